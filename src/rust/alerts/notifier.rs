use std::time::Duration;
use async_trait::async_trait;
use serde::Serialize;

use super::SeverityLevel;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Webhook returned status {0}")]
    Status(u16),
}

/// Destination for alert notifications.
///
/// Delivery is best-effort: the evaluator logs a returned error and carries on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str, severity_level: SeverityLevel) -> Result<(), NotifyError>;
}

/// Writes alerts to the log at `warn` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str, severity_level: SeverityLevel) -> Result<(), NotifyError> {
        log::warn!("{} {}", message, severity_level);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    message: &'a str,
    severity_level: &'static str,
}

/// POSTs alerts as JSON `{ "message", "severity_level" }` to a fixed URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url: url.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &str, severity_level: SeverityLevel) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            message,
            severity_level: severity_level.as_str(),
        };
        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        log::debug!("Alert delivered to {}", self.url);
        Ok(())
    }
}
