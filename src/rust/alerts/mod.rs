mod evaluator;
mod notifier;
mod thresholds;

pub use evaluator::AlertEvaluator;
pub use notifier::{LogNotifier, Notifier, NotifyError, WebhookNotifier};
pub use thresholds::{AlertThresholds, SeverityLevel, Threshold};

use crate::store::StoreError;

/// Message sent with every alert notification.
pub const ALERT_MESSAGE: &str = "Alert: High severity comment detected";

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Invalid alert thresholds: {0}")]
    InvalidThresholds(String),
}
