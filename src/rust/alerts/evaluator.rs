use std::sync::Arc;
use log::{info, warn};

use super::notifier::Notifier;
use super::thresholds::{AlertThresholds, SeverityLevel};
use super::{AlertError, ALERT_MESSAGE};
use crate::scorer::{Category, SeverityScores};
use crate::store::{CommentId, CommentStore};

/// Decides whether a scored record warrants an alert, and if so flags the
/// record and sends a notification.
///
/// Every call is independent: evaluating the same triggering scores twice
/// issues two store updates and two notifications.
#[derive(Clone)]
pub struct AlertEvaluator {
    store: Arc<dyn CommentStore>,
    notifier: Arc<dyn Notifier>,
    thresholds: AlertThresholds,
}

impl AlertEvaluator {
    pub fn new(
        store: Arc<dyn CommentStore>,
        notifier: Arc<dyn Notifier>,
        thresholds: AlertThresholds,
    ) -> Self {
        Self { store, notifier, thresholds }
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    /// Categories that would trigger for `scores`, in configuration order. No side effects.
    pub fn triggered_categories(&self, scores: &SeverityScores) -> Vec<Category> {
        self.thresholds.exceeded(scores)
    }

    /// Evaluates `scores` for the record `record_id`.
    ///
    /// Returns `Ok(false)` without touching the store or notifier when no
    /// threshold is exceeded. Otherwise flags the record, notifies, and
    /// returns `Ok(true)`. A failed store update is returned as an error and
    /// suppresses the notification; a failed notification is only logged.
    pub async fn evaluate(&self, record_id: &CommentId, scores: &SeverityScores) -> Result<bool, AlertError> {
        let triggered = self.triggered_categories(scores);
        let Some(severity_level) = SeverityLevel::from_triggered(&triggered) else {
            return Ok(false);
        };

        self.store.mark_alert_triggered(record_id).await?;
        info!(
            "Alert triggered for comment {} ({})",
            record_id,
            triggered.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ")
        );

        if let Err(e) = self.notifier.notify(ALERT_MESSAGE, severity_level).await {
            warn!("Failed to deliver alert for comment {}: {}", record_id, e);
        }

        Ok(true)
    }
}

impl std::fmt::Debug for AlertEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertEvaluator")
            .field("thresholds", &self.thresholds)
            .finish_non_exhaustive()
    }
}
