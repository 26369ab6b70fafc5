use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scorer::{Category, SeverityScores};

/// Opaque identifier assigned to a record by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(Uuid);

impl CommentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CommentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A persisted, scored comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedComment {
    pub id: CommentId,
    pub comment_text: String,
    pub severity_scores: SeverityScores,
    pub predicted_category: Category,
    pub timestamp: DateTime<Utc>,
    pub alert_triggered: bool,
}

/// The fields of a record before the store assigns it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFlaggedComment {
    pub comment_text: String,
    pub severity_scores: SeverityScores,
    pub predicted_category: Category,
    pub timestamp: DateTime<Utc>,
}

impl NewFlaggedComment {
    /// Derives the predicted category from `scores` and stamps the current time.
    pub fn from_scores(comment_text: impl Into<String>, severity_scores: SeverityScores) -> Self {
        Self {
            comment_text: comment_text.into(),
            predicted_category: severity_scores.predicted_category(),
            severity_scores,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn into_record(self, id: CommentId) -> FlaggedComment {
        FlaggedComment {
            id,
            comment_text: self.comment_text,
            severity_scores: self.severity_scores,
            predicted_category: self.predicted_category,
            timestamp: self.timestamp,
            alert_triggered: false,
        }
    }
}
