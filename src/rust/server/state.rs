use chrono::{DateTime, Utc};

use crate::pipeline::CommentPipeline;

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    pub pipeline: CommentPipeline,
    pub version: String,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(pipeline: CommentPipeline) -> Self {
        Self {
            pipeline,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
