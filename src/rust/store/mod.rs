//! Persistence for flagged comments.
//!
//! Records are append-only: created once with all scoring fields, after which
//! the only permitted mutation is flipping `alert_triggered` to `true`.

mod memory;
mod record;
mod sqlite;

pub use memory::InMemoryCommentStore;
pub use record::{CommentId, FlaggedComment, NewFlaggedComment};
pub use sqlite::SqliteCommentStore;

use async_trait::async_trait;

use crate::scorer::Category;

/// Number of records returned by recency queries when no limit is given.
pub const DEFAULT_RECENT_LIMIT: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Comment not found: {0}")]
    NotFound(CommentId),
    #[error("Store backend error: {0}")]
    Backend(String),
    #[error("Stored record could not be decoded: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage for flagged comments.
///
/// Implementations must make `mark_alert_triggered` a single atomic field
/// update so concurrent evaluations of the same record cannot interleave.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Persists a new record with `alert_triggered = false` and returns its id
    async fn insert(&self, comment: NewFlaggedComment) -> StoreResult<CommentId>;

    /// Sets `alert_triggered = true` on one record
    ///
    /// Fails with [`StoreError::NotFound`] if no record has this id.
    async fn mark_alert_triggered(&self, id: &CommentId) -> StoreResult<()>;

    /// Fetches a single record
    async fn get(&self, id: &CommentId) -> StoreResult<Option<FlaggedComment>>;

    /// Up to `limit` records, newest first
    async fn recent(&self, limit: usize) -> StoreResult<Vec<FlaggedComment>>;

    /// All records whose predicted category is `category`, in insertion order
    async fn by_category(&self, category: Category) -> StoreResult<Vec<FlaggedComment>>;
}
