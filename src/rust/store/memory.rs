use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CommentId, CommentStore, FlaggedComment, NewFlaggedComment, StoreError, StoreResult};
use crate::scorer::Category;

/// In-memory store for development and testing
#[derive(Debug, Default)]
pub struct InMemoryCommentStore {
    comments: RwLock<Vec<FlaggedComment>>,
}

impl InMemoryCommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.comments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.comments.read().await.is_empty()
    }
}

#[async_trait]
impl CommentStore for InMemoryCommentStore {
    async fn insert(&self, comment: NewFlaggedComment) -> StoreResult<CommentId> {
        let id = CommentId::generate();
        self.comments.write().await.push(comment.into_record(id));
        Ok(id)
    }

    async fn mark_alert_triggered(&self, id: &CommentId) -> StoreResult<()> {
        let mut comments = self.comments.write().await;
        let record = comments
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or(StoreError::NotFound(*id))?;
        record.alert_triggered = true;
        Ok(())
    }

    async fn get(&self, id: &CommentId) -> StoreResult<Option<FlaggedComment>> {
        let comments = self.comments.read().await;
        Ok(comments.iter().find(|c| &c.id == id).cloned())
    }

    async fn recent(&self, limit: usize) -> StoreResult<Vec<FlaggedComment>> {
        let comments = self.comments.read().await;
        // Reverse first so that equal timestamps come out newest-inserted first.
        let mut recent: Vec<FlaggedComment> = comments.iter().rev().cloned().collect();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(limit);
        Ok(recent)
    }

    async fn by_category(&self, category: Category) -> StoreResult<Vec<FlaggedComment>> {
        let comments = self.comments.read().await;
        Ok(comments
            .iter()
            .filter(|c| c.predicted_category == category)
            .cloned()
            .collect())
    }
}
