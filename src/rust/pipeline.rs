//! Scoring-to-storage pipeline: score text, persist the record, evaluate alerts.

use std::sync::Arc;
use log::debug;
use serde::Serialize;

use crate::alerts::{AlertError, AlertEvaluator, AlertThresholds, Notifier};
use crate::scorer::{Category, Scorer, ScoringError, SeverityScores};
use crate::store::{
    CommentId, CommentStore, FlaggedComment, NewFlaggedComment, StoreError, DEFAULT_RECENT_LIMIT,
};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Internal(String),
}

impl From<AlertError> for PipelineError {
    fn from(err: AlertError) -> Self {
        match err {
            AlertError::Store(e) => PipelineError::Store(e),
            other => PipelineError::Internal(other.to_string()),
        }
    }
}

/// Outcome of scoring one comment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredComment {
    pub id: CommentId,
    pub text: String,
    pub severity_scores: SeverityScores,
    pub predicted_category: Category,
    pub alert_triggered: bool,
}

/// Connects a [`Scorer`], a [`CommentStore`] and an [`AlertEvaluator`].
#[derive(Clone)]
pub struct CommentPipeline {
    scorer: Arc<dyn Scorer>,
    store: Arc<dyn CommentStore>,
    evaluator: AlertEvaluator,
}

impl CommentPipeline {
    /// Builds a pipeline whose evaluator flags records in the same `store`.
    pub fn new(
        scorer: Arc<dyn Scorer>,
        store: Arc<dyn CommentStore>,
        notifier: Arc<dyn Notifier>,
        thresholds: AlertThresholds,
    ) -> Self {
        let evaluator = AlertEvaluator::new(Arc::clone(&store), notifier, thresholds);
        Self { scorer, store, evaluator }
    }

    pub fn evaluator(&self) -> &AlertEvaluator {
        &self.evaluator
    }

    /// Scores `text` on the blocking thread pool.
    pub async fn score(&self, text: &str) -> Result<SeverityScores, PipelineError> {
        let scorer = Arc::clone(&self.scorer);
        let text = text.to_owned();
        let scores = tokio::task::spawn_blocking(move || scorer.score(&text))
            .await
            .map_err(|e| PipelineError::Internal(format!("Scoring task failed: {}", e)))??;
        Ok(scores)
    }

    /// Scores, persists and evaluates one comment.
    pub async fn process(&self, text: &str) -> Result<ScoredComment, PipelineError> {
        let severity_scores = self.score(text).await?;

        let new = NewFlaggedComment::from_scores(text, severity_scores);
        let predicted_category = new.predicted_category;
        let id = self.store.insert(new).await?;
        debug!("Stored comment {} as {}", id, predicted_category);

        let alert_triggered = self.evaluator.evaluate(&id, &severity_scores).await?;

        Ok(ScoredComment {
            id,
            text: text.to_string(),
            severity_scores,
            predicted_category,
            alert_triggered,
        })
    }

    /// Up to `limit` (default 20) records, newest first.
    pub async fn recent_comments(&self, limit: Option<usize>) -> Result<Vec<FlaggedComment>, PipelineError> {
        Ok(self.store.recent(limit.unwrap_or(DEFAULT_RECENT_LIMIT)).await?)
    }

    pub async fn comments_by_category(&self, category: Category) -> Result<Vec<FlaggedComment>, PipelineError> {
        Ok(self.store.by_category(category).await?)
    }

    pub async fn comment(&self, id: &CommentId) -> Result<FlaggedComment, PipelineError> {
        self.store
            .get(id)
            .await?
            .ok_or(PipelineError::Store(StoreError::NotFound(*id)))
    }
}

impl std::fmt::Debug for CommentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentPipeline")
            .field("evaluator", &self.evaluator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::LogNotifier;
    use crate::store::InMemoryCommentStore;

    struct FixedScorer(SeverityScores);

    impl Scorer for FixedScorer {
        fn score(&self, _text: &str) -> Result<SeverityScores, ScoringError> {
            Ok(self.0)
        }
    }

    struct BrokenScorer;

    impl Scorer for BrokenScorer {
        fn score(&self, _text: &str) -> Result<SeverityScores, ScoringError> {
            Err(ScoringError::ModelError("model not loaded".into()))
        }
    }

    fn pipeline(scorer: Arc<dyn Scorer>) -> (CommentPipeline, Arc<InMemoryCommentStore>) {
        let store = Arc::new(InMemoryCommentStore::new());
        let pipeline = CommentPipeline::new(scorer, store.clone(), Arc::new(LogNotifier), AlertThresholds::default());
        (pipeline, store)
    }

    #[tokio::test]
    async fn test_process_persists_and_flags() {
        let scores = SeverityScores::from_array([0.6, 0.1, 0.2, 0.95, 0.3, 0.05]);
        let (pipeline, store) = pipeline(Arc::new(FixedScorer(scores)));

        let result = pipeline.process("I will kill you").await.unwrap();
        assert!(result.alert_triggered);
        assert_eq!(result.predicted_category, Category::Threat);

        let record = store.get(&result.id).await.unwrap().unwrap();
        assert_eq!(record.comment_text, "I will kill you");
        assert_eq!(record.predicted_category, Category::Threat);
        assert!(record.alert_triggered);
    }

    #[tokio::test]
    async fn test_scoring_failure_writes_nothing() {
        let (pipeline, store) = pipeline(Arc::new(BrokenScorer));

        let result = pipeline.process("hello").await;
        assert!(matches!(result, Err(PipelineError::Scoring(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_recent_defaults_to_twenty() {
        let (pipeline, _store) = pipeline(Arc::new(FixedScorer(SeverityScores::default())));
        for i in 0..25 {
            pipeline.process(&format!("comment {}", i)).await.unwrap();
        }
        assert_eq!(pipeline.recent_comments(None).await.unwrap().len(), 20);
        assert_eq!(pipeline.recent_comments(Some(3)).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_comment_is_not_found() {
        let (pipeline, _store) = pipeline(Arc::new(FixedScorer(SeverityScores::default())));
        let result = pipeline.comment(&CommentId::generate()).await;
        assert!(matches!(result, Err(PipelineError::Store(StoreError::NotFound(_)))));
    }
}
