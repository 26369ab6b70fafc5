#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use niasafe::alerts::{AlertThresholds, Notifier, NotifyError, SeverityLevel};
use niasafe::pipeline::CommentPipeline;
use niasafe::store::{CommentStore, InMemoryCommentStore};
use niasafe::{Scorer, ScoringError, SeverityScores};

/// Returns canned scores per input text, falling back to a default.
pub struct FixedScorer {
    default: SeverityScores,
    by_text: HashMap<String, SeverityScores>,
}

impl FixedScorer {
    pub fn new(default: SeverityScores) -> Self {
        Self { default, by_text: HashMap::new() }
    }

    pub fn with_text(mut self, text: &str, scores: SeverityScores) -> Self {
        self.by_text.insert(text.to_string(), scores);
        self
    }
}

impl Scorer for FixedScorer {
    fn score(&self, text: &str) -> Result<SeverityScores, ScoringError> {
        Ok(self.by_text.get(text).copied().unwrap_or(self.default))
    }
}

pub struct FailingScorer;

impl Scorer for FailingScorer {
    fn score(&self, _text: &str) -> Result<SeverityScores, ScoringError> {
        Err(ScoringError::PredictionError("inference backend unavailable".into()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, SeverityLevel)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, SeverityLevel)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str, severity_level: SeverityLevel) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push((message.to_string(), severity_level));
        Ok(())
    }
}

/// Scores observed for "I will kill you" with the reference model.
pub fn threat_scores() -> SeverityScores {
    SeverityScores::from_array([0.92, 0.31, 0.40, 0.95, 0.55, 0.12])
}

pub fn benign_scores() -> SeverityScores {
    SeverityScores::from_array([0.02, 0.001, 0.01, 0.001, 0.01, 0.003])
}

pub struct Harness {
    pub pipeline: CommentPipeline,
    pub store: Arc<InMemoryCommentStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness(scorer: impl Scorer + 'static) -> Harness {
    harness_with_store(scorer, Arc::new(InMemoryCommentStore::new()))
}

pub fn harness_with_store(scorer: impl Scorer + 'static, store: Arc<InMemoryCommentStore>) -> Harness {
    let notifier = Arc::new(RecordingNotifier::default());
    let pipeline = CommentPipeline::new(
        Arc::new(scorer),
        store.clone() as Arc<dyn CommentStore>,
        notifier.clone(),
        AlertThresholds::default(),
    );
    Harness { pipeline, store, notifier }
}
