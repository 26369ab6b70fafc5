use std::sync::Arc;
use ort::session::Session;
use tokenizers::Tokenizer;

use super::categories::SeverityScores;
use super::encoding::SequenceClassification;
use super::error::ScoringError;
use super::{Scorer, ToxicityModelInfo};

/// A thread-safe toxicity scorer backed by an ONNX sequence-classification model.
///
/// # Thread Safety
///
/// This type is automatically `Send + Sync` because all of its fields are thread-safe:
/// - `String` and `usize` are `Send + Sync`
/// - `Tokenizer` and `Session` are wrapped in `Arc`
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use niasafe::{Scorer, ToxicityModel};
///
/// let model = ToxicityModel::builder()
///     .with_model_dir("./models")?
///     .build()?;
///
/// let scores = model.score("You are a wonderful person")?;
/// println!("threat: {:.3}", scores.threat);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ToxicityModel {
    pub model_path: String,
    pub tokenizer_path: String,
    pub tokenizer: Arc<Tokenizer>,
    pub session: Arc<Session>,
    pub max_sequence_length: usize,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<ToxicityModel>();
    }
};

impl SequenceClassification for ToxicityModel {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        Some(&self.tokenizer)
    }

    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }

    fn max_sequence_length(&self) -> Option<usize> {
        Some(self.max_sequence_length)
    }
}

impl ToxicityModel {
    /// Creates a new ToxicityModelBuilder for fluent construction
    pub fn builder() -> super::builder::ToxicityModelBuilder {
        super::builder::ToxicityModelBuilder::new()
    }

    /// Returns information about the loaded model
    pub fn info(&self) -> ToxicityModelInfo {
        ToxicityModelInfo {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            max_sequence_length: self.max_sequence_length,
        }
    }

    /// Number of tokens the model sees for `text` after truncation
    pub fn token_count(&self, text: &str) -> Result<usize, ScoringError> {
        self.count_tokens(text)
    }
}

impl Scorer for ToxicityModel {
    fn score(&self, text: &str) -> Result<SeverityScores, ScoringError> {
        self.classify_text(text)
    }
}
