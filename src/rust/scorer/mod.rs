mod builder;
mod categories;
mod encoding;
mod error;
mod model;
mod utils;

pub use builder::{ToxicityModelBuilder, DEFAULT_MAX_SEQUENCE_LENGTH};
pub use categories::{Category, SeverityScores};
pub use error::ScoringError;
pub use model::ToxicityModel;

/// Maps text to independent per-category toxicity scores.
///
/// Implementations are shared across request handlers and must be usable
/// concurrently without mutation.
pub trait Scorer: Send + Sync {
    fn score(&self, text: &str) -> Result<SeverityScores, ScoringError>;
}

/// Information about a loaded toxicity model
#[derive(Debug, Clone)]
pub struct ToxicityModelInfo {
    pub model_path: String,
    pub tokenizer_path: String,
    pub max_sequence_length: usize,
}
