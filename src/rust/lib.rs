//! Toxicity scoring for user comments, backed by a six-label ONNX classifier.
//!
//! Every comment is scored, persisted with its per-category scores, and checked
//! against alert thresholds. Records that cross a threshold are flagged and a
//! notification goes out.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use niasafe::{Scorer, ToxicityModel};
//!
//! let model = ToxicityModel::builder()
//!     .with_model_dir("models")?
//!     .build()?;
//!
//! let scores = model.score("I will kill you")?;
//! println!("threat: {:.3}", scores.threat);
//! println!("predicted: {}", scores.predicted_category());
//! # Ok(())
//! # }
//! ```
//!
//! # Running the Pipeline
//!
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use niasafe::alerts::{AlertThresholds, LogNotifier};
//! use niasafe::pipeline::CommentPipeline;
//! use niasafe::store::InMemoryCommentStore;
//! use niasafe::ToxicityModelBuilder;
//!
//! let model = ToxicityModelBuilder::new().with_model_dir("models")?.build()?;
//! let pipeline = CommentPipeline::new(
//!     Arc::new(model),
//!     Arc::new(InMemoryCommentStore::new()),
//!     Arc::new(LogNotifier),
//!     AlertThresholds::default(),
//! );
//!
//! let scored = pipeline.process("you are an idiot").await?;
//! println!("alert triggered: {}", scored.alert_triggered);
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod config;
pub mod model_manager;
pub mod pipeline;
mod runtime;
pub mod scorer;
pub mod server;
pub mod store;

pub use config::AppConfig;
pub use model_manager::{ModelError, ModelManager, ModelSource};
pub use pipeline::{CommentPipeline, PipelineError, ScoredComment};
pub use runtime::{create_session_builder, RuntimeConfig};
pub use scorer::{
    Category, Scorer, ScoringError, SeverityScores, ToxicityModel, ToxicityModelBuilder,
    ToxicityModelInfo,
};

pub fn init_logger() {
    env_logger::init();
}
