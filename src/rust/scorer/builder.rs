use std::path::Path;
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};
use ort::session::Session;
use log::{info, error};

use super::categories::Category;
use super::encoding::SequenceClassification;
use super::error::ScoringError;
use super::model::ToxicityModel;
use crate::model_manager::{ModelManager, ModelSource};
use crate::runtime::{RuntimeConfig, create_session_builder};

/// Default token limit, matching DistilBERT's position embeddings.
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 512;

/// A builder for constructing a [`ToxicityModel`] with a fluent interface.
#[derive(Debug)]
pub struct ToxicityModelBuilder {
    model_path: Option<String>,
    tokenizer_path: Option<String>,
    tokenizer: Option<Tokenizer>,
    session: Option<Session>,
    max_sequence_length: usize,
    runtime_config: RuntimeConfig,
}

impl Default for ToxicityModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceClassification for ToxicityModelBuilder {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        self.tokenizer.as_ref()
    }

    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn max_sequence_length(&self) -> Option<usize> {
        Some(self.max_sequence_length)
    }
}

impl ToxicityModelBuilder {
    /// Creates a new empty builder with default configuration
    pub fn new() -> Self {
        Self {
            model_path: None,
            tokenizer_path: None,
            tokenizer: None,
            session: None,
            max_sequence_length: DEFAULT_MAX_SEQUENCE_LENGTH,
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Sets the runtime configuration for ONNX model execution.
    ///
    /// Must be called before loading a model to take effect.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Sets the maximum number of tokens fed to the model. Longer input is truncated.
    pub fn with_max_sequence_length(mut self, max_sequence_length: usize) -> Self {
        self.max_sequence_length = max_sequence_length;
        self
    }

    /// Loads `model.onnx` and `tokenizer.json` from a directory
    ///
    /// # Example
    /// ```no_run
    /// use niasafe::ToxicityModelBuilder;
    ///
    /// let builder = ToxicityModelBuilder::new()
    ///     .with_model_dir("./models");
    /// ```
    pub fn with_model_dir(self, dir: impl AsRef<Path>) -> Result<Self, ScoringError> {
        let dir = dir.as_ref();
        let model_path = dir.join("model.onnx");
        let tokenizer_path = dir.join("tokenizer.json");
        self.with_custom_model(
            &model_path.to_string_lossy(),
            &tokenizer_path.to_string_lossy(),
        )
    }

    /// Loads a model previously fetched by a [`ModelManager`]
    ///
    /// # Returns
    /// * An error if the model has not been downloaded yet
    pub fn with_managed_model(self, manager: &ModelManager, source: &ModelSource) -> Result<Self, ScoringError> {
        if !manager.is_model_downloaded(&source.name) {
            return Err(ScoringError::BuildError(format!(
                "Model '{}' is not downloaded. Please download it first using ModelManager::download_model()",
                source.name
            )));
        }
        let model_path = manager.get_model_path(&source.name);
        let tokenizer_path = manager.get_tokenizer_path(&source.name);
        self.with_custom_model(
            &model_path.to_string_lossy(),
            &tokenizer_path.to_string_lossy(),
        )
    }

    /// Sets a custom model and tokenizer path
    ///
    /// # Returns
    /// * `Result<Self, ScoringError>` - The builder instance if successful, or an error if:
    ///   - The model or tokenizer paths are empty
    ///   - The paths are already set
    ///   - The files don't exist
    ///   - The model or tokenizer failed to load
    ///   - The model structure is invalid
    pub fn with_custom_model(
        mut self,
        model_path: &str,
        tokenizer_path: &str,
    ) -> Result<Self, ScoringError> {
        if model_path.is_empty() || tokenizer_path.is_empty() {
            return Err(ScoringError::BuildError("Model and tokenizer paths cannot be empty".to_string()));
        }
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ScoringError::BuildError("Model and tokenizer paths already set".to_string()));
        }

        if !Path::new(model_path).exists() {
            return Err(ScoringError::BuildError(format!("Model file not found: {}", model_path)));
        }
        if !Path::new(tokenizer_path).exists() {
            return Err(ScoringError::BuildError(format!("Tokenizer file not found: {}", tokenizer_path)));
        }

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| {
                error!("Failed to load tokenizer: {}", e);
                ScoringError::BuildError(format!("Failed to load tokenizer: {}", e))
            })?;
        info!("Tokenizer loaded from {}", tokenizer_path);

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(model_path)?;

        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.tokenizer = Some(tokenizer);
        self.session = Some(session);
        self.model_path = Some(model_path.to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string());
        Ok(self)
    }

    /// Builds the final [`ToxicityModel`]
    ///
    /// Configures tokenizer truncation and runs one sample input to confirm the
    /// model emits one logit per toxicity category.
    pub fn build(mut self) -> Result<ToxicityModel, ScoringError> {
        if self.max_sequence_length == 0 {
            return Err(ScoringError::ValidationError("Max sequence length must be positive".into()));
        }

        let mut tokenizer = self.tokenizer.take()
            .ok_or_else(|| ScoringError::BuildError("No tokenizer loaded".into()))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: self.max_sequence_length,
                ..Default::default()
            }))
            .map_err(|e| ScoringError::BuildError(format!("Failed to configure truncation: {}", e)))?;
        tokenizer.with_padding(None);
        self.tokenizer = Some(tokenizer);

        let sample = self.encode("sample input to check label count")?;
        let logits = self.run_logits(&sample)?;
        if logits.len() != Category::ALL.len() {
            return Err(ScoringError::ModelError(format!(
                "Model must output {} labels, found {}",
                Category::ALL.len(),
                logits.len()
            )));
        }
        info!("Model emits {} labels", logits.len());

        let tokenizer = Arc::new(self.tokenizer.take()
            .ok_or_else(|| ScoringError::BuildError("No tokenizer loaded".into()))?);
        let session = Arc::new(self.session.take()
            .ok_or_else(|| ScoringError::BuildError("No ONNX model loaded".into()))?);
        let model_path = self.model_path.take()
            .ok_or_else(|| ScoringError::BuildError("Model path must be set".into()))?;
        let tokenizer_path = self.tokenizer_path.take()
            .ok_or_else(|| ScoringError::BuildError("Tokenizer path must be set".into()))?;

        Ok(ToxicityModel {
            model_path,
            tokenizer_path,
            tokenizer,
            session,
            max_sequence_length: self.max_sequence_length,
        })
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), ScoringError> {
        let inputs = &session.inputs;
        if inputs.len() < 2 {
            return Err(ScoringError::ModelError(
                format!("Model must have at least 2 inputs (input_ids and attention_mask), found {}", inputs.len())
            ));
        }

        let outputs = &session.outputs;
        if outputs.is_empty() {
            return Err(ScoringError::ModelError(
                "Model must have at least 1 output for logits".to_string()
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_without_model_fails() {
        let result = ToxicityModelBuilder::new().build();
        assert!(matches!(result, Err(ScoringError::BuildError(_))));
    }

    #[test]
    fn test_empty_paths_rejected() {
        let result = ToxicityModelBuilder::new().with_custom_model("", "tokenizer.json");
        assert!(matches!(result, Err(ScoringError::BuildError(_))));
    }

    #[test]
    fn test_missing_files_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = ToxicityModelBuilder::new().with_model_dir(dir.path());
        match result {
            Err(ScoringError::BuildError(msg)) => assert!(msg.contains("Model file not found")),
            other => panic!("expected build error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_zero_sequence_length_rejected() {
        let result = ToxicityModelBuilder::new().with_max_sequence_length(0).build();
        assert!(matches!(result, Err(ScoringError::ValidationError(_))));
    }

    #[test]
    fn test_unmanaged_model_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        let source = ModelSource::new("toxic-distilbert", "http://localhost/model.onnx", "http://localhost/tokenizer.json");
        let result = ToxicityModelBuilder::new().with_managed_model(&manager, &source);
        assert!(matches!(result, Err(ScoringError::BuildError(_))));
    }
}
