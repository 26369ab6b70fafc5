use tokenizers::Tokenizer;
use ort::session::Session;
use ndarray::{Array1, Array2};
use ort::value::Tensor;
use std::collections::HashMap;

use super::categories::SeverityScores;
use super::error::ScoringError;
use super::utils::{probabilities_to_scores, sigmoid};

/// Token ids and attention mask for a single input sequence.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EncodedText {
    pub ids: Vec<u32>,
    pub attention_mask: Vec<u32>,
}

/// Runs text through a multi-label sequence-classification ONNX model.
///
/// The pipeline is:
/// 1. Tokenization with special tokens, truncated to `max_sequence_length`
/// 2. Running the model on `input_ids` and `attention_mask`
/// 3. Applying a sigmoid to each output logit independently
///
/// The ONNX model is expected to:
/// - Accept `input_ids` and `attention_mask` (both shape [batch_size, sequence_length], i64)
/// - Output logits of shape [batch_size, num_labels] as its first output
pub(crate) trait SequenceClassification {
    /// Returns the initialized tokenizer if available
    fn tokenizer(&self) -> Option<&Tokenizer>;

    /// Returns the initialized ONNX session if available
    fn session(&self) -> Option<&Session>;

    /// Returns the maximum sequence length the model can handle
    fn max_sequence_length(&self) -> Option<usize>;

    /// Counts the tokens the model would see for `text`, special tokens included.
    ///
    /// # Errors
    /// - `TokenizerError` if the tokenizer is not initialized
    /// - `TokenizerError` if the text cannot be encoded
    fn count_tokens(&self, text: &str) -> Result<usize, ScoringError> {
        self.encode(text).map(|encoded| encoded.ids.len())
    }

    /// Tokenizes `text` into model input.
    ///
    /// Input longer than `max_sequence_length` is truncated rather than
    /// rejected. The tokenizer is normally configured to truncate already; the
    /// length check here covers tokenizers loaded without truncation params.
    fn encode(&self, text: &str) -> Result<EncodedText, ScoringError> {
        let tokenizer = self.tokenizer()
            .ok_or_else(|| ScoringError::TokenizerError("Tokenizer not initialized".into()))?;
        let max_length = self.max_sequence_length()
            .ok_or_else(|| ScoringError::TokenizerError("Max sequence length not set".into()))?;

        let encoding = tokenizer.encode(text, true)
            .map_err(|e| ScoringError::TokenizerError(e.to_string()))?;

        let mut ids = encoding.get_ids().to_vec();
        let mut attention_mask = encoding.get_attention_mask().to_vec();
        if ids.len() > max_length {
            log::debug!("Truncating input from {} to {} tokens", ids.len(), max_length);
            ids.truncate(max_length);
            attention_mask.truncate(max_length);
        }
        if ids.is_empty() {
            return Err(ScoringError::ValidationError("Input produced no tokens".into()));
        }

        Ok(EncodedText { ids, attention_mask })
    }

    /// Scores `text` across all toxicity categories.
    ///
    /// # Errors
    /// - Forwards all errors from `encode()` and `run_logits()`
    fn classify_text(&self, text: &str) -> Result<SeverityScores, ScoringError> {
        let encoded = self.encode(text)?;
        let logits = self.run_logits(&encoded)?;
        probabilities_to_scores(&sigmoid(&logits))
    }

    /// Runs the model and returns the raw logits for the single batch row.
    ///
    /// # Errors
    /// - `ModelError` if the session is not initialized
    /// - `ModelError` if tensor creation or model execution fails
    /// - `PredictionError` if the output does not have shape [1, num_labels]
    fn run_logits(&self, encoded: &EncodedText) -> Result<Array1<f32>, ScoringError> {
        let session = self.session()
            .ok_or_else(|| ScoringError::ModelError("Session not initialized".into()))?;

        let seq_len = encoded.ids.len();
        let input_array = Array2::from_shape_vec((1, seq_len),
            encoded.ids.iter().map(|&x| x as i64).collect())
            .map_err(|e| ScoringError::ModelError(format!("Failed to create input array: {}", e)))?;
        let input_dyn = input_array.into_dyn();
        let input_ids = input_dyn.as_standard_layout();

        let mask_array = Array2::from_shape_vec((1, seq_len),
            encoded.attention_mask.iter().map(|&x| x as i64).collect())
            .map_err(|e| ScoringError::ModelError(format!("Failed to create mask array: {}", e)))?;
        let mask_dyn = mask_array.into_dyn();
        let attention_mask = mask_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert("input_ids", Tensor::from_array(&input_ids)
            .map_err(|e| ScoringError::ModelError(format!("Failed to create input tensor: {}", e)))?);
        input_tensors.insert("attention_mask", Tensor::from_array(&attention_mask)
            .map_err(|e| ScoringError::ModelError(format!("Failed to create mask tensor: {}", e)))?);

        let outputs = session.run(input_tensors)
            .map_err(|e| ScoringError::ModelError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ScoringError::ModelError(format!("Failed to extract output tensor: {}", e)))?;

        let shape = output_tensor.shape();
        if shape.len() != 2 || shape[0] != 1 {
            return Err(ScoringError::PredictionError(
                format!("Unexpected logits shape {:?}, expected [1, num_labels]", shape)
            ));
        }

        let row = output_tensor.slice(ndarray::s![0, ..]);
        Ok(Array1::from_iter(row.iter().cloned()))
    }
}
