use ndarray::Array1;

use super::categories::{Category, SeverityScores};
use super::error::ScoringError;

pub(crate) fn sigmoid(logits: &Array1<f32>) -> Array1<f32> {
    logits.mapv(|x| 1.0 / (1.0 + (-x).exp()))
}

/// Maps one row of per-label probabilities onto the fixed category order.
pub(crate) fn probabilities_to_scores(probs: &Array1<f32>) -> Result<SeverityScores, ScoringError> {
    if probs.len() != Category::ALL.len() {
        return Err(ScoringError::PredictionError(format!(
            "Expected {} labels from model, got {}",
            Category::ALL.len(),
            probs.len()
        )));
    }
    let mut values = [0.0f32; 6];
    for (slot, p) in values.iter_mut().zip(probs.iter()) {
        *slot = *p;
    }
    Ok(SeverityScores::from_array(values))
}
