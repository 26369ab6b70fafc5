use std::fmt;
use serde::{Deserialize, Serialize};

use super::AlertError;
use crate::scorer::{Category, SeverityScores};

/// A single per-category cutoff. Scores strictly above `threshold` trigger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub category: Category,
    pub threshold: f32,
}

/// Ordered per-category alert cutoffs.
///
/// Categories not listed never trigger an alert on their own. Order decides
/// the order in which triggered categories are reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Threshold>", into = "Vec<Threshold>")]
pub struct AlertThresholds {
    entries: Vec<Threshold>,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            entries: vec![
                Threshold { category: Category::Threat, threshold: 0.8 },
                Threshold { category: Category::SevereToxic, threshold: 0.7 },
            ],
        }
    }
}

impl AlertThresholds {
    /// Validates and wraps `entries`: each category at most once, each cutoff a finite number.
    pub fn new(entries: Vec<Threshold>) -> Result<Self, AlertError> {
        for (i, entry) in entries.iter().enumerate() {
            if !entry.threshold.is_finite() {
                return Err(AlertError::InvalidThresholds(format!(
                    "threshold for {} must be finite, got {}",
                    entry.category, entry.threshold
                )));
            }
            if entries[..i].iter().any(|e| e.category == entry.category) {
                return Err(AlertError::InvalidThresholds(format!(
                    "duplicate threshold for {}",
                    entry.category
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[Threshold] {
        &self.entries
    }

    pub fn threshold_for(&self, category: Category) -> Option<f32> {
        self.entries
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.threshold)
    }

    /// Categories whose score exceeds their cutoff, in configuration order.
    pub fn exceeded(&self, scores: &SeverityScores) -> Vec<Category> {
        self.entries
            .iter()
            .filter(|e| scores.get(e.category) > e.threshold)
            .map(|e| e.category)
            .collect()
    }
}

impl TryFrom<Vec<Threshold>> for AlertThresholds {
    type Error = AlertError;

    fn try_from(entries: Vec<Threshold>) -> Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<AlertThresholds> for Vec<Threshold> {
    fn from(thresholds: AlertThresholds) -> Self {
        thresholds.entries
    }
}

/// The severity reported with an alert notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityLevel {
    /// Exactly one category crossed its threshold
    Single(Category),
    /// More than one category crossed its threshold
    Multiple,
}

impl SeverityLevel {
    /// Collapses a non-empty set of triggered categories. Returns `None` for an empty set.
    pub fn from_triggered(triggered: &[Category]) -> Option<Self> {
        match triggered {
            [] => None,
            [only] => Some(SeverityLevel::Single(*only)),
            _ => Some(SeverityLevel::Multiple),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLevel::Single(category) => category.as_str(),
            SeverityLevel::Multiple => "multiple",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
