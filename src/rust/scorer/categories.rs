use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use super::error::ScoringError;

/// The six toxicity categories the model is trained on.
///
/// Declaration order is significant: it is the enumeration order used for
/// model output columns and for breaking ties when picking the predicted
/// category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Toxic,
    SevereToxic,
    Obscene,
    Threat,
    Insult,
    IdentityHate,
}

impl Category {
    /// All categories in enumeration order.
    pub const ALL: [Category; 6] = [
        Category::Toxic,
        Category::SevereToxic,
        Category::Obscene,
        Category::Threat,
        Category::Insult,
        Category::IdentityHate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Toxic => "toxic",
            Category::SevereToxic => "severe_toxic",
            Category::Obscene => "obscene",
            Category::Threat => "threat",
            Category::Insult => "insult",
            Category::IdentityHate => "identity_hate",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ScoringError::ValidationError(format!("Unknown category: {}", s)))
    }
}

/// Per-category scores in [0, 1], one per [`Category`].
///
/// Serializes as a flat JSON object keyed by category name. Keys missing on
/// input deserialize to `0.0`, which is also how the alert rule treats them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityScores {
    pub toxic: f32,
    pub severe_toxic: f32,
    pub obscene: f32,
    pub threat: f32,
    pub insult: f32,
    pub identity_hate: f32,
}

impl SeverityScores {
    /// Builds scores from values laid out in [`Category::ALL`] order.
    pub fn from_array(values: [f32; 6]) -> Self {
        let [toxic, severe_toxic, obscene, threat, insult, identity_hate] = values;
        Self { toxic, severe_toxic, obscene, threat, insult, identity_hate }
    }

    pub fn to_array(&self) -> [f32; 6] {
        [
            self.toxic,
            self.severe_toxic,
            self.obscene,
            self.threat,
            self.insult,
            self.identity_hate,
        ]
    }

    pub fn get(&self, category: Category) -> f32 {
        self.to_array()[category.index()]
    }

    /// Sets one category's score, returning the updated scores.
    pub fn with(self, category: Category, score: f32) -> Self {
        let mut values = self.to_array();
        values[category.index()] = score;
        Self::from_array(values)
    }

    /// Iterates `(category, score)` pairs in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, f32)> + '_ {
        Category::ALL.iter().map(move |&c| (c, self.get(c)))
    }

    /// The highest-scoring category. Ties go to the earliest category in
    /// enumeration order; NaN scores never win.
    pub fn predicted_category(&self) -> Category {
        let mut best = Category::ALL[0];
        let mut best_score = self.get(best);
        for (category, score) in self.iter().skip(1) {
            if score > best_score || (best_score.is_nan() && !score.is_nan()) {
                best = category;
                best_score = score;
            }
        }
        best
    }
}
