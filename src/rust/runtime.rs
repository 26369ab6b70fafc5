use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::scorer::ScoringError;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// ONNX Runtime session tuning.
///
/// Zero thread counts let the runtime decide. `optimization_level` 0 disables
/// graph optimization, and values above 3 behave as 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: u8,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0,
            intra_threads: 0,
            optimization_level: 3,
        }
    }
}

impl RuntimeConfig {
    pub fn graph_optimization_level(&self) -> GraphOptimizationLevel {
        match self.optimization_level {
            0 => GraphOptimizationLevel::Disable,
            1 => GraphOptimizationLevel::Level1,
            2 => GraphOptimizationLevel::Level2,
            _ => GraphOptimizationLevel::Level3,
        }
    }
}

/// Commits the ONNX Runtime environment once per process.
pub fn ensure_initialized() -> Result<(), ScoringError> {
    INIT.get_or_init(|| {
        ort::init()
            .with_name("niasafe")
            .commit()
            .map(|_| ())
            .map_err(|e| e.to_string())
    })
    .clone()
    .map_err(|e| ScoringError::ModelError(format!("Failed to initialize ONNX Runtime environment: {}", e)))
}

pub fn create_session_builder(config: &RuntimeConfig) -> Result<SessionBuilder, ScoringError> {
    ensure_initialized()?;
    let mut builder = Session::builder()?;

    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }

    Ok(builder.with_optimization_level(config.graph_optimization_level())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_initialization() {
        assert!(ensure_initialized().is_ok());
        assert!(ensure_initialized().is_ok());
    }

    #[test]
    fn test_session_builder_config() {
        let config = RuntimeConfig { inter_threads: 2, intra_threads: 2, optimization_level: 1 };
        assert!(matches!(config.graph_optimization_level(), GraphOptimizationLevel::Level1));
        assert!(create_session_builder(&config).is_ok());
    }

    #[test]
    fn test_optimization_level_mapping() {
        let level = |n| RuntimeConfig { optimization_level: n, ..Default::default() }.graph_optimization_level();
        assert!(matches!(level(0), GraphOptimizationLevel::Disable));
        assert!(matches!(level(2), GraphOptimizationLevel::Level2));
        assert!(matches!(level(9), GraphOptimizationLevel::Level3));
    }
}
