//! Service configuration.
//!
//! Layered as built-in defaults, then an optional TOML file, then
//! `NIASAFE__SECTION__KEY` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::alerts::{AlertThresholds, LogNotifier, Notifier, NotifyError, WebhookNotifier};
use crate::model_manager::ModelSource;
use crate::runtime::RuntimeConfig;
use crate::scorer::DEFAULT_MAX_SEQUENCE_LENGTH;
use crate::store::{CommentStore, InMemoryCommentStore, SqliteCommentStore, StoreResult};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            max_body_size: default_max_body_size(),
        }
    }
}

/// Where the toxicity model comes from.
///
/// When `source` is set the files are fetched into the model cache and loaded
/// from there; otherwise `dir` must already hold `model.onnx` and
/// `tokenizer.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub source: Option<ModelSource>,
    #[serde(default = "default_max_sequence_length")]
    pub max_sequence_length: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: default_model_dir(),
            source: None,
            max_sequence_length: default_max_sequence_length(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Records live only as long as the process
    #[default]
    Memory,
    /// Records persist in a SQLite database file
    Sqlite { path: PathBuf },
}

impl StoreConfig {
    pub fn open(&self) -> StoreResult<Arc<dyn CommentStore>> {
        Ok(match self {
            StoreConfig::Memory => Arc::new(InMemoryCommentStore::new()),
            StoreConfig::Sqlite { path } => Arc::new(SqliteCommentStore::open(path)?),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default)]
    pub thresholds: AlertThresholds,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotifierConfig {
    #[default]
    Log,
    Webhook {
        url: String,
        #[serde(default = "default_webhook_timeout")]
        timeout_secs: u64,
    },
}

impl NotifierConfig {
    pub fn build(&self) -> Result<Arc<dyn Notifier>, NotifyError> {
        Ok(match self {
            NotifierConfig::Log => Arc::new(LogNotifier),
            NotifierConfig::Webhook { url, timeout_secs } => {
                Arc::new(WebhookNotifier::new(url.clone(), Duration::from_secs(*timeout_secs))?)
            }
        })
    }
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("models")
}

fn default_max_sequence_length() -> usize {
    DEFAULT_MAX_SEQUENCE_LENGTH
}

fn default_webhook_timeout() -> u64 {
    5
}

impl AppConfig {
    /// Load configuration from defaults, an optional file, and the environment
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("NIASAFE")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.model.max_sequence_length == 0 {
            return Err(config::ConfigError::Message(
                "model.max_sequence_length must be positive".into(),
            ));
        }
        if self.server.max_body_size == 0 {
            return Err(config::ConfigError::Message(
                "server.max_body_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::Category;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.listen_addr.port(), 5000);
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.notifier, NotifierConfig::Log);
        assert_eq!(config.alerts.thresholds, AlertThresholds::default());
        assert_eq!(config.model.max_sequence_length, 512);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
listen_addr = "0.0.0.0:8080"

[store]
type = "sqlite"
path = "/var/lib/niasafe/comments.db"

[notifier]
type = "webhook"
url = "http://alerts.internal/hook"

[runtime]
intra_threads = 4

[[alerts.thresholds]]
category = "threat"
threshold = 0.9

[[alerts.thresholds]]
category = "identity_hate"
threshold = 0.6
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.server.listen_addr.port(), 8080);
        assert_eq!(
            config.store,
            StoreConfig::Sqlite { path: PathBuf::from("/var/lib/niasafe/comments.db") }
        );
        assert!(matches!(config.notifier, NotifierConfig::Webhook { timeout_secs: 5, .. }));
        assert_eq!(config.runtime.intra_threads, 4);
        assert_eq!(config.runtime.optimization_level, 3);

        let thresholds = config.alerts.thresholds.entries();
        assert_eq!(thresholds.len(), 2);
        assert_eq!(thresholds[1].category, Category::IdentityHate);
        assert!((thresholds[0].threshold - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(AppConfig::load(Some("/nonexistent/niasafe.toml")).is_err());
    }

    #[test]
    fn test_store_config_opens_memory_store() {
        assert!(StoreConfig::Memory.open().is_ok());
    }
}
