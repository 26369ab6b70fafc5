use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("Download of {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Where to fetch a model's files from, and optionally what they must hash to.
///
/// When a hash is `None` the file is accepted as downloaded without
/// verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSource {
    pub name: String,
    pub model_url: String,
    pub tokenizer_url: String,
    #[serde(default)]
    pub model_hash: Option<String>,
    #[serde(default)]
    pub tokenizer_hash: Option<String>,
}

impl ModelSource {
    pub fn new(name: impl Into<String>, model_url: impl Into<String>, tokenizer_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model_url: model_url.into(),
            tokenizer_url: tokenizer_url.into(),
            model_hash: None,
            tokenizer_hash: None,
        }
    }

    /// Pins both files to SHA-256 digests (lowercase hex)
    pub fn with_hashes(mut self, model_hash: impl Into<String>, tokenizer_hash: impl Into<String>) -> Self {
        self.model_hash = Some(model_hash.into());
        self.tokenizer_hash = Some(tokenizer_hash.into());
        self
    }
}

/// Local cache of downloaded model and tokenizer files, one directory per model name.
#[derive(Debug, Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        if let Ok(path) = env::var("NIASAFE_CACHE") {
            return PathBuf::from(path).join("models");
        }

        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("niasafe").join("models");
        }

        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("niasafe").join("models");
        }

        env::temp_dir().join("niasafe").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_dir(&self, name: &str) -> PathBuf {
        self.models_dir.join(name)
    }

    pub fn get_model_path(&self, name: &str) -> PathBuf {
        self.get_model_dir(name).join("model.onnx")
    }

    pub fn get_tokenizer_path(&self, name: &str) -> PathBuf {
        self.get_model_dir(name).join("tokenizer.json")
    }

    pub fn is_model_downloaded(&self, name: &str) -> bool {
        let model_path = self.get_model_path(name);
        let tokenizer_path = self.get_tokenizer_path(name);
        log::debug!("Model path: {:?} (exists: {})", model_path, model_path.exists());
        log::debug!("Tokenizer path: {:?} (exists: {})", tokenizer_path, tokenizer_path.exists());
        model_path.exists() && tokenizer_path.exists()
    }

    /// Downloads any missing or corrupt files for `source`.
    ///
    /// Both files are removed again if either one fails, so a model is never
    /// left half-installed.
    pub async fn download_model(&self, source: &ModelSource) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        let model_dir = self.get_model_dir(&source.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        let model_path = self.get_model_path(&source.name);
        let model_result = self
            .ensure_file(&source.model_url, &model_path, source.model_hash.as_deref(), "model")
            .await;

        let tokenizer_path = self.get_tokenizer_path(&source.name);
        let tokenizer_result = self
            .ensure_file(&source.tokenizer_url, &tokenizer_path, source.tokenizer_hash.as_deref(), "tokenizer")
            .await;

        match (model_result, tokenizer_result) {
            (Ok(()), Ok(())) => {
                log::info!("Model and tokenizer ready to use");
                Ok(())
            }
            (Err(e), _) => {
                log::error!("Failed to setup model file: {}", e);
                let _ = self.remove_download(&source.name);
                Err(e)
            }
            (_, Err(e)) => {
                log::error!("Failed to setup tokenizer file: {}", e);
                let _ = self.remove_download(&source.name);
                Err(e)
            }
        }
    }

    async fn ensure_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(), ModelError> {
        if path.exists() {
            log::info!("{} file exists at {:?}, verifying...", file_type, path);
            if self.verify_file(path, expected_hash)? {
                log::info!("Existing {} file verified successfully", file_type);
                return Ok(());
            }
            log::warn!("{} file verification failed, redownloading", file_type);
        }
        self.download_and_verify_file(url, path, expected_hash, file_type).await
    }

    fn verify_file(&self, path: &Path, expected_hash: Option<&str>) -> Result<bool, ModelError> {
        let Some(expected) = expected_hash else {
            return Ok(path.exists());
        };
        let bytes = fs::read(path)?;
        let hash = sha256_hex(&bytes);
        log::debug!("Calculated hash: {}", hash);
        log::debug!("Expected hash:   {}", expected);
        Ok(hash.eq_ignore_ascii_case(expected))
    }

    /// Checks that both files exist and match their pinned hashes
    pub fn verify_model(&self, source: &ModelSource) -> Result<bool, ModelError> {
        let model_path = self.get_model_path(&source.name);
        let tokenizer_path = self.get_tokenizer_path(&source.name);

        if !model_path.exists() || !tokenizer_path.exists() {
            log::info!("One or both files do not exist");
            return Ok(false);
        }

        let model_ok = self.verify_file(&model_path, source.model_hash.as_deref())?;
        let tokenizer_ok = self.verify_file(&tokenizer_path, source.tokenizer_hash.as_deref())?;

        log::info!("Model hash verification: {}", model_ok);
        log::info!("Tokenizer hash verification: {}", tokenizer_ok);

        Ok(model_ok && tokenizer_ok)
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let response = reqwest::get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ModelError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = expected_hash {
            let hash = sha256_hex(&bytes);
            if !hash.eq_ignore_ascii_case(expected) {
                log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, hash);
                return Err(ModelError::HashMismatch {
                    file_type: file_type.to_string(),
                    expected: expected.to_string(),
                    actual: hash,
                });
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        if !self.verify_file(path, expected_hash)? {
            return Err(ModelError::VerificationFailed);
        }

        log::info!("{} file downloaded and verified successfully", file_type);
        Ok(())
    }

    pub fn remove_download(&self, name: &str) -> Result<(), ModelError> {
        let model_path = self.get_model_path(name);
        let tokenizer_path = self.get_tokenizer_path(name);

        if model_path.exists() {
            fs::remove_file(&model_path)?;
        }
        if tokenizer_path.exists() {
            fs::remove_file(&tokenizer_path)?;
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, source: &ModelSource) -> Result<(), ModelError> {
        log::info!("Checking if model {} is downloaded...", source.name);
        if !self.is_model_downloaded(&source.name) {
            log::info!("Model not found, downloading...");
            self.download_model(source).await?;
        } else if !self.verify_model(source)? {
            log::info!("Model verification failed, re-downloading...");
            self.remove_download(&source.name)?;
            self.download_model(source).await?;
        } else {
            log::info!("Model verification successful");
        }
        Ok(())
    }
}
