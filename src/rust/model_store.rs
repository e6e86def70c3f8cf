use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::Classifier;

/// Format tag written into every model artifact.
pub const MODEL_FORMAT: &str = "lyricist-model";
/// Current artifact layout version.
pub const MODEL_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Model not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
}

#[derive(Serialize, Deserialize)]
struct ModelEnvelope {
    format: String,
    version: u32,
    sha256: String,
    classifier: Classifier,
}

fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Writes `classifier` to `path`, creating missing parent directories.
///
/// The artifact is written to a sibling temporary file and renamed into
/// place, so a failed save never leaves a truncated model behind.
pub fn save_model<P: AsRef<Path>>(classifier: &Classifier, path: P) -> Result<(), StorageError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let payload = serde_json::to_vec(classifier)?;
    let envelope = ModelEnvelope {
        format: MODEL_FORMAT.to_string(),
        version: MODEL_VERSION,
        sha256: digest(&payload),
        classifier: classifier.clone(),
    };
    let bytes = serde_json::to_vec(&envelope)?;

    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let written = (|| -> io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    log::info!("Saved model ({} bytes) to {:?}", bytes.len(), path);
    Ok(())
}

/// Reads a classifier written by [`save_model`], verifying its checksum.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Classifier, StorageError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(StorageError::NotFound(path.display().to_string()));
    }

    let bytes = fs::read(path)?;
    let envelope: ModelEnvelope = serde_json::from_slice(&bytes)?;
    if envelope.format != MODEL_FORMAT || envelope.version != MODEL_VERSION {
        return Err(StorageError::UnsupportedFormat(format!(
            "{} v{}",
            envelope.format, envelope.version
        )));
    }

    let actual = digest(&serde_json::to_vec(&envelope.classifier)?);
    if actual != envelope.sha256 {
        log::warn!("Checksum mismatch for model at {:?}", path);
        return Err(StorageError::HashMismatch {
            expected: envelope.sha256,
            actual,
        });
    }

    log::info!("Loaded model from {:?}", path);
    Ok(envelope.classifier)
}

/// Manages named model artifacts in one directory.
#[derive(Debug, Clone)]
pub struct ModelStore {
    models_dir: PathBuf,
}

impl ModelStore {
    /// Creates a new ModelStore with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::default_models_dir())
    }

    /// Returns the default models directory path
    pub fn default_models_dir() -> PathBuf {
        // Explicit override for the models only
        if let Ok(path) = env::var("LYRICIST_MODELS") {
            return PathBuf::from(path);
        }
        crate::config::default_base_dir().join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self { models_dir })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn model_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(format!("{}.json", name))
    }

    pub fn is_model_saved(&self, name: &str) -> bool {
        let path = self.model_path(name);
        log::debug!("Checking for model {:?} (exists: {})", path, path.exists());
        path.exists()
    }

    pub fn save(&self, name: &str, classifier: &Classifier) -> Result<PathBuf, StorageError> {
        let path = self.model_path(name);
        save_model(classifier, &path)?;
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<Classifier, StorageError> {
        load_model(self.model_path(name))
    }

    /// True when the named model exists and its checksum matches.
    pub fn verify_model(&self, name: &str) -> Result<bool, StorageError> {
        match self.load(name) {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(StorageError::HashMismatch { .. }) | Err(StorageError::SerializationError(_)) => {
                log::warn!("Model '{}' failed verification", name);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub fn remove_model(&self, name: &str) -> Result<(), StorageError> {
        let path = self.model_path(name);
        if path.exists() {
            log::info!("Removing model at {:?}", path);
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
