use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ort::session::Session;
use sha2::{Digest, Sha256};

use crate::classifier::{ModelLoader, OnnxModel, ProbabilityModel};
use crate::imaging::INPUT_SHAPE;
use crate::runtime::{create_session_builder, RuntimeConfig};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Hash mismatch for {path}: expected {expected}, got {actual}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
    #[error("ONNX Runtime environment error: {0}")]
    Environment(String),
    #[error("ONNX Runtime error: {0}")]
    Runtime(#[from] ort::Error),
    #[error("Unexpected model signature: {0}")]
    InvalidSignature(String),
    #[error("Model load task failed: {0}")]
    TaskFailed(String),
}

/// Locates, verifies and loads the X-ray model artifact.
#[derive(Debug, Clone)]
pub struct ModelManager {
    model_path: PathBuf,
    expected_hash: Option<String>,
    runtime_config: RuntimeConfig,
}

impl ModelManager {
    /// Relative path the service looks at when nothing else is configured
    pub const DEFAULT_MODEL_PATH: &'static str = "model4.onnx";

    pub fn new<P: AsRef<Path>>(model_path: P) -> Self {
        Self {
            model_path: model_path.as_ref().to_path_buf(),
            expected_hash: None,
            runtime_config: RuntimeConfig::default(),
        }
    }

    pub fn new_default() -> Self {
        Self::new(Self::DEFAULT_MODEL_PATH)
    }

    /// Requires the artifact's SHA-256 to match `hash` (hex, case-insensitive) before loading.
    pub fn with_expected_hash(mut self, hash: impl Into<String>) -> Self {
        self.expected_hash = Some(hash.into().trim().to_ascii_lowercase());
        self
    }

    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn is_model_present(&self) -> bool {
        let exists = self.model_path.is_file();
        log::debug!("Model path: {:?} (exists: {})", self.model_path, exists);
        exists
    }

    fn hash_file(path: &Path) -> Result<String, ModelError> {
        let bytes = fs::read(path)?;
        log::debug!("Read {} bytes from {:?}", bytes.len(), path);
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Compares the artifact's SHA-256 with the configured one. Passes when no
    /// hash is configured.
    fn check_hash(&self) -> Result<(), ModelError> {
        let Some(expected) = &self.expected_hash else {
            return Ok(());
        };

        let actual = Self::hash_file(&self.model_path)?;
        log::debug!("Calculated hash: {}", actual);
        if &actual != expected {
            log::error!("Model hash mismatch: expected {}, got {}", expected, actual);
            return Err(ModelError::HashMismatch {
                path: self.model_path.clone(),
                expected: expected.clone(),
                actual,
            });
        }

        log::info!("Model file verified successfully");
        Ok(())
    }

    /// Returns `false` when the artifact is missing or its hash differs from the
    /// configured one. Without a configured hash a present file always verifies.
    pub fn verify_model(&self) -> Result<bool, ModelError> {
        if !self.is_model_present() {
            return Ok(false);
        }
        match self.check_hash() {
            Ok(()) => Ok(true),
            Err(ModelError::HashMismatch { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Opens an ONNX Runtime session for the artifact after the presence and
    /// hash checks, and validates its input/output signature.
    pub fn load_session(&self) -> Result<Session, ModelError> {
        if !self.is_model_present() {
            return Err(ModelError::NotFound(self.model_path.clone()));
        }
        self.check_hash()?;

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(&self.model_path)?;

        Self::validate_signature(&session)?;
        log::info!("Model structure validated successfully");

        Ok(session)
    }

    /// The model must take a single NHWC image batch and produce at least one output.
    /// Dynamic dimensions (reported as -1) are accepted.
    fn validate_signature(session: &Session) -> Result<(), ModelError> {
        if session.inputs.len() != 1 {
            return Err(ModelError::InvalidSignature(format!(
                "expected exactly 1 input, found {}",
                session.inputs.len()
            )));
        }
        if session.outputs.is_empty() {
            return Err(ModelError::InvalidSignature("model has no outputs".to_string()));
        }

        let input = &session.inputs[0];
        if let Some(dims) = input.input_type.tensor_dimensions() {
            let fits = dims.len() == INPUT_SHAPE.len()
                && dims
                    .iter()
                    .zip(INPUT_SHAPE.iter())
                    .skip(1)
                    .all(|(&actual, &expected)| actual < 0 || actual as usize == expected);
            if !fits {
                return Err(ModelError::InvalidSignature(format!(
                    "input '{}' has shape {:?}, expected {:?}",
                    input.name, dims, INPUT_SHAPE
                )));
            }
        }

        Ok(())
    }
}

impl Default for ModelManager {
    fn default() -> Self {
        Self::new_default()
    }
}

impl ModelLoader for ModelManager {
    fn load(&self) -> Result<Arc<dyn ProbabilityModel>, ModelError> {
        log::info!("Loading model from {:?}", self.model_path);
        let session = self.load_session()?;
        Ok(Arc::new(OnnxModel::new(session)?))
    }
}
