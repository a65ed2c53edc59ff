//! Loading serialized classifiers from disk.
//!
//! The file extension selects the format:
//! - `.json`: a [`JsonModel`] wrapped in an artifact envelope carrying the
//!   feature names the model was trained on.
//! - `.onnx`: a converted classifier run through ONNX Runtime (requires the
//!   `onnx` feature).

use std::path::{Path, PathBuf};

use hyperisk_core::FEATURE_COLUMNS;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::classifier::{Classifier, JsonModel};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("artifact {path} was trained on columns {found:?}, expected {expected:?}")]
    FeatureMismatch {
        path: PathBuf,
        found: Vec<String>,
        expected: Vec<String>,
    },

    #[error("artifact {path} is invalid: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("unsupported artifact format: {0}")]
    UnsupportedFormat(PathBuf),

    #[cfg(feature = "onnx")]
    #[error("onnx runtime error: {0}")]
    Onnx(#[from] ort::Error),
}

/// On-disk envelope for JSON models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonArtifact {
    /// Column names seen at training time. Checked against [`FEATURE_COLUMNS`] when present.
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
    pub model: JsonModel,
}

/// Load a classifier artifact, dispatching on file extension.
pub fn load(path: &Path) -> Result<Box<dyn Classifier>, ArtifactError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Box::new(load_json(path)?)),
        #[cfg(feature = "onnx")]
        Some("onnx") => Ok(Box::new(crate::onnx::OnnxClassifier::load(path)?)),
        _ => Err(ArtifactError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load and validate a JSON model artifact.
pub fn load_json(path: &Path) -> Result<JsonModel, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let artifact: JsonArtifact =
        serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if let Some(found) = &artifact.feature_names
        && !found.iter().map(String::as_str).eq(FEATURE_COLUMNS)
    {
        return Err(ArtifactError::FeatureMismatch {
            path: path.to_path_buf(),
            found: found.clone(),
            expected: FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect(),
        });
    }

    artifact
        .model
        .validate()
        .map_err(|reason| ArtifactError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;

    debug!(path = %path.display(), "parsed json model artifact");
    Ok(artifact.model)
}
