//! Named, pre-loaded classifiers.
//!
//! The registry is built once at startup from a fixed catalog of model
//! identifiers and artifact filenames. Missing artifacts are skipped; a
//! present but unreadable artifact aborts loading. After construction the
//! registry is read-only and shared across requests.

use std::path::Path;

use hyperisk_core::{FeatureVector, Verdict};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::artifact::{self, ArtifactError};
use crate::classifier::Classifier;

/// Known models and their artifact filenames, in registration order.
pub const DEFAULT_CATALOG: &[(&str, &str)] = &[
    ("LOG", "modelo_hipertension_LOG.json"),
    ("RF", "modelo_hipertension_RF.json"),
    ("XGB", "modelo_hipertension_XGB.json"),
];

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model {0} not found")]
    UnknownModel(String),

    #[error("model {model} returned {value}, expected 0 or 1")]
    InvalidClassifierOutput { model: String, value: f64 },

    #[error("model {model} failed: {message}")]
    Inference { model: String, message: String },
}

/// Loaded classifiers keyed by identifier, kept in registration order.
#[derive(Default)]
pub struct ModelRegistry {
    models: Vec<(String, Box<dyn Classifier>)>,
}

impl ModelRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the [`DEFAULT_CATALOG`] from `dir`.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        Self::load_catalog(dir, DEFAULT_CATALOG)
    }

    /// Load every catalog entry whose artifact exists under `dir`.
    ///
    /// Entries with no file on disk are skipped without error.
    pub fn load_catalog(dir: &Path, catalog: &[(&str, &str)]) -> Result<Self, ArtifactError> {
        let mut registry = Self::new();

        for &(name, filename) in catalog {
            let path = dir.join(filename);
            if !path.exists() {
                debug!(model = name, path = %path.display(), "artifact missing, skipping");
                continue;
            }
            let classifier = artifact::load(&path)?;
            debug!(model = name, path = %path.display(), "loaded model");
            registry.register(name, classifier);
        }

        info!(
            count = registry.len(),
            dir = %dir.display(),
            models = ?registry.list_models(),
            "model registry loaded"
        );
        Ok(registry)
    }

    /// Add a classifier. Re-registering a name replaces the classifier in place.
    pub fn register(&mut self, name: impl Into<String>, classifier: Box<dyn Classifier>) {
        let name = name.into();
        match self.models.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = classifier,
            None => self.models.push((name, classifier)),
        }
    }

    /// Identifiers of all loaded models, in registration order.
    pub fn list_models(&self) -> Vec<String> {
        self.models.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Run the named classifier and map its raw label onto a [`Verdict`].
    pub fn predict(&self, name: &str, features: &FeatureVector) -> Result<Verdict, ModelError> {
        let classifier = self
            .get(name)
            .ok_or_else(|| ModelError::UnknownModel(name.to_string()))?;

        let raw = classifier
            .infer(features)
            .map_err(|e| ModelError::Inference {
                model: name.to_string(),
                message: e.to_string(),
            })?;

        Verdict::from_raw(raw).ok_or_else(|| {
            error!(model = name, value = raw, "classifier returned a label outside {{0, 1}}");
            ModelError::InvalidClassifierOutput {
                model: name.to_string(),
                value: raw,
            }
        })
    }

    fn get(&self, name: &str) -> Option<&dyn Classifier> {
        self.models
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_ref())
    }
}
