//! ONNX Runtime backend for converted tabular classifiers.
//!
//! Expects the layout produced by scikit-learn/XGBoost converters: a single
//! float32 input of shape `[N, 5]` and the predicted label (int64) as the
//! first output. The probability output, if present, is ignored.

use std::path::Path;
use std::sync::Mutex;

use hyperisk_core::FeatureVector;
use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::classifier::{Classifier, InferenceError};

/// A classifier backed by an ONNX Runtime session.
pub struct OnnxClassifier {
    // `Session::run` needs `&mut self`; predictions for concurrent requests serialize here.
    session: Mutex<Session>,
}

impl OnnxClassifier {
    /// Load a converted classifier from an `.onnx` file.
    pub fn load(path: &Path) -> Result<Self, ort::Error> {
        let session = Session::builder()?.commit_from_file(path)?;
        info!(model = %path.display(), "loaded onnx classifier");
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl Classifier for OnnxClassifier {
    fn infer(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
        let row: Vec<f32> = features.to_array().iter().map(|&v| v as f32).collect();
        let shape = [1i64, FeatureVector::LEN as i64];
        let input = Tensor::from_array((shape, row.into_boxed_slice()))
            .map_err(|e| InferenceError(format!("build input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError("onnx session lock poisoned".into()))?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| InferenceError(format!("run session: {e}")))?;

        let (_, labels) = outputs[0]
            .try_extract_tensor::<i64>()
            .map_err(|e| InferenceError(format!("extract label tensor: {e}")))?;
        let label = labels
            .first()
            .ok_or_else(|| InferenceError("empty label tensor".into()))?;
        Ok(*label as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn load_missing_model_fails() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("no-such-model.onnx");
        assert!(OnnxClassifier::load(&path).is_err());
    }
}
