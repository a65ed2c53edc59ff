//! Inference layer: pre-trained hypertension classifiers and LLM recommendations.

pub mod artifact;
pub mod classifier;
pub mod recommend;
pub mod registry;

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "openai")]
pub use openai::{OpenAiConfig, OpenAiRecommender};

pub use artifact::ArtifactError;
pub use classifier::{Classifier, InferenceError};
pub use recommend::{RecommendationGenerator, RecommendationUnavailable};
pub use registry::{DEFAULT_CATALOG, ModelError, ModelRegistry};
