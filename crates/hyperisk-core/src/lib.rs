//! Core types for hypertension risk assessment: patient input, derived features, verdicts.

pub mod assessment;
pub mod patient;
pub mod schema;

pub use assessment::{Assessment, PredictionResult, Verdict};
pub use patient::{FEATURE_COLUMNS, FeatureVector, PatientError, PatientInput, derive_features};
pub use schema::{feature_schema, features_to_batch};
