//! Patient measurements and the feature vector the classifiers were trained on.
//!
//! The classifiers consume five columns in a fixed order. Column names and
//! order are an external contract with the training pipeline and must match
//! [`FEATURE_COLUMNS`] exactly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trained column order: BMI, total activity, arterial tension, mean weight, age.
pub const FEATURE_COLUMNS: [&str; 5] = [
    "IMC_calculado",
    "actividad_total",
    "tension_arterial",
    "peso_promedio",
    "edad",
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatientError {
    #[error("invalid measurement: {field} = {value}")]
    InvalidMeasurement { field: &'static str, value: f64 },
}

/// Raw patient measurements as received from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientInput {
    /// Body weight in kilograms.
    pub weight: f64,
    /// Height in metres.
    pub height: f64,
    pub total_activity: f64,
    pub arterial_tension: f64,
    /// Age in whole years.
    pub age: u32,
}

impl PatientInput {
    pub fn new(
        weight: f64,
        height: f64,
        total_activity: f64,
        arterial_tension: f64,
        age: u32,
    ) -> Self {
        Self {
            weight,
            height,
            total_activity,
            arterial_tension,
            age,
        }
    }

    /// Body-mass index: weight / height².
    ///
    /// Fails with [`PatientError::InvalidMeasurement`] when height or weight
    /// is zero, negative, or not finite, or when the quotient overflows.
    pub fn bmi(&self) -> Result<f64, PatientError> {
        ensure_positive("height", self.height)?;
        ensure_positive("weight", self.weight)?;
        let bmi = self.weight / (self.height * self.height);
        ensure_finite("bmi", bmi)?;
        Ok(bmi)
    }
}

fn ensure_finite(field: &'static str, value: f64) -> Result<(), PatientError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PatientError::InvalidMeasurement { field, value })
    }
}

fn ensure_positive(field: &'static str, value: f64) -> Result<(), PatientError> {
    ensure_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(PatientError::InvalidMeasurement { field, value })
    }
}

/// Numeric input to a classifier, laid out in [`FEATURE_COLUMNS`] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub bmi: f64,
    pub total_activity: f64,
    pub arterial_tension: f64,
    pub mean_weight: f64,
    pub age: f64,
}

impl FeatureVector {
    /// Number of features each classifier expects.
    pub const LEN: usize = FEATURE_COLUMNS.len();

    /// Values in trained column order.
    pub fn to_array(&self) -> [f64; Self::LEN] {
        [
            self.bmi,
            self.total_activity,
            self.arterial_tension,
            self.mean_weight,
            self.age,
        ]
    }
}

/// Derive the classifier feature vector from raw measurements.
///
/// Every feature must be finite; NaN or infinite inputs never reach a model.
pub fn derive_features(patient: &PatientInput) -> Result<FeatureVector, PatientError> {
    ensure_finite("total_activity", patient.total_activity)?;
    ensure_finite("arterial_tension", patient.arterial_tension)?;
    Ok(FeatureVector {
        bmi: patient.bmi()?,
        total_activity: patient.total_activity,
        arterial_tension: patient.arterial_tension,
        mean_weight: patient.weight,
        age: f64::from(patient.age),
    })
}
