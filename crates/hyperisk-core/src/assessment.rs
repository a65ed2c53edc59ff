//! Verdicts and the per-request assessment assembled from them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::PatientInput;

/// Binary hypertension-risk verdict of a single classifier.
///
/// Serialized with its localized form: `"Sí"` for [`Positive`](Self::Positive),
/// `"No"` for [`Negative`](Self::Negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "Sí")]
    Positive,
    #[serde(rename = "No")]
    Negative,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "Sí",
            Self::Negative => "No",
        }
    }

    /// Map a raw classifier label onto a verdict. Only `1` and `0` are valid.
    pub fn from_raw(raw: f64) -> Option<Self> {
        if raw == 1.0 {
            Some(Self::Positive)
        } else if raw == 0.0 {
            Some(Self::Negative)
        } else {
            None
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict and recommendation produced by one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub model: String,
    pub verdict: Verdict,
    pub recommendation: String,
}

/// All model results for one patient, in model registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub patient: PatientInput,
    pub results: Vec<PredictionResult>,
}

impl Assessment {
    /// Number of models that flagged the patient as at risk.
    pub fn positive_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.verdict == Verdict::Positive)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_labels_map_to_verdicts() {
        assert_eq!(Verdict::from_raw(1.0), Some(Verdict::Positive));
        assert_eq!(Verdict::from_raw(0.0), Some(Verdict::Negative));
        assert_eq!(Verdict::from_raw(2.0), None);
        assert_eq!(Verdict::from_raw(0.5), None);
        assert_eq!(Verdict::from_raw(-1.0), None);
        assert_eq!(Verdict::from_raw(f64::NAN), None);
    }

    #[test]
    fn verdict_renders_localized() {
        assert_eq!(Verdict::Positive.to_string(), "Sí");
        assert_eq!(Verdict::Negative.to_string(), "No");
        assert_eq!(serde_json::to_string(&Verdict::Positive).unwrap(), "\"Sí\"");
        let parsed: Verdict = serde_json::from_str("\"No\"").unwrap();
        assert_eq!(parsed, Verdict::Negative);
    }

    #[test]
    fn positive_count_ignores_negatives() {
        let result = |model: &str, verdict| PredictionResult {
            model: model.into(),
            verdict,
            recommendation: String::new(),
        };
        let assessment = Assessment {
            patient: PatientInput::new(70.0, 1.75, 150.0, 120.0, 30),
            results: vec![
                result("LOG", Verdict::Positive),
                result("RF", Verdict::Negative),
                result("XGB", Verdict::Positive),
            ],
        };
        assert_eq!(assessment.positive_count(), 2);
    }
}
