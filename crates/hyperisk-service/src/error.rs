use std::time::Duration;

use hyperisk_ai::{ModelError, RecommendationUnavailable};
use hyperisk_core::PatientError;
use thiserror::Error;

/// Why an assessment failed. Any single model failure fails the whole assessment.
#[derive(Debug, Error)]
pub enum AssessError {
    #[error(transparent)]
    InvalidMeasurement(#[from] PatientError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("model {model}: {source}")]
    RecommendationUnavailable {
        model: String,
        #[source]
        source: RecommendationUnavailable,
    },

    #[error("recommendation for model {model} timed out after {after:?}")]
    RecommendationTimeout { model: String, after: Duration },

    #[error("assessment exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),

    #[error("prediction worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl AssessError {
    /// Caller-side input problem rather than a server fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidMeasurement(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::RecommendationTimeout { .. } | Self::DeadlineExceeded(_)
        )
    }
}
