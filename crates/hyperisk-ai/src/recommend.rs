//! Natural-language recommendations keyed on a verdict.

use async_trait::async_trait;
use hyperisk_core::Verdict;
use thiserror::Error;

/// System role for the text-generation call.
pub const SYSTEM_PROMPT: &str = "Eres un asistente médico experto en hipertensión.";

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The one failure a recommendation generator reports, whatever went wrong
/// underneath (network, auth, rate limiting, malformed response).
#[derive(Debug, Error)]
#[error("recommendation unavailable: {reason}")]
pub struct RecommendationUnavailable {
    pub reason: String,
    #[source]
    pub source: Option<BoxError>,
}

impl RecommendationUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            source: None,
        }
    }

    pub fn with_source(reason: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            reason: reason.into(),
            source: Some(source.into()),
        }
    }
}

/// Produces a human-readable recommendation for a verdict.
///
/// Implementations do not cache: every call is a fresh generation.
#[async_trait]
pub trait RecommendationGenerator: Send + Sync {
    async fn generate(&self, verdict: Verdict) -> Result<String, RecommendationUnavailable>;
}

/// User prompt embedding the localized verdict.
pub fn build_user_prompt(verdict: Verdict) -> String {
    format!(
        "En base a la siguiente predicción sobre el riesgo de hipertensión: '{}', \
         ¿qué me podrías recomendar? Por favor responde en un párrafo breve y completo.",
        verdict.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn prompt_embeds_localized_verdict() {
        let prompt = build_user_prompt(Verdict::Positive);
        assert!(prompt.contains("hipertensión: 'Sí',"), "{prompt}");
        assert!(prompt.ends_with("párrafo breve y completo."));

        let prompt = build_user_prompt(Verdict::Negative);
        assert!(prompt.contains("'No'"), "{prompt}");
    }

    #[test]
    fn unavailable_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = RecommendationUnavailable::with_source("connect failed", io);
        assert_eq!(err.to_string(), "recommendation unavailable: connect failed");
        assert!(err.source().is_some());

        assert!(RecommendationUnavailable::new("no key").source().is_none());
    }
}
