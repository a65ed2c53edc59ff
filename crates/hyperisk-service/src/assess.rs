//! Prediction orchestration.
//!
//! One assessment is a single fan-out/fan-in pass:
//!
//! 1. Derive the feature vector once; every model reads the same copy.
//! 2. Snapshot the registry's model list.
//! 3. Per model, concurrently: classify on the blocking pool, then generate
//!    a recommendation for that verdict.
//! 4. Join in model order. The first failure aborts the assessment and drops
//!    the units still in flight.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::try_join_all;
use hyperisk_ai::{ModelRegistry, RecommendationGenerator};
use hyperisk_core::{Assessment, FeatureVector, PatientInput, PredictionResult, derive_features};
use tracing::{info, warn};

use crate::AssessError;

/// Time limits applied to an assessment. `None` disables a limit.
#[derive(Debug, Clone, Copy)]
pub struct AssessLimits {
    /// Upper bound on each recommendation call.
    pub recommendation_timeout: Option<Duration>,
    /// Upper bound on the whole assessment.
    pub deadline: Option<Duration>,
}

impl Default for AssessLimits {
    fn default() -> Self {
        Self {
            recommendation_timeout: Some(Duration::from_secs(30)),
            deadline: Some(Duration::from_secs(60)),
        }
    }
}

/// Runs every registered model against a patient and pairs each verdict
/// with a generated recommendation.
pub struct Assessor {
    registry: Arc<ModelRegistry>,
    recommender: Arc<dyn RecommendationGenerator>,
    limits: AssessLimits,
}

impl Assessor {
    pub fn new(registry: Arc<ModelRegistry>, recommender: Arc<dyn RecommendationGenerator>) -> Self {
        Self {
            registry,
            recommender,
            limits: AssessLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: AssessLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Assess one patient against every registered model.
    ///
    /// Results follow registry order regardless of which unit finishes first.
    /// An empty registry yields an assessment with no results.
    pub async fn assess(&self, patient: PatientInput) -> Result<Assessment, AssessError> {
        let start = Instant::now();
        let features = derive_features(&patient)?;
        let models = self.registry.list_models();
        let model_count = models.len();

        let units = try_join_all(
            models
                .into_iter()
                .map(|model| self.assess_with_model(model, features)),
        );

        let outcome = match self.limits.deadline {
            Some(deadline) => tokio::time::timeout(deadline, units)
                .await
                .unwrap_or(Err(AssessError::DeadlineExceeded(deadline))),
            None => units.await,
        };

        match outcome {
            Ok(results) => {
                info!(
                    models = model_count,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "assessment complete"
                );
                Ok(Assessment { patient, results })
            }
            Err(e) => {
                warn!(error = %e, models = model_count, "assessment failed");
                Err(e)
            }
        }
    }

    /// One unit of work: classify, then recommend for that verdict.
    async fn assess_with_model(
        &self,
        model: String,
        features: FeatureVector,
    ) -> Result<PredictionResult, AssessError> {
        let registry = Arc::clone(&self.registry);
        let name = model.clone();
        let verdict =
            tokio::task::spawn_blocking(move || registry.predict(&name, &features)).await??;

        let generation = self.recommender.generate(verdict);
        let recommendation = match self.limits.recommendation_timeout {
            Some(after) => tokio::time::timeout(after, generation)
                .await
                .map_err(|_| AssessError::RecommendationTimeout {
                    model: model.clone(),
                    after,
                })?,
            None => generation.await,
        }
        .map_err(|source| AssessError::RecommendationUnavailable {
            model: model.clone(),
            source,
        })?;

        Ok(PredictionResult {
            model,
            verdict,
            recommendation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hyperisk_ai::{Classifier, InferenceError, ModelError, RecommendationUnavailable};
    use hyperisk_core::{PatientError, Verdict};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Always returns the same raw label.
    struct Fixed(f64);

    impl Classifier for Fixed {
        fn infer(&self, _: &FeatureVector) -> Result<f64, InferenceError> {
            Ok(self.0)
        }
    }

    /// Positive when BMI is above 30.
    struct Obese;

    impl Classifier for Obese {
        fn infer(&self, features: &FeatureVector) -> Result<f64, InferenceError> {
            Ok(if features.bmi > 30.0 { 1.0 } else { 0.0 })
        }
    }

    struct Panics;

    impl Classifier for Panics {
        fn infer(&self, _: &FeatureVector) -> Result<f64, InferenceError> {
            panic!("corrupt model state");
        }
    }

    /// Echoes the verdict, optionally delaying positives, and records completion order.
    #[derive(Default)]
    struct Echo {
        positive_delay: Duration,
        fail_on: Option<Verdict>,
        calls: AtomicUsize,
        completed: Mutex<Vec<Verdict>>,
    }

    #[async_trait]
    impl RecommendationGenerator for Echo {
        async fn generate(&self, verdict: Verdict) -> Result<String, RecommendationUnavailable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if verdict == Verdict::Positive {
                tokio::time::sleep(self.positive_delay).await;
            }
            if self.fail_on == Some(verdict) {
                return Err(RecommendationUnavailable::new("rate limited"));
            }
            self.completed.lock().unwrap().push(verdict);
            Ok(format!("recomendación para {verdict}"))
        }
    }

    fn clf(c: impl Classifier + 'static) -> Box<dyn Classifier> {
        Box::new(c)
    }

    fn registry(models: Vec<(&str, Box<dyn Classifier>)>) -> Arc<ModelRegistry> {
        let mut registry = ModelRegistry::new();
        for (name, classifier) in models {
            registry.register(name, classifier);
        }
        Arc::new(registry)
    }

    fn three_models() -> Arc<ModelRegistry> {
        registry(vec![
            ("LOG", clf(Fixed(1.0))),
            ("RF", clf(Fixed(0.0))),
            ("XGB", clf(Fixed(1.0))),
        ])
    }

    fn patient() -> PatientInput {
        PatientInput::new(70.0, 1.75, 150.0, 120.0, 30)
    }

    #[tokio::test]
    async fn one_result_per_model() {
        let echo = Arc::new(Echo::default());
        let assessor = Assessor::new(three_models(), echo.clone());

        let assessment = assessor.assess(patient()).await.unwrap();

        assert_eq!(assessment.patient, patient());
        assert_eq!(assessment.results.len(), 3);
        assert_eq!(echo.calls.load(Ordering::SeqCst), 3);

        let first = &assessment.results[0];
        assert_eq!(first.model, "LOG");
        assert_eq!(first.verdict, Verdict::Positive);
        assert_eq!(first.recommendation, "recomendación para Sí");
        assert_eq!(assessment.results[1].verdict, Verdict::Negative);
        assert_eq!(assessment.results[1].recommendation, "recomendación para No");
    }

    #[tokio::test]
    async fn results_follow_registry_order_not_completion_order() {
        // LOG is positive and its recommendation is slow, so RF finishes first.
        let echo = Arc::new(Echo {
            positive_delay: Duration::from_millis(100),
            ..Default::default()
        });
        let assessor = Assessor::new(three_models(), echo.clone());

        let assessment = assessor.assess(patient()).await.unwrap();

        assert_eq!(echo.completed.lock().unwrap()[0], Verdict::Negative);
        let order: Vec<&str> = assessment.results.iter().map(|r| r.model.as_str()).collect();
        assert_eq!(order, ["LOG", "RF", "XGB"]);
    }

    #[tokio::test]
    async fn units_run_concurrently() {
        let echo = Arc::new(Echo {
            positive_delay: Duration::from_millis(200),
            ..Default::default()
        });
        let models = registry(vec![
            ("A", clf(Fixed(1.0))),
            ("B", clf(Fixed(1.0))),
            ("C", clf(Fixed(1.0))),
        ]);
        let assessor = Assessor::new(models, echo);

        let start = Instant::now();
        assessor.assess(patient()).await.unwrap();
        // Sequential execution would take at least 600ms.
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn empty_registry_is_empty_assessment() {
        let echo = Arc::new(Echo::default());
        let assessor = Assessor::new(Arc::new(ModelRegistry::new()), echo.clone());

        let assessment = assessor.assess(patient()).await.unwrap();
        assert!(assessment.results.is_empty());
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn one_failed_recommendation_fails_everything() {
        // RF is the only negative; its recommendation fails.
        let echo = Arc::new(Echo {
            fail_on: Some(Verdict::Negative),
            ..Default::default()
        });
        let assessor = Assessor::new(three_models(), echo);

        let err = assessor.assess(patient()).await.unwrap_err();
        assert!(
            matches!(err, AssessError::RecommendationUnavailable { ref model, .. } if model == "RF"),
            "{err}"
        );
    }

    #[tokio::test]
    async fn invalid_classifier_output_fails_everything() {
        let models = registry(vec![
            ("LOG", clf(Fixed(1.0))),
            ("BROKEN", clf(Fixed(3.0))),
        ]);
        let assessor = Assessor::new(models, Arc::new(Echo::default()));

        let err = assessor.assess(patient()).await.unwrap_err();
        assert!(matches!(
            err,
            AssessError::Model(ModelError::InvalidClassifierOutput { .. })
        ));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn panicking_classifier_is_worker_failure() {
        let models = registry(vec![("LOG", clf(Fixed(1.0))), ("BROKEN", clf(Panics))]);
        let assessor = Assessor::new(models, Arc::new(Echo::default()));

        let err = assessor.assess(patient()).await.unwrap_err();
        assert!(matches!(err, AssessError::Worker(_)), "{err}");
        assert!(!err.is_client_error());
        assert!(!err.is_timeout());
    }

    #[tokio::test]
    async fn classifier_error_fails_everything() {
        struct Fails;

        impl Classifier for Fails {
            fn infer(&self, _: &FeatureVector) -> Result<f64, InferenceError> {
                Err(InferenceError("session closed".into()))
            }
        }

        let models = registry(vec![("LOG", clf(Fixed(1.0))), ("ONNX", clf(Fails))]);
        let assessor = Assessor::new(models, Arc::new(Echo::default()));

        let err = assessor.assess(patient()).await.unwrap_err();
        assert!(matches!(
            err,
            AssessError::Model(ModelError::Inference { ref model, .. }) if model == "ONNX"
        ));
    }

    #[tokio::test]
    async fn zero_height_is_rejected_before_any_model_runs() {
        let echo = Arc::new(Echo::default());
        let assessor = Assessor::new(three_models(), echo.clone());

        let err = assessor
            .assess(PatientInput::new(70.0, 0.0, 150.0, 120.0, 30))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AssessError::InvalidMeasurement(PatientError::InvalidMeasurement { field: "height", .. })
        ));
        assert!(err.is_client_error());
        assert_eq!(echo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn slow_recommendation_times_out() {
        let echo = Arc::new(Echo {
            positive_delay: Duration::from_secs(5),
            ..Default::default()
        });
        let assessor = Assessor::new(three_models(), echo).with_limits(AssessLimits {
            recommendation_timeout: Some(Duration::from_millis(50)),
            deadline: None,
        });

        let err = assessor.assess(patient()).await.unwrap_err();
        assert!(matches!(err, AssessError::RecommendationTimeout { .. }), "{err}");
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn deadline_bounds_whole_assessment() {
        let echo = Arc::new(Echo {
            positive_delay: Duration::from_secs(5),
            ..Default::default()
        });
        let assessor = Assessor::new(three_models(), echo).with_limits(AssessLimits {
            recommendation_timeout: None,
            deadline: Some(Duration::from_millis(50)),
        });

        let err = assessor.assess(patient()).await.unwrap_err();
        assert!(matches!(err, AssessError::DeadlineExceeded(_)), "{err}");
    }

    #[tokio::test]
    async fn concurrent_assessments_stay_independent() {
        let models = registry(vec![("LOG", clf(Obese)), ("RF", clf(Obese))]);
        let assessor = Arc::new(Assessor::new(models, Arc::new(Echo::default())));

        let lean = PatientInput::new(60.0, 1.80, 200.0, 110.0, 25);
        let obese = PatientInput::new(120.0, 1.70, 20.0, 150.0, 58);

        let (a, b) = tokio::join!(assessor.assess(lean), assessor.assess(obese));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.patient, lean);
        assert_eq!(b.patient, obese);
        assert!(a.results.iter().all(|r| r.verdict == Verdict::Negative));
        assert!(b.results.iter().all(|r| r.verdict == Verdict::Positive));
    }
}
