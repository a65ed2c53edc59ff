//! HTTP boundary: request/response shapes, status mapping, and the server loop.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use hyperisk_core::{Assessment, PatientInput, Verdict};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::{AssessError, Assessor};

/// Body of `POST /predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDataRequest {
    pub peso: f64,
    pub estatura: f64,
    pub actividad_total: f64,
    pub tension_arterial: f64,
    pub edad: u32,
}

impl From<PatientDataRequest> for PatientInput {
    fn from(req: PatientDataRequest) -> Self {
        PatientInput::new(
            req.peso,
            req.estatura,
            req.actividad_total,
            req.tension_arterial,
            req.edad,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub modelo: String,
    pub prediccion: Verdict,
    pub respuesta: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypertensionRiskResponse {
    pub riesgo_hipertension: Vec<PredictionResponse>,
}

impl From<Assessment> for HypertensionRiskResponse {
    fn from(assessment: Assessment) -> Self {
        Self {
            riesgo_hipertension: assessment
                .results
                .into_iter()
                .map(|r| PredictionResponse {
                    modelo: r.model,
                    prediccion: r.verdict,
                    respuesta: r.recommendation,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl AssessError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidMeasurement(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RecommendationUnavailable { .. } => StatusCode::BAD_GATEWAY,
            Self::RecommendationTimeout { .. } | Self::DeadlineExceeded(_) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            Self::Model(_) | Self::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AssessError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(%status, error = %self, "assessment request failed");
        }
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the application router.
pub fn router(assessor: Arc<Assessor>) -> Router {
    // Any origin, no credentials.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/models", get(models))
        .route("/predict", post(predict))
        .layer(cors)
        .with_state(assessor)
}

/// Serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, assessor: Arc<Assessor>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(assessor))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn models(State(assessor): State<Arc<Assessor>>) -> Json<Vec<String>> {
    Json(assessor.registry().list_models())
}

async fn predict(
    State(assessor): State<Arc<Assessor>>,
    Json(req): Json<PatientDataRequest>,
) -> Result<Json<HypertensionRiskResponse>, AssessError> {
    let assessment = assessor.assess(req.into()).await?;
    Ok(Json(assessment.into()))
}
