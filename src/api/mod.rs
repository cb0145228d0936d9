//! HTTP surface: `GET /health` and `POST /predict`

pub mod error;

use crate::error::InferenceError;
use crate::metrics::ServiceMetrics;
use crate::models::InferenceEngine;
use crate::types::PredictionResult;
use crate::validation;
use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::debug;

pub use error::ApiError;

/// Shared, read-only request state
#[derive(Clone)]
pub struct AppState {
    pub engine: InferenceEngine,
    pub metrics: Arc<ServiceMetrics>,
    pub expose_error_details: bool,
}

impl AppState {
    pub fn new(engine: InferenceEngine, metrics: Arc<ServiceMetrics>) -> Self {
        Self {
            engine,
            metrics,
            expose_error_details: false,
        }
    }

    pub fn with_error_details(mut self, expose: bool) -> Self {
        self.expose_error_details = expose;
        self
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/predict", post(predict))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictionResult>, ApiError> {
    let start_time = Instant::now();
    state.metrics.record_request();

    let record = validation::validate_json(&body).map_err(|e| {
        state.metrics.record_validation_failure();
        ApiError::validation(e)
    })?;

    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || engine.predict(&record))
        .await
        .unwrap_or_else(|e| Err(InferenceError::Join(e.to_string())));

    match result {
        Ok(prediction) => {
            let latency = start_time.elapsed();
            state.metrics.record_prediction(latency, prediction.risk);
            debug!(
                prediction = prediction.prediction,
                risk = prediction.risk.as_str(),
                latency_us = latency.as_micros() as u64,
                "Prediction served"
            );
            Ok(Json(prediction))
        }
        Err(e) => {
            state.metrics.record_inference_failure();
            Err(ApiError::inference(e, state.expose_error_details))
        }
    }
}
