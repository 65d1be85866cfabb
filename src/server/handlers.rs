//! Request handlers.
//!
//! Each handler only decodes the request, calls into the aggregator and
//! encodes the result.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::Uri;
use axum::Json;
use serde::Serialize;
use tracing::debug;

use super::error::ApiError;
use super::AppState;
use crate::analysis;
use crate::models::{AnalysisRequest, AnalysisResponse};

/// `POST /api`
pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Rejected analysis request: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;

    let response = analysis::analyze(&state.store, &request, state.default_threshold_ms);
    debug!("Answered analysis for {} regions", response.len());
    Ok(Json(response))
}

/// Any other method on `/api`.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Unknown paths.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Regions in the loaded dataset.
    pub regions: usize,
    /// Records across all regions.
    pub records: usize,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        regions: state.store.region_count(),
        records: state.store.record_count(),
    })
}
