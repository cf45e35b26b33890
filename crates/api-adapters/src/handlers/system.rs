use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use domains::DomainError;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

const OPENMETRICS: &str = "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let body = state.metrics.encode().map_err(DomainError::unexpected)?;
    Ok(([(CONTENT_TYPE, OPENMETRICS)], body))
}
