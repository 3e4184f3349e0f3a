//! Axum handlers for `/api/*` routes.
//!
//! Each handler receives [`AxumState`] via [`axum::extract::State`].  Body
//! extraction errors are caught here and turned into a 422 with the same
//! `{error, message}` shape as every other client error.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::subsystems::stories::DEFAULT_MAX_LENGTH;

use super::AxumState;

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct StatusCheckRequest {
    client_name: String,
}

#[derive(Deserialize)]
pub(super) struct GenerateRequest {
    prompt: String,
    max_length: Option<u32>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Build a JSON error response body.
fn json_error(code: &str, msg: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(json!({ "error": code, "message": format!("{msg}") }))
}

fn invalid_request(msg: impl std::fmt::Display) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, json_error("invalid_request", msg)).into_response()
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /api/
pub(super) async fn root(State(state): State<AxumState>) -> Response {
    let avail = state.comms.availability();
    Json(json!({
        "message": "Hello World",
        "mongodb": avail.store(),
        "ai_model": avail.ai_model(),
    }))
    .into_response()
}

/// GET /api/test
pub(super) async fn test() -> Response {
    Json(json!({
        "status": "ok",
        "message": "App is running",
        "timestamp": Utc::now(),
    }))
    .into_response()
}

/// GET /api/health: answered from the startup snapshot alone.
pub(super) async fn health(State(state): State<AxumState>) -> Response {
    let avail = state.comms.availability();
    Json(json!({
        "status": "healthy",
        "mongodb": avail.store(),
        "ai_model": avail.ai_model(),
        "timestamp": Utc::now(),
    }))
    .into_response()
}

/// POST /api/status
pub(super) async fn create_status(
    State(state): State<AxumState>,
    body: Result<Json<StatusCheckRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return invalid_request(rejection.body_text()),
    };

    if req.client_name.trim().is_empty() {
        return invalid_request("client_name must not be empty");
    }

    // Stored exactly as submitted; the trim only decides emptiness.
    let record = state.comms.record_status(&req.client_name).await;
    (StatusCode::OK, Json(record)).into_response()
}

/// GET /api/status
pub(super) async fn list_status(State(state): State<AxumState>) -> Response {
    let records = state.comms.list_status().await;
    (StatusCode::OK, Json(records)).into_response()
}

/// POST /api/generate
pub(super) async fn generate(
    State(state): State<AxumState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return invalid_request(rejection.body_text()),
    };

    if req.prompt.trim().is_empty() {
        return invalid_request("prompt must not be empty");
    }

    let max_length = req.max_length.unwrap_or(DEFAULT_MAX_LENGTH);
    let result = state.comms.generate(&req.prompt, max_length).await;
    debug!(ai_model_used = result.ai_model_used, theme = ?result.theme, "story generated");
    (StatusCode::OK, Json(result)).into_response()
}
