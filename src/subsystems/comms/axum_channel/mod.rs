//! Axum-based HTTP channel: serves the JSON API under `/api/`.
//!
//! `run_axum()` binds the listener and drives the axum event loop; the
//! [`CancellationToken`] passed in is wired to axum's graceful shutdown.
//!
//! ## URL layout
//!
//! ```text
//! GET  /api/          → greeting + availability flags
//! GET  /api/test      → liveness
//! GET  /api/health    → availability snapshot
//! POST /api/status    → record a status check
//! GET  /api/status    → list status checks (≤ 1000)
//! POST /api/generate  → story for a prompt
//! GET  /favicon.ico   → 204
//! ```

mod api;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::AppError;

use super::state::CommsState;

// ── Shared request state ──────────────────────────────────────────────────────

/// Axum router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone: the comms state is reference-counted.
#[derive(Clone)]
pub(crate) struct AxumState {
    pub comms: Arc<CommsState>,
}

// ── Server loop ───────────────────────────────────────────────────────────────

/// Bind `bind_addr` and serve until `shutdown` is cancelled.
pub async fn run_axum(
    bind_addr: &str,
    comms: Arc<CommsState>,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Comms(format!("axum bind failed on {bind_addr}: {e}")))?;

    let local = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| bind_addr.to_string());
    info!(bind_addr = %local, "http channel listening");

    axum::serve(listener, build_router(comms))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Comms(format!("axum server error: {e}")))?;

    info!("http channel shut down");
    Ok(())
}

// ── Router ────────────────────────────────────────────────────────────────────

/// The full application router.  Public so integration tests can drive it
/// without a socket.
pub fn build_router(comms: Arc<CommsState>) -> Router {
    Router::new()
        .route("/api",          get(api::root))
        .route("/api/",         get(api::root))
        .route("/api/test",     get(api::test))
        .route("/api/health",   get(api::health))
        .route("/api/status",   post(api::create_status).get(api::list_status))
        .route("/api/generate", post(api::generate))
        .route("/favicon.ico",  get(|| async { StatusCode::NO_CONTENT }))
        .with_state(AxumState { comms })
}
