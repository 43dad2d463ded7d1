//! Health check endpoints.
//!
//! These endpoints are used by load balancers and monitoring systems
//! to verify service health.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

/// Simple health check endpoint (for basic liveness).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness report.
#[derive(Debug, Serialize)]
pub struct Readiness {
    /// `ready` when a category ladder is loaded, `degraded` otherwise
    pub status: &'static str,
    /// Number of brackets in the ladder
    pub categories: usize,
    /// Number of configured events
    pub events: usize,
}

/// Readiness check with catalog diagnostics.
///
/// An empty ladder classifies nobody, so every registration would be
/// rejected; the service still answers 200 but reports `degraded`.
///
/// # Endpoint
///
/// ```text
/// GET /ready
/// ```
#[allow(clippy::unused_async)]
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let categories = state.catalog.categories().len();
    let status = if categories == 0 { "degraded" } else { "ready" };

    (
        StatusCode::OK,
        Json(Readiness {
            status,
            categories,
            events: state.catalog.event_count(),
        }),
    )
}
