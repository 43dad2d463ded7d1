//! Router configuration for the registration service.
//!
//! Builds the complete Axum router with all endpoints.

use crate::handlers::health::{health_check, readiness_check};
use crate::handlers::{categories, eligibility, pull_couple, tickets};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// Health checks live at the root; everything else is nested under
/// `/api/v1`. Requests are traced with `tower-http`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Rule queries
        .route("/categories/resolve", post(categories::resolve_category))
        .route(
            "/pull-couple/evaluate",
            post(pull_couple::evaluate_pull_couple),
        )
        .route("/eligibility/validate", post(eligibility::validate_entry))
        // Cart
        .route("/tickets/entries", post(tickets::add_entry))
        .route("/tickets/entries/remove", post(tickets::remove_entry))
        // Lifecycle
        .route("/tickets/submit", post(tickets::submit_ticket))
        .route("/tickets/confirm", post(tickets::confirm_ticket))
        .route("/tickets/cancel", post(tickets::cancel_ticket));

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
