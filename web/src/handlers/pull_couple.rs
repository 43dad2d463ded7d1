//! Pull-couple evaluation endpoint.
//!
//! - POST /api/v1/pull-couple/evaluate - Check whether two partners may dance together

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use dance_registry_core::catalog::EventCatalog;
use dance_registry_core::pull_couple::{evaluate, CoupleMember, PullCoupleOutcome};
use dance_registry_core::types::EventId;
use serde::Deserialize;

/// One partner as sent by the client.
#[derive(Debug, Deserialize)]
pub struct PartnerInput {
    /// Resolved category name
    pub category: String,
    /// Age in whole years
    pub age: u32,
}

/// Request to evaluate a couple against an event's policy.
#[derive(Debug, Deserialize)]
pub struct EvaluatePullCoupleRequest {
    /// Event whose policy applies
    pub event_id: EventId,
    /// First partner
    pub a: PartnerInput,
    /// Second partner
    pub b: PartnerInput,
}

/// Evaluate a pull couple.
///
/// Returns 404 for an unknown event and 422 when a category is not in the
/// ladder. A refused couple is still a 200 with `allowed: false`.
#[allow(clippy::unused_async)]
pub async fn evaluate_pull_couple(
    State(state): State<AppState>,
    Json(request): Json<EvaluatePullCoupleRequest>,
) -> Result<Json<PullCoupleOutcome>, AppError> {
    let policy = state
        .catalog
        .pull_couple_policy(request.event_id)
        .ok_or_else(|| AppError::not_found("Event", request.event_id))?;

    let outcome = evaluate(
        CoupleMember::new(&request.a.category, request.a.age),
        CoupleMember::new(&request.b.category, request.b.age),
        &policy,
        state.catalog.categories(),
    )?;

    Ok(Json(outcome))
}
