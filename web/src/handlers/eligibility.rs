//! Eligibility endpoint.
//!
//! - POST /api/v1/eligibility/validate - Dry-run a registration request

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use chrono::NaiveDate;
use dance_registry_core::catalog::EventCatalog;
use dance_registry_core::eligibility::{EligibilityValidator, EntryRequest, Verdict};
use dance_registry_core::types::{AcademyId, EventId, Participant, TicketEntry};
use serde::Deserialize;

/// Request to validate one entry.
#[derive(Debug, Deserialize)]
pub struct ValidateEntryRequest {
    /// Event being registered for
    pub event_id: EventId,
    /// Modality name
    pub modality: String,
    /// Academy doing the registration
    pub inscriber_academy_id: AcademyId,
    /// Reference date for ages; defaults to today
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    /// Solo participant or first partner
    pub primary: Participant,
    /// Second partner
    #[serde(default)]
    pub partner: Option<Participant>,
    /// Entries already on the academy's ticket
    #[serde(default)]
    pub existing_entries: Vec<TicketEntry>,
}

/// Validate an entry without touching any ticket.
///
/// Rejections are part of the response body (`"verdict": "rejected"`), not
/// HTTP errors. Only an unknown event or modality is a 404.
#[allow(clippy::unused_async)]
pub async fn validate_entry(
    State(state): State<AppState>,
    Json(request): Json<ValidateEntryRequest>,
) -> Result<Json<Verdict>, AppError> {
    let rule = state
        .catalog
        .modality_rule(request.event_id, &request.modality)
        .ok_or_else(|| AppError::not_found("Modality", &request.modality))?;
    let policy = state
        .catalog
        .pull_couple_policy(request.event_id)
        .unwrap_or_default();
    let as_of = request.as_of.unwrap_or_else(|| state.today());

    let validator = EligibilityValidator::new(state.catalog.categories(), &policy, as_of);
    let entry_request = EntryRequest {
        primary: request.primary,
        partner: request.partner,
    };

    Ok(Json(validator.validate(
        &entry_request,
        &request.existing_entries,
        &rule,
        request.inscriber_academy_id,
    )))
}
