//! Ticket endpoints.
//!
//! The shell stores nothing: clients send the current ticket snapshot with
//! every command and receive the next snapshot plus the events it produced.
//!
//! - POST /api/v1/tickets/entries - Validate and add an entry (opens a draft)
//! - POST /api/v1/tickets/entries/remove - Remove an entry by index
//! - POST /api/v1/tickets/submit - Submit a draft
//! - POST /api/v1/tickets/confirm - Confirm a pending ticket
//! - POST /api/v1/tickets/cancel - Cancel a draft or pending ticket

use crate::error::AppError;
use crate::state::AppState;
use crate::WebResult;
use axum::{extract::State, Json};
use chrono::NaiveDate;
use dance_registry_core::cart::ensure_no_open_draft;
use dance_registry_core::catalog::{EventCatalog, InMemoryDirectory};
use dance_registry_core::eligibility::{EligibilityValidator, EntryRequest};
use dance_registry_core::reducer::Reducer;
use dance_registry_core::ticket::{TicketAction, TicketEnvironment, TicketReducer, TicketState};
use dance_registry_core::types::{AcademyId, EventId, Participant, Ticket, UserId};
use dance_registry_core::TicketError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Context for opening a new draft.
#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    /// Event being registered for
    pub event_id: EventId,
    /// Registering academy
    pub academy_id: AcademyId,
    /// Operating user
    pub created_by: UserId,
    /// Tickets the academy already holds, checked for an open draft
    #[serde(default)]
    pub existing: Vec<Ticket>,
}

/// Request to add an entry.
///
/// Exactly one of `ticket` (continue a draft) or `draft` (open one) is used;
/// `ticket` wins when both are present.
#[derive(Debug, Deserialize)]
pub struct AddEntryRequest {
    /// Current ticket snapshot
    #[serde(default)]
    pub ticket: Option<Ticket>,
    /// New draft context
    #[serde(default)]
    pub draft: Option<DraftRequest>,
    /// Modality name
    pub modality: String,
    /// Reference date for ages; defaults to today
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    /// Solo participant or first partner
    pub primary: Participant,
    /// Second partner
    #[serde(default)]
    pub partner: Option<Participant>,
}

/// Request to remove an entry.
#[derive(Debug, Deserialize)]
pub struct RemoveEntryRequest {
    /// Current ticket snapshot
    pub ticket: Ticket,
    /// Position of the entry
    pub index: usize,
}

/// Request to submit a ticket.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// Current ticket snapshot
    pub ticket: Ticket,
    /// Current directory records; affiliations are re-checked against them
    #[serde(default)]
    pub roster: Option<Vec<Participant>>,
}

/// Request carrying only a ticket (confirm).
#[derive(Debug, Deserialize)]
pub struct TicketRequest {
    /// Current ticket snapshot
    pub ticket: Ticket,
}

/// Request to cancel a ticket.
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    /// Current ticket snapshot
    pub ticket: Ticket,
    /// Optional reason
    #[serde(default)]
    pub reason: Option<String>,
}

/// Next ticket snapshot and the events that produced it.
#[derive(Debug, Serialize, Deserialize)]
pub struct TicketResponse {
    /// Updated ticket
    pub ticket: Ticket,
    /// Events emitted, in order
    pub events: Vec<TicketAction>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Validate an entry and add it to the ticket.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/v1/tickets/entries \
///   -H "Content-Type: application/json" \
///   -d '{
///     "draft": { "event_id": "...", "academy_id": "...", "created_by": "..." },
///     "modality": "Solista",
///     "primary": { ... }
///   }'
/// ```
#[allow(clippy::unused_async)]
pub async fn add_entry(
    State(state): State<AppState>,
    Json(request): Json<AddEntryRequest>,
) -> Result<Json<TicketResponse>, AppError> {
    let ticket_state = match (request.ticket, request.draft) {
        (Some(ticket), _) => TicketState::from_ticket(ticket),
        (None, Some(draft)) => {
            ensure_no_open_draft(&draft.existing, draft.academy_id, draft.event_id)?;
            TicketState::new(draft.event_id, draft.academy_id, draft.created_by)
        }
        (None, None) => {
            return Err(AppError::bad_request(
                "either `ticket` or `draft` must be provided",
            ))
        }
    };

    let rule = state
        .catalog
        .modality_rule(ticket_state.event_id, &request.modality)
        .ok_or_else(|| AppError::not_found("Modality", &request.modality))?;
    let policy = state
        .catalog
        .pull_couple_policy(ticket_state.event_id)
        .unwrap_or_default();
    let as_of = request.as_of.unwrap_or_else(|| state.today());

    let validator = EligibilityValidator::new(state.catalog.categories(), &policy, as_of);
    let existing = ticket_state
        .ticket
        .as_ref()
        .map_or(&[][..], |t| t.entries.as_slice());
    let entry = validator
        .validate(
            &EntryRequest {
                primary: request.primary,
                partner: request.partner,
            },
            existing,
            &rule,
            ticket_state.academy_id,
        )
        .into_result()?;

    let env = TicketEnvironment::new(Arc::clone(&state.clock));
    dispatch(ticket_state, TicketAction::AddEntry { entry }, &env)
}

/// Remove an entry from a draft.
#[allow(clippy::unused_async)]
pub async fn remove_entry(
    State(state): State<AppState>,
    Json(request): Json<RemoveEntryRequest>,
) -> Result<Json<TicketResponse>, AppError> {
    let env = TicketEnvironment::new(Arc::clone(&state.clock));
    dispatch(
        TicketState::from_ticket(request.ticket),
        TicketAction::RemoveEntry {
            index: request.index,
        },
        &env,
    )
}

/// Submit a draft.
///
/// With a `roster`, affiliations are re-resolved from it; participants
/// missing from the roster count as unaffiliated.
#[allow(clippy::unused_async)]
pub async fn submit_ticket(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<Json<TicketResponse>, AppError> {
    let mut env = TicketEnvironment::new(Arc::clone(&state.clock));
    if let Some(roster) = request.roster {
        env = env.with_directory(Arc::new(InMemoryDirectory::new(roster)));
    }
    dispatch(TicketState::from_ticket(request.ticket), TicketAction::Submit, &env)
}

/// Confirm a pending ticket.
#[allow(clippy::unused_async)]
pub async fn confirm_ticket(
    State(state): State<AppState>,
    Json(request): Json<TicketRequest>,
) -> Result<Json<TicketResponse>, AppError> {
    let env = TicketEnvironment::new(Arc::clone(&state.clock));
    dispatch(TicketState::from_ticket(request.ticket), TicketAction::Confirm, &env)
}

/// Cancel a draft or pending ticket.
#[allow(clippy::unused_async)]
pub async fn cancel_ticket(
    State(state): State<AppState>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<TicketResponse>, AppError> {
    let env = TicketEnvironment::new(Arc::clone(&state.clock));
    dispatch(
        TicketState::from_ticket(request.ticket),
        TicketAction::Cancel {
            reason: request.reason,
        },
        &env,
    )
}

/// Runs one command through the reducer and maps the outcome.
fn dispatch(
    mut ticket_state: TicketState,
    action: TicketAction,
    env: &TicketEnvironment,
) -> WebResult<Json<TicketResponse>> {
    let effects = TicketReducer::new().reduce(&mut ticket_state, action, env);

    if let Some(error) = ticket_state.last_error.take() {
        return Err(error.into());
    }

    let events = effects
        .iter()
        .flat_map(|effect| effect.emitted())
        .cloned()
        .collect();
    let ticket = ticket_state
        .ticket
        .ok_or_else(|| AppError::from(TicketError::NoTicket))?;

    Ok(Json(TicketResponse { ticket, events }))
}
