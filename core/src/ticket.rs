//! Ticket reducer.
//!
//! Wraps the [`cart`](crate::cart) and [`lifecycle`](crate::lifecycle)
//! functions behind commands and events so a shell can drive one academy's
//! ticket for one event. Commands are validated with the pure functions,
//! then recorded as events; events alone rebuild the state on replay.

use crate::cart;
use crate::catalog::ParticipantDirectory;
use crate::effect::Effect;
use crate::environment::Clock;
use crate::error::TicketError;
use crate::lifecycle;
use crate::reducer::Reducer;
use crate::types::{AcademyId, EventId, Ticket, TicketEntry, TicketId, TicketStatus, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::sync::Arc;

// ============================================================================
// Actions (Commands + Events)
// ============================================================================

/// Actions for the ticket reducer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TicketAction {
    // Commands
    /// Append an entry already accepted by the eligibility validator
    AddEntry {
        /// Validated entry
        entry: TicketEntry,
    },

    /// Remove the entry at `index`
    RemoveEntry {
        /// Position in the ticket
        index: usize,
    },

    /// Submit the draft for review
    Submit,

    /// Confirm a pending ticket (organizer)
    Confirm,

    /// Cancel a draft or pending ticket
    Cancel {
        /// Optional free-text reason
        #[serde(default)]
        reason: Option<String>,
    },

    // Events
    /// Draft opened by the first accepted entry
    DraftOpened {
        /// New ticket id
        ticket_id: TicketId,
        /// When the draft was opened
        opened_at: DateTime<Utc>,
    },

    /// Entry appended
    EntryAdded {
        /// Entry added
        entry: TicketEntry,
    },

    /// Entry removed
    EntryRemoved {
        /// Former position
        index: usize,
    },

    /// Ticket moved to `Pending`
    TicketSubmitted {
        /// Ticket id
        ticket_id: TicketId,
        /// When submitted
        submitted_at: DateTime<Utc>,
    },

    /// Ticket moved to `Confirmed`; one registration per entry is due
    TicketConfirmed {
        /// Ticket id
        ticket_id: TicketId,
        /// Entries to materialize downstream
        entries: Vec<TicketEntry>,
        /// When confirmed
        confirmed_at: DateTime<Utc>,
    },

    /// Ticket moved to `Cancelled`
    TicketCancelled {
        /// Ticket id
        ticket_id: TicketId,
        /// Reason given by the caller
        reason: Option<String>,
        /// When cancelled
        cancelled_at: DateTime<Utc>,
    },

    /// A command was refused; the ticket is unchanged
    CommandRejected {
        /// Why
        error: TicketError,
    },
}

impl TicketAction {
    /// Whether this action is a command (a request)
    #[must_use]
    pub const fn is_command(&self) -> bool {
        matches!(
            self,
            Self::AddEntry { .. }
                | Self::RemoveEntry { .. }
                | Self::Submit
                | Self::Confirm
                | Self::Cancel { .. }
        )
    }

    /// Whether this action is an event (a recorded fact)
    #[must_use]
    pub const fn is_event(&self) -> bool {
        !self.is_command()
    }
}

// ============================================================================
// State
// ============================================================================

/// One academy's ticket for one event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketState {
    /// Event being registered for
    pub event_id: EventId,
    /// Registering academy
    pub academy_id: AcademyId,
    /// User operating the ticket
    pub created_by: UserId,
    /// Ticket, once the first entry opened it
    pub ticket: Option<Ticket>,
    /// Last command rejection, cleared by the next accepted command
    pub last_error: Option<TicketError>,
}

impl TicketState {
    /// Creates a state with no ticket yet
    #[must_use]
    pub const fn new(event_id: EventId, academy_id: AcademyId, created_by: UserId) -> Self {
        Self {
            event_id,
            academy_id,
            created_by,
            ticket: None,
            last_error: None,
        }
    }

    /// Resumes from an existing ticket snapshot
    ///
    /// The snapshot is taken as given; its total is checked against the
    /// entries before any status change.
    #[must_use]
    pub const fn from_ticket(ticket: Ticket) -> Self {
        Self {
            event_id: ticket.event_id,
            academy_id: ticket.academy_id,
            created_by: ticket.created_by,
            ticket: Some(ticket),
            last_error: None,
        }
    }

    /// Current status, `None` before the first entry
    #[must_use]
    pub fn status(&self) -> Option<TicketStatus> {
        self.ticket.as_ref().map(|t| t.status)
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Environment dependencies for the ticket reducer
#[derive(Clone)]
pub struct TicketEnvironment {
    /// Clock for timestamps
    pub clock: Arc<dyn Clock>,
    /// Directory for re-resolving affiliations on submit, if available
    pub directory: Option<Arc<dyn ParticipantDirectory>>,
}

impl TicketEnvironment {
    /// Creates a new `TicketEnvironment` without a directory
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            directory: None,
        }
    }

    /// Re-resolve affiliations through `directory` on submit
    #[must_use]
    pub fn with_directory(mut self, directory: Arc<dyn ParticipantDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for group registration tickets
#[derive(Clone, Debug, Default)]
pub struct TicketReducer;

impl TicketReducer {
    /// Creates a new `TicketReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Applies an event to state
    fn apply_event(state: &mut TicketState, action: &TicketAction) {
        match action {
            TicketAction::DraftOpened {
                ticket_id,
                opened_at,
            } => {
                state.ticket = Some(Ticket::draft(
                    *ticket_id,
                    state.event_id,
                    state.academy_id,
                    state.created_by,
                    *opened_at,
                ));
                state.last_error = None;
            }

            TicketAction::EntryAdded { entry } => {
                if let Some(ticket) = state.ticket.as_mut() {
                    ticket.entries.push(entry.clone());
                }
                Self::refresh_total(state);
            }

            TicketAction::EntryRemoved { index } => {
                if let Some(ticket) = state.ticket.as_mut() {
                    if *index < ticket.entries.len() {
                        ticket.entries.remove(*index);
                    }
                }
                Self::refresh_total(state);
            }

            TicketAction::TicketSubmitted { submitted_at, .. } => {
                if let Some(ticket) = state.ticket.as_mut() {
                    ticket.status = TicketStatus::Pending;
                    ticket.submitted_at = Some(*submitted_at);
                }
                state.last_error = None;
            }

            TicketAction::TicketConfirmed { confirmed_at, .. } => {
                if let Some(ticket) = state.ticket.as_mut() {
                    ticket.status = TicketStatus::Confirmed;
                    ticket.confirmed_at = Some(*confirmed_at);
                }
                state.last_error = None;
            }

            TicketAction::TicketCancelled { cancelled_at, .. } => {
                if let Some(ticket) = state.ticket.as_mut() {
                    ticket.status = TicketStatus::Cancelled;
                    ticket.cancelled_at = Some(*cancelled_at);
                }
                state.last_error = None;
            }

            TicketAction::CommandRejected { error } => {
                state.last_error = Some(error.clone());
            }

            // Commands don't modify state
            TicketAction::AddEntry { .. }
            | TicketAction::RemoveEntry { .. }
            | TicketAction::Submit
            | TicketAction::Confirm
            | TicketAction::Cancel { .. } => {}
        }
    }

    /// Overflow while replaying a foreign log surfaces as `last_error`
    fn refresh_total(state: &mut TicketState) {
        state.last_error = state
            .ticket
            .as_mut()
            .and_then(|ticket| ticket.recompute_total().err());
    }

    fn reject(state: &mut TicketState, error: TicketError) -> SmallVec<[Effect<TicketAction>; 4]> {
        if error.is_caller_bug() {
            tracing::warn!(academy_id = %state.academy_id, error = %error, "Command rejected");
        } else {
            tracing::debug!(academy_id = %state.academy_id, error = %error, "Command rejected");
        }
        Self::apply_event(state, &TicketAction::CommandRejected { error });
        SmallVec::new()
    }

    fn record(
        state: &mut TicketState,
        event: TicketAction,
    ) -> SmallVec<[Effect<TicketAction>; 4]> {
        Self::apply_event(state, &event);
        smallvec![Effect::Emit(event)]
    }
}

impl Reducer for TicketReducer {
    type State = TicketState;
    type Action = TicketAction;
    type Environment = TicketEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Add Entry ==========
            TicketAction::AddEntry { entry } => {
                let now = env.clock.now();
                let candidate = state.ticket.clone().unwrap_or_else(|| {
                    Ticket::draft(
                        TicketId::new(),
                        state.event_id,
                        state.academy_id,
                        state.created_by,
                        now,
                    )
                });

                if let Err(error) = cart::check_add(&candidate, &entry) {
                    return Self::reject(state, error);
                }

                let mut effects = SmallVec::new();
                if state.ticket.is_none() {
                    tracing::info!(
                        ticket_id = %candidate.id,
                        event_id = %state.event_id,
                        academy_id = %state.academy_id,
                        "Draft opened"
                    );
                    effects.extend(Self::record(
                        state,
                        TicketAction::DraftOpened {
                            ticket_id: candidate.id,
                            opened_at: now,
                        },
                    ));
                }
                effects.extend(Self::record(state, TicketAction::EntryAdded { entry }));
                effects
            }

            // ========== Remove Entry ==========
            TicketAction::RemoveEntry { index } => {
                let Some(ticket) = state.ticket.as_ref() else {
                    return Self::reject(state, TicketError::NoTicket);
                };
                if let Err(error) = cart::remove_entry(ticket, index) {
                    return Self::reject(state, error);
                }
                Self::record(state, TicketAction::EntryRemoved { index })
            }

            // ========== Submit ==========
            TicketAction::Submit => {
                let Some(ticket) = state.ticket.as_ref() else {
                    return Self::reject(state, TicketError::NoTicket);
                };
                let now = env.clock.now();
                let result = match &env.directory {
                    Some(directory) => lifecycle::submit_against(ticket, directory.as_ref(), now),
                    None => lifecycle::submit(ticket, now),
                };
                match result {
                    Ok(next) => Self::record(
                        state,
                        TicketAction::TicketSubmitted {
                            ticket_id: next.id,
                            submitted_at: now,
                        },
                    ),
                    Err(error) => Self::reject(state, error),
                }
            }

            // ========== Confirm ==========
            TicketAction::Confirm => {
                let Some(ticket) = state.ticket.as_ref() else {
                    return Self::reject(state, TicketError::NoTicket);
                };
                let now = env.clock.now();
                match lifecycle::confirm(ticket, now) {
                    Ok(next) => Self::record(
                        state,
                        TicketAction::TicketConfirmed {
                            ticket_id: next.id,
                            entries: next.entries,
                            confirmed_at: now,
                        },
                    ),
                    Err(error) => Self::reject(state, error),
                }
            }

            // ========== Cancel ==========
            TicketAction::Cancel { reason } => {
                let Some(ticket) = state.ticket.as_ref() else {
                    return Self::reject(state, TicketError::NoTicket);
                };
                let now = env.clock.now();
                match lifecycle::cancel(ticket, now) {
                    Ok(next) => Self::record(
                        state,
                        TicketAction::TicketCancelled {
                            ticket_id: next.id,
                            reason,
                            cancelled_at: now,
                        },
                    ),
                    Err(error) => Self::reject(state, error),
                }
            }

            // ========== Events (replay) ==========
            event => {
                Self::apply_event(state, &event);
                SmallVec::new()
            }
        }
    }
}
