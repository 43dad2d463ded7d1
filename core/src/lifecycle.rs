//! Ticket state machine.
//!
//! ```text
//! Draft -> Pending -> Confirmed
//!   |         |
//!   +---------+----> Cancelled
//! ```
//!
//! Confirmation (the organizer's action) is where registration records are
//! materialized; cancellation never creates any. Transitions outside the
//! graph fail with [`TicketError::IllegalTransition`]. Every transition also
//! re-checks `total_amount` against the entries, since snapshots may come
//! from outside the engine.

use crate::catalog::ParticipantDirectory;
use crate::error::{Result, TicketError};
use crate::types::{AcademyId, Ticket, TicketEntry, TicketStatus};
use chrono::{DateTime, Utc};

/// Fails unless `from -> to` is an edge of the lifecycle graph.
///
/// # Errors
///
/// Returns [`TicketError::IllegalTransition`].
pub const fn check_transition(from: TicketStatus, to: TicketStatus) -> Result<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(TicketError::IllegalTransition { from, to })
    }
}

/// Moves a draft to `Pending`, re-checking affiliation on every entry.
///
/// Affiliation is read from the academies recorded on each entry when it
/// was validated. Use [`submit_against`] to re-read them from a directory.
///
/// # Errors
///
/// In order: [`TicketError::IllegalTransition`] unless `Draft`,
/// [`TicketError::EmptyTicket`], a total error from
/// [`Ticket::verify_total`], then [`TicketError::GroupValidation`]
/// listing every entry without a member of the registering academy.
pub fn submit(ticket: &Ticket, now: DateTime<Utc>) -> Result<Ticket> {
    submit_with(ticket, now, |_, entry| entry.academy_ids.contains(&ticket.academy_id))
}

/// Like [`submit`], but re-resolves every participant through `directory`.
///
/// A participant missing from the directory counts as unaffiliated.
///
/// # Errors
///
/// Same as [`submit`].
pub fn submit_against(
    ticket: &Ticket,
    directory: &dyn ParticipantDirectory,
    now: DateTime<Utc>,
) -> Result<Ticket> {
    submit_with(ticket, now, |academy_id, entry| {
        entry.participant_ids.iter().any(|id| {
            directory
                .find_by_identifier(&id.to_string())
                .is_some_and(|p| p.belongs_to(academy_id))
        })
    })
}

fn submit_with<F>(ticket: &Ticket, now: DateTime<Utc>, affiliated: F) -> Result<Ticket>
where
    F: Fn(AcademyId, &TicketEntry) -> bool,
{
    check_transition(ticket.status, TicketStatus::Pending)?;

    if ticket.entries.is_empty() {
        return Err(TicketError::EmptyTicket);
    }
    verified_total(ticket)?;

    let failing: Vec<usize> = ticket
        .entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| !affiliated(ticket.academy_id, entry))
        .map(|(index, _)| index)
        .collect();
    if !failing.is_empty() {
        tracing::warn!(ticket_id = %ticket.id, entries = ?failing, "Submission refused");
        return Err(TicketError::GroupValidation { entries: failing });
    }

    let mut next = ticket.clone();
    next.status = TicketStatus::Pending;
    next.submitted_at = Some(now);

    tracing::info!(
        ticket_id = %next.id,
        entries = next.entries.len(),
        total = %next.total_amount,
        "Ticket submitted"
    );
    Ok(next)
}

/// Moves a pending ticket to `Confirmed`.
///
/// # Errors
///
/// Returns [`TicketError::IllegalTransition`] unless `Pending`, or a total
/// error from [`Ticket::verify_total`].
pub fn confirm(ticket: &Ticket, now: DateTime<Utc>) -> Result<Ticket> {
    check_transition(ticket.status, TicketStatus::Confirmed)?;
    verified_total(ticket)?;

    let mut next = ticket.clone();
    next.status = TicketStatus::Confirmed;
    next.confirmed_at = Some(now);

    tracing::info!(ticket_id = %next.id, entries = next.entries.len(), "Ticket confirmed");
    Ok(next)
}

/// Moves a draft or pending ticket to `Cancelled`.
///
/// # Errors
///
/// Returns [`TicketError::IllegalTransition`] from a terminal state, or a
/// total error from [`Ticket::verify_total`].
pub fn cancel(ticket: &Ticket, now: DateTime<Utc>) -> Result<Ticket> {
    check_transition(ticket.status, TicketStatus::Cancelled)?;
    verified_total(ticket)?;

    let mut next = ticket.clone();
    next.status = TicketStatus::Cancelled;
    next.cancelled_at = Some(now);

    tracing::info!(ticket_id = %next.id, from = %ticket.status, "Ticket cancelled");
    Ok(next)
}

fn verified_total(ticket: &Ticket) -> Result<()> {
    if let Err(err) = ticket.verify_total() {
        tracing::warn!(ticket_id = %ticket.id, error = %err, "Ticket total refused");
        return Err(err);
    }
    Ok(())
}
