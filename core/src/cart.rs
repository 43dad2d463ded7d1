//! Draft ticket editing.
//!
//! Entries arrive already validated; the cart only guards the ticket's own
//! invariants: edits happen in `Draft`, no participant appears twice in a
//! modality, and `total_amount` always equals the sum of entry amounts.
//! Every operation returns a new ticket and leaves the input untouched.

use crate::error::{Result, TicketError};
use crate::types::{AcademyId, EventId, Ticket, TicketEntry, TicketId, UserId};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Opens an empty draft for an academy and event.
///
/// # Errors
///
/// Returns [`TicketError::DraftAlreadyOpen`] when `existing` already holds a
/// draft for the same academy and event.
pub fn open_draft(
    existing: &[Ticket],
    event_id: EventId,
    academy_id: AcademyId,
    created_by: UserId,
    now: DateTime<Utc>,
) -> Result<Ticket> {
    ensure_no_open_draft(existing, academy_id, event_id)?;
    let ticket = Ticket::draft(TicketId::new(), event_id, academy_id, created_by, now);
    tracing::info!(ticket_id = %ticket.id, %event_id, %academy_id, "Draft opened");
    Ok(ticket)
}

/// Fails if a draft is already open for the academy and event.
///
/// # Errors
///
/// Returns [`TicketError::DraftAlreadyOpen`].
pub fn ensure_no_open_draft(
    existing: &[Ticket],
    academy_id: AcademyId,
    event_id: EventId,
) -> Result<()> {
    let open = existing
        .iter()
        .any(|t| t.is_draft() && t.academy_id == academy_id && t.event_id == event_id);
    if open {
        return Err(TicketError::DraftAlreadyOpen);
    }
    Ok(())
}

/// Checks that `entry` may be appended to `ticket` without modifying it.
///
/// # Errors
///
/// - [`TicketError::InvalidState`] if the ticket is not a draft
/// - [`TicketError::MalformedEntry`] unless the entry has one or two distinct participants
/// - [`TicketError::DuplicateEntry`] if a participant is already in the same modality
/// - [`TicketError::TotalOverflow`] if the new total would not fit
pub fn check_add(ticket: &Ticket, entry: &TicketEntry) -> Result<()> {
    if !ticket.is_draft() {
        return Err(TicketError::InvalidState {
            status: ticket.status,
        });
    }

    let distinct = entry.participant_ids.iter().collect::<BTreeSet<_>>().len();
    if distinct != entry.participant_ids.len() || !(1..=2).contains(&distinct) {
        return Err(TicketError::MalformedEntry {
            count: entry.participant_ids.len(),
        });
    }

    if let Some(existing_index) = ticket.entries.iter().position(|e| e.overlaps(entry)) {
        return Err(TicketError::DuplicateEntry {
            modality: entry.modality.clone(),
            existing_index,
        });
    }

    ticket
        .computed_total()
        .and_then(|total| total.checked_add(entry.amount))
        .ok_or(TicketError::TotalOverflow)?;

    Ok(())
}

/// Appends a validated entry and refreshes the total.
///
/// # Errors
///
/// See [`check_add`].
pub fn add_entry(ticket: &Ticket, entry: TicketEntry) -> Result<Ticket> {
    if let Err(err) = check_add(ticket, &entry) {
        tracing::warn!(ticket_id = %ticket.id, error = %err, "Entry refused by cart");
        return Err(err);
    }

    let mut next = ticket.clone();
    next.entries.push(entry);
    next.recompute_total()?;

    tracing::debug!(
        ticket_id = %next.id,
        entries = next.entries.len(),
        total = %next.total_amount,
        "Entry added"
    );
    Ok(next)
}

/// Removes the entry at `index` and refreshes the total.
///
/// Entries after `index` shift down by one.
///
/// # Errors
///
/// - [`TicketError::InvalidState`] if the ticket is not a draft
/// - [`TicketError::IndexOutOfRange`] if `index >= entries.len()`
pub fn remove_entry(ticket: &Ticket, index: usize) -> Result<Ticket> {
    if !ticket.is_draft() {
        return Err(TicketError::InvalidState {
            status: ticket.status,
        });
    }
    if index >= ticket.entries.len() {
        let err = TicketError::IndexOutOfRange {
            index,
            len: ticket.entries.len(),
        };
        tracing::warn!(ticket_id = %ticket.id, error = %err, "Entry removal refused");
        return Err(err);
    }

    let mut next = ticket.clone();
    let removed = next.entries.remove(index);
    next.recompute_total()?;

    tracing::debug!(
        ticket_id = %next.id,
        modality = %removed.modality,
        total = %next.total_amount,
        "Entry removed"
    );
    Ok(next)
}
