//! Domain types for group registration tickets.
//!
//! Value objects, entities, and the ticket snapshot the engine operates on.
//! Every type here is a plain immutable snapshot: category is derived from
//! a birth date at validation time and never stored as authoritative.

use crate::error::{Result, TicketError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a participant (dancer)
    ParticipantId
);
define_id!(
    /// Unique identifier for an academy
    AcademyId
);
define_id!(
    /// Unique identifier for a competition event
    EventId
);
define_id!(
    /// Unique identifier for a group registration ticket
    TicketId
);
define_id!(
    /// Unique identifier for the user operating on behalf of an academy
    UserId
);

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount in whole units (rounded down)
    #[must_use]
    pub const fn units(&self) -> u64 {
        self.0 / 100
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two money amounts with overflow checking
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(result) => Some(Self(result)),
            None => None,
        }
    }

    /// Sums amounts, `None` on overflow
    pub fn checked_sum<'a>(amounts: impl IntoIterator<Item = &'a Self>) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, amount| acc.checked_add(*amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.units(), self.0 % 100)
    }
}

// ============================================================================
// Participants
// ============================================================================

/// Participant gender, used by the couple pairing rule
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Female
    Female,
    /// Male
    Male,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Female => write!(f, "female"),
            Self::Male => write!(f, "male"),
        }
    }
}

/// Academy a participant trains with
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Academy {
    /// Academy identifier
    pub id: AcademyId,
    /// Display name, used in rejection messages
    pub name: String,
}

impl Academy {
    /// Creates a new `Academy`
    #[must_use]
    pub const fn new(id: AcademyId, name: String) -> Self {
        Self { id, name }
    }
}

/// Snapshot of a dancer taken at validation time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant identifier
    pub id: ParticipantId,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// National identity document number
    pub dni: String,
    /// Birth date (category is derived from it)
    pub birth_date: NaiveDate,
    /// Gender
    pub gender: Gender,
    /// Academy affiliation, `None` when the directory has no academy on file
    pub academy: Option<Academy>,
}

impl Participant {
    /// Full display name
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Academy id, if affiliated
    #[must_use]
    pub fn academy_id(&self) -> Option<AcademyId> {
        self.academy.as_ref().map(|a| a.id)
    }

    /// Whether this participant belongs to the given academy
    #[must_use]
    pub fn belongs_to(&self, academy_id: AcademyId) -> bool {
        self.academy_id() == Some(academy_id)
    }
}

// ============================================================================
// Categories and rules
// ============================================================================

/// One age bracket in the ordered category ladder
///
/// The position of a definition in its ladder is its rank: a higher index is
/// a more advanced (older) bracket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    /// Category name (e.g. "Juvenil")
    pub name: String,
    /// Minimum age, inclusive
    pub min_age: u32,
    /// Maximum age, inclusive
    pub max_age: u32,
}

impl CategoryDefinition {
    /// Creates a new `CategoryDefinition`
    #[must_use]
    pub fn new(name: impl Into<String>, min_age: u32, max_age: u32) -> Self {
        Self {
            name: name.into(),
            min_age,
            max_age,
        }
    }

    /// Whether the age falls inside `[min_age, max_age]`
    #[must_use]
    pub const fn contains(&self, age: u32) -> bool {
        age >= self.min_age && age <= self.max_age
    }
}

/// Result of resolving a birth date against a category ladder
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// A named bracket from the ladder
    Named(String),
    /// No bracket matched; ineligible for every modality
    Unclassified,
}

impl Category {
    /// Category name, `None` for `Unclassified`
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Unclassified => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::Unclassified => write!(f, "Unclassified"),
        }
    }
}

/// Registration rules for one modality of an event
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalityRule {
    /// Modality name (e.g. "Individual", "Pareja")
    pub name: String,
    /// Price charged per registered entry
    pub price_per_entry: Money,
    /// Whether entries are couples (two participants of opposite gender)
    pub requires_couple: bool,
    /// Eligible category names; empty means every category is allowed
    #[serde(default)]
    pub allowed_categories: BTreeSet<String>,
}

impl ModalityRule {
    /// Whether the named category may register in this modality
    #[must_use]
    pub fn allows(&self, category: &str) -> bool {
        self.allowed_categories.is_empty() || self.allowed_categories.contains(category)
    }
}

/// How the distance between two partners is measured
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullCoupleCriterion {
    /// Absolute difference in whole years of age
    Age,
    /// Absolute difference in ladder positions
    #[default]
    Category,
}

impl fmt::Display for PullCoupleCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Age => write!(f, "age"),
            Self::Category => write!(f, "category"),
        }
    }
}

/// Per-event policy for couples whose partners fall in different categories
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullCouplePolicy {
    /// Whether cross-category couples are admitted at all
    pub enabled: bool,
    /// Distance measure
    pub criterion: PullCoupleCriterion,
    /// Largest admissible distance, inclusive
    pub max_difference: u32,
}

// ============================================================================
// Tickets
// ============================================================================

/// One registration line inside a ticket
///
/// Built by the eligibility validator; never edited in place (edit means
/// remove then re-add).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketEntry {
    /// Modality name
    pub modality: String,
    /// Category the entry competes in
    pub category: String,
    /// Whether a cross-category couple was admitted
    pub is_pull_couple: bool,
    /// One (solo) or two (couple) participants
    pub participant_ids: Vec<ParticipantId>,
    /// Academies of the participants at validation time
    pub academy_ids: BTreeSet<AcademyId>,
    /// Amount charged for this entry
    pub amount: Money,
}

impl TicketEntry {
    /// Whether the participant is registered in this entry
    #[must_use]
    pub fn includes(&self, participant: ParticipantId) -> bool {
        self.participant_ids.contains(&participant)
    }

    /// Whether both entries are in the same modality and share a participant
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.modality == other.modality
            && other.participant_ids.iter().any(|id| self.includes(*id))
    }
}

/// Lifecycle states of a group registration ticket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    /// Being assembled; entries may be added and removed
    Draft,
    /// Submitted; entries frozen, awaiting organizer action
    Pending,
    /// Accepted by the organizer (terminal)
    Confirmed,
    /// Withdrawn (terminal)
    Cancelled,
}

impl TicketStatus {
    /// Whether no further transition is possible
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Cancelled)
    }

    /// Whether `self -> next` is an edge of the lifecycle graph
    ///
    /// ```text
    /// Draft -> Pending -> Confirmed
    ///   |         |
    ///   +---------+----> Cancelled
    /// ```
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft | Self::Pending, Self::Cancelled)
                | (Self::Draft, Self::Pending)
                | (Self::Pending, Self::Confirmed)
        )
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "Draft"),
            Self::Pending => write!(f, "Pending"),
            Self::Confirmed => write!(f, "Confirmed"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Group registration ticket for one (academy, event) pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Ticket identifier
    pub id: TicketId,
    /// Event the registrations belong to
    pub event_id: EventId,
    /// Academy performing the registration
    pub academy_id: AcademyId,
    /// User who opened the ticket
    pub created_by: UserId,
    /// Current lifecycle state
    pub status: TicketStatus,
    /// Registration lines, in insertion order
    #[serde(default)]
    pub entries: Vec<TicketEntry>,
    /// Sum of entry amounts
    pub total_amount: Money,
    /// When the draft was opened
    pub created_at: DateTime<Utc>,
    /// When the ticket was submitted
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    /// When the ticket was confirmed
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
    /// When the ticket was cancelled
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Creates an empty ticket in `Draft`
    #[must_use]
    pub const fn draft(
        id: TicketId,
        event_id: EventId,
        academy_id: AcademyId,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            event_id,
            academy_id,
            created_by,
            status: TicketStatus::Draft,
            entries: Vec::new(),
            total_amount: Money::ZERO,
            created_at,
            submitted_at: None,
            confirmed_at: None,
            cancelled_at: None,
        }
    }

    /// Sum of entry amounts, `None` if it overflows
    #[must_use]
    pub fn computed_total(&self) -> Option<Money> {
        Money::checked_sum(self.entries.iter().map(|e| &e.amount))
    }

    /// Refreshes `total_amount` from the entries
    ///
    /// # Errors
    ///
    /// [`TicketError::TotalOverflow`] if the amounts don't fit; the ticket is
    /// left untouched.
    pub fn recompute_total(&mut self) -> Result<Money> {
        let total = self.computed_total().ok_or(TicketError::TotalOverflow)?;
        self.total_amount = total;
        Ok(total)
    }

    /// Checks that `total_amount` agrees with the entries
    ///
    /// Snapshots arriving from outside the engine go through this before any
    /// status change.
    ///
    /// # Errors
    ///
    /// [`TicketError::TotalOverflow`] if the entries can't be summed,
    /// [`TicketError::TotalMismatch`] if the recorded total differs.
    pub fn verify_total(&self) -> Result<Money> {
        let computed = self.computed_total().ok_or(TicketError::TotalOverflow)?;
        if computed != self.total_amount {
            return Err(TicketError::TotalMismatch {
                recorded: self.total_amount,
                computed,
            });
        }
        Ok(computed)
    }

    /// Whether the ticket can still be edited
    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.status == TicketStatus::Draft
    }

    /// Number of distinct participants across all entries
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.entries
            .iter()
            .flat_map(|e| e.participant_ids.iter())
            .collect::<BTreeSet<_>>()
            .len()
    }
}
