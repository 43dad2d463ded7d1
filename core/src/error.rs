//! Error types for the registration engine.
//!
//! Every failure here is caller-recoverable. [`Rejection`] covers eligibility
//! rules (expected and user-facing); [`TicketError`] covers cart and lifecycle
//! misuse; [`CategoryError`] covers malformed category ladders.

use crate::types::{Money, PullCoupleCriterion, TicketStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for ticket operations.
pub type Result<T> = std::result::Result<T, TicketError>;

/// Why the eligibility validator refused an entry.
///
/// Variants are listed in the order the validator checks them; the first
/// failing rule wins.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rejection {
    // ═══════════════════════════════════════════════════════════
    // Participant resolution
    // ═══════════════════════════════════════════════════════════

    /// Participant has no academy on file.
    #[error("participant {participant} has no academy")]
    ParticipantWithoutAcademy {
        /// Participant display name
        participant: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Modality shape
    // ═══════════════════════════════════════════════════════════

    /// Couple modality registered without a partner.
    #[error("modality {modality} requires a partner")]
    PartnerRequired {
        /// Modality name
        modality: String,
    },

    /// Couple partners share the same gender.
    #[error("modality {modality} requires partners of opposite gender")]
    SameGenderCouple {
        /// Modality name
        modality: String,
    },

    /// Solo modality registered with a partner.
    #[error("modality {modality} accepts a single participant")]
    PartnerNotAllowed {
        /// Modality name
        modality: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Categories
    // ═══════════════════════════════════════════════════════════

    /// No category bracket matches the participant's age.
    #[error("participant {participant} does not fit any category")]
    UnclassifiedParticipant {
        /// Participant display name
        participant: String,
    },

    /// Participant's category is not eligible for the modality.
    #[error("category {category} of {participant} is not allowed in modality {modality}")]
    CategoryNotAllowed {
        /// Participant display name
        participant: String,
        /// Resolved category
        category: String,
        /// Modality name
        modality: String,
    },

    /// Category is not part of the event's ladder.
    #[error("category {category} is not defined for this event")]
    UnknownCategory {
        /// Category name
        category: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Pull couple
    // ═══════════════════════════════════════════════════════════

    /// Partners are in different categories and pull couples are disabled.
    #[error("partners are in different categories ({category_a} and {category_b}) and pull couples are not enabled")]
    PullCoupleDisabled {
        /// First partner's category
        category_a: String,
        /// Second partner's category
        category_b: String,
    },

    /// Partners are too far apart.
    #[error("{criterion} difference of {difference} exceeds the allowed {max_difference}")]
    PullCoupleDifferenceExceeded {
        /// Measure used
        criterion: PullCoupleCriterion,
        /// Measured distance
        difference: u32,
        /// Configured maximum
        max_difference: u32,
    },

    // ═══════════════════════════════════════════════════════════
    // Academy and duplicates
    // ═══════════════════════════════════════════════════════════

    /// None of the participants belongs to the registering academy.
    #[error("no participant belongs to your academy (found: {})", academies.join(", "))]
    NoAffiliatedParticipant {
        /// Academy names of the participants
        academies: Vec<String>,
    },

    /// Participant is already registered in this modality on the ticket.
    #[error("{participant} is already registered in modality {modality}")]
    DuplicateRegistration {
        /// Participant display name
        participant: String,
        /// Modality name
        modality: String,
    },
}

impl Rejection {
    /// Stable machine-readable reason code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ParticipantWithoutAcademy { .. } => "PARTICIPANT_WITHOUT_ACADEMY",
            Self::PartnerRequired { .. } => "PARTNER_REQUIRED",
            Self::SameGenderCouple { .. } => "SAME_GENDER_COUPLE",
            Self::PartnerNotAllowed { .. } => "PARTNER_NOT_ALLOWED",
            Self::UnclassifiedParticipant { .. } => "UNCLASSIFIED_PARTICIPANT",
            Self::CategoryNotAllowed { .. } => "CATEGORY_NOT_ALLOWED",
            Self::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            Self::PullCoupleDisabled { .. } => "PULL_COUPLE_DISABLED",
            Self::PullCoupleDifferenceExceeded { .. } => "PULL_COUPLE_DIFFERENCE_EXCEEDED",
            Self::NoAffiliatedParticipant { .. } => "NO_AFFILIATED_PARTICIPANT",
            Self::DuplicateRegistration { .. } => "DUPLICATE_REGISTRATION",
        }
    }
}

/// Cart and lifecycle failures.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketError {
    // ═══════════════════════════════════════════════════════════
    // Cart misuse
    // ═══════════════════════════════════════════════════════════

    /// Entry shares a participant with an existing entry of the same modality.
    #[error("entry collides with entry #{existing_index} in modality {modality}")]
    DuplicateEntry {
        /// Modality name
        modality: String,
        /// Position of the colliding entry
        existing_index: usize,
    },

    /// Removal index outside `[0, len)`.
    #[error("entry index {index} is out of range (ticket has {len} entries)")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of entries
        len: usize,
    },

    /// Entry does not carry one or two distinct participants.
    #[error("entry must have one or two distinct participants (found {count})")]
    MalformedEntry {
        /// Participant count found
        count: usize,
    },

    /// Mutation attempted on a ticket that is no longer a draft.
    #[error("ticket is {status}; entries can only change while Draft")]
    InvalidState {
        /// Current status
        status: TicketStatus,
    },

    /// A draft already exists for this academy and event.
    #[error("a draft ticket is already open for this academy and event")]
    DraftAlreadyOpen,

    // ═══════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════

    /// Transition not in the lifecycle graph.
    #[error("illegal transition from {from} to {to}")]
    IllegalTransition {
        /// Current status
        from: TicketStatus,
        /// Requested status
        to: TicketStatus,
    },

    /// Submission of a ticket without entries.
    #[error("cannot submit a ticket without entries")]
    EmptyTicket,

    /// Some entries no longer include a member of the registering academy.
    #[error("entries {entries:?} have no participant from the registering academy")]
    GroupValidation {
        /// Positions of the failing entries
        entries: Vec<usize>,
    },

    // ═══════════════════════════════════════════════════════════
    // Totals
    // ═══════════════════════════════════════════════════════════

    /// Snapshot total disagrees with the sum of its entries.
    #[error("ticket total {recorded} does not match its entries ({computed})")]
    TotalMismatch {
        /// Total carried by the snapshot
        recorded: Money,
        /// Sum of entry amounts
        computed: Money,
    },

    /// Entry amounts no longer fit in a total.
    #[error("ticket total overflows")]
    TotalOverflow,

    // ═══════════════════════════════════════════════════════════
    // Operations outside a ticket context
    // ═══════════════════════════════════════════════════════════

    /// Operation attempted before any entry opened the ticket.
    #[error("no ticket has been opened yet")]
    NoTicket,
}

impl TicketError {
    /// Stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::DuplicateEntry { .. } => "DUPLICATE_ENTRY",
            Self::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            Self::MalformedEntry { .. } => "MALFORMED_ENTRY",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::DraftAlreadyOpen => "DRAFT_ALREADY_OPEN",
            Self::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            Self::EmptyTicket => "EMPTY_TICKET",
            Self::GroupValidation { .. } => "GROUP_VALIDATION",
            Self::TotalMismatch { .. } => "TOTAL_MISMATCH",
            Self::TotalOverflow => "TOTAL_OVERFLOW",
            Self::NoTicket => "NO_TICKET",
        }
    }

    /// Whether the error points at a caller bug rather than user input.
    #[must_use]
    pub const fn is_caller_bug(&self) -> bool {
        matches!(
            self,
            Self::DuplicateEntry { .. }
                | Self::IndexOutOfRange { .. }
                | Self::MalformedEntry { .. }
                | Self::InvalidState { .. }
                | Self::IllegalTransition { .. }
                | Self::TotalMismatch { .. }
                | Self::NoTicket
        )
    }
}

/// Malformed category ladders and lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CategoryError {
    /// Category name is not in the ladder.
    #[error("unknown category: {0}")]
    Unknown(String),

    /// `min_age` greater than `max_age`.
    #[error("category {name} has an inverted age range {min_age}..={max_age}")]
    InvertedRange {
        /// Category name
        name: String,
        /// Minimum age
        min_age: u32,
        /// Maximum age
        max_age: u32,
    },

    /// Brackets are not contiguous and increasing.
    #[error("category {name} must start at age {expected} (starts at {found})")]
    NotContiguous {
        /// Category name
        name: String,
        /// Expected minimum age
        expected: u32,
        /// Actual minimum age
        found: u32,
    },

    /// Two brackets share a name.
    #[error("category {0} is defined more than once")]
    DuplicateName(String),
}
