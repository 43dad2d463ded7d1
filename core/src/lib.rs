//! # Dance Registry Core
//!
//! Group registration engine for dance competitions.
//!
//! An academy assembles one ticket per event: every proposed entry (a solo
//! dancer or a couple in a modality) is checked by the eligibility validator,
//! accepted entries go into a draft cart, and the draft is then submitted,
//! confirmed, or cancelled.
//!
//! ## Layout
//!
//! - [`category`]: age to category resolution
//! - [`pull_couple`]: cross-category couple evaluation
//! - [`eligibility`]: ordered accept/reject rules for one entry
//! - [`cart`]: draft editing with running totals
//! - [`lifecycle`]: `Draft -> Pending -> Confirmed | Cancelled`
//! - [`ticket`]: reducer tying cart and lifecycle to commands and events
//! - [`catalog`]: collaborator traits (event rules, participant directory)
//!
//! Everything except the [`environment::Clock`] is a pure function of its
//! arguments: callers supply the category ladder, the modality rules, the
//! participant snapshots, and the current time.
//!
//! ## Example
//!
//! ```ignore
//! use dance_registry_core::eligibility::{EligibilityValidator, EntryRequest};
//!
//! let validator = EligibilityValidator::new(&ladder, &policy, today);
//! let verdict = validator.validate(&EntryRequest::solo(dancer), &ticket.entries, &modality, academy_id);
//! let ticket = cart::add_entry(&ticket, verdict.into_result()?)?;
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

pub mod cart;
pub mod catalog;
pub mod category;
pub mod eligibility;
pub mod error;
pub mod lifecycle;
pub mod pull_couple;
pub mod ticket;
pub mod types;

pub use error::{CategoryError, Rejection, TicketError};

/// Reducer module - the seam between commands and state
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait
    ///
    /// A reducer validates an action against the current state, updates the
    /// state in place, and returns descriptions of side effects for the shell
    /// to run. It performs no I/O itself.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
pub mod effect {
    /// Describes a side effect to be executed by the shell
    ///
    /// Effects are values: returning one from a reducer does nothing until
    /// the caller interprets it.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Publish an event to downstream consumers
        Emit(Action),
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Self>) -> Self {
            Self::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Self>) -> Self {
            Self::Sequential(effects)
        }

        /// Every emitted action, depth first
        #[must_use]
        pub fn emitted(&self) -> Vec<&Action> {
            match self {
                Self::None => Vec::new(),
                Self::Emit(action) => vec![action],
                Self::Parallel(effects) | Self::Sequential(effects) => {
                    effects.iter().flat_map(Self::emitted).collect()
                }
            }
        }
    }
}

/// Environment module - dependency injection traits
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
