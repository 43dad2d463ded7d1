//! # Dance Registry Testing
//!
//! Testing utilities for the dance registry engine.
//!
//! This crate provides:
//! - A fixed clock for the reducer environment
//! - Fixture builders for participants, academies, ladders, and modalities
//! - `proptest` strategies for dates, amounts, and ticket states
//! - A Given-When-Then harness for reducers
//!
//! ## Example
//!
//! ```ignore
//! use dance_registry_testing::fixtures::{self, ParticipantBuilder};
//!
//! let academy = fixtures::academy("Salsa Norte");
//! let dancer = ParticipantBuilder::new("Lucia", "Rojas").aged(16).female().academy(&academy).build();
//! let validator = EligibilityValidator::new(&ladder, &policy, fixtures::competition_day());
//! ```

use chrono::{DateTime, Utc};
use dance_registry_core::environment::Clock;


/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use dance_registry_testing::mocks::FixedClock;
    /// use dance_registry_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

/// Fixture builders
///
/// Ages are relative to [`fixtures::competition_day`], the date of
/// [`mocks::test_clock`].
pub mod fixtures {
    use chrono::NaiveDate;
    use dance_registry_core::environment::Clock;
    use dance_registry_core::types::{
        Academy, AcademyId, CategoryDefinition, EventId, Gender, ModalityRule, Money,
        Participant, ParticipantId, PullCoupleCriterion, PullCouplePolicy, Ticket, TicketId,
        UserId,
    };
    use std::collections::BTreeSet;

    /// 2025-01-01
    ///
    /// # Panics
    ///
    /// Never, the date is hardcoded.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn competition_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).expect("hardcoded date is valid")
    }

    /// Seven-bracket ladder covering ages 0 to 120
    ///
    /// | index | name         | ages    |
    /// |-------|--------------|---------|
    /// | 0     | Baby         | 0-5     |
    /// | 1     | Mini         | 6-8     |
    /// | 2     | Pre-Infantil | 9-11    |
    /// | 3     | Infantil     | 12-14   |
    /// | 4     | Juvenil      | 15-17   |
    /// | 5     | Adulto       | 18-35   |
    /// | 6     | Senior       | 36-120  |
    #[must_use]
    pub fn standard_ladder() -> Vec<CategoryDefinition> {
        vec![
            CategoryDefinition::new("Baby", 0, 5),
            CategoryDefinition::new("Mini", 6, 8),
            CategoryDefinition::new("Pre-Infantil", 9, 11),
            CategoryDefinition::new("Infantil", 12, 14),
            CategoryDefinition::new("Juvenil", 15, 17),
            CategoryDefinition::new("Adulto", 18, 35),
            CategoryDefinition::new("Senior", 36, 120),
        ]
    }

    /// Academy with a fresh id
    #[must_use]
    pub fn academy(name: &str) -> Academy {
        Academy::new(AcademyId::new(), name.to_string())
    }

    /// Solo modality; an empty `allowed` admits every category
    #[must_use]
    pub fn solo_modality(name: &str, cents: u64, allowed: &[&str]) -> ModalityRule {
        ModalityRule {
            name: name.to_string(),
            price_per_entry: Money::from_cents(cents),
            requires_couple: false,
            allowed_categories: allowed.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    /// Couple modality open to every category
    #[must_use]
    pub fn couple_modality(name: &str, cents: u64) -> ModalityRule {
        ModalityRule {
            name: name.to_string(),
            price_per_entry: Money::from_cents(cents),
            requires_couple: true,
            allowed_categories: BTreeSet::new(),
        }
    }

    /// Enabled pull-couple policy
    #[must_use]
    pub const fn pull_couple(criterion: PullCoupleCriterion, max_difference: u32) -> PullCouplePolicy {
        PullCouplePolicy {
            enabled: true,
            criterion,
            max_difference,
        }
    }

    /// Empty draft opened on the competition day
    #[must_use]
    pub fn draft_ticket(event_id: EventId, academy_id: AcademyId) -> Ticket {
        Ticket::draft(
            TicketId::new(),
            event_id,
            academy_id,
            UserId::new(),
            crate::mocks::test_clock().now(),
        )
    }

    /// Builder for [`Participant`] snapshots
    #[derive(Clone, Debug)]
    pub struct ParticipantBuilder {
        participant: Participant,
    }

    impl ParticipantBuilder {
        /// Female, aged 16, no academy
        #[must_use]
        pub fn new(first_name: &str, last_name: &str) -> Self {
            let id = ParticipantId::new();
            Self {
                participant: Participant {
                    id,
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                    dni: format!("{:08}", id.as_uuid().as_u128() % 100_000_000),
                    birth_date: born_aged(16),
                    gender: Gender::Female,
                    academy: None,
                },
            }
        }

        /// Whole years of age on the competition day
        #[must_use]
        pub fn aged(mut self, years: u32) -> Self {
            self.participant.birth_date = born_aged(years);
            self
        }

        /// Female
        #[must_use]
        pub fn female(mut self) -> Self {
            self.participant.gender = Gender::Female;
            self
        }

        /// Male
        #[must_use]
        pub fn male(mut self) -> Self {
            self.participant.gender = Gender::Male;
            self
        }

        /// Affiliated with `academy`
        #[must_use]
        pub fn academy(mut self, academy: &Academy) -> Self {
            self.participant.academy = Some(academy.clone());
            self
        }

        /// Finished snapshot
        #[must_use]
        pub fn build(self) -> Participant {
            self.participant
        }
    }

    // Mid-year birthday, so the age on the competition day is exact.
    fn born_aged(years: u32) -> NaiveDate {
        let year = 2024 - i32::try_from(years).unwrap_or(i32::MAX / 2);
        NaiveDate::from_ymd_opt(year, 6, 15).unwrap_or(NaiveDate::MIN)
    }
}

/// Property-based testing utilities
pub mod properties {
    use chrono::{Duration, NaiveDate};
    use dance_registry_core::types::{Money, TicketStatus};
    use proptest::prelude::*;

    /// Birth dates from `as_of` back to `max_days` days earlier
    pub fn birth_date_before(as_of: NaiveDate, max_days: i64) -> impl Strategy<Value = NaiveDate> {
        (0..=max_days).prop_map(move |days| as_of - Duration::days(days))
    }

    /// Entry prices up to 1000.00
    pub fn price() -> impl Strategy<Value = Money> {
        (0u64..=100_000).prop_map(Money::from_cents)
    }

    /// Any lifecycle state
    pub fn ticket_status() -> impl Strategy<Value = TicketStatus> {
        prop_oneof![
            Just(TicketStatus::Draft),
            Just(TicketStatus::Pending),
            Just(TicketStatus::Confirmed),
            Just(TicketStatus::Cancelled),
        ]
    }

    /// Cart edit script: `Ok(price)` adds, `Err(index)` removes
    pub fn cart_ops(max_len: usize) -> impl Strategy<Value = Vec<Result<Money, usize>>> {
        prop::collection::vec(
            prop_oneof![price().prop_map(Ok), (0usize..16).prop_map(Err)],
            0..max_len,
        )
    }
}

/// Installs a test-friendly `tracing` subscriber once per process.
///
/// Honors `RUST_LOG`; repeated calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dance_registry_core=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock};
pub use reducer_test::{assertions, ReducerTest};
