//! Eligibility validation for a single registration request.
//!
//! Rules run in a fixed order and the first failure wins:
//!
//! 1. every participant has an academy
//! 2. modality shape (couple needs an opposite-gender partner, solo refuses one)
//! 3. every participant's category is eligible for the modality
//! 4. cross-category couples satisfy the pull-couple policy
//! 5. at least one participant belongs to the registering academy
//! 6. nobody is already registered in the same modality on the ticket
//!
//! On success the verdict carries the [`TicketEntry`] to add to the cart.

use crate::category::{age_on, resolve};
use crate::error::Rejection;
use crate::pull_couple::{evaluate, CoupleMember};
use crate::types::{
    AcademyId, Category, CategoryDefinition, ModalityRule, Participant, PullCouplePolicy,
    TicketEntry,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Participants proposed for one entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRequest {
    /// Solo participant, or first partner of a couple
    pub primary: Participant,
    /// Second partner, for couple modalities
    #[serde(default)]
    pub partner: Option<Participant>,
}

impl EntryRequest {
    /// Request for a solo entry
    #[must_use]
    pub const fn solo(primary: Participant) -> Self {
        Self {
            primary,
            partner: None,
        }
    }

    /// Request for a couple entry
    #[must_use]
    pub const fn couple(primary: Participant, partner: Participant) -> Self {
        Self {
            primary,
            partner: Some(partner),
        }
    }

    fn participants(&self) -> impl Iterator<Item = &Participant> {
        std::iter::once(&self.primary).chain(self.partner.as_ref())
    }
}

/// Accept or reject decision
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Entry may be added to the ticket
    Accepted {
        /// Entry to add
        entry: TicketEntry,
    },
    /// Entry refused
    Rejected {
        /// Failing rule
        reason: Rejection,
    },
}

impl Verdict {
    /// Whether the entry was accepted
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Accepted entry, if any
    #[must_use]
    pub const fn entry(&self) -> Option<&TicketEntry> {
        match self {
            Self::Accepted { entry } => Some(entry),
            Self::Rejected { .. } => None,
        }
    }

    /// Rejection reason, if any
    #[must_use]
    pub const fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected { reason } => Some(reason),
        }
    }

    /// Converts into a `Result`
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] of a rejected verdict.
    pub fn into_result(self) -> Result<TicketEntry, Rejection> {
        match self {
            Self::Accepted { entry } => Ok(entry),
            Self::Rejected { reason } => Err(reason),
        }
    }
}

impl From<Result<TicketEntry, Rejection>> for Verdict {
    fn from(result: Result<TicketEntry, Rejection>) -> Self {
        match result {
            Ok(entry) => Self::Accepted { entry },
            Err(reason) => Self::Rejected { reason },
        }
    }
}

/// Validator for one event's validation session
///
/// Holds the read-only configuration (ladder, policy, reference date) that
/// stays fixed while an academy assembles its ticket. Holds no mutable state:
/// identical arguments always yield identical verdicts.
#[derive(Clone, Copy, Debug)]
pub struct EligibilityValidator<'a> {
    categories: &'a [CategoryDefinition],
    policy: &'a PullCouplePolicy,
    as_of: NaiveDate,
}

struct Classified<'p> {
    participant: &'p Participant,
    category: String,
    age: u32,
}

impl<'a> EligibilityValidator<'a> {
    /// Creates a validator; ages are computed on `as_of`
    #[must_use]
    pub const fn new(
        categories: &'a [CategoryDefinition],
        policy: &'a PullCouplePolicy,
        as_of: NaiveDate,
    ) -> Self {
        Self {
            categories,
            policy,
            as_of,
        }
    }

    /// Decides whether `request` may be added to a ticket already holding
    /// `existing_entries`, on behalf of `inscriber`.
    #[must_use]
    pub fn validate(
        &self,
        request: &EntryRequest,
        existing_entries: &[TicketEntry],
        modality: &ModalityRule,
        inscriber: AcademyId,
    ) -> Verdict {
        let verdict: Verdict = self
            .check(request, existing_entries, modality, inscriber)
            .into();

        match &verdict {
            Verdict::Accepted { entry } => tracing::debug!(
                modality = %modality.name,
                category = %entry.category,
                pull_couple = entry.is_pull_couple,
                "Entry accepted"
            ),
            Verdict::Rejected { reason } => tracing::debug!(
                modality = %modality.name,
                code = reason.code(),
                reason = %reason,
                "Entry rejected"
            ),
        }

        verdict
    }

    fn check(
        &self,
        request: &EntryRequest,
        existing_entries: &[TicketEntry],
        modality: &ModalityRule,
        inscriber: AcademyId,
    ) -> Result<TicketEntry, Rejection> {
        // 1. Academy on file
        for participant in request.participants() {
            if participant.academy.is_none() {
                return Err(Rejection::ParticipantWithoutAcademy {
                    participant: participant.full_name(),
                });
            }
        }

        // 2. Modality shape
        Self::check_shape(request, modality)?;

        // 3. Categories
        let primary = self.classify(&request.primary, modality)?;
        let partner = request
            .partner
            .as_ref()
            .map(|p| self.classify(p, modality))
            .transpose()?;

        // 4. Pull couple
        let (category, is_pull_couple) = match &partner {
            Some(partner) if partner.category != primary.category => {
                (self.check_pull_couple(&primary, partner)?, true)
            }
            _ => (primary.category.clone(), false),
        };

        // 5. Affiliation
        if !request.participants().any(|p| p.belongs_to(inscriber)) {
            return Err(Rejection::NoAffiliatedParticipant {
                academies: request
                    .participants()
                    .filter_map(|p| p.academy.as_ref().map(|a| a.name.clone()))
                    .collect(),
            });
        }

        // 6. Duplicates within the modality
        let same_modality: Vec<&TicketEntry> = existing_entries
            .iter()
            .filter(|e| e.modality == modality.name)
            .collect();
        for participant in request.participants() {
            if same_modality.iter().any(|e| e.includes(participant.id)) {
                return Err(Rejection::DuplicateRegistration {
                    participant: participant.full_name(),
                    modality: modality.name.clone(),
                });
            }
        }

        // 7. Build entry
        let participant_ids = request.participants().map(|p| p.id).collect();
        let academy_ids: BTreeSet<AcademyId> =
            request.participants().filter_map(Participant::academy_id).collect();

        Ok(TicketEntry {
            modality: modality.name.clone(),
            category,
            is_pull_couple,
            participant_ids,
            academy_ids,
            amount: modality.price_per_entry,
        })
    }

    fn check_shape(request: &EntryRequest, modality: &ModalityRule) -> Result<(), Rejection> {
        match (&request.partner, modality.requires_couple) {
            (None, true) => Err(Rejection::PartnerRequired {
                modality: modality.name.clone(),
            }),
            (Some(partner), true) if partner.gender == request.primary.gender => {
                Err(Rejection::SameGenderCouple {
                    modality: modality.name.clone(),
                })
            }
            (Some(_), false) => Err(Rejection::PartnerNotAllowed {
                modality: modality.name.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn classify<'p>(
        &self,
        participant: &'p Participant,
        modality: &ModalityRule,
    ) -> Result<Classified<'p>, Rejection> {
        let unclassified = || Rejection::UnclassifiedParticipant {
            participant: participant.full_name(),
        };

        let age = age_on(participant.birth_date, self.as_of).ok_or_else(unclassified)?;
        let Category::Named(category) =
            resolve(participant.birth_date, self.as_of, self.categories)
        else {
            return Err(unclassified());
        };

        if !modality.allows(&category) {
            return Err(Rejection::CategoryNotAllowed {
                participant: participant.full_name(),
                category,
                modality: modality.name.clone(),
            });
        }

        Ok(Classified {
            participant,
            category,
            age,
        })
    }

    fn check_pull_couple(
        &self,
        a: &Classified<'_>,
        b: &Classified<'_>,
    ) -> Result<String, Rejection> {
        if !self.policy.enabled {
            return Err(Rejection::PullCoupleDisabled {
                category_a: a.category.clone(),
                category_b: b.category.clone(),
            });
        }

        let outcome = evaluate(
            CoupleMember::new(&a.category, a.age),
            CoupleMember::new(&b.category, b.age),
            self.policy,
            self.categories,
        )
        .map_err(|err| Rejection::UnknownCategory {
            category: match err {
                crate::error::CategoryError::Unknown(name) => name,
                other => other.to_string(),
            },
        })?;

        if !outcome.allowed {
            return Err(Rejection::PullCoupleDifferenceExceeded {
                criterion: self.policy.criterion,
                difference: outcome.difference,
                max_difference: self.policy.max_difference,
            });
        }

        tracing::debug!(
            primary = %a.participant.full_name(),
            partner = %b.participant.full_name(),
            final_category = %outcome.final_category,
            "Pull couple admitted"
        );

        Ok(outcome.final_category)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Academy, Gender, Money, ParticipantId, PullCoupleCriterion};

    fn ladder() -> Vec<CategoryDefinition> {
        vec![
            CategoryDefinition::new("Baby", 0, 5),
            CategoryDefinition::new("Mini", 6, 8),
            CategoryDefinition::new("Pre-Infantil", 9, 11),
            CategoryDefinition::new("Infantil", 12, 14),
            CategoryDefinition::new("Juvenil", 15, 17),
            CategoryDefinition::new("Adulto", 18, 35),
        ]
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
    }

    fn dancer(age: i32, gender: Gender, academy: Option<&Academy>) -> Participant {
        Participant {
            id: ParticipantId::new(),
            first_name: "Dancer".to_string(),
            last_name: format!("{age}"),
            dni: format!("7{age:07}"),
            birth_date: NaiveDate::from_ymd_opt(2024 - age, 3, 1).unwrap(),
            gender,
            academy: academy.cloned(),
        }
    }

    fn home() -> Academy {
        Academy::new(AcademyId::new(), "Salsa Norte".to_string())
    }

    fn solo(allowed: &[&str]) -> ModalityRule {
        ModalityRule {
            name: "Individual".to_string(),
            price_per_entry: Money::from_cents(2000),
            requires_couple: false,
            allowed_categories: allowed.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn couple() -> ModalityRule {
        ModalityRule {
            name: "Pareja".to_string(),
            price_per_entry: Money::from_cents(3500),
            requires_couple: true,
            allowed_categories: BTreeSet::new(),
        }
    }

    const fn enabled(max: u32) -> PullCouplePolicy {
        PullCouplePolicy {
            enabled: true,
            criterion: PullCoupleCriterion::Category,
            max_difference: max,
        }
    }

    #[test]
    fn test_solo_accepted() {
        let academy = home();
        let defs = ladder();
        let policy = PullCouplePolicy::default();
        let validator = EligibilityValidator::new(&defs, &policy, as_of());

        let verdict = validator.validate(
            &EntryRequest::solo(dancer(16, Gender::Female, Some(&academy))),
            &[],
            &solo(&["Juvenil"]),
            academy.id,
        );

        let entry = verdict.entry().unwrap();
        assert_eq!(entry.category, "Juvenil");
        assert!(!entry.is_pull_couple);
        assert_eq!(entry.amount, Money::from_cents(2000));
        assert_eq!(entry.academy_ids, BTreeSet::from([academy.id]));
    }

    #[test]
    fn test_missing_academy_checked_first() {
        let defs = ladder();
        let policy = PullCouplePolicy::default();
        let validator = EligibilityValidator::new(&defs, &policy, as_of());

        // Also the wrong category, but the academy rule runs first
        let verdict = validator.validate(
            &EntryRequest::solo(dancer(40, Gender::Male, None)),
            &[],
            &solo(&["Juvenil"]),
            AcademyId::new(),
        );
        assert_eq!(verdict.rejection().unwrap().code(), "PARTICIPANT_WITHOUT_ACADEMY");
    }

    #[test]
    fn test_couple_requires_partner() {
        let academy = home();
        let defs = ladder();
        let policy = PullCouplePolicy::default();
        let validator = EligibilityValidator::new(&defs, &policy, as_of());

        let verdict = validator.validate(
            &EntryRequest::solo(dancer(16, Gender::Female, Some(&academy))),
            &[],
            &couple(),
            academy.id,
        );
        assert_eq!(verdict.rejection().unwrap().code(), "PARTNER_REQUIRED");
    }

    #[test]
    fn test_same_gender_couple_rejected() {
        let academy = home();
        let defs = ladder();
        let policy = PullCouplePolicy::default();
        let validator = EligibilityValidator::new(&defs, &policy, as_of());

        let verdict = validator.validate(
            &EntryRequest::couple(
                dancer(16, Gender::Female, Some(&academy)),
                dancer(16, Gender::Female, Some(&academy)),
            ),
            &[],
            &couple(),
            academy.id,
        );
        assert_eq!(verdict.rejection().unwrap().code(), "SAME_GENDER_COUPLE");
    }

    #[test]
    fn test_solo_refuses_partner() {
        let academy = home();
        let defs = ladder();
        let policy = PullCouplePolicy::default();
        let validator = EligibilityValidator::new(&defs, &policy, as_of());

        let verdict = validator.validate(
            &EntryRequest::couple(
                dancer(16, Gender::Female, Some(&academy)),
                dancer(16, Gender::Male, Some(&academy)),
            ),
            &[],
            &solo(&[]),
            academy.id,
        );
        assert_eq!(verdict.rejection().unwrap().code(), "PARTNER_NOT_ALLOWED");
    }

    #[test]
    fn test_category_not_allowed_names_category() {
        let academy = home();
        let defs = ladder();
        let policy = PullCouplePolicy::default();
        let validator = EligibilityValidator::new(&defs, &policy, as_of());

        let verdict = validator.validate(
            &EntryRequest::solo(dancer(13, Gender::Female, Some(&academy))),
            &[],
            &solo(&["Juvenil"]),
            academy.id,
        );
        let reason = verdict.rejection().unwrap();
        assert_eq!(reason.code(), "CATEGORY_NOT_ALLOWED");
        assert!(reason.to_string().contains("Infantil"));
    }

    #[test]
    fn test_unclassified_is_ineligible_even_when_all_allowed() {
        let academy = home();
        let defs = ladder();
        let policy = PullCouplePolicy::default();
        let validator = EligibilityValidator::new(&defs, &policy, as_of());

        let verdict = validator.validate(
            &EntryRequest::solo(dancer(70, Gender::Male, Some(&academy))),
            &[],
            &solo(&[]),
            academy.id,
        );
        assert_eq!(verdict.rejection().unwrap().code(), "UNCLASSIFIED_PARTICIPANT");
    }

    #[test]
    fn test_pull_couple_admitted_under_higher_category() {
        let academy = home();
        let defs = ladder();
        let policy = enabled(1);
        let validator = EligibilityValidator::new(&defs, &policy, as_of());

        let verdict = validator.validate(
            &EntryRequest::couple(
                dancer(13, Gender::Female, Some(&academy)),
                dancer(16, Gender::Male, Some(&academy)),
            ),
            &[],
            &couple(),
            academy.id,
        );
        let entry = verdict.entry().unwrap();
        assert_eq!(entry.category, "Juvenil");
        assert!(entry.is_pull_couple);
        assert_eq!(entry.amount, Money::from_cents(3500));
        assert_eq!(entry.participant_ids.len(), 2);
    }

    #[test]
    fn test_pull_couple_disabled() {
        let academy = home();
        let defs = ladder();
        let policy = PullCouplePolicy::default();
        let validator = EligibilityValidator::new(&defs, &policy, as_of());

        let verdict = validator.validate(
            &EntryRequest::couple(
                dancer(13, Gender::Female, Some(&academy)),
                dancer(16, Gender::Male, Some(&academy)),
            ),
            &[],
            &couple(),
            academy.id,
        );
        assert_eq!(verdict.rejection().unwrap().code(), "PULL_COUPLE_DISABLED");
    }

    #[test]
    fn test_pull_couple_difference_in_message() {
        let academy = home();
        let defs = ladder();
        let policy = enabled(1);
        let validator = EligibilityValidator::new(&defs, &policy, as_of());

        let verdict = validator.validate(
            &EntryRequest::couple(
                dancer(10, Gender::Female, Some(&academy)),
                dancer(20, Gender::Male, Some(&academy)),
            ),
            &[],
            &couple(),
            academy.id,
        );
        let reason = verdict.rejection().unwrap();
        assert_eq!(
            *reason,
            Rejection::PullCoupleDifferenceExceeded {
                criterion: PullCoupleCriterion::Category,
                difference: 3,
                max_difference: 1,
            }
        );
    }

    #[test]
    fn test_pull_couple_by_age_through_validator() {
        let academy = home();
        let defs = ladder();
        let couple_of = || {
            EntryRequest::couple(
                dancer(14, Gender::Female, Some(&academy)),
                dancer(15, Gender::Male, Some(&academy)),
            )
        };

        let lenient = PullCouplePolicy {
            criterion: PullCoupleCriterion::Age,
            ..enabled(1)
        };
        let verdict = EligibilityValidator::new(&defs, &lenient, as_of()).validate(
            &couple_of(),
            &[],
            &couple(),
            academy.id,
        );
        let entry = verdict.entry().unwrap();
        assert!(entry.is_pull_couple);
        assert_eq!(entry.category, "Juvenil");

        let strict = PullCouplePolicy {
            criterion: PullCoupleCriterion::Age,
            ..enabled(0)
        };
        let verdict = EligibilityValidator::new(&defs, &strict, as_of()).validate(
            &couple_of(),
            &[],
            &couple(),
            academy.id,
        );
        assert_eq!(
            *verdict.rejection().unwrap(),
            Rejection::PullCoupleDifferenceExceeded {
                criterion: PullCoupleCriterion::Age,
                difference: 1,
                max_difference: 0,
            }
        );
    }

    #[test]
    fn test_one_affiliated_partner_is_enough() {
        let academy = home();
        let other = Academy::new(AcademyId::new(), "Ritmo Sur".to_string());
        let defs = ladder();
        let policy = PullCouplePolicy::default();
        let validator = EligibilityValidator::new(&defs, &policy, as_of());

        let verdict = validator.validate(
            &EntryRequest::couple(
                dancer(16, Gender::Female, Some(&other)),
                dancer(16, Gender::Male, Some(&academy)),
            ),
            &[],
            &couple(),
            academy.id,
        );
        let entry = verdict.entry().unwrap();
        assert_eq!(entry.academy_ids.len(), 2);
    }

    #[test]
    fn test_duplicate_partner_in_same_modality() {
        let academy = home();
        let defs = ladder();
        let policy = PullCouplePolicy::default();
        let validator = EligibilityValidator::new(&defs, &policy, as_of());
        let her = dancer(16, Gender::Female, Some(&academy));
        let him = dancer(16, Gender::Male, Some(&academy));
        let other_him = dancer(17, Gender::Male, Some(&academy));

        let first = validator
            .validate(&EntryRequest::couple(her.clone(), him), &[], &couple(), academy.id)
            .into_result()
            .unwrap();

        let verdict = validator.validate(
            &EntryRequest::couple(other_him, her),
            &[first],
            &couple(),
            academy.id,
        );
        assert_eq!(verdict.rejection().unwrap().code(), "DUPLICATE_REGISTRATION");
    }

    #[test]
    fn test_same_participant_other_modality_is_fine() {
        let academy = home();
        let defs = ladder();
        let policy = PullCouplePolicy::default();
        let validator = EligibilityValidator::new(&defs, &policy, as_of());
        let her = dancer(16, Gender::Female, Some(&academy));

        let solo_entry = validator
            .validate(&EntryRequest::solo(her.clone()), &[], &solo(&[]), academy.id)
            .into_result()
            .unwrap();

        let verdict = validator.validate(
            &EntryRequest::couple(her, dancer(16, Gender::Male, Some(&academy))),
            &[solo_entry],
            &couple(),
            academy.id,
        );
        assert!(verdict.is_accepted());
    }
}
