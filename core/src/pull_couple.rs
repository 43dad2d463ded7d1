//! Cross-category couple ("pull couple") evaluation.
//!
//! Two partners in different categories may register together when the
//! event's policy is enabled and their distance does not exceed the
//! configured maximum. The couple competes in the more advanced of the two
//! categories: the younger partner is pulled up.

use crate::category::rank;
use crate::error::CategoryError;
use crate::types::{CategoryDefinition, PullCoupleCriterion, PullCouplePolicy};
use serde::{Deserialize, Serialize};

/// One side of a couple as seen by the evaluator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoupleMember<'a> {
    /// Resolved category name
    pub category: &'a str,
    /// Age in whole years, only read by the age criterion
    pub age: u32,
}

impl<'a> CoupleMember<'a> {
    /// Creates a new `CoupleMember`
    #[must_use]
    pub const fn new(category: &'a str, age: u32) -> Self {
        Self { category, age }
    }
}

/// Outcome of a pull-couple evaluation
///
/// `difference` is reported even when the couple is refused so callers can
/// explain the rejection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullCoupleOutcome {
    /// Whether the couple is admissible
    pub allowed: bool,
    /// Category the couple competes in (the higher-ranked of the two)
    pub final_category: String,
    /// Measured distance between partners
    pub difference: u32,
    /// Measure used; `None` when both partners share a category
    pub criterion: Option<PullCoupleCriterion>,
}

impl PullCoupleOutcome {
    /// Whether the partners were in different categories
    #[must_use]
    pub const fn is_cross_category(&self) -> bool {
        self.criterion.is_some()
    }
}

/// Decides whether two partners may register together.
///
/// Equal categories are always allowed with a difference of zero and no
/// policy lookup. Otherwise the difference is measured with the policy's
/// criterion and compared to `max_difference`; a disabled policy refuses the
/// couple but still reports the difference. The result is symmetric in `a`
/// and `b`.
///
/// # Errors
///
/// Returns [`CategoryError::Unknown`] when the partners' categories differ
/// and either one is missing from `ordered`.
pub fn evaluate(
    a: CoupleMember<'_>,
    b: CoupleMember<'_>,
    policy: &PullCouplePolicy,
    ordered: &[CategoryDefinition],
) -> Result<PullCoupleOutcome, CategoryError> {
    if a.category == b.category {
        return Ok(PullCoupleOutcome {
            allowed: true,
            final_category: a.category.to_string(),
            difference: 0,
            criterion: None,
        });
    }

    let rank_a = rank(a.category, ordered)?;
    let rank_b = rank(b.category, ordered)?;

    let difference = match policy.criterion {
        PullCoupleCriterion::Category => {
            u32::try_from(rank_a.abs_diff(rank_b)).unwrap_or(u32::MAX)
        }
        PullCoupleCriterion::Age => a.age.abs_diff(b.age),
    };

    let final_category = if rank_a >= rank_b { a.category } else { b.category };
    let allowed = policy.enabled && difference <= policy.max_difference;

    tracing::trace!(
        category_a = a.category,
        category_b = b.category,
        difference,
        allowed,
        "Evaluated pull couple"
    );

    Ok(PullCoupleOutcome {
        allowed,
        final_category: final_category.to_string(),
        difference,
        criterion: Some(policy.criterion),
    })
}
