//! Age to category resolution.
//!
//! A category ladder is an ordered slice of [`CategoryDefinition`]s with
//! contiguous, increasing age brackets. The slice order is the rank used by
//! the pull-couple rule.

use crate::error::CategoryError;
use crate::types::{Category, CategoryDefinition};
use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;

/// Age in whole years on `as_of`.
///
/// A birthday not yet reached in the `as_of` year does not count. Returns
/// `None` when `birth_date` is after `as_of`.
#[must_use]
pub fn age_on(birth_date: NaiveDate, as_of: NaiveDate) -> Option<u32> {
    let mut years = as_of.year() - birth_date.year();
    if (as_of.month(), as_of.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// First bracket containing `age`, scanning in ladder order.
#[must_use]
pub fn resolve_age(age: u32, definitions: &[CategoryDefinition]) -> Category {
    definitions
        .iter()
        .find(|d| d.contains(age))
        .map_or(Category::Unclassified, |d| Category::Named(d.name.clone()))
}

/// Category for a birth date on `as_of`.
///
/// Never fails: an empty ladder, an age outside every bracket, or a birth
/// date in the future all yield [`Category::Unclassified`].
#[must_use]
pub fn resolve(
    birth_date: NaiveDate,
    as_of: NaiveDate,
    definitions: &[CategoryDefinition],
) -> Category {
    age_on(birth_date, as_of).map_or(Category::Unclassified, |age| {
        resolve_age(age, definitions)
    })
}

/// Ladder position of a category name.
#[must_use]
pub fn index_of(name: &str, definitions: &[CategoryDefinition]) -> Option<usize> {
    definitions.iter().position(|d| d.name == name)
}

/// Ladder position of a category name, failing on unknown names.
///
/// # Errors
///
/// Returns [`CategoryError::Unknown`] when `name` is not in the ladder.
pub fn rank(name: &str, definitions: &[CategoryDefinition]) -> Result<usize, CategoryError> {
    index_of(name, definitions).ok_or_else(|| CategoryError::Unknown(name.to_string()))
}

/// Checks that brackets are well formed, contiguous, increasing, and uniquely named.
///
/// An empty ladder is valid (everyone resolves to `Unclassified`).
///
/// # Errors
///
/// Returns the first [`CategoryError`] found, scanning in ladder order.
pub fn validate_ladder(definitions: &[CategoryDefinition]) -> Result<(), CategoryError> {
    let mut names = HashSet::new();
    let mut previous: Option<&CategoryDefinition> = None;

    for definition in definitions {
        if !names.insert(definition.name.as_str()) {
            return Err(CategoryError::DuplicateName(definition.name.clone()));
        }
        if definition.min_age > definition.max_age {
            return Err(CategoryError::InvertedRange {
                name: definition.name.clone(),
                min_age: definition.min_age,
                max_age: definition.max_age,
            });
        }
        if let Some(prev) = previous {
            let expected = prev.max_age.saturating_add(1);
            if definition.min_age != expected {
                return Err(CategoryError::NotContiguous {
                    name: definition.name.clone(),
                    expected,
                    found: definition.min_age,
                });
            }
        }
        previous = Some(definition);
    }

    Ok(())
}
