//! Category resolution endpoint.
//!
//! - POST /api/v1/categories/resolve - Resolve a birth date against the ladder

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, Json};
use chrono::NaiveDate;
use dance_registry_core::category::{age_on, resolve};
use dance_registry_core::types::Category;
use serde::{Deserialize, Serialize};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to resolve a category.
#[derive(Debug, Deserialize)]
pub struct ResolveCategoryRequest {
    /// Participant birth date
    pub birth_date: NaiveDate,
    /// Reference date; defaults to today
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

/// Resolved category.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveCategoryResponse {
    /// Named bracket or `unclassified`
    pub category: Category,
    /// Age on the reference date, absent for future birth dates
    pub age: Option<u32>,
    /// Reference date used
    pub as_of: NaiveDate,
}

// ============================================================================
// Handlers
// ============================================================================

/// Resolve the category of a birth date.
///
/// Never fails: an age outside every bracket yields `unclassified`.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/v1/categories/resolve \
///   -H "Content-Type: application/json" \
///   -d '{ "birth_date": "2010-03-02", "as_of": "2025-06-01" }'
/// ```
#[allow(clippy::unused_async)]
pub async fn resolve_category(
    State(state): State<AppState>,
    Json(request): Json<ResolveCategoryRequest>,
) -> Result<Json<ResolveCategoryResponse>, AppError> {
    let as_of = request.as_of.unwrap_or_else(|| state.today());
    let category = resolve(request.birth_date, as_of, state.catalog.categories());

    Ok(Json(ResolveCategoryResponse {
        category,
        age: age_on(request.birth_date, as_of),
        as_of,
    }))
}
