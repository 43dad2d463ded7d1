//! Application state for Axum handlers.
//!
//! The shell holds read-only configuration only. Tickets and participants
//! travel in request bodies and are never stored here.

use chrono::NaiveDate;
use dance_registry_core::catalog::InMemoryCatalog;
use dance_registry_core::environment::{Clock, SystemClock};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Event catalog (category ladder, policies, modalities)
    pub catalog: Arc<InMemoryCatalog>,
    /// Clock for timestamps and the default validation date
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create a new application state on the system clock.
    #[must_use]
    pub fn new(catalog: InMemoryCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Today's date on the clock, used when a request omits `as_of`.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }
}
