//! HTTP shell for the group registration engine.
//!
//! Implements the "Functional Core, Imperative Shell" split: handlers parse
//! JSON, look rules up in the event catalog, run the pure core functions and
//! the ticket reducer, and map the outcome to a response.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Look up** modality rules and policy in the catalog
//! 3. **Validate** the entry with the eligibility validator
//! 4. **Dispatch** a `TicketAction` through the `TicketReducer`
//! 5. **Map** `last_error` or the emitted events to an HTTP response
//!
//! No ticket is stored server-side; clients carry the snapshot.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use config::Config;
pub use error::AppError;
pub use router::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
