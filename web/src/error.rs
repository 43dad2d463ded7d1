//! Error types for web handlers.
//!
//! Engine errors keep their stable code in the JSON body so clients can
//! branch on it, and carry their structured payload under `details`:
//!
//! ```json
//! {
//!   "code": "PULL_COUPLE_DIFFERENCE_EXCEEDED",
//!   "message": "category difference of 2 exceeds the allowed 1",
//!   "details": { "code": "PULL_COUPLE_DIFFERENCE_EXCEEDED", "criterion": "category", "difference": 2, "max_difference": 1 }
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dance_registry_core::{CategoryError, Rejection, TicketError};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Application error type for web handlers.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
    details: Option<Value>,
    /// Logged, never sent
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Error with an explicit status and code
    #[must_use]
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Attach the structured payload of an engine error
    #[must_use]
    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    /// Attach an internal cause
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 `BAD_REQUEST`
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// 404 `NOT_FOUND`, e.g. "Modality Tango not found"
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{resource} {id} not found"),
        )
    }

    /// 500 `INTERNAL_SERVER_ERROR`
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            message,
        )
    }

    /// HTTP status
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                code = %self.code,
                message = %self.message,
                error = ?self.source,
                "Internal server error"
            );
        } else {
            tracing::debug!(status = %self.status, code = %self.code, "Request refused");
        }

        let body = ErrorBody {
            code: self.code,
            message: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

/// Eligibility rejections: 422 with the rule's code.
impl From<Rejection> for AppError {
    fn from(err: Rejection) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err.code(), err.to_string()).with_details(&err)
    }
}

/// Cart and lifecycle errors.
///
/// | error                                                      | status |
/// |------------------------------------------------------------|--------|
/// | illegal transition, invalid state, duplicate, open draft   | 409    |
/// | index out of range, malformed entry, total mismatch, none  | 400    |
/// | empty ticket, group validation, total overflow             | 422    |
impl From<TicketError> for AppError {
    fn from(err: TicketError) -> Self {
        let status = match err {
            TicketError::IllegalTransition { .. }
            | TicketError::InvalidState { .. }
            | TicketError::DuplicateEntry { .. }
            | TicketError::DraftAlreadyOpen => StatusCode::CONFLICT,
            TicketError::IndexOutOfRange { .. }
            | TicketError::MalformedEntry { .. }
            | TicketError::TotalMismatch { .. }
            | TicketError::NoTicket => StatusCode::BAD_REQUEST,
            TicketError::EmptyTicket
            | TicketError::GroupValidation { .. }
            | TicketError::TotalOverflow => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self::new(status, err.code(), err.to_string()).with_details(&err)
    }
}

/// Unknown categories are bad input; a broken ladder is a server fault.
impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::Unknown(_) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNKNOWN_CATEGORY",
                err.to_string(),
            ),
            other => Self::internal("Category configuration is invalid")
                .with_source(anyhow::Error::new(other)),
        }
    }
}
