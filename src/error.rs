//! Domain error taxonomy shared by the service, the stores, and the API
//! layer. Every kind maps to a distinct HTTP status and machine-readable
//! code; storage failures are reported separately from domain outcomes and
//! are never interpreted as a successful transition.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde_json::json;
use thiserror::Error;

pub type LeaveResult<T> = Result<T, LeaveError>;

#[derive(Debug, Error)]
pub enum LeaveError {
    /// Referenced request or employee absent.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Caller lacks the role or ownership the operation requires.
    #[error("{0}")]
    Forbidden(&'static str),

    /// Operation not legal for the record's current status; also the
    /// outcome a caller observes after losing a resolution race.
    #[error("{0}")]
    InvalidState(&'static str),

    #[error("start_date cannot be after end_date")]
    InvalidDateRange,

    /// Expected outcome, not a defect: the balance does not cover the
    /// request, at creation time or at the moment of the approval commit.
    #[error("Insufficient leave balance")]
    InsufficientBalance,

    #[error("{0}")]
    Validation(&'static str),

    /// Duplicate registration.
    #[error("{0}")]
    Conflict(&'static str),

    #[error("storage error: {0}")]
    Storage(String),
}

impl LeaveError {
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::InvalidDateRange => "INVALID_DATE_RANGE",
            Self::InsufficientBalance => "INSUFFICIENT_BALANCE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl From<sqlx::Error> for LeaveError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl actix_web::ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::InvalidState(_)
            | Self::InvalidDateRange
            | Self::InsufficientBalance
            | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Self::Storage(detail) = self {
            tracing::error!(error = %detail, "storage failure");
            return HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error",
                "code": self.error_code(),
            }));
        }
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string(),
            "code": self.error_code(),
        }))
    }
}
