// src/error.rs
use thiserror::Error;
use warp::http::StatusCode;
use warp::reject::Reject;

/// Faults surfaced at the HTTP boundary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Reject for ApiError {}

/// Generated data that failed its own consistency checks.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    #[error("inconsistent {entity}: {reason}")]
    Inconsistent { entity: &'static str, reason: String },
}

/// Everything that can go wrong for a polling client. Never crosses the
/// boundary; pollers store the message and keep going.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("{0}")]
    Rejected(String),
    #[error("Invalid payload: {0}")]
    Invalid(String),
}
