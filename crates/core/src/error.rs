use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::EventError;
use crate::storage::RepositoryError;

/// A single invalid input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by the guest service to every transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{message}")]
    BadRequest {
        message: String,
        fields: Vec<FieldError>,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
    #[error("Upstream responded with {status}: {message}")]
    Upstream { status: u16, message: String },
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    /// Builds a `BadRequest` from a list of invalid fields.
    pub fn bad_request(fields: Vec<FieldError>) -> Self {
        Self::BadRequest {
            message: "Bad Request".to_string(),
            fields,
        }
    }

    /// Builds a `BadRequest` for a single invalid field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::bad_request(vec![FieldError::new(field, message)])
    }

    /// HTTP-equivalent status code, shared by the HTTP and gRPC transports.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest { .. } => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
            Self::Upstream { status, .. } => *status,
        }
    }

    /// Field-level errors; empty for everything but `BadRequest`.
    pub fn fields(&self) -> &[FieldError] {
        match self {
            Self::BadRequest { fields, .. } => fields,
            _ => &[],
        }
    }

    /// Message safe to hand back to callers.
    ///
    /// Internal failures never leak their cause.
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Only `NotFound` and `AlreadyExists` survive the service boundary; every
/// other storage failure is internal.
impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err.status_code() {
            404 => Self::NotFound(err.to_string()),
            409 => Self::Conflict(err.to_string()),
            _ => Self::Internal(err.to_string()),
        }
    }
}

impl From<EventError> for ServiceError {
    fn from(err: EventError) -> Self {
        Self::Internal(err.to_string())
    }
}
