//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps the use-case errors of `fleet-ops` and the store errors of
//! `fleet-store` to HTTP status codes with a JSON error body. Internal error
//! details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use fleet_core::ValidationError;
use fleet_ops::{LoadError, QueryError, RegistrationError};
use fleet_state::AdmissionError;
use fleet_store::StoreError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// The error.
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "LOADING_REJECTED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Offending values, present for loading refusals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request field failed validation (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// The drone cannot take the item: battery or capacity (422).
    #[error("{0}")]
    Rejected(AdmissionError),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict with the current state of the fleet (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The operation did not finish in time (504).
    #[error("timeout: {0}")]
    Timeout(String),

    /// A dependency is not reachable (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Rejected(_) => (StatusCode::UNPROCESSABLE_ENTITY, "LOADING_REJECTED"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };
        let details = match &self {
            Self::Rejected(err) => serde_json::to_value(err).ok(),
            _ => None,
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            Self::Timeout(_) => tracing::warn!(error = %self, "request timed out"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound(err.to_string()),
            StoreError::Duplicate { .. } | StoreError::Conflict { .. } => {
                Self::Conflict(err.to_string())
            }
            StoreError::Backend(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::DroneNotFound(_) => Self::NotFound(err.to_string()),
            LoadError::InvalidMedicationName(_) | LoadError::InvalidMedication(_) => {
                Self::Validation(err.to_string())
            }
            LoadError::Rejected(rejection) => Self::Rejected(rejection),
            LoadError::InvalidState(_) => Self::Conflict(err.to_string()),
            LoadError::TimedOut(_) => Self::Timeout(err.to_string()),
            LoadError::Store(store) => store.into(),
        }
    }
}

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Invalid(invalid) => invalid.into(),
            RegistrationError::Store(store) => store.into(),
        }
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::DroneNotFound(_) => Self::NotFound(err.to_string()),
            QueryError::Store(store) => store.into(),
        }
    }
}
