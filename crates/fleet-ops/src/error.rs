//! # Use-Case Errors
//!
//! One error type per use-case. Store `NotFound` is lifted into each
//! use-case's own `DroneNotFound` so callers never match on store internals
//! for the common case.

use std::time::Duration;

use thiserror::Error;

use fleet_core::{DroneId, ValidationError};
use fleet_state::{AdmissionError, DroneError, LifecycleError};
use fleet_store::StoreError;

/// Errors from the medication loading workflow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// No drone with this identifier.
    #[error("drone {0} not found")]
    DroneNotFound(DroneId),

    /// The name contains characters outside `[a-zA-Z0-9_.-]`.
    #[error("invalid medication name \"{0}\": only letters, digits, '-', '_' and '.' are allowed")]
    InvalidMedicationName(String),

    /// Another medication field is invalid.
    #[error("invalid medication: {0}")]
    InvalidMedication(ValidationError),

    /// Battery minimum or weight capacity refused the item.
    #[error(transparent)]
    Rejected(#[from] AdmissionError),

    /// The drone's current state does not allow loading.
    #[error("drone cannot be loaded: {0}")]
    InvalidState(#[from] LifecycleError),

    /// The load did not finish within the caller's limit. Nothing was saved.
    #[error("loading did not finish within {0:?}")]
    TimedOut(Duration),

    /// The store failed, or the drone kept changing under the workflow.
    #[error(transparent)]
    Store(StoreError),
}

impl LoadError {
    /// Short machine-readable label, used as a metrics dimension.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::DroneNotFound(_) => "drone_not_found",
            Self::InvalidMedicationName(_) | Self::InvalidMedication(_) => "invalid_medication",
            Self::Rejected(AdmissionError::InsufficientBattery { .. }) => "low_battery",
            Self::Rejected(AdmissionError::CapacityExceeded { .. }) => "overweight",
            Self::InvalidState(_) => "invalid_state",
            Self::TimedOut(_) => "timed_out",
            Self::Store(StoreError::Duplicate { .. }) => "duplicate",
            Self::Store(StoreError::Conflict { .. }) => "contended",
            Self::Store(_) => "store",
        }
    }
}

impl From<StoreError> for LoadError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::DroneNotFound(id),
            other => Self::Store(other),
        }
    }
}

impl From<DroneError> for LoadError {
    fn from(err: DroneError) -> Self {
        match err {
            DroneError::Admission(e) => Self::Rejected(e),
            DroneError::Lifecycle(e) => Self::InvalidState(e),
            other => Self::Store(StoreError::Backend(other.to_string())),
        }
    }
}

impl From<ValidationError> for LoadError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidMedicationName(name) => Self::InvalidMedicationName(name),
            other => Self::InvalidMedication(other),
        }
    }
}

/// Errors from drone registration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A field is out of range or malformed.
    #[error("invalid drone registration: {0}")]
    Invalid(#[from] ValidationError),

    /// The store refused the drone, e.g. a duplicate serial number.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from read-only fleet queries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// No drone with this identifier.
    #[error("drone {0} not found")]
    DroneNotFound(DroneId),

    /// The store failed.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for QueryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::DroneNotFound(id),
            other => Self::Store(other),
        }
    }
}
