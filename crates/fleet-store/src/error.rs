//! # Store Errors

use thiserror::Error;

use fleet_core::DroneId;

/// Errors returned by [`DroneStore`](crate::DroneStore) and
/// [`LogStore`](crate::LogStore) implementations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No drone with this identifier exists.
    #[error("drone {0} not found")]
    NotFound(DroneId),

    /// A value that must be unique across the fleet is already taken.
    #[error("{field} \"{value}\" already exists")]
    Duplicate {
        /// Which unique field clashed ("serial number", "medication code", ...).
        field: &'static str,
        /// The clashing value.
        value: String,
    },

    /// The drone was saved by someone else since it was read.
    #[error("drone {id} was modified concurrently: expected version {expected}, found {actual}")]
    Conflict {
        /// Drone identifier.
        id: DroneId,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// The storage backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.to_string())
    }
}
