//! # Validation Errors
//!
//! Every newtype in this crate validates its input at construction time.
//! A failed construction returns a [`ValidationError`] that carries the
//! rejected value and the accepted range, so an operator reading the log
//! can tell exactly what was wrong without reproducing the request.

use thiserror::Error;

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Serial number length is outside the accepted range.
    #[error("invalid serial number \"{value}\": length must be between {min} and {max} characters")]
    InvalidSerialNumber {
        /// The rejected serial number.
        value: String,
        /// Minimum accepted length.
        min: usize,
        /// Maximum accepted length.
        max: usize,
    },

    /// Medication name contains a character outside `[a-zA-Z0-9_.-]`.
    #[error("invalid medication name \"{0}\": only letters, digits, '-', '_' and '.' are allowed")]
    InvalidMedicationName(String),

    /// Medication code is empty.
    #[error("invalid medication code: must be non-empty")]
    EmptyMedicationCode,

    /// Battery charge is outside 0..=100.
    #[error("invalid battery level {0}: must be between 0 and 100")]
    InvalidBattery(i64),

    /// Weight is outside its accepted range.
    #[error("invalid {field} {value}g: must be between {min}g and {max}g")]
    WeightOutOfRange {
        /// Which weight was rejected ("weight limit", "medication weight").
        field: &'static str,
        /// The rejected value in grams.
        value: i64,
        /// Minimum accepted grams.
        min: u32,
        /// Maximum accepted grams.
        max: u32,
    },

    /// Drone model is not one of the known models.
    #[error("unknown drone model \"{0}\" (expected Lightweight, Middleweight, Cruiserweight or Heavyweight)")]
    UnknownModel(String),

    /// Drone state is not one of the lifecycle states.
    #[error("unknown drone state \"{0}\" (expected IDLE, LOADING, LOADED, DELIVERING, DELIVERED or RETURNING)")]
    UnknownState(String),

    /// Drone identifier is not a positive integer.
    #[error("invalid drone id {0}: must be a positive integer")]
    InvalidDroneId(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_error_names_field_and_bounds() {
        let err = ValidationError::WeightOutOfRange {
            field: "weight limit",
            value: 501,
            min: 1,
            max: 500,
        };
        let msg = err.to_string();
        assert!(msg.contains("weight limit"));
        assert!(msg.contains("501g"));
        assert!(msg.contains("500g"));
    }

    #[test]
    fn medication_name_error_echoes_input() {
        let err = ValidationError::InvalidMedicationName("###test".into());
        assert!(err.to_string().contains("###test"));
    }

    #[test]
    fn battery_error_display() {
        let msg = ValidationError::InvalidBattery(-3).to_string();
        assert!(msg.contains("-3"));
        assert!(msg.contains("0 and 100"));
    }
}
