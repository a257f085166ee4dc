//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the identifiers used across the fleet.
//! Each identifier is a distinct type, so a [`MedicationCode`] cannot be
//! passed where a [`MedicationName`] is expected.
//!
//! String-based identifiers validate their format at construction and on
//! deserialization (`serde(try_from = "String")`), so an invalid value
//! never reaches the domain layer through either path.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// DroneId
// ---------------------------------------------------------------------------

/// Store-assigned identifier of a registered drone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct DroneId(i64);

impl DroneId {
    /// Create a drone identifier. Identifiers start at 1.
    pub fn new(id: i64) -> Result<Self, ValidationError> {
        if id <= 0 {
            return Err(ValidationError::InvalidDroneId(id));
        }
        Ok(Self(id))
    }

    /// The raw integer value.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for DroneId {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DroneId> for i64 {
    fn from(id: DroneId) -> Self {
        id.0
    }
}

impl std::fmt::Display for DroneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SerialNumber
// ---------------------------------------------------------------------------

/// Manufacturer serial number of a drone, unique across the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SerialNumber(String);

impl SerialNumber {
    /// Shortest accepted serial number.
    pub const MIN_LEN: usize = 10;
    /// Longest accepted serial number.
    pub const MAX_LEN: usize = 100;

    /// Create a validated serial number. Surrounding whitespace is trimmed.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let trimmed = s.trim();
        let len = trimmed.chars().count();
        if !(Self::MIN_LEN..=Self::MAX_LEN).contains(&len) {
            return Err(ValidationError::InvalidSerialNumber {
                value: s,
                min: Self::MIN_LEN,
                max: Self::MAX_LEN,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Return the serial number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SerialNumber {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SerialNumber> for String {
    fn from(s: SerialNumber) -> Self {
        s.0
    }
}

impl std::fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// MedicationName
// ---------------------------------------------------------------------------

/// Name of a medication item. Letters, digits, `-`, `_` and `.` only.
///
/// The empty string matches the allowed character set and is accepted here;
/// requiring a name is the job of request validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MedicationName(String);

impl MedicationName {
    /// Create a validated medication name.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if !s.chars().all(is_name_char) {
            return Err(ValidationError::InvalidMedicationName(s));
        }
        Ok(Self(s))
    }

    /// Return the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

impl TryFrom<String> for MedicationName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MedicationName> for String {
    fn from(n: MedicationName) -> Self {
        n.0
    }
}

impl std::fmt::Display for MedicationName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// MedicationCode
// ---------------------------------------------------------------------------

/// Primary identifier of a medication item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MedicationCode(String);

impl MedicationCode {
    /// Create a medication code. Must be non-empty after trimming.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyMedicationCode);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Return the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MedicationCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MedicationCode> for String {
    fn from(c: MedicationCode) -> Self {
        c.0
    }
}

impl std::fmt::Display for MedicationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
