//! # Drone Models
//!
//! The closed set of airframe models the fleet accepts. Parsing accepts the
//! canonical names and their lowercase forms; anything else is rejected, so
//! an unknown model can never be stored.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Airframe model of a drone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DroneModel {
    /// Light airframe.
    Lightweight,
    /// Medium airframe.
    Middleweight,
    /// Long-range airframe.
    Cruiserweight,
    /// Heavy-lift airframe.
    Heavyweight,
}

impl DroneModel {
    /// All models, in ascending size.
    pub const ALL: [Self; 4] = [
        Self::Lightweight,
        Self::Middleweight,
        Self::Cruiserweight,
        Self::Heavyweight,
    ];

    /// Return the canonical model name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lightweight => "Lightweight",
            Self::Middleweight => "Middleweight",
            Self::Cruiserweight => "Cruiserweight",
            Self::Heavyweight => "Heavyweight",
        }
    }
}

impl FromStr for DroneModel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s || m.as_str().to_ascii_lowercase() == s)
            .ok_or_else(|| ValidationError::UnknownModel(s.to_string()))
    }
}

impl TryFrom<String> for DroneModel {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DroneModel> for String {
    fn from(m: DroneModel) -> Self {
        m.as_str().to_string()
    }
}

impl std::fmt::Display for DroneModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_and_lowercase_names() {
        assert_eq!("Heavyweight".parse::<DroneModel>().unwrap(), DroneModel::Heavyweight);
        assert_eq!("middleweight".parse::<DroneModel>().unwrap(), DroneModel::Middleweight);
    }

    #[test]
    fn rejects_unknown_model() {
        let err = "Model Not exist".parse::<DroneModel>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownModel("Model Not exist".into()));
        assert!("HEAVYWEIGHT".parse::<DroneModel>().is_err());
    }

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&DroneModel::Cruiserweight).unwrap();
        assert_eq!(json, "\"Cruiserweight\"");
        let back: DroneModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DroneModel::Cruiserweight);
        assert!(serde_json::from_str::<DroneModel>("\"Jumbo\"").is_err());
    }
}
