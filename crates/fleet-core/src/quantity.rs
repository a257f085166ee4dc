//! # Physical Quantities
//!
//! [`BatteryLevel`] and [`Weight`] keep battery charge and payload arithmetic
//! in integer units. Weights are whole grams so capacity checks are exact
//! (no float rounding at the `current + candidate > limit` boundary).

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// BatteryLevel
// ---------------------------------------------------------------------------

/// Battery charge as a whole percentage in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct BatteryLevel(u8);

impl BatteryLevel {
    /// A fully charged battery; the default for newly registered drones.
    pub const FULL: Self = Self(100);

    /// Create a battery level, rejecting anything outside `0..=100`.
    pub fn new(percent: i64) -> Result<Self, ValidationError> {
        if !(0..=100).contains(&percent) {
            return Err(ValidationError::InvalidBattery(percent));
        }
        Ok(Self(percent as u8))
    }

    /// The charge in percent.
    pub fn percent(&self) -> u8 {
        self.0
    }

    /// One unit less, or `None` when the charge is already at or below `floor`.
    pub fn decremented_above(&self, floor: u8) -> Option<Self> {
        (self.0 > floor).then(|| Self(self.0 - 1))
    }
}

impl Default for BatteryLevel {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<i64> for BatteryLevel {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BatteryLevel> for u8 {
    fn from(b: BatteryLevel) -> Self {
        b.0
    }
}

impl std::fmt::Display for BatteryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

// ---------------------------------------------------------------------------
// Weight
// ---------------------------------------------------------------------------

/// A mass in whole grams.
///
/// Range checks depend on what the weight describes (a drone's limit or a
/// single medication item), so they live in the named constructors rather
/// than in deserialization.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Weight(u32);

impl Weight {
    /// No weight at all; the payload of an empty drone.
    pub const ZERO: Self = Self(0);

    /// Lightest weight limit a drone may declare.
    pub const MIN_LIMIT_GRAMS: u32 = 10;

    /// Heaviest weight limit any drone model may declare.
    pub const MAX_LIMIT_GRAMS: u32 = 500;

    /// Heaviest single medication item.
    pub const MAX_ITEM_GRAMS: u32 = 500;

    /// Wrap a raw gram count without range checks.
    pub const fn grams(g: u32) -> Self {
        Self(g)
    }

    /// A drone weight limit in `10..=500` grams.
    pub fn limit(grams: i64) -> Result<Self, ValidationError> {
        Self::ranged(
            "weight limit",
            grams,
            Self::MIN_LIMIT_GRAMS,
            Self::MAX_LIMIT_GRAMS,
        )
    }

    /// A medication item weight in `1..=500` grams.
    pub fn item(grams: i64) -> Result<Self, ValidationError> {
        Self::ranged("medication weight", grams, 1, Self::MAX_ITEM_GRAMS)
    }

    fn ranged(
        field: &'static str,
        grams: i64,
        min: u32,
        max: u32,
    ) -> Result<Self, ValidationError> {
        if grams < i64::from(min) || grams > i64::from(max) {
            return Err(ValidationError::WeightOutOfRange {
                field,
                value: grams,
                min,
                max,
            });
        }
        Ok(Self(grams as u32))
    }

    /// The mass in grams.
    pub fn as_grams(&self) -> u32 {
        self.0
    }

    /// Sum of two weights, saturating at `u32::MAX`.
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl std::iter::Sum for Weight {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl std::fmt::Display for Weight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}g", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battery_bounds() {
        assert!(BatteryLevel::new(-1).is_err());
        assert!(BatteryLevel::new(101).is_err());
        assert_eq!(BatteryLevel::new(0).unwrap().percent(), 0);
        assert_eq!(BatteryLevel::new(100).unwrap(), BatteryLevel::FULL);
    }

    #[test]
    fn battery_displays_as_percentage() {
        assert_eq!(BatteryLevel::new(87).unwrap().to_string(), "87%");
    }

    #[test]
    fn battery_decrement_respects_floor() {
        let b = BatteryLevel::new(2).unwrap();
        assert_eq!(b.decremented_above(1), Some(BatteryLevel::new(1).unwrap()));
        assert_eq!(BatteryLevel::new(1).unwrap().decremented_above(1), None);
        assert_eq!(BatteryLevel::new(0).unwrap().decremented_above(1), None);
    }

    #[test]
    fn battery_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<BatteryLevel>("100").is_ok());
        assert!(serde_json::from_str::<BatteryLevel>("101").is_err());
        assert!(serde_json::from_str::<BatteryLevel>("-5").is_err());
    }

    #[test]
    fn weight_limit_range() {
        assert!(Weight::limit(0).is_err());
        assert!(Weight::limit(9).is_err());
        assert_eq!(Weight::limit(10).unwrap().as_grams(), 10);
        assert_eq!(Weight::limit(500).unwrap().as_grams(), 500);
        assert!(Weight::limit(501).is_err());
        assert_eq!(Weight::limit(300).unwrap().as_grams(), 300);
    }

    #[test]
    fn item_weight_range() {
        assert!(Weight::item(0).is_err());
        assert!(Weight::item(-10).is_err());
        assert!(Weight::item(1).is_ok());
    }

    #[test]
    fn weights_sum() {
        let total: Weight = [Weight::grams(100), Weight::grams(150)].into_iter().sum();
        assert_eq!(total, Weight::grams(250));
    }
}
