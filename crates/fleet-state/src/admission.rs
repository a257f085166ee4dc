//! # Loading Admission
//!
//! The rule deciding whether one more medication item may go onto a drone.
//! Battery is checked before capacity, so a drone that is both too weak and
//! too full reports the battery problem.

use serde::Serialize;
use thiserror::Error;

use fleet_core::{BatteryLevel, Weight};

/// Lowest battery charge, in percent, at which a drone may be loaded.
pub const LOADING_MINIMUM_BATTERY: u8 = 25;

/// Why a medication item was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AdmissionError {
    /// Battery below [`LOADING_MINIMUM_BATTERY`].
    #[error("drone cannot be loaded: battery at {battery} is below the {minimum}% loading minimum")]
    InsufficientBattery {
        /// Current battery charge.
        battery: BatteryLevel,
        /// Required minimum, in percent.
        minimum: u8,
    },

    /// The item does not fit under the weight limit.
    #[error(
        "drone cannot carry {candidate} more: current payload {current_payload} \
         plus item exceeds weight limit {weight_limit}"
    )]
    CapacityExceeded {
        /// Payload already on board.
        current_payload: Weight,
        /// Weight of the refused item.
        candidate: Weight,
        /// The drone's weight limit.
        weight_limit: Weight,
    },
}

/// Admit or refuse an item of `candidate` weight.
pub fn evaluate(
    battery: BatteryLevel,
    weight_limit: Weight,
    current_payload: Weight,
    candidate: Weight,
) -> Result<(), AdmissionError> {
    if battery.percent() < LOADING_MINIMUM_BATTERY {
        return Err(AdmissionError::InsufficientBattery {
            battery,
            minimum: LOADING_MINIMUM_BATTERY,
        });
    }
    if current_payload.saturating_add(candidate) > weight_limit {
        return Err(AdmissionError::CapacityExceeded {
            current_payload,
            candidate,
            weight_limit,
        });
    }
    Ok(())
}
