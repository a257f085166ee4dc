//! # Battery Log
//!
//! Append-only audit records written once per battery decrement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fleet_core::{BatteryLevel, DroneId};

use crate::drone::Drone;
use crate::lifecycle::DroneState;

/// A log record that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBatteryLog {
    /// Drone whose battery changed.
    pub drone_id: DroneId,
    /// Charge after the change.
    pub battery: BatteryLevel,
    /// Drone state at the time of the change.
    pub drone_state: DroneState,
}

impl NewBatteryLog {
    /// Record the current battery and state of `drone`.
    pub fn for_drone(drone: &Drone) -> Self {
        Self {
            drone_id: drone.id(),
            battery: drone.battery(),
            drone_state: drone.state(),
        }
    }
}

/// A stored log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryLog {
    /// Store-assigned, increasing identifier.
    pub id: i64,
    /// Drone whose battery changed.
    pub drone_id: DroneId,
    /// Charge after the change.
    pub battery: BatteryLevel,
    /// Drone state at the time of the change.
    pub drone_state: DroneState,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
}

impl BatteryLog {
    /// Stamp a pending record with its identifier and creation time.
    pub fn stamped(id: i64, entry: NewBatteryLog, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            drone_id: entry.drone_id,
            battery: entry.battery,
            drone_state: entry.drone_state,
            created_at,
        }
    }
}
