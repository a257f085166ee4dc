//! # Fleet Queries
//!
//! Read-only views over the latest stored snapshot. A query racing a
//! degradation tick may see the battery before or after that tick.

use fleet_core::DroneId;
use fleet_state::{BatteryLog, Drone, DroneState};

use crate::error::QueryError;
use crate::service::FleetService;

impl FleetService {
    /// One drone with its medications.
    pub async fn drone(&self, id: DroneId) -> Result<Drone, QueryError> {
        Ok(self.drones.get_drone(id).await?)
    }

    /// Drones available for loading, i.e. in IDLE state.
    pub async fn available_drones(&self) -> Result<Vec<Drone>, QueryError> {
        Ok(self.drones.list_drones_by_state(DroneState::Idle).await?)
    }

    /// Battery charge of a drone, formatted as a percentage (`"87%"`).
    pub async fn battery_level(&self, id: DroneId) -> Result<String, QueryError> {
        let drone = self.drones.get_drone(id).await?;
        Ok(drone.battery().to_string())
    }

    /// Current lifecycle state of a drone.
    pub async fn drone_state(&self, id: DroneId) -> Result<DroneState, QueryError> {
        Ok(self.drones.get_drone(id).await?.state())
    }

    /// Every battery log record, oldest first.
    pub async fn battery_logs(&self) -> Result<Vec<BatteryLog>, QueryError> {
        Ok(self.logs.list_logs().await?)
    }
}
