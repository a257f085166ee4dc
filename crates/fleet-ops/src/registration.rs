//! # Drone Registration

use fleet_core::{BatteryLevel, DroneId, DroneModel, SerialNumber, Weight};
use fleet_state::{DroneState, NewDrone};

use crate::error::RegistrationError;
use crate::service::FleetService;

/// Raw registration input, before business-rule validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterDrone {
    /// Manufacturer serial number, 10 to 100 characters.
    pub serial_number: String,
    /// Model name.
    pub model: String,
    /// Weight limit in grams, 10 to 500.
    pub weight_limit: i64,
    /// Initial battery charge; 100 when absent.
    pub battery: Option<i64>,
    /// Initial state name; IDLE when absent.
    pub state: Option<String>,
}

impl RegisterDrone {
    /// Validate every field into a [`NewDrone`].
    pub fn validate(self) -> Result<NewDrone, RegistrationError> {
        let serial_number = SerialNumber::new(self.serial_number)?;
        let model: DroneModel = self.model.parse()?;
        let weight_limit = Weight::limit(self.weight_limit)?;
        let mut new = NewDrone::new(serial_number, model, weight_limit);
        if let Some(battery) = self.battery {
            new = new.with_battery(BatteryLevel::new(battery)?);
        }
        if let Some(state) = self.state {
            new = new.with_state(state.parse::<DroneState>()?);
        }
        Ok(new)
    }
}

impl FleetService {
    /// Register a new drone and return its identifier.
    pub async fn register_drone(&self, input: RegisterDrone) -> Result<DroneId, RegistrationError> {
        let new = input.validate()?;
        let drone = self.drones.create_drone(new).await?;
        tracing::info!(
            drone_id = %drone.id(),
            serial_number = %drone.serial_number(),
            model = %drone.model(),
            "drone registered"
        );
        Ok(drone.id())
    }
}
