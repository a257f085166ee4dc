//! # Route Modules
//!
//! | Prefix            | Module       | Operations                                  |
//! |-------------------|--------------|---------------------------------------------|
//! | `/v1/drones/*`    | [`drones`]   | register, fetch, load, battery, state       |
//! | `/v1/fleet/*`     | [`fleet`]    | available drones, battery log               |

pub mod drones;
pub mod fleet;

use serde::Serialize;
use utoipa::ToSchema;

use fleet_state::{Drone, Medication};

/// A drone as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct DroneResponse {
    /// Drone identifier.
    pub id: i64,
    /// Manufacturer serial number.
    pub serial_number: String,
    /// Airframe model.
    pub model: String,
    /// Weight limit in grams.
    pub weight_limit: u32,
    /// Battery charge in percent.
    pub battery: u8,
    /// Lifecycle state.
    pub state: String,
    /// Sum of loaded item weights in grams.
    pub current_payload: u32,
    /// Loaded items, in load order.
    pub medications: Vec<MedicationResponse>,
    /// Committed write count.
    pub version: u64,
}

/// A loaded medication item.
#[derive(Debug, Serialize, ToSchema)]
pub struct MedicationResponse {
    /// Item code.
    pub code: String,
    /// Item name.
    pub name: String,
    /// Weight in grams.
    pub weight: u32,
    /// Picture of the packaging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<&Medication> for MedicationResponse {
    fn from(m: &Medication) -> Self {
        Self {
            code: m.code.to_string(),
            name: m.name.to_string(),
            weight: m.weight.as_grams(),
            image: m.image.clone(),
        }
    }
}

impl From<&Drone> for DroneResponse {
    fn from(d: &Drone) -> Self {
        Self {
            id: d.id().get(),
            serial_number: d.serial_number().to_string(),
            model: d.model().to_string(),
            weight_limit: d.weight_limit().as_grams(),
            battery: d.battery().percent(),
            state: d.state().to_string(),
            current_payload: d.current_payload().as_grams(),
            medications: d.medications().iter().map(MedicationResponse::from).collect(),
            version: d.version(),
        }
    }
}
