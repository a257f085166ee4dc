//! # Drone Aggregate
//!
//! A [`Drone`] owns its loaded [`Medication`]s and keeps its payload total in
//! step with them. Every mutation goes through a method that checks the
//! lifecycle table and the admission rule before touching any field, so a
//! refused operation leaves the drone exactly as it was.
//!
//! `version` counts committed writes. Stores compare it on save and bump it
//! on success; two writers that read the same version cannot both commit.

use serde::Serialize;
use thiserror::Error;

use fleet_core::{
    BatteryLevel, DroneId, DroneModel, MedicationCode, MedicationName, SerialNumber, Weight,
};

use crate::admission::{self, AdmissionError};
use crate::lifecycle::{DroneState, LifecycleError};

// ─── Medication ─────────────────────────────────────────────────────

/// A validated medication item that has not been put on a drone yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicationItem {
    /// Item name.
    pub name: MedicationName,
    /// Item code, unique across the fleet.
    pub code: MedicationCode,
    /// Item weight.
    pub weight: Weight,
    /// Reference to a picture of the item's packaging.
    pub image: Option<String>,
}

/// A medication item loaded onto a drone. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Medication {
    /// Item name.
    pub name: MedicationName,
    /// Item code, unique across the fleet.
    pub code: MedicationCode,
    /// Item weight.
    pub weight: Weight,
    /// Reference to a picture of the item's packaging.
    pub image: Option<String>,
    /// The drone carrying the item.
    pub drone_id: DroneId,
}

impl Medication {
    /// Attach an item to a drone.
    pub fn new(item: MedicationItem, drone_id: DroneId) -> Self {
        Self {
            name: item.name,
            code: item.code,
            weight: item.weight,
            image: item.image,
            drone_id,
        }
    }
}

// ─── Registration input ─────────────────────────────────────────────

/// Attributes of a drone that is about to be registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDrone {
    /// Manufacturer serial number.
    pub serial_number: SerialNumber,
    /// Airframe model.
    pub model: DroneModel,
    /// Heaviest payload the drone may carry.
    pub weight_limit: Weight,
    /// Initial battery charge.
    pub battery: BatteryLevel,
    /// Initial lifecycle state.
    pub state: DroneState,
}

impl NewDrone {
    /// A fully charged, idle drone.
    pub fn new(serial_number: SerialNumber, model: DroneModel, weight_limit: Weight) -> Self {
        Self {
            serial_number,
            model,
            weight_limit,
            battery: BatteryLevel::FULL,
            state: DroneState::Idle,
        }
    }

    /// Override the initial battery charge.
    pub fn with_battery(mut self, battery: BatteryLevel) -> Self {
        self.battery = battery;
        self
    }

    /// Override the initial lifecycle state.
    pub fn with_state(mut self, state: DroneState) -> Self {
        self.state = state;
        self
    }
}

/// Raw persisted fields of a drone, as read back from storage.
#[derive(Debug, Clone)]
pub struct DroneParts {
    /// Drone identifier.
    pub id: DroneId,
    /// Manufacturer serial number.
    pub serial_number: SerialNumber,
    /// Airframe model.
    pub model: DroneModel,
    /// Weight limit.
    pub weight_limit: Weight,
    /// Battery charge.
    pub battery: BatteryLevel,
    /// Lifecycle state.
    pub state: DroneState,
    /// Loaded items, in load order.
    pub medications: Vec<Medication>,
    /// Committed write count.
    pub version: u64,
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Errors from operations on a [`Drone`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DroneError {
    /// The admission rule refused the item.
    #[error(transparent)]
    Admission(#[from] AdmissionError),

    /// The operation needs a state change the lifecycle does not allow.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Persisted medications add up to more than the weight limit.
    #[error("drone {id} carries {payload}, above its weight limit {weight_limit}")]
    Overloaded {
        /// Drone identifier.
        id: DroneId,
        /// Sum of the loaded items.
        payload: Weight,
        /// The drone's weight limit.
        weight_limit: Weight,
    },

    /// A persisted medication points at a different drone.
    #[error("medication {code} belongs to drone {owner}, not drone {id}")]
    ForeignMedication {
        /// Drone being restored.
        id: DroneId,
        /// Medication code.
        code: MedicationCode,
        /// Drone the medication names as its owner.
        owner: DroneId,
    },
}

// ─── Drone ──────────────────────────────────────────────────────────

/// A registered drone and everything it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drone {
    id: DroneId,
    serial_number: SerialNumber,
    model: DroneModel,
    weight_limit: Weight,
    battery: BatteryLevel,
    state: DroneState,
    current_payload: Weight,
    medications: Vec<Medication>,
    version: u64,
}

impl Drone {
    /// A freshly registered drone: empty, version 0.
    pub fn register(id: DroneId, new: NewDrone) -> Self {
        Self {
            id,
            serial_number: new.serial_number,
            model: new.model,
            weight_limit: new.weight_limit,
            battery: new.battery,
            state: new.state,
            current_payload: Weight::ZERO,
            medications: Vec::new(),
            version: 0,
        }
    }

    /// Rebuild a drone from storage, re-deriving the payload total.
    pub fn restore(parts: DroneParts) -> Result<Self, DroneError> {
        if let Some(foreign) = parts.medications.iter().find(|m| m.drone_id != parts.id) {
            return Err(DroneError::ForeignMedication {
                id: parts.id,
                code: foreign.code.clone(),
                owner: foreign.drone_id,
            });
        }
        let payload: Weight = parts.medications.iter().map(|m| m.weight).sum();
        if payload > parts.weight_limit {
            return Err(DroneError::Overloaded {
                id: parts.id,
                payload,
                weight_limit: parts.weight_limit,
            });
        }
        Ok(Self {
            id: parts.id,
            serial_number: parts.serial_number,
            model: parts.model,
            weight_limit: parts.weight_limit,
            battery: parts.battery,
            state: parts.state,
            current_payload: payload,
            medications: parts.medications,
            version: parts.version,
        })
    }

    /// Drone identifier.
    pub fn id(&self) -> DroneId {
        self.id
    }

    /// Manufacturer serial number.
    pub fn serial_number(&self) -> &SerialNumber {
        &self.serial_number
    }

    /// Airframe model.
    pub fn model(&self) -> DroneModel {
        self.model
    }

    /// Heaviest payload the drone may carry.
    pub fn weight_limit(&self) -> Weight {
        self.weight_limit
    }

    /// Current battery charge.
    pub fn battery(&self) -> BatteryLevel {
        self.battery
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DroneState {
        self.state
    }

    /// Sum of the loaded items' weights.
    pub fn current_payload(&self) -> Weight {
        self.current_payload
    }

    /// Loaded items, in load order.
    pub fn medications(&self) -> &[Medication] {
        &self.medications
    }

    /// Committed write count.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The same drone with its version advanced by one committed write.
    ///
    /// Called by stores after a successful save.
    pub fn next_version(mut self) -> Self {
        self.version += 1;
        self
    }

    /// Check whether an item of `weight` could be loaded right now.
    pub fn admit(&self, weight: Weight) -> Result<(), DroneError> {
        self.state.check_transition(DroneState::Loading)?;
        admission::evaluate(self.battery, self.weight_limit, self.current_payload, weight)?;
        Ok(())
    }

    /// Load an item: admit it, enter LOADING, append it and grow the payload.
    pub fn load(&mut self, item: MedicationItem) -> Result<&Medication, DroneError> {
        self.admit(item.weight)?;
        self.transition_to(DroneState::Loading)?;
        self.current_payload = self.current_payload.saturating_add(item.weight);
        let index = self.medications.len();
        self.medications.push(Medication::new(item, self.id));
        Ok(&self.medications[index])
    }

    /// Move to another lifecycle state.
    pub fn transition_to(&mut self, to: DroneState) -> Result<(), LifecycleError> {
        self.state.check_transition(to)?;
        self.state = to;
        Ok(())
    }

    pub(crate) fn set_battery(&mut self, battery: BatteryLevel) {
        self.battery = battery;
    }
}
