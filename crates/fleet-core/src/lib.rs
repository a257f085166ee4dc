#![deny(missing_docs)]

//! # fleet-core: Foundational Types for the Drone Fleet Controller
//!
//! Every other crate in the workspace depends on `fleet-core`; it depends on
//! nothing internal, only `serde` and `thiserror`.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** [`DroneId`],
//!    [`SerialNumber`], [`MedicationName`] and [`MedicationCode`] are distinct
//!    types with validated constructors. No bare strings for identifiers.
//!
//! 2. **Integer quantities.** [`BatteryLevel`] is a whole percentage and
//!    [`Weight`] is whole grams, so admission checks compare exactly.
//!
//! 3. **Closed enumerations.** [`DroneModel`] is an exhaustive enum; an
//!    unknown model string fails to parse instead of being stored.

pub mod error;
pub mod identity;
pub mod model;
pub mod quantity;

pub use error::ValidationError;
pub use identity::{DroneId, MedicationCode, MedicationName, SerialNumber};
pub use model::DroneModel;
pub use quantity::{BatteryLevel, Weight};
