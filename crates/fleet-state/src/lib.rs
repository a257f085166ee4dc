#![deny(missing_docs)]

//! # fleet-state: Drone Lifecycle and Loading Policy
//!
//! The pure domain layer of the fleet controller. Nothing here performs I/O
//! or waits; every function takes values and returns values, so the rules can
//! be tested without a store or a clock.
//!
//! ## Modules
//!
//! - **Lifecycle** (`lifecycle.rs`): the six-state delivery cycle with a
//!   checked transition table.
//!
//! - **Admission** (`admission.rs`): battery minimum and weight capacity rule
//!   for one more medication item.
//!
//! - **Drone** (`drone.rs`): the drone aggregate, its medications, and the
//!   optimistic-concurrency `version`.
//!
//! - **Degradation** (`degradation.rs`): one tick of battery drain over a
//!   snapshot of the fleet.
//!
//! - **Log** (`log.rs`): battery audit records.

pub mod admission;
pub mod degradation;
pub mod drone;
pub mod lifecycle;
pub mod log;

pub use admission::{evaluate, AdmissionError, LOADING_MINIMUM_BATTERY};
pub use degradation::{degrade, DegradationPass, BATTERY_FLOOR};
pub use drone::{Drone, DroneError, DroneParts, Medication, MedicationItem, NewDrone};
pub use lifecycle::{DroneState, LifecycleError};
pub use log::{BatteryLog, NewBatteryLog};
