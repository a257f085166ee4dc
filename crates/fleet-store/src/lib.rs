#![deny(missing_docs)]

//! # fleet-store: Drone Persistence
//!
//! The fleet's use-cases talk to storage only through the [`DroneStore`] and
//! [`LogStore`] traits. Two implementations ship here:
//!
//! - [`MemoryStore`]: `parking_lot`-guarded maps, for tests and local runs.
//! - [`PgStore`]: Postgres via `sqlx`, with embedded migrations.
//!
//! ## Write Contract
//!
//! Every drone write is a compare-and-swap on the drone's `version`. A save
//! succeeds only when the stored version equals the version the caller read;
//! the returned drone carries the bumped version. A stale writer gets
//! [`StoreError::Conflict`] and must re-read.
//!
//! Serial numbers, medication codes and medication names are unique across
//! the whole fleet; a clash is [`StoreError::Duplicate`].

pub mod error;
pub mod memory;
pub mod pg;

use async_trait::async_trait;

use fleet_core::DroneId;
use fleet_state::{BatteryLog, Drone, DroneState, NewBatteryLog, NewDrone};

pub use error::StoreError;
pub use memory::MemoryStore;
pub use pg::{init_pool, PgStore};

/// Outcome of a batch save: drones that committed and drones that did not.
#[derive(Debug, Default)]
pub struct BatchSave {
    /// Saved drones, with their new versions.
    pub saved: Vec<Drone>,
    /// Drones that were not saved, with the reason.
    pub failed: Vec<(DroneId, StoreError)>,
    /// Battery log records written with the saved drones, by
    /// [`DroneStore::save_drained`] only.
    pub logs: Vec<BatteryLog>,
}

/// Persistence of drones and their medications.
#[async_trait]
pub trait DroneStore: Send + Sync {
    /// Store a new drone and assign its identifier.
    async fn create_drone(&self, new: NewDrone) -> Result<Drone, StoreError>;

    /// Fetch one drone with its medications.
    async fn get_drone(&self, id: DroneId) -> Result<Drone, StoreError>;

    /// Save a drone if its version still matches the stored one.
    async fn save_drone(&self, drone: &Drone) -> Result<Drone, StoreError>;

    /// Save many drones in one write.
    ///
    /// Per-drone failures (conflict, missing drone) land in
    /// [`BatchSave::failed`]; `Err` means the whole batch failed.
    async fn save_drones(&self, drones: &[Drone]) -> Result<BatchSave, StoreError>;

    /// Save drones whose battery just drained, each together with its
    /// battery log record.
    ///
    /// A drone and its record commit or fail as one; a drone in
    /// [`BatchSave::failed`] leaves no record behind. `Err` means the whole
    /// batch failed.
    async fn save_drained(&self, drones: &[Drone]) -> Result<BatchSave, StoreError>;

    /// All drones, ordered by identifier.
    async fn list_drones(&self) -> Result<Vec<Drone>, StoreError>;

    /// Drones in `state`, ordered by identifier.
    async fn list_drones_by_state(&self, state: DroneState) -> Result<Vec<Drone>, StoreError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Append-only sink for battery log records.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Append a record, assigning its identifier and timestamp.
    async fn create_log(&self, entry: NewBatteryLog) -> Result<BatteryLog, StoreError>;

    /// All records in creation order.
    async fn list_logs(&self) -> Result<Vec<BatteryLog>, StoreError>;
}
