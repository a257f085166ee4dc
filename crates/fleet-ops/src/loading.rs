//! # Medication Loading Workflow
//!
//! Loading one item onto a drone runs in four steps:
//!
//! 1. read the drone and validate the item;
//! 2. check state and admission (battery minimum, weight capacity);
//! 3. wait out the physical loading time;
//! 4. commit the loaded drone with a version-guarded save.
//!
//! The wait is the only long await. Dropping the future there (or running
//! out of time in [`FleetService::load_medication_with_timeout`]) leaves the
//! stored drone untouched, because nothing is written before step 4.
//!
//! Step 4 re-checks admission against whatever the store holds now. If
//! another writer committed in the meantime the save conflicts, the drone is
//! re-read and the commit is retried (without a second wait) up to
//! [`MAX_COMMIT_ATTEMPTS`] times.

use std::time::Duration;

use fleet_core::{DroneId, MedicationCode, MedicationName, Weight};
use fleet_state::{Drone, MedicationItem};
use fleet_store::StoreError;

use crate::error::LoadError;
use crate::service::FleetService;

/// Commit attempts before a contended load gives up.
pub const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Raw medication input, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicationRequest {
    /// Item name; letters, digits, `-`, `_` and `.` only.
    pub name: String,
    /// Item code, unique across the fleet.
    pub code: String,
    /// Item weight in grams.
    pub weight: i64,
    /// Optional reference to a picture of the packaging.
    pub image: Option<String>,
}

impl MedicationRequest {
    /// Validate every field into a [`MedicationItem`].
    pub fn validate(self) -> Result<MedicationItem, LoadError> {
        Ok(MedicationItem {
            name: MedicationName::new(self.name)?,
            code: MedicationCode::new(self.code)?,
            weight: Weight::item(self.weight)?,
            image: self.image,
        })
    }
}

impl FleetService {
    /// Load one medication item onto a drone and return the saved drone.
    pub async fn load_medication(
        &self,
        drone_id: DroneId,
        request: MedicationRequest,
    ) -> Result<Drone, LoadError> {
        let outcome = self.run_load(drone_id, request).await;
        self.record_load(&outcome);
        outcome
    }

    /// [`load_medication`](Self::load_medication) bounded by `limit`.
    ///
    /// On timeout the load is abandoned and nothing is saved.
    pub async fn load_medication_with_timeout(
        &self,
        drone_id: DroneId,
        request: MedicationRequest,
        limit: Duration,
    ) -> Result<Drone, LoadError> {
        let outcome = match tokio::time::timeout(limit, self.run_load(drone_id, request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(drone_id = %drone_id, limit_ms = limit.as_millis() as u64, "medication load timed out");
                Err(LoadError::TimedOut(limit))
            }
        };
        self.record_load(&outcome);
        outcome
    }

    fn record_load(&self, outcome: &Result<Drone, LoadError>) {
        if let Some(metrics) = &self.metrics {
            metrics.record_load(outcome);
        }
    }

    async fn run_load(&self, drone_id: DroneId, request: MedicationRequest) -> Result<Drone, LoadError> {
        let drone = self.drones.get_drone(drone_id).await?;
        let item = request.validate()?;
        drone.admit(item.weight)?;

        tracing::debug!(
            drone_id = %drone_id,
            code = %item.code,
            weight = %item.weight,
            delay_ms = self.loading_delay.as_millis() as u64,
            "medication admitted, loading"
        );
        if !self.loading_delay.is_zero() {
            tokio::time::sleep(self.loading_delay).await;
        }

        self.commit_load(drone, item).await
    }

    async fn commit_load(&self, mut drone: Drone, item: MedicationItem) -> Result<Drone, LoadError> {
        let mut attempt = 1;
        loop {
            let mut next = drone.clone();
            next.load(item.clone())?;
            match self.drones.save_drone(&next).await {
                Ok(saved) => {
                    tracing::info!(
                        drone_id = %saved.id(),
                        code = %item.code,
                        payload = %saved.current_payload(),
                        state = %saved.state(),
                        "medication loaded"
                    );
                    return Ok(saved);
                }
                Err(StoreError::Conflict { .. }) if attempt < MAX_COMMIT_ATTEMPTS => {
                    tracing::debug!(drone_id = %drone.id(), attempt, "drone changed during loading, retrying commit");
                    attempt += 1;
                    drone = self.drones.get_drone(drone.id()).await?;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
