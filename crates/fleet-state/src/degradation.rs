//! # Battery Degradation
//!
//! One scheduler tick drains one percent from every drone above the floor.
//! The computation is pure: it takes a snapshot and returns the drones that
//! changed, leaving persistence and logging to the caller.

use crate::drone::Drone;

/// Charge at or below which a drone is no longer drained.
pub const BATTERY_FLOOR: u8 = 1;

/// Result of draining one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DegradationPass {
    /// Number of drones in the snapshot.
    pub examined: usize,
    /// Drones whose battery went down, with the new charge applied.
    pub updated: Vec<Drone>,
}

impl DegradationPass {
    /// Drain every drone in `snapshot` whose charge is above [`BATTERY_FLOOR`].
    pub fn compute(snapshot: &[Drone]) -> Self {
        let updated = snapshot.iter().filter_map(degrade).collect();
        Self {
            examined: snapshot.len(),
            updated,
        }
    }
}

/// The drone with one percent less charge, or `None` when it is at the floor.
pub fn degrade(drone: &Drone) -> Option<Drone> {
    let battery = drone.battery().decremented_above(BATTERY_FLOOR)?;
    let mut next = drone.clone();
    next.set_battery(battery);
    Some(next)
}
