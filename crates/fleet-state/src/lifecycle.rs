//! # Drone Lifecycle
//!
//! A drone moves through a fixed delivery cycle:
//!
//! ```text
//! IDLE ──▶ LOADING ──▶ LOADED ──▶ DELIVERING ──▶ DELIVERED ──▶ RETURNING
//!  ▲          │ ▲                                                  │
//!  │          └─┘ (another item)                                   │
//!  └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! The state is persisted, so it is a runtime enum with a checked transition
//! table rather than a typestate. Only the six canonical upper-case names
//! parse; anything else is a [`ValidationError::UnknownState`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fleet_core::ValidationError;

/// Lifecycle state of a drone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DroneState {
    /// On the ground, empty, available for loading.
    #[default]
    Idle,
    /// Medication is being loaded.
    Loading,
    /// Fully loaded, waiting for dispatch.
    Loaded,
    /// In flight towards the destination.
    Delivering,
    /// Payload handed over.
    Delivered,
    /// Flying back to base.
    Returning,
}

impl DroneState {
    /// Every state, in cycle order.
    pub const ALL: [Self; 6] = [
        Self::Idle,
        Self::Loading,
        Self::Loaded,
        Self::Delivering,
        Self::Delivered,
        Self::Returning,
    ];

    /// Returns the canonical state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Loading => "LOADING",
            Self::Loaded => "LOADED",
            Self::Delivering => "DELIVERING",
            Self::Delivered => "DELIVERED",
            Self::Returning => "RETURNING",
        }
    }

    /// Whether `self -> to` is an edge of the lifecycle.
    pub fn can_transition_to(&self, to: DroneState) -> bool {
        matches!(
            (self, to),
            (Self::Idle, Self::Loading)
                | (Self::Loading, Self::Loading)
                | (Self::Loading, Self::Loaded)
                | (Self::Loaded, Self::Delivering)
                | (Self::Delivering, Self::Delivered)
                | (Self::Delivered, Self::Returning)
                | (Self::Returning, Self::Idle)
        )
    }

    /// Legal successor states.
    pub fn successors(&self) -> Vec<DroneState> {
        Self::ALL
            .into_iter()
            .filter(|to| self.can_transition_to(*to))
            .collect()
    }

    /// Check a transition without applying it.
    pub fn check_transition(&self, to: DroneState) -> Result<(), LifecycleError> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(LifecycleError::InvalidTransition { from: *self, to })
        }
    }
}

impl FromStr for DroneState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.name() == s)
            .ok_or_else(|| ValidationError::UnknownState(s.to_string()))
    }
}

impl std::fmt::Display for DroneState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors from the drone state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// Attempted transition is not an edge of the lifecycle.
    #[error("invalid drone transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: DroneState,
        /// Attempted target state.
        to: DroneState,
    },
}
