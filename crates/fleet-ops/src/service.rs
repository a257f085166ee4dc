//! # Fleet Service
//!
//! The handle every request-driven use-case hangs off. Registration, loading
//! and queries are implemented in their own modules as `impl FleetService`
//! blocks.

use std::sync::Arc;
use std::time::Duration;

use fleet_store::{DroneStore, LogStore};

use crate::metrics::FleetMetrics;

/// Physical loading time of the reference deployment.
pub const DEFAULT_LOADING_DELAY: Duration = Duration::from_secs(5);

/// Shared entry point for registration, loading and fleet queries.
///
/// Cheap to clone; clones share the same stores.
#[derive(Clone)]
pub struct FleetService {
    pub(crate) drones: Arc<dyn DroneStore>,
    pub(crate) logs: Arc<dyn LogStore>,
    pub(crate) loading_delay: Duration,
    pub(crate) metrics: Option<FleetMetrics>,
}

impl FleetService {
    /// Create a service over the given stores with the default loading delay.
    pub fn new(drones: Arc<dyn DroneStore>, logs: Arc<dyn LogStore>) -> Self {
        Self {
            drones,
            logs,
            loading_delay: DEFAULT_LOADING_DELAY,
            metrics: None,
        }
    }

    /// Count loads and fleet state into `metrics`.
    pub fn with_metrics(mut self, metrics: FleetMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The metrics this service records into, if any.
    pub fn metrics(&self) -> Option<&FleetMetrics> {
        self.metrics.as_ref()
    }

    /// Override how long a medication load takes.
    pub fn with_loading_delay(mut self, delay: Duration) -> Self {
        self.loading_delay = delay;
        self
    }

    /// Configured loading delay.
    pub fn loading_delay(&self) -> Duration {
        self.loading_delay
    }

    /// The drone store, for readiness checks.
    pub fn drone_store(&self) -> &Arc<dyn DroneStore> {
        &self.drones
    }
}

impl std::fmt::Debug for FleetService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetService")
            .field("loading_delay", &self.loading_delay)
            .finish_non_exhaustive()
    }
}
