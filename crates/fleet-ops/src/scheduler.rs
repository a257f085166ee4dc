//! # Battery Degradation Scheduler
//!
//! A background task that drains one percent from every drone above the
//! floor once per interval and writes a battery log record for each drone it
//! drained.
//!
//! Each tick:
//!
//! 1. snapshots the fleet with `list_drones`;
//! 2. computes a [`DegradationPass`] over the snapshot;
//! 3. saves the drained drones in one `save_drained` batch, which writes each
//!    drone together with its battery log record;
//! 4. retries, once and from a fresh read, drones whose save conflicted.
//!
//! A drone is never saved without its log record, nor logged without being
//! saved. A failure on one drone is logged and skipped. A failed snapshot read
//! aborts that tick only; the task keeps running until its
//! [`CancellationToken`] is cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use fleet_core::DroneId;
use fleet_state::{degrade, DegradationPass, Drone};
use fleet_store::{BatchSave, DroneStore, StoreError};

use crate::metrics::FleetMetrics;

/// Default time between two ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Drones in the snapshot.
    pub examined: usize,
    /// Drones whose lower charge was saved.
    pub decremented: usize,
    /// Drones that should have been drained but could not be saved.
    pub failed: usize,
    /// Battery log records written.
    pub logged: usize,
}

/// Periodic battery drain over the whole fleet.
#[derive(Clone)]
pub struct DegradationScheduler {
    drones: Arc<dyn DroneStore>,
    interval: Duration,
    metrics: Option<FleetMetrics>,
}

impl DegradationScheduler {
    /// Create a scheduler ticking every `interval`.
    pub fn new(drones: Arc<dyn DroneStore>, interval: Duration) -> Self {
        Self {
            drones,
            // tokio panics on a zero period.
            interval: interval.max(Duration::from_millis(1)),
            metrics: None,
        }
    }

    /// Record every tick into `metrics`.
    pub fn with_metrics(mut self, metrics: FleetMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Time between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one tick now.
    pub async fn run_tick(&self) -> Result<TickReport, StoreError> {
        let outcome = self.drain_once().await;
        if let Some(metrics) = &self.metrics {
            match &outcome {
                Ok(report) => metrics.record_tick(report),
                Err(_) => metrics.record_tick_failure(),
            }
        }
        outcome
    }

    async fn drain_once(&self) -> Result<TickReport, StoreError> {
        let snapshot = self.drones.list_drones().await?;
        let pass = DegradationPass::compute(&snapshot);
        let mut report = TickReport {
            examined: pass.examined,
            ..TickReport::default()
        };
        if pass.updated.is_empty() {
            return Ok(report);
        }

        let batch = self.drones.save_drained(&pass.updated).await?;
        report.decremented = batch.saved.len();
        report.logged = batch.logs.len();
        for (id, err) in batch.failed {
            let outcome = match err {
                StoreError::Conflict { .. } => self.retry(id).await,
                other => Err(other),
            };
            match outcome {
                Ok(retried) => {
                    report.decremented += retried.saved.len();
                    report.logged += retried.logs.len();
                }
                Err(err) => {
                    tracing::warn!(drone_id = %id, error = %err, "battery degradation not saved");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    /// Drain a drone again from a fresh read. Saves nothing when it has
    /// reached the floor in the meantime.
    async fn retry(&self, id: DroneId) -> Result<BatchSave, StoreError> {
        let fresh = self.drones.get_drone(id).await?;
        let Some(next) = degrade(&fresh) else {
            return Ok(BatchSave::default());
        };
        let mut batch = self.drones.save_drained(std::slice::from_ref(&next)).await?;
        match batch.failed.pop() {
            Some((_, err)) => Err(err),
            None => Ok(batch),
        }
    }

    /// Tick every interval until `token` is cancelled. The first tick comes
    /// one interval after start.
    pub async fn run(self, token: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = self.interval.as_secs(), "battery degradation scheduler started");

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => match self.run_tick().await {
                    Ok(report) => tracing::info!(
                        examined = report.examined,
                        decremented = report.decremented,
                        failed = report.failed,
                        logged = report.logged,
                        "battery degradation tick"
                    ),
                    Err(err) => tracing::error!(error = %err, "battery degradation tick failed"),
                },
            }
        }
        tracing::info!("battery degradation scheduler stopped");
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(token))
    }
}

impl std::fmt::Debug for DegradationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DegradationScheduler")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
