//! # Fleet Metrics
//!
//! Prometheus counters for the use-cases, plus a drones-by-state gauge that
//! the `/metrics` handler refreshes on each scrape (pull model).
//!
//! Counters are pushed by the code paths they describe: the degradation
//! scheduler after every tick, the loading workflow after every load.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

use fleet_state::{Drone, DroneState};

use crate::error::LoadError;
use crate::scheduler::TickReport;

/// Shared metrics handle backed by its own Prometheus registry.
///
/// Cheap to clone; clones record into the same registry.
#[derive(Clone)]
pub struct FleetMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,

    // -- Scheduler (push) --
    ticks_total: IntCounter,
    tick_failures_total: IntCounter,
    battery_decrements_total: IntCounter,
    degradation_failures_total: IntCounter,
    battery_logs_total: IntCounter,

    // -- Loading (push) --
    medications_loaded_total: IntCounter,
    load_rejections_total: IntCounterVec,

    // -- Fleet gauge (pull, refreshed on scrape) --
    drones: IntGaugeVec,
}

impl std::fmt::Debug for FleetMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetMetrics")
            .field("ticks", &self.inner.ticks_total.get())
            .field("medications_loaded", &self.inner.medications_loaded_total.get())
            .finish_non_exhaustive()
    }
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, prometheus::Error> {
    let c = IntCounter::new(name, help)?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

impl FleetMetrics {
    /// Create the metrics on a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let ticks_total = counter(
            &registry,
            "fleet_degradation_ticks_total",
            "Battery degradation ticks completed",
        )?;
        let tick_failures_total = counter(
            &registry,
            "fleet_degradation_tick_failures_total",
            "Battery degradation ticks aborted by a store failure",
        )?;
        let battery_decrements_total = counter(
            &registry,
            "fleet_battery_decrements_total",
            "Drones whose battery was drained by one percent",
        )?;
        let degradation_failures_total = counter(
            &registry,
            "fleet_degradation_failures_total",
            "Drones that should have been drained but could not be saved",
        )?;
        let battery_logs_total = counter(
            &registry,
            "fleet_battery_logs_total",
            "Battery log records written",
        )?;
        let medications_loaded_total = counter(
            &registry,
            "fleet_medications_loaded_total",
            "Medication items committed onto a drone",
        )?;

        let load_rejections_total = IntCounterVec::new(
            Opts::new("fleet_load_rejections_total", "Medication loads refused, by reason"),
            &["reason"],
        )?;
        registry.register(Box::new(load_rejections_total.clone()))?;

        let drones = IntGaugeVec::new(Opts::new("fleet_drones", "Registered drones by state"), &["state"])?;
        registry.register(Box::new(drones.clone()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                ticks_total,
                tick_failures_total,
                battery_decrements_total,
                degradation_failures_total,
                battery_logs_total,
                medications_loaded_total,
                load_rejections_total,
                drones,
            }),
        })
    }

    /// Record a completed degradation tick.
    pub fn record_tick(&self, report: &TickReport) {
        self.inner.ticks_total.inc();
        self.inner.battery_decrements_total.inc_by(report.decremented as u64);
        self.inner.degradation_failures_total.inc_by(report.failed as u64);
        self.inner.battery_logs_total.inc_by(report.logged as u64);
    }

    /// Record a tick aborted before it saved anything.
    pub fn record_tick_failure(&self) {
        self.inner.tick_failures_total.inc();
    }

    /// Record the outcome of one medication load.
    pub fn record_load(&self, outcome: &Result<Drone, LoadError>) {
        match outcome {
            Ok(_) => self.inner.medications_loaded_total.inc(),
            Err(err) => self
                .inner
                .load_rejections_total
                .with_label_values(&[err.reason()])
                .inc(),
        }
    }

    /// Replace the drones-by-state gauge with counts from `drones`.
    ///
    /// Every state gets a sample, zero included.
    pub fn observe_fleet(&self, drones: &[Drone]) {
        self.inner.drones.reset();
        for state in DroneState::ALL {
            let count = drones.iter().filter(|d| d.state() == state).count();
            self.inner
                .drones
                .with_label_values(&[state.name()])
                .set(count as i64);
        }
    }

    /// Medication items committed so far.
    pub fn medications_loaded(&self) -> u64 {
        self.inner.medications_loaded_total.get()
    }

    /// Loads refused for `reason` so far.
    pub fn load_rejections(&self, reason: &str) -> u64 {
        self.inner
            .load_rejections_total
            .with_label_values(&[reason])
            .get()
    }

    /// Drones drained so far.
    pub fn battery_decrements(&self) -> u64 {
        self.inner.battery_decrements_total.get()
    }

    /// Gather all metrics and encode them in the Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer).map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::{BatteryLevel, DroneId};
    use fleet_state::AdmissionError;

    #[test]
    fn new_metrics_start_at_zero() {
        let m = FleetMetrics::new().unwrap();
        assert_eq!(m.medications_loaded(), 0);
        assert_eq!(m.battery_decrements(), 0);
        assert_eq!(m.load_rejections("low_battery"), 0);
    }

    #[test]
    fn tick_reports_accumulate() {
        let m = FleetMetrics::new().unwrap();
        let report = TickReport {
            examined: 3,
            decremented: 2,
            failed: 1,
            logged: 2,
        };
        m.record_tick(&report);
        m.record_tick(&report);
        m.record_tick_failure();
        assert_eq!(m.battery_decrements(), 4);
        let text = m.gather_and_encode().unwrap();
        assert!(text.contains("fleet_degradation_ticks_total 2"));
        assert!(text.contains("fleet_degradation_tick_failures_total 1"));
        assert!(text.contains("fleet_battery_logs_total 4"));
    }

    #[test]
    fn load_outcomes_are_split_by_reason() {
        let m = FleetMetrics::new().unwrap();
        let low = LoadError::Rejected(AdmissionError::InsufficientBattery {
            battery: BatteryLevel::new(10).unwrap(),
            minimum: 25,
        });
        m.record_load(&Err(low));
        m.record_load(&Err(LoadError::DroneNotFound(DroneId::new(4).unwrap())));
        assert_eq!(m.load_rejections("low_battery"), 1);
        assert_eq!(m.load_rejections("drone_not_found"), 1);
        assert_eq!(m.medications_loaded(), 0);
    }

    #[test]
    fn fleet_gauge_lists_every_state() {
        let m = FleetMetrics::new().unwrap();
        m.observe_fleet(&[]);
        let text = m.gather_and_encode().unwrap();
        for state in DroneState::ALL {
            assert!(
                text.contains(&format!("fleet_drones{{state=\"{}\"}} 0", state.name())),
                "missing {state}"
            );
        }
    }

    #[test]
    fn clones_share_the_registry() {
        let m = FleetMetrics::new().unwrap();
        let clone = m.clone();
        clone.record_tick_failure();
        assert!(m
            .gather_and_encode()
            .unwrap()
            .contains("fleet_degradation_tick_failures_total 1"));
    }
}
