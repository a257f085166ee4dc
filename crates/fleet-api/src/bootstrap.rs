//! # Startup Bootstrap
//!
//! Selects the persistence backend and wires the shared state and the
//! battery degradation scheduler over it.
//!
//! 1. **Store**: Postgres when `DATABASE_URL` is set (migrations run on
//!    connect), otherwise the in-memory store.
//! 2. **Metrics**: one [`FleetMetrics`] registry shared by both of the below.
//! 3. **State**: [`AppState`] over the chosen store.
//! 4. **Scheduler**: [`DegradationScheduler`] over the same store, not yet
//!    started.

use std::sync::Arc;

use fleet_ops::{DegradationScheduler, FleetMetrics};
use fleet_store::{DroneStore, LogStore, MemoryStore, PgStore};

use crate::state::{AppConfig, AppState};

/// Errors during startup.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The database could not be reached or migrated.
    #[error("database initialization failed: {0}")]
    Database(#[from] sqlx::Error),

    /// The metrics registry could not be built.
    #[error("metrics initialization failed: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Everything the server needs to start.
#[derive(Debug)]
pub struct Bootstrapped {
    /// Shared handler state.
    pub state: AppState,
    /// Battery degradation task, ready to spawn.
    pub scheduler: DegradationScheduler,
}

/// Build the state and scheduler for `config`.
pub async fn bootstrap(config: AppConfig) -> Result<Bootstrapped, BootstrapError> {
    let drones: Arc<dyn DroneStore>;
    let logs: Arc<dyn LogStore>;
    match &config.database_url {
        Some(url) => {
            let pool = fleet_store::init_pool(url).await?;
            tracing::info!("connected to Postgres, migrations applied");
            let store = Arc::new(PgStore::new(pool));
            drones = store.clone();
            logs = store;
        }
        None => {
            tracing::warn!("DATABASE_URL not set, fleet data is kept in memory only");
            let store = Arc::new(MemoryStore::new());
            drones = store.clone();
            logs = store;
        }
    }
    with_stores(config, drones, logs)
}

/// Wire state and scheduler over explicit stores.
///
/// The scheduler writes battery log records through `drones`
/// ([`DroneStore::save_drained`]); `logs` serves the log query.
pub fn with_stores(
    config: AppConfig,
    drones: Arc<dyn DroneStore>,
    logs: Arc<dyn LogStore>,
) -> Result<Bootstrapped, BootstrapError> {
    let metrics = FleetMetrics::new()?;
    let scheduler =
        DegradationScheduler::new(drones.clone(), config.tick_interval).with_metrics(metrics.clone());
    tracing::info!(
        tick_interval_secs = config.tick_interval.as_secs(),
        loading_delay_ms = config.loading_delay.as_millis() as u64,
        loading_timeout_secs = config.loading_timeout.as_secs(),
        "fleet controller configured"
    );
    let state = AppState::new(config, drones, logs, metrics);
    Ok(Bootstrapped { state, scheduler })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn without_database_url_uses_memory() {
        let config = AppConfig {
            tick_interval: Duration::from_secs(7),
            ..AppConfig::default()
        };
        let boot = bootstrap(config).await.unwrap();
        assert_eq!(boot.scheduler.interval(), Duration::from_secs(7));
        assert!(boot.state.fleet.available_drones().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scheduler_and_service_share_metrics() {
        let boot = bootstrap(AppConfig::default()).await.unwrap();
        boot.scheduler.run_tick().await.unwrap();
        let text = boot.state.metrics.gather_and_encode().unwrap();
        assert!(text.contains("fleet_degradation_ticks_total 1"));
        assert!(boot.state.fleet.metrics().is_some());
    }
}
