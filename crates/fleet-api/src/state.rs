//! # Application State & Configuration
//!
//! [`AppConfig`] is read once at startup from the environment. [`AppState`]
//! is the shared handle passed to every route handler.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use fleet_ops::{FleetMetrics, FleetService, DEFAULT_LOADING_DELAY, DEFAULT_TICK_INTERVAL};
use fleet_store::{DroneStore, LogStore};

// -- Configuration ------------------------------------------------------------

/// Default HTTP-side limit on one medication load.
pub const DEFAULT_LOADING_TIMEOUT: Duration = Duration::from_secs(30);

/// Invalid configuration value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("invalid {var}=\"{value}\": {reason}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
        /// What was expected.
        reason: &'static str,
    },
}

/// Runtime configuration.
///
/// | Variable                     | Default | Meaning                       |
/// |------------------------------|---------|-------------------------------|
/// | `PORT`                       | 8080    | HTTP bind port                |
/// | `DATABASE_URL`               | unset   | Postgres URL; unset = memory  |
/// | `FLEET_TICK_INTERVAL_SECS`   | 60      | battery degradation interval  |
/// | `FLEET_LOADING_DELAY_MS`     | 5000    | simulated loading time        |
/// | `FLEET_LOADING_TIMEOUT_SECS` | 30      | HTTP-side load timeout        |
/// | `FLEET_LOG_JSON`             | false   | JSON log output               |
#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Postgres connection URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Time between battery degradation ticks.
    pub tick_interval: Duration,
    /// Simulated physical loading time.
    pub loading_delay: Duration,
    /// Upper bound on one load request, delay included.
    pub loading_timeout: Duration,
    /// Emit logs as JSON lines.
    pub log_json: bool,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let port = match lookup("PORT") {
            Some(v) => parse(&v, "PORT", "expected a port number")?,
            None => defaults.port,
        };
        let tick_interval = match lookup("FLEET_TICK_INTERVAL_SECS") {
            Some(v) => Duration::from_secs(positive(&v, "FLEET_TICK_INTERVAL_SECS")?),
            None => defaults.tick_interval,
        };
        let loading_delay = match lookup("FLEET_LOADING_DELAY_MS") {
            Some(v) => Duration::from_millis(parse(
                &v,
                "FLEET_LOADING_DELAY_MS",
                "expected milliseconds",
            )?),
            None => defaults.loading_delay,
        };
        let loading_timeout = match lookup("FLEET_LOADING_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(positive(&v, "FLEET_LOADING_TIMEOUT_SECS")?),
            None => defaults.loading_timeout,
        };
        let log_json = match lookup("FLEET_LOG_JSON") {
            Some(v) => parse_bool(&v, "FLEET_LOG_JSON")?,
            None => defaults.log_json,
        };
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        Ok(Self {
            port,
            database_url,
            tick_interval,
            loading_delay,
            loading_timeout,
            log_json,
        })
    }
}

fn parse<T: std::str::FromStr>(
    value: &str,
    var: &'static str,
    reason: &'static str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason,
    })
}

fn positive(value: &str, var: &'static str) -> Result<u64, ConfigError> {
    let reason = "expected a positive number of seconds";
    let secs: u64 = parse(value, var, reason)?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason,
        });
    }
    Ok(secs)
}

fn parse_bool(value: &str, var: &'static str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "expected true or false",
        }),
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("tick_interval", &self.tick_interval)
            .field("loading_delay", &self.loading_delay)
            .field("loading_timeout", &self.loading_timeout)
            .field("log_json", &self.log_json)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
            loading_delay: DEFAULT_LOADING_DELAY,
            loading_timeout: DEFAULT_LOADING_TIMEOUT,
            log_json: false,
        }
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Fleet use-cases.
    pub fleet: FleetService,
    /// Runtime configuration.
    pub config: Arc<AppConfig>,
    /// Prometheus registry served at `/metrics`.
    pub metrics: FleetMetrics,
}

impl AppState {
    /// Build the state over the given stores, recording into `metrics`.
    pub fn new(
        config: AppConfig,
        drones: Arc<dyn DroneStore>,
        logs: Arc<dyn LogStore>,
        metrics: FleetMetrics,
    ) -> Self {
        let fleet = FleetService::new(drones, logs)
            .with_loading_delay(config.loading_delay)
            .with_metrics(metrics.clone());
        Self {
            fleet,
            config: Arc::new(config),
            metrics,
        }
    }
}
