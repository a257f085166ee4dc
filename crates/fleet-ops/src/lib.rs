#![deny(missing_docs)]

//! # fleet-ops: Fleet Use-Cases
//!
//! Orchestrates the pure rules of `fleet-state` over the storage contracts of
//! `fleet-store`.
//!
//! - [`FleetService`]: request-driven use-cases. Registration
//!   (`registration.rs`), the medication loading workflow (`loading.rs`) and
//!   read-only fleet queries (`queries.rs`) are all methods on it.
//! - [`DegradationScheduler`]: the background battery drain (`scheduler.rs`).
//! - [`FleetMetrics`]: Prometheus counters both of the above record into
//!   (`metrics.rs`).
//!
//! Both hold their stores as trait objects, so the same code runs over the
//! in-memory store in tests and over Postgres in production.

pub mod error;
pub mod loading;
pub mod metrics;
pub mod queries;
pub mod registration;
pub mod scheduler;
pub mod service;

pub use error::{LoadError, QueryError, RegistrationError};
pub use loading::{MedicationRequest, MAX_COMMIT_ATTEMPTS};
pub use metrics::FleetMetrics;
pub use registration::RegisterDrone;
pub use scheduler::{DegradationScheduler, TickReport, DEFAULT_TICK_INTERVAL};
pub use service::{FleetService, DEFAULT_LOADING_DELAY};
