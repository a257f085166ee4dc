//! # Fleet-Wide Queries API

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use fleet_state::BatteryLog;

use crate::error::AppError;
use crate::routes::DroneResponse;
use crate::state::AppState;

/// One battery log record.
#[derive(Debug, Serialize, ToSchema)]
pub struct BatteryLogResponse {
    /// Record identifier.
    pub id: i64,
    /// Drone whose battery changed.
    pub drone_id: i64,
    /// Charge after the change, in percent.
    pub battery: u8,
    /// Drone state at the time of the change.
    pub drone_state: String,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
}

impl From<&BatteryLog> for BatteryLogResponse {
    fn from(log: &BatteryLog) -> Self {
        Self {
            id: log.id,
            drone_id: log.drone_id.get(),
            battery: log.battery.percent(),
            drone_state: log.drone_state.to_string(),
            created_at: log.created_at,
        }
    }
}

/// Build the fleet router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/fleet/available", get(available_drones))
        .route("/v1/fleet/logs", get(battery_logs))
}

/// GET /v1/fleet/available: Drones available for loading.
#[utoipa::path(
    get,
    path = "/v1/fleet/available",
    responses(
        (status = 200, description = "Drones in IDLE state", body = Vec<DroneResponse>),
    ),
    tag = "fleet"
)]
async fn available_drones(
    State(state): State<AppState>,
) -> Result<Json<Vec<DroneResponse>>, AppError> {
    let drones = state.fleet.available_drones().await?;
    Ok(Json(drones.iter().map(DroneResponse::from).collect()))
}

/// GET /v1/fleet/logs: Battery log, oldest first.
#[utoipa::path(
    get,
    path = "/v1/fleet/logs",
    responses(
        (status = 200, description = "Battery log records", body = Vec<BatteryLogResponse>),
    ),
    tag = "fleet"
)]
async fn battery_logs(
    State(state): State<AppState>,
) -> Result<Json<Vec<BatteryLogResponse>>, AppError> {
    let logs = state.fleet.battery_logs().await?;
    Ok(Json(logs.iter().map(BatteryLogResponse::from).collect()))
}
