//! # Drone Operations API
//!
//! Registration, medication loading, and per-drone battery and state queries.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use fleet_core::{SerialNumber, Weight};
use fleet_ops::{MedicationRequest, RegisterDrone};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, http_url, in_range, required, DronePath, Validate};
use crate::routes::DroneResponse;
use crate::state::AppState;

/// Request to register a drone.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterDroneRequest {
    /// Manufacturer serial number, 10 to 100 characters.
    pub serial_number: String,
    /// Lightweight, Middleweight, Cruiserweight or Heavyweight.
    pub model: String,
    /// Weight limit in grams, 10 to 500.
    pub weight_limit: i64,
    /// Initial battery charge in percent; 100 when omitted.
    pub battery: Option<i64>,
    /// Initial state; IDLE when omitted.
    pub state: Option<String>,
}

impl Validate for RegisterDroneRequest {
    fn validate(&self) -> Result<(), String> {
        let serial_len = self.serial_number.trim().chars().count() as i64;
        in_range(
            "serial_number length",
            serial_len,
            SerialNumber::MIN_LEN as i64,
            SerialNumber::MAX_LEN as i64,
        )?;
        required("model", &self.model)?;
        in_range(
            "weight_limit",
            self.weight_limit,
            i64::from(Weight::MIN_LIMIT_GRAMS),
            i64::from(Weight::MAX_LIMIT_GRAMS),
        )?;
        if let Some(battery) = self.battery {
            in_range("battery", battery, 0, 100)?;
        }
        Ok(())
    }
}

impl From<RegisterDroneRequest> for RegisterDrone {
    fn from(req: RegisterDroneRequest) -> Self {
        Self {
            serial_number: req.serial_number,
            model: req.model,
            weight_limit: req.weight_limit,
            battery: req.battery,
            state: req.state,
        }
    }
}

/// Request to load one medication item.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoadMedicationRequest {
    /// Item name; letters, digits, `-`, `_` and `.` only.
    pub name: String,
    /// Item code, unique across the fleet.
    pub code: String,
    /// Weight in grams, 1 to 500.
    pub weight: i64,
    /// Optional http(s) URL of a picture of the packaging.
    pub image: Option<String>,
}

impl Validate for LoadMedicationRequest {
    fn validate(&self) -> Result<(), String> {
        required("name", &self.name)?;
        required("code", &self.code)?;
        in_range("weight", self.weight, 1, i64::from(Weight::MAX_ITEM_GRAMS))?;
        if let Some(image) = &self.image {
            http_url("image", image)?;
        }
        Ok(())
    }
}

impl From<LoadMedicationRequest> for MedicationRequest {
    fn from(req: LoadMedicationRequest) -> Self {
        Self {
            name: req.name,
            code: req.code,
            weight: req.weight,
            image: req.image,
        }
    }
}

/// Identifier of a newly registered drone.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisteredResponse {
    /// Drone identifier.
    pub drone_id: i64,
}

/// Battery charge of a drone.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BatteryResponse {
    /// Drone identifier.
    pub drone_id: i64,
    /// Charge as a percentage, e.g. `"87%"`.
    pub battery: String,
}

/// Lifecycle state of a drone.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StateResponse {
    /// Drone identifier.
    pub drone_id: i64,
    /// IDLE, LOADING, LOADED, DELIVERING, DELIVERED or RETURNING.
    pub state: String,
}

/// Build the drones router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/drones", post(register_drone))
        .route("/v1/drones/{id}", get(get_drone))
        .route("/v1/drones/{id}/medications", post(load_medication))
        .route("/v1/drones/{id}/battery", get(battery_level))
        .route("/v1/drones/{id}/state", get(drone_state))
}

/// POST /v1/drones: Register a drone.
#[utoipa::path(
    post,
    path = "/v1/drones",
    request_body = RegisterDroneRequest,
    responses(
        (status = 201, description = "Drone registered", body = RegisteredResponse),
        (status = 409, description = "Serial number already registered", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "drones"
)]
async fn register_drone(
    State(state): State<AppState>,
    body: Result<Json<RegisterDroneRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let id = state.fleet.register_drone(req.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisteredResponse { drone_id: id.get() }),
    ))
}

/// GET /v1/drones/{id}: Fetch a drone with its medications.
#[utoipa::path(
    get,
    path = "/v1/drones/{id}",
    params(("id" = i64, Path, description = "Drone ID")),
    responses(
        (status = 200, description = "Drone found", body = DroneResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "drones"
)]
async fn get_drone(
    State(state): State<AppState>,
    DronePath(id): DronePath,
) -> Result<Json<DroneResponse>, AppError> {
    let drone = state.fleet.drone(id).await?;
    Ok(Json(DroneResponse::from(&drone)))
}

/// POST /v1/drones/{id}/medications: Load one medication item.
///
/// Waits out the configured loading time before committing; bounded by the
/// configured loading timeout.
#[utoipa::path(
    post,
    path = "/v1/drones/{id}/medications",
    params(("id" = i64, Path, description = "Drone ID")),
    request_body = LoadMedicationRequest,
    responses(
        (status = 201, description = "Medication loaded", body = DroneResponse),
        (status = 404, description = "Drone not found", body = crate::error::ErrorBody),
        (status = 409, description = "Drone cannot be loaded in its current state", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid medication, low battery or overweight", body = crate::error::ErrorBody),
        (status = 504, description = "Loading timed out", body = crate::error::ErrorBody),
    ),
    tag = "drones"
)]
async fn load_medication(
    State(state): State<AppState>,
    DronePath(id): DronePath,
    body: Result<Json<LoadMedicationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<DroneResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let drone = state
        .fleet
        .load_medication_with_timeout(id, req.into(), state.config.loading_timeout)
        .await?;
    Ok((StatusCode::CREATED, Json(DroneResponse::from(&drone))))
}

/// GET /v1/drones/{id}/battery: Battery charge of a drone.
#[utoipa::path(
    get,
    path = "/v1/drones/{id}/battery",
    params(("id" = i64, Path, description = "Drone ID")),
    responses(
        (status = 200, description = "Battery charge", body = BatteryResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "drones"
)]
async fn battery_level(
    State(state): State<AppState>,
    DronePath(id): DronePath,
) -> Result<Json<BatteryResponse>, AppError> {
    let battery = state.fleet.battery_level(id).await?;
    Ok(Json(BatteryResponse {
        drone_id: id.get(),
        battery,
    }))
}

/// GET /v1/drones/{id}/state: Lifecycle state of a drone.
#[utoipa::path(
    get,
    path = "/v1/drones/{id}/state",
    params(("id" = i64, Path, description = "Drone ID")),
    responses(
        (status = 200, description = "Drone state", body = StateResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "drones"
)]
async fn drone_state(
    State(state): State<AppState>,
    DronePath(id): DronePath,
) -> Result<Json<StateResponse>, AppError> {
    let current = state.fleet.drone_state(id).await?;
    Ok(Json(StateResponse {
        drone_id: id.get(),
        state: current.to_string(),
    }))
}
