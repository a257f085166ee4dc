//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the fleet API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Drone Fleet Controller API",
        version = "0.1.0",
        description = "Registers delivery drones, loads medication onto them, and reports battery and lifecycle state.\n\nA background task drains every drone's battery by one percent per tick and records each change in the battery log.",
        license(name = "AGPL-3.0-or-later")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        crate::routes::drones::register_drone,
        crate::routes::drones::get_drone,
        crate::routes::drones::load_medication,
        crate::routes::drones::battery_level,
        crate::routes::drones::drone_state,
        crate::routes::fleet::available_drones,
        crate::routes::fleet::battery_logs,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            crate::routes::DroneResponse,
            crate::routes::MedicationResponse,
            crate::routes::drones::RegisterDroneRequest,
            crate::routes::drones::LoadMedicationRequest,
            crate::routes::drones::RegisteredResponse,
            crate::routes::drones::BatteryResponse,
            crate::routes::drones::StateResponse,
            crate::routes::fleet::BatteryLogResponse,
        ),
    ),
    tags(
        (name = "drones", description = "Drone registration, medication loading, battery and state"),
        (name = "fleet", description = "Fleet-wide availability and the battery log"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
