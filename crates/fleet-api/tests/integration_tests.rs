//! # Integration Tests for fleet-api
//!
//! Drives the full router over the in-memory store: registration, loading,
//! per-drone queries, fleet queries, the battery log after a degradation
//! tick, health probes, the metrics endpoint, and the OpenAPI document.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use fleet_api::bootstrap::{with_stores, Bootstrapped};
use fleet_api::state::AppConfig;
use fleet_core::DroneId;
use fleet_state::{Drone, DroneState, NewDrone};
use fleet_store::{BatchSave, DroneStore, MemoryStore, StoreError};

/// Helper: state and scheduler over a fresh in-memory store, no loading delay.
fn test_boot() -> Bootstrapped {
    let config = AppConfig {
        loading_delay: Duration::ZERO,
        ..AppConfig::default()
    };
    let store = Arc::new(MemoryStore::new());
    with_stores(config, store.clone(), store).unwrap()
}

fn test_app() -> axum::Router {
    fleet_api::app(test_boot().state)
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Helper: register a drone and return its id.
async fn register(app: &axum::Router, body: Value) -> i64 {
    let response = app
        .clone()
        .oneshot(post_json("/v1/drones", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["drone_id"].as_i64().unwrap()
}

fn drone(serial: &str, weight_limit: i64) -> Value {
    json!({ "serial_number": serial, "model": "Middleweight", "weight_limit": weight_limit })
}

fn medication(name: &str, code: &str, weight: i64) -> Value {
    json!({ "name": name, "code": code, "weight": weight })
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let response = test_app().oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let response = test_app().oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

/// A drone store whose backend is gone.
struct UnreachableStore;

fn refused<T>() -> Result<T, StoreError> {
    Err(StoreError::Backend("connection refused".into()))
}

#[async_trait]
impl DroneStore for UnreachableStore {
    async fn create_drone(&self, _: NewDrone) -> Result<Drone, StoreError> {
        refused()
    }
    async fn get_drone(&self, _: DroneId) -> Result<Drone, StoreError> {
        refused()
    }
    async fn save_drone(&self, _: &Drone) -> Result<Drone, StoreError> {
        refused()
    }
    async fn save_drones(&self, _: &[Drone]) -> Result<BatchSave, StoreError> {
        refused()
    }
    async fn save_drained(&self, _: &[Drone]) -> Result<BatchSave, StoreError> {
        refused()
    }
    async fn list_drones(&self) -> Result<Vec<Drone>, StoreError> {
        refused()
    }
    async fn list_drones_by_state(&self, _: DroneState) -> Result<Vec<Drone>, StoreError> {
        refused()
    }
    async fn ping(&self) -> Result<(), StoreError> {
        refused()
    }
}

#[tokio::test]
async fn test_readiness_fails_when_store_is_unreachable() {
    let boot = with_stores(
        AppConfig::default(),
        Arc::new(UnreachableStore),
        Arc::new(MemoryStore::new()),
    )
    .unwrap();
    let app = fleet_api::app(boot.state);

    let response = app.clone().oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    assert!(!body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("connection refused"));

    let response = app.oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Metrics ------------------------------------------------------------------

#[tokio::test]
async fn test_metrics_count_loads_and_ticks() {
    let boot = test_boot();
    let app = fleet_api::app(boot.state);
    let id = register(&app, drone("SN-0000000001", 300)).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/drones/{id}/medications"),
            medication("Aspirin", "ASP_1", 10),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/drones/{id}/medications"),
            medication("Ibuprofen", "IBU_1", 400),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    boot.scheduler.run_tick().await.unwrap();

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_string(response).await;
    assert!(text.contains("fleet_medications_loaded_total 1"));
    assert!(text.contains("fleet_load_rejections_total{reason=\"overweight\"} 1"));
    assert!(text.contains("fleet_degradation_ticks_total 1"));
    assert!(text.contains("fleet_battery_logs_total 1"));
    assert!(text.contains("fleet_drones{state=\"LOADING\"} 1"));
    assert!(text.contains("fleet_drones{state=\"IDLE\"} 0"));
}

// -- Registration -------------------------------------------------------------

#[tokio::test]
async fn test_register_and_fetch_drone() {
    let app = test_app();
    let id = register(&app, drone("SN-0000000001", 300)).await;

    let response = app.oneshot(get(&format!("/v1/drones/{id}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["serial_number"], "SN-0000000001");
    assert_eq!(body["model"], "Middleweight");
    assert_eq!(body["battery"], 100);
    assert_eq!(body["state"], "IDLE");
    assert_eq!(body["current_payload"], 0);
    assert_eq!(body["medications"], json!([]));
}

#[tokio::test]
async fn test_register_rejects_short_serial() {
    let response = test_app()
        .oneshot(post_json("/v1/drones", drone("SN-1", 300)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_register_rejects_unknown_model() {
    let body = json!({ "serial_number": "SN-0000000001", "model": "Jumbo", "weight_limit": 300 });
    let response = test_app().oneshot(post_json("/v1/drones", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_register_rejects_weight_limit_over_500() {
    let response = test_app()
        .oneshot(post_json("/v1/drones", drone("SN-0000000001", 501)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_register_weight_limit_minimum_is_10() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(post_json("/v1/drones", drone("SN-0000000001", 9)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    register(&app, drone("SN-0000000001", 10)).await;
}

#[tokio::test]
async fn test_register_duplicate_serial_is_conflict() {
    let app = test_app();
    register(&app, drone("SN-0000000001", 300)).await;
    let response = app
        .oneshot(post_json("/v1/drones", drone("SN-0000000001", 200)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_malformed_json_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/drones")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -- Loading ------------------------------------------------------------------

#[tokio::test]
async fn test_load_until_full() {
    let app = test_app();
    let id = register(&app, drone("SN-0000000001", 300)).await;
    let uri = format!("/v1/drones/{id}/medications");

    let response = app
        .clone()
        .oneshot(post_json(&uri, medication("Aspirin", "ASP_1", 200)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["state"], "LOADING");
    assert_eq!(body["current_payload"], 200);
    assert_eq!(body["medications"][0]["code"], "ASP_1");

    let response = app
        .clone()
        .oneshot(post_json(&uri, medication("Ibuprofen", "IBU_1", 100)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["current_payload"], 300);

    let response = app
        .clone()
        .oneshot(post_json(&uri, medication("Paracetamol", "PAR_1", 1)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "LOADING_REJECTED");
    assert_eq!(body["error"]["details"]["reason"], "capacity_exceeded");
    assert_eq!(body["error"]["details"]["current_payload"], 300);

    let response = app.oneshot(get(&format!("/v1/drones/{id}"))).await.unwrap();
    assert_eq!(body_json(response).await["medications"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_load_low_battery_rejected() {
    let app = test_app();
    let mut body = drone("SN-0000000001", 300);
    body["battery"] = json!(24);
    let id = register(&app, body).await;

    let response = app
        .oneshot(post_json(
            &format!("/v1/drones/{id}/medications"),
            medication("Aspirin", "ASP_1", 10),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["details"]["reason"], "insufficient_battery");
    assert_eq!(body["error"]["details"]["battery"], 24);
    assert_eq!(body["error"]["details"]["minimum"], 25);
}

#[tokio::test]
async fn test_load_invalid_name_rejected() {
    let app = test_app();
    let id = register(&app, drone("SN-0000000001", 300)).await;
    let response = app
        .oneshot(post_json(
            &format!("/v1/drones/{id}/medications"),
            medication("Aspirin 500mg!", "ASP_1", 10),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_load_busy_drone_is_conflict() {
    let app = test_app();
    let mut body = drone("SN-0000000001", 300);
    body["state"] = json!("DELIVERING");
    let id = register(&app, body).await;

    let response = app
        .oneshot(post_json(
            &format!("/v1/drones/{id}/medications"),
            medication("Aspirin", "ASP_1", 10),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_load_unknown_drone_is_not_found() {
    let response = test_app()
        .oneshot(post_json("/v1/drones/42/medications", medication("Aspirin", "ASP_1", 10)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_load_duplicate_code_is_conflict() {
    let app = test_app();
    let a = register(&app, drone("SN-0000000001", 300)).await;
    let b = register(&app, drone("SN-0000000002", 300)).await;

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/drones/{a}/medications"),
            medication("Aspirin", "ASP_1", 10),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(post_json(
            &format!("/v1/drones/{b}/medications"),
            medication("Aspirin-B", "ASP_1", 10),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_load_same_code_twice_on_one_drone_is_conflict() {
    let app = test_app();
    let id = register(&app, drone("SN-0000000001", 300)).await;
    let uri = format!("/v1/drones/{id}/medications");

    let response = app
        .clone()
        .oneshot(post_json(&uri, medication("Aspirin", "ASP_1", 10)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(post_json(&uri, medication("Aspirin-again", "ASP_1", 10)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert!(body["error"]["message"].as_str().unwrap().contains("ASP_1"));

    let response = app.oneshot(get(&format!("/v1/drones/{id}"))).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["medications"].as_array().unwrap().len(), 1);
    assert_eq!(body["current_payload"], 10);
}

#[tokio::test]
async fn test_load_unparseable_image_url_rejected() {
    let app = test_app();
    let id = register(&app, drone("SN-0000000001", 300)).await;
    let mut item = medication("Aspirin", "ASP_1", 10);
    item["image"] = json!("https://[");
    let response = app
        .oneshot(post_json(&format!("/v1/drones/{id}/medications"), item))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -- Per-drone queries --------------------------------------------------------

#[tokio::test]
async fn test_battery_level_is_percentage_string() {
    let app = test_app();
    let mut body = drone("SN-0000000001", 300);
    body["battery"] = json!(87);
    let id = register(&app, body).await;

    let response = app.oneshot(get(&format!("/v1/drones/{id}/battery"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["drone_id"], id);
    assert_eq!(body["battery"], "87%");
}

#[tokio::test]
async fn test_drone_state() {
    let app = test_app();
    let id = register(&app, drone("SN-0000000001", 300)).await;
    let response = app.oneshot(get(&format!("/v1/drones/{id}/state"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["state"], "IDLE");
}

#[tokio::test]
async fn test_unknown_drone_is_not_found() {
    let app = test_app();
    for uri in ["/v1/drones/7", "/v1/drones/7/battery", "/v1/drones/0/state"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let response = test_app().oneshot(get("/v1/drones/abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -- Fleet queries ------------------------------------------------------------

#[tokio::test]
async fn test_available_lists_idle_drones_only() {
    let app = test_app();
    let idle = register(&app, drone("SN-0000000001", 300)).await;
    let busy = register(&app, drone("SN-0000000002", 300)).await;
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/v1/drones/{busy}/medications"),
            medication("Aspirin", "ASP_1", 10),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(get("/v1/fleet/available")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![idle]);
}

#[tokio::test]
async fn test_battery_log_after_tick() {
    let boot = test_boot();
    let app = fleet_api::app(boot.state);
    let id = register(&app, drone("SN-0000000001", 300)).await;

    let response = app.clone().oneshot(get("/v1/fleet/logs")).await.unwrap();
    assert_eq!(body_json(response).await, json!([]));

    let report = boot.scheduler.run_tick().await.unwrap();
    assert_eq!(report.decremented, 1);

    let response = app.clone().oneshot(get("/v1/fleet/logs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["drone_id"], id);
    assert_eq!(body[0]["battery"], 99);
    assert_eq!(body[0]["drone_state"], "IDLE");

    let response = app.oneshot(get(&format!("/v1/drones/{id}/battery"))).await.unwrap();
    assert_eq!(body_json(response).await["battery"], "99%");
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn test_openapi_served() {
    let response = test_app().oneshot(get("/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/v1/drones/{id}/medications"].is_object());
    assert!(body["paths"]["/v1/fleet/logs"].is_object());
}
