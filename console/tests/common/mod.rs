//! Common Test Utilities for Integration Tests
//!
//! An in-process stand-in for the REST proxy, served with axum on an
//! ephemeral port.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use geotrack_console::api::{CreateDeviceRequest, CreateGeofenceRequest};
use geotrack_console::config::ApiConfig;
use geotrack_console::geo::{
    DevicePosition, DeviceRecord, GeofenceGeometry, GeofenceRecord, LngLat, Place, PlaceGeometry,
    PlaceResult,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_API_KEY: &str = "test-key";

/// Device id whose position lookup fails with a bare 500
pub const EXPLODING_DEVICE: &str = "explode";

/// Backend data shared between the stub's handlers and the test
#[derive(Default)]
pub struct StubData {
    pub geofences: Vec<GeofenceRecord>,
    pub devices: Vec<DeviceRecord>,
    pub positions: HashMap<String, LngLat>,
    pub places: Vec<PlaceResult>,
    pub search_terms: Vec<String>,
    /// Reject geofence creation with an `{error}` payload
    pub reject_geofences: bool,
    /// Answer geofence creation the way the gateway does for a bad key
    pub forbid_geofences: bool,
}

#[derive(Clone, Default)]
pub struct StubBackend {
    data: Arc<Mutex<StubData>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F: FnOnce(&mut StubData)>(&self, f: F) {
        f(&mut self.data.lock().unwrap());
    }

    pub fn read<T, F: FnOnce(&StubData) -> T>(&self, f: F) -> T {
        f(&self.data.lock().unwrap())
    }
}

fn ok(body: serde_json::Value) -> Response {
    Json(body).into_response()
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn require_api_key(request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        == Some(TEST_API_KEY);
    if !authorized {
        // Same shape as the gateway's own rejection, not an `{error}` payload
        return (StatusCode::FORBIDDEN, Json(json!({ "message": "Forbidden" }))).into_response();
    }
    next.run(request).await
}

async fn list_geofences(State(stub): State<StubBackend>) -> Response {
    ok(json!(stub.read(|d| d.geofences.clone())))
}

async fn create_geofence(
    State(stub): State<StubBackend>,
    Json(request): Json<CreateGeofenceRequest>,
) -> Response {
    if stub.read(|d| d.forbid_geofences) {
        return (StatusCode::FORBIDDEN, Json(json!({ "message": "Forbidden" }))).into_response();
    }
    if stub.read(|d| d.reject_geofences) {
        return failure(StatusCode::BAD_REQUEST, "ValidationException: invalid polygon");
    }

    let mut ring = request.points.clone();
    if !ring.is_empty() && ring.first() != ring.last() {
        ring.push(ring[0]);
    }
    stub.with(|d| {
        d.geofences.retain(|g| g.geofence_id != request.id);
        d.geofences.push(GeofenceRecord {
            geofence_id: request.id.clone(),
            geometry: GeofenceGeometry {
                polygon: vec![ring],
            },
            status: Some("ACTIVE".to_string()),
            create_time: None,
            update_time: None,
        });
    });
    ok(json!({ "GeofenceId": request.id }))
}

async fn delete_geofence(State(stub): State<StubBackend>, Path(id): Path<String>) -> Response {
    stub.with(|d| d.geofences.retain(|g| g.geofence_id != id));
    ok(json!({ "Errors": [] }))
}

async fn list_devices(State(stub): State<StubBackend>) -> Response {
    ok(json!(stub.read(|d| d.devices.clone())))
}

async fn create_device(
    State(stub): State<StubBackend>,
    Json(request): Json<CreateDeviceRequest>,
) -> Response {
    stub.with(|d| {
        d.devices.retain(|r| r.device_id != request.device_id);
        d.devices.push(DeviceRecord {
            device_id: request.device_id.clone(),
            path: request.path.clone(),
        });
    });
    ok(json!({}))
}

async fn delete_device(State(stub): State<StubBackend>, Path(id): Path<String>) -> Response {
    stub.with(|d| {
        d.devices.retain(|r| r.device_id != id);
        d.positions.remove(&id);
    });
    ok(json!({}))
}

async fn device_position(State(stub): State<StubBackend>, Path(id): Path<String>) -> Response {
    if id == EXPLODING_DEVICE {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    }
    match stub.read(|d| d.positions.get(&id).copied()) {
        Some(position) => ok(json!(DevicePosition {
            device_id: id,
            position,
            sample_time: Some("2024-01-01T00:00:00Z".to_string()),
            received_time: None,
        })),
        None => failure(StatusCode::NOT_FOUND, "ResourceNotFoundException"),
    }
}

#[derive(Deserialize)]
struct SearchQuery {
    term: String,
}

async fn search_pois(State(stub): State<StubBackend>, Query(query): Query<SearchQuery>) -> Response {
    let places = stub.read(|d| d.places.clone());
    stub.with(|d| d.search_terms.push(query.term));
    ok(json!(places))
}

/// Router implementing the REST proxy's routes
pub fn create_stub_router(stub: StubBackend) -> Router {
    Router::new()
        .route("/geofences", get(list_geofences).post(create_geofence))
        .route("/geofences/:id", delete(delete_geofence))
        .route("/devices", get(list_devices).post(create_device))
        .route("/devices/:id", delete(delete_device))
        .route("/devices/:id/position", get(device_position))
        .route("/pois", get(search_pois))
        .layer(middleware::from_fn(require_api_key))
        .with_state(stub)
}

/// Serve the stub on an ephemeral port
pub async fn start_stub_backend(stub: StubBackend) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let app = create_stub_router(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give server time to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, handle)
}

/// Client configuration pointing at a running stub
pub fn api_config(addr: SocketAddr) -> ApiConfig {
    ApiConfig {
        endpoint: format!("http://{}", addr),
        api_key: Some(TEST_API_KEY.to_string()),
        timeout: Duration::from_secs(5),
    }
}

pub fn place(label: &str, lng: f64, lat: f64) -> PlaceResult {
    PlaceResult {
        place: Place {
            label: Some(label.to_string()),
            geometry: PlaceGeometry {
                point: LngLat::new(lng, lat),
            },
        },
    }
}
