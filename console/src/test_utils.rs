//! Test Utilities Module
//!
//! Provides an in-memory `LocationApi` that records every call, plus small
//! fixtures shared by the controller tests.

#![cfg(test)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::json;

use crate::api::{Ack, ApiError, ErrorBody, LocationApi, Reply};
use crate::geo::{
    DevicePosition, DeviceRecord, GeofenceGeometry, GeofenceRecord, LngLat, Place, PlaceGeometry,
    PlaceResult,
};

// ============================================================================
// Recorded calls
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    ListGeofences,
    CreateGeofence { id: String, points: Vec<LngLat> },
    DeleteGeofence(String),
    ListDevices,
    CreateDevice { id: String, path: Option<Vec<LngLat>> },
    DeleteDevice(String),
    DevicePosition(String),
    SearchPois(String),
}

/// How the fake answers create/delete calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailureMode {
    #[default]
    None,
    /// Answer with an `{error}` payload
    Reject,
    /// Fail as if the request never reached the backend
    Transport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Geofences,
    Devices,
    Both,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<ApiCall>,
    geofences: Vec<GeofenceRecord>,
    devices: Vec<DeviceRecord>,
    positions: HashMap<String, LngLat>,
    places: Vec<PlaceResult>,
    writes: FailureMode,
    device_lists: FailureMode,
    geofence_lists: FailureMode,
    unreachable_positions: Vec<String>,
}

// ============================================================================
// Fake backend
// ============================================================================

/// In-memory backend behaving like the REST proxy
#[derive(Clone, Default)]
pub struct FakeApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_geofence(self, id: &str, ring: Vec<LngLat>) -> Self {
        self.state().geofences.push(geofence(id, ring));
        self
    }

    pub fn with_device(self, id: &str, path: Option<Vec<LngLat>>) -> Self {
        self.state().devices.push(DeviceRecord {
            device_id: id.to_string(),
            path,
        });
        self
    }

    pub fn with_position(self, id: &str, at: LngLat) -> Self {
        self.set_position(id, at);
        self
    }

    pub fn with_place(self, label: &str, at: LngLat) -> Self {
        self.state().places.push(PlaceResult {
            place: Place {
                label: Some(label.to_string()),
                geometry: PlaceGeometry { point: at },
            },
        });
        self
    }

    pub fn set_position(&self, id: &str, at: LngLat) {
        self.state().positions.insert(id.to_string(), at);
    }

    /// Drop a device behind the controller's back
    pub fn remove_device(&self, id: &str) {
        self.state().devices.retain(|d| d.device_id != id);
    }

    pub fn fail_writes(&self, mode: FailureMode) {
        self.state().writes = mode;
    }

    /// Make list calls reject or fail in transport
    pub fn fail_lists(&self, which: ListKind, mode: FailureMode) {
        let mut state = self.state();
        match which {
            ListKind::Geofences => state.geofence_lists = mode,
            ListKind::Devices => state.device_lists = mode,
            ListKind::Both => {
                state.geofence_lists = mode;
                state.device_lists = mode;
            }
        }
    }

    pub fn make_position_unreachable(&self, id: &str) {
        self.state().unreachable_positions.push(id.to_string());
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    fn record(&self, call: ApiCall) -> FailureMode {
        let mut state = self.state();
        state.calls.push(call);
        state.writes
    }
}

fn failure(msg: &str) -> ErrorBody {
    ErrorBody {
        error: msg.to_string(),
    }
}

#[async_trait]
impl LocationApi for FakeApi {
    async fn list_geofences(&self) -> Result<Reply<Vec<GeofenceRecord>>, ApiError> {
        self.record(ApiCall::ListGeofences);
        let state = self.state();
        match state.geofence_lists {
            FailureMode::Transport => Err(ApiError::Unavailable("connection refused".into())),
            FailureMode::Reject => Ok(Reply::Failure(failure("Geofence collection not found"))),
            FailureMode::None => Ok(Reply::Success(state.geofences.clone())),
        }
    }

    async fn create_geofence(&self, id: &str, points: &[LngLat]) -> Result<Reply<Ack>, ApiError> {
        let mode = self.record(ApiCall::CreateGeofence {
            id: id.to_string(),
            points: points.to_vec(),
        });
        match mode {
            FailureMode::Transport => Err(ApiError::Unavailable("connection refused".into())),
            FailureMode::Reject => Ok(Reply::Failure(failure("Invalid polygon"))),
            FailureMode::None => {
                let mut ring = points.to_vec();
                if ring.first() != ring.last() {
                    ring.push(ring[0]);
                }
                let mut state = self.state();
                state.geofences.retain(|g| g.geofence_id != id);
                state.geofences.push(geofence(id, ring));
                Ok(Reply::Success(json!({"GeofenceId": id})))
            }
        }
    }

    async fn delete_geofence(&self, id: &str) -> Result<Reply<Ack>, ApiError> {
        let mode = self.record(ApiCall::DeleteGeofence(id.to_string()));
        match mode {
            FailureMode::Transport => Err(ApiError::Unavailable("connection refused".into())),
            FailureMode::Reject => Ok(Reply::Failure(failure("ResourceNotFoundError"))),
            FailureMode::None => {
                self.state().geofences.retain(|g| g.geofence_id != id);
                Ok(Reply::Success(json!({"Errors": []})))
            }
        }
    }

    async fn list_devices(&self) -> Result<Reply<Vec<DeviceRecord>>, ApiError> {
        self.record(ApiCall::ListDevices);
        let state = self.state();
        match state.device_lists {
            FailureMode::Transport => Err(ApiError::Unavailable("connection refused".into())),
            FailureMode::Reject => Ok(Reply::Failure(failure("Table not found"))),
            FailureMode::None => Ok(Reply::Success(state.devices.clone())),
        }
    }

    async fn create_device(
        &self,
        id: &str,
        path: Option<&[LngLat]>,
    ) -> Result<Reply<Ack>, ApiError> {
        let mode = self.record(ApiCall::CreateDevice {
            id: id.to_string(),
            path: path.map(<[LngLat]>::to_vec),
        });
        match mode {
            FailureMode::Transport => Err(ApiError::Unavailable("connection refused".into())),
            FailureMode::Reject => Ok(Reply::Failure(failure("Table not found"))),
            FailureMode::None => {
                let mut state = self.state();
                state.devices.retain(|d| d.device_id != id);
                state.devices.push(DeviceRecord {
                    device_id: id.to_string(),
                    path: path.map(<[LngLat]>::to_vec),
                });
                Ok(Reply::Success(json!({"status": "ok"})))
            }
        }
    }

    async fn delete_device(&self, id: &str) -> Result<Reply<Ack>, ApiError> {
        let mode = self.record(ApiCall::DeleteDevice(id.to_string()));
        match mode {
            FailureMode::Transport => Err(ApiError::Unavailable("connection refused".into())),
            FailureMode::Reject => Ok(Reply::Failure(failure("Table not found"))),
            FailureMode::None => {
                self.state().devices.retain(|d| d.device_id != id);
                Ok(Reply::Success(json!({"status": "ok"})))
            }
        }
    }

    async fn device_position(&self, id: &str) -> Result<Reply<DevicePosition>, ApiError> {
        self.record(ApiCall::DevicePosition(id.to_string()));
        let state = self.state();
        if state.unreachable_positions.iter().any(|u| u == id) {
            return Err(ApiError::Unavailable("timed out".into()));
        }
        Ok(match state.positions.get(id) {
            Some(&position) => Reply::Success(DevicePosition {
                device_id: id.to_string(),
                position,
                sample_time: None,
                received_time: None,
            }),
            None => Reply::Failure(failure("Device position not found")),
        })
    }

    async fn search_pois(&self, term: &str) -> Result<Reply<Vec<PlaceResult>>, ApiError> {
        self.record(ApiCall::SearchPois(term.to_string()));
        Ok(Reply::Success(self.state().places.clone()))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn geofence(id: &str, ring: Vec<LngLat>) -> GeofenceRecord {
    GeofenceRecord {
        geofence_id: id.to_string(),
        geometry: GeofenceGeometry {
            polygon: vec![ring],
        },
        status: None,
        create_time: None,
        update_time: None,
    }
}

/// Closed unit-ish square ring with its lower-left corner at `(x, y)`
pub fn square_ring(x: f64, y: f64, size: f64) -> Vec<LngLat> {
    vec![
        LngLat::new(x, y),
        LngLat::new(x, y + size),
        LngLat::new(x + size, y + size),
        LngLat::new(x + size, y),
        LngLat::new(x, y),
    ]
}
