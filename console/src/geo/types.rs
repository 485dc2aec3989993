//! Coordinate and backend record types

use serde::{Deserialize, Serialize};

/// Longitude/latitude pair, encoded on the wire as `[lng, lat]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        [p.lng, p.lat]
    }
}

/// Geometry block of a geofence record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceGeometry {
    /// Linear rings; the first one is the exterior
    #[serde(rename = "Polygon")]
    pub polygon: Vec<Vec<LngLat>>,
}

/// Geofence as listed by `GET /geofences`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceRecord {
    #[serde(rename = "GeofenceId")]
    pub geofence_id: String,
    #[serde(rename = "Geometry")]
    pub geometry: GeofenceGeometry,
    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "CreateTime", default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(rename = "UpdateTime", default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

/// Device as listed by `GET /devices`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(rename = "DeviceId")]
    pub device_id: String,
    /// Historical path; `null` when the device was created without one
    #[serde(rename = "Path", default)]
    pub path: Option<Vec<LngLat>>,
}

/// Current position of a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicePosition {
    #[serde(rename = "DeviceId")]
    pub device_id: String,
    #[serde(rename = "Position")]
    pub position: LngLat,
    #[serde(rename = "SampleTime", default, skip_serializing_if = "Option::is_none")]
    pub sample_time: Option<String>,
    #[serde(rename = "ReceivedTime", default, skip_serializing_if = "Option::is_none")]
    pub received_time: Option<String>,
}

/// Point of interest geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceGeometry {
    #[serde(rename = "Point")]
    pub point: LngLat,
}

/// Point of interest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(rename = "Label", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "Geometry")]
    pub geometry: PlaceGeometry,
}

/// One entry of a `GET /pois` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceResult {
    #[serde(rename = "Place")]
    pub place: Place,
}
