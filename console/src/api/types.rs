//! Backend wire types and error definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::LngLat;

/// Errors that prevent a backend reply from being read at all
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend returned HTTP {status} without an error payload")]
    Status { status: u16 },

    #[error("Failed to decode backend reply: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("API key is not a valid header value")]
    InvalidApiKey,

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Error payload the backend sends instead of a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Parsed backend reply: either the expected payload or an error payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply<T> {
    Failure(ErrorBody),
    Success(T),
}

impl<T> Reply<T> {
    pub fn error(&self) -> Option<&str> {
        match self {
            Reply::Success(_) => None,
            Reply::Failure(body) => Some(&body.error),
        }
    }
}

/// Body of `POST /geofences`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateGeofenceRequest {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Points")]
    pub points: Vec<LngLat>,
}

/// Body of `POST /devices`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDeviceRequest {
    #[serde(rename = "DeviceId")]
    pub device_id: String,
    /// Serialised as `null` when no coordinates were drawn
    #[serde(rename = "Path")]
    pub path: Option<Vec<LngLat>>,
}

/// Acknowledgement payloads are passed through as raw JSON
pub type Ack = serde_json::Value;
