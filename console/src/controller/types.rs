//! Controller state types and error definitions

use thiserror::Error;

use crate::api::ApiError;
use crate::geo::{LngLat, Place};
use crate::map::{Cursor, MarkerId};

/// Interaction mode; decides what a map click means
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Default,
    CreateGeofence,
    CreateDevice,
}

impl Mode {
    pub fn cursor(self) -> Cursor {
        match self {
            Mode::CreateGeofence | Mode::CreateDevice => Cursor::Crosshair,
            Mode::Default => Cursor::Pointer,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Default => "default",
            Mode::CreateGeofence => "createGeofence",
            Mode::CreateDevice => "createDevice",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum number of drawn points for a geofence
pub const MIN_GEOFENCE_POINTS: usize = 4;

/// Errors from committing a draft
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("Not in {expected} mode (current mode is {actual})")]
    WrongMode { expected: Mode, actual: Mode },

    #[error("Not enough coordinates in geofence: {have} of {need}")]
    NotEnoughPoints { have: usize, need: usize },

    #[error("{0} ID has not been provided")]
    MissingId(&'static str),

    #[error("Backend rejected the {kind}: {message}")]
    Rejected { kind: &'static str, message: String },

    #[error("Created, but reloading the collection failed: {0}")]
    Reload(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CommitError {
    /// Whether the error was raised before any request was made
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CommitError::WrongMode { .. }
                | CommitError::NotEnoughPoints { .. }
                | CommitError::MissingId(_)
        )
    }
}

/// Errors from controller flows other than commits
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Backend returned an error: {0}")]
    Backend(String),

    #[error("Search term is empty")]
    EmptySearchTerm,

    #[error("Controller is not running")]
    Stopped,
}

/// Marker owned by a device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceMarker {
    pub marker: MarkerId,
    pub position: LngLat,
}

/// Result of one position refresh pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Markers created on first sighting
    pub created: usize,
    /// Existing markers moved
    pub moved: usize,
    /// Devices without a known position
    pub missing: usize,
    /// Devices whose position request failed
    pub failed: usize,
}

/// Read-only view of the controller state
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub mode: Mode,
    pub cursor: Cursor,
    pub status: Option<String>,
    pub geofence_draft: Vec<LngLat>,
    pub device_draft: Vec<LngLat>,
    pub geofence_ids: Vec<String>,
    pub device_ids: Vec<String>,
    /// Device id and last known position, sorted by id
    pub device_positions: Vec<(String, LngLat)>,
}

/// What a dispatched command produced
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Done,
    Places(Vec<Place>),
    Pass(PassSummary),
    Snapshot(Snapshot),
}
