//! Interaction controller module
//!
//! This module provides:
//! - `App`, the mode state machine and data synchronisation flows
//! - `runtime`, the command loop that owns an `App` and drives the
//!   periodic position refresh

mod app;
pub mod runtime;
mod types;


pub use app::App;
pub use runtime::{Command, ControllerHandle, spawn};
pub use types::{
    CommitError, ControllerError, DeviceMarker, MIN_GEOFENCE_POINTS, Mode, Outcome, PassSummary,
    Snapshot,
};
