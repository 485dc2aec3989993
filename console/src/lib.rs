//! Geotrack Console Library
//!
//! Headless controller for drawing geofences and devices on a map, keeping
//! them in sync with the location REST backend and tracking live device
//! positions. Exported for the console binary and integration tests.

pub mod api;
pub mod config;
pub mod console;
pub mod controller;
pub mod geo;
pub mod map;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use api::{HttpLocationApi, LocationApi};
pub use config::Config;
pub use controller::{App, Command, ControllerHandle, Mode, Outcome};
pub use map::{MapRenderer, SceneRenderer};
