//! Backend client module
//!
//! This module provides:
//! - `LocationApi` trait for abstracting the geofence/device backend
//! - `HttpLocationApi` for talking to the REST proxy over HTTP
//! - Wire types shared by both

mod http;
mod service;
mod types;

pub use http::HttpLocationApi;
pub use service::LocationApi;
pub use types::{Ack, ApiError, CreateDeviceRequest, CreateGeofenceRequest, ErrorBody, Reply};
