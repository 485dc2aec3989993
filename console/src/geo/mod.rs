//! Geographic types
//!
//! Coordinates, backend record shapes and the GeoJSON subset pushed into
//! map sources.

pub mod geojson;
pub mod types;

pub use geojson::{Feature, FeatureCollection, GeoJson, Geometry};
pub use types::{
    DevicePosition, DeviceRecord, GeofenceGeometry, GeofenceRecord, LngLat, Place, PlaceGeometry,
    PlaceResult,
};
