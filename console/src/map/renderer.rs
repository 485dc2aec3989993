//! MapRenderer trait and the layer catalogue

use crate::geo::{Feature, GeoJson, LngLat};

/// Sources (and the layer drawn from each) installed on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Preview of the polygon being drawn
    DraftGeofence,
    /// Preview of the path being drawn
    DraftDevice,
    Geofences,
    Devices,
}

impl Layer {
    pub const ALL: [Layer; 4] = [
        Layer::DraftGeofence,
        Layer::DraftDevice,
        Layer::Geofences,
        Layer::Devices,
    ];

    /// Source and layer id on the map
    pub fn id(self) -> &'static str {
        match self {
            Layer::DraftGeofence => "_newGeofence",
            Layer::DraftDevice => "_newDevice",
            Layer::Geofences => "geofences",
            Layer::Devices => "devices",
        }
    }
}

/// Pixel position on the map canvas
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// A click on the map, in both canvas and geographic coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapClick {
    pub point: ScreenPoint,
    pub lng_lat: LngLat,
}

impl MapClick {
    pub fn at(lng_lat: LngLat) -> Self {
        Self {
            point: ScreenPoint::default(),
            lng_lat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Pointer,
    Crosshair,
}

impl Cursor {
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Pointer => "pointer",
            Cursor::Crosshair => "crosshair",
        }
    }
}

/// Handle of a marker owned by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

pub const DEVICE_MARKER_COLOR: &str = "#ff0000";
pub const SEARCH_MARKER_COLOR: &str = "#0080ff";

/// Rendering surface driven by the controller
///
/// All calls happen on the controller's task so implementations need no
/// internal locking.
pub trait MapRenderer: Send {
    /// Create the GeoJSON source and its layer, initially empty
    fn add_layer(&mut self, layer: Layer);

    /// Replace a source's data; `None` empties it
    fn set_source_data(&mut self, layer: Layer, data: Option<GeoJson>);

    /// Features of `layer` drawn under the click
    fn query_rendered_features(&self, click: &MapClick, layer: Layer) -> Vec<Feature>;

    fn set_cursor(&mut self, cursor: Cursor);

    fn add_marker(&mut self, at: LngLat, color: &str) -> MarkerId;

    fn move_marker(&mut self, marker: MarkerId, to: LngLat);

    fn remove_marker(&mut self, marker: MarkerId);
}
