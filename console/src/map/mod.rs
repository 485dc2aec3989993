//! Map renderer seam
//!
//! This module provides:
//! - `MapRenderer` trait implemented by whatever draws the map
//! - `SceneRenderer`, an in-memory renderer with spatial hit testing
//! - `RequestTransformer` for resolving and signing renderer requests

mod renderer;
mod scene;
pub mod transform;

pub use renderer::{
    Cursor, DEVICE_MARKER_COLOR, Layer, MapClick, MapRenderer, MarkerId,
    SEARCH_MARKER_COLOR, ScreenPoint,
};
pub use scene::{SceneMarker, SceneRenderer};
pub use transform::{RequestTransformer, ResourceType, resolve_style_url};
