//! Headless renderer that keeps source data in memory
//!
//! Stands in for the browser map: it stores whatever the controller pushes
//! and answers rendered-feature queries in geographic coordinates using an
//! R-tree of feature envelopes.

use std::collections::{BTreeMap, HashMap};

use rstar::{AABB, RTree, RTreeObject};
use tracing::debug;

use super::renderer::{Cursor, Layer, MapClick, MapRenderer, MarkerId};
use crate::geo::{Feature, GeoJson, Geometry, LngLat};

/// Entry in a layer's spatial index
#[derive(Debug, Clone)]
struct FeatureEntry {
    /// Index into the source's feature list
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for FeatureEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Source data plus its index
struct RenderedSource {
    data: GeoJson,
    tree: RTree<FeatureEntry>,
}

impl RenderedSource {
    fn new(data: GeoJson) -> Self {
        let entries = data
            .features()
            .iter()
            .enumerate()
            .filter_map(|(index, feature)| {
                envelope_of(&feature.geometry).map(|envelope| FeatureEntry { index, envelope })
            })
            .collect();

        Self {
            data,
            tree: RTree::bulk_load(entries),
        }
    }
}

/// Marker drawn on the scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneMarker {
    pub position: LngLat,
    pub color: String,
}

pub struct SceneRenderer {
    layers: HashMap<Layer, Option<RenderedSource>>,
    markers: BTreeMap<MarkerId, SceneMarker>,
    next_marker: u64,
    cursor: Cursor,
    /// Hit distance for points and lines, in degrees
    tolerance: f64,
}

impl SceneRenderer {
    pub fn new(tolerance: f64) -> Self {
        Self {
            layers: HashMap::new(),
            markers: BTreeMap::new(),
            next_marker: 1,
            cursor: Cursor::Pointer,
            tolerance,
        }
    }

    pub fn has_layer(&self, layer: Layer) -> bool {
        self.layers.contains_key(&layer)
    }

    /// Current data of a source, `None` when empty or never set
    pub fn source(&self, layer: Layer) -> Option<&GeoJson> {
        self.layers
            .get(&layer)
            .and_then(|s| s.as_ref())
            .map(|s| &s.data)
    }

    pub fn markers(&self) -> &BTreeMap<MarkerId, SceneMarker> {
        &self.markers
    }

    pub fn marker(&self, id: MarkerId) -> Option<&SceneMarker> {
        self.markers.get(&id)
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }
}

impl MapRenderer for SceneRenderer {
    fn add_layer(&mut self, layer: Layer) {
        debug!("Adding layer {}", layer.id());
        self.layers.entry(layer).or_insert(None);
    }

    fn set_source_data(&mut self, layer: Layer, data: Option<GeoJson>) {
        match self.layers.get_mut(&layer) {
            Some(slot) => *slot = data.map(RenderedSource::new),
            None => debug!("Ignoring data for missing source {}", layer.id()),
        }
    }

    fn query_rendered_features(&self, click: &MapClick, layer: Layer) -> Vec<Feature> {
        let Some(Some(source)) = self.layers.get(&layer) else {
            return Vec::new();
        };

        let p = [click.lng_lat.lng, click.lng_lat.lat];
        let t = self.tolerance;
        let query = AABB::from_corners([p[0] - t, p[1] - t], [p[0] + t, p[1] + t]);

        let features = source.data.features();
        let mut hits: Vec<usize> = source
            .tree
            .locate_in_envelope_intersecting(&query)
            .map(|entry| entry.index)
            .filter(|&i| hits_geometry(&features[i].geometry, p, t))
            .collect();
        hits.sort_unstable();

        hits.into_iter().map(|i| features[i].clone()).collect()
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn add_marker(&mut self, at: LngLat, color: &str) -> MarkerId {
        let id = MarkerId(self.next_marker);
        self.next_marker += 1;
        self.markers.insert(
            id,
            SceneMarker {
                position: at,
                color: color.to_string(),
            },
        );
        id
    }

    fn move_marker(&mut self, marker: MarkerId, to: LngLat) {
        if let Some(m) = self.markers.get_mut(&marker) {
            m.position = to;
        }
    }

    fn remove_marker(&mut self, marker: MarkerId) {
        self.markers.remove(&marker);
    }
}

fn envelope_of(geometry: &Geometry) -> Option<AABB<[f64; 2]>> {
    let points: Vec<[f64; 2]> = match geometry {
        Geometry::Point { coordinates } => vec![(*coordinates).into()],
        Geometry::LineString { coordinates } => coordinates.iter().map(|&c| c.into()).collect(),
        Geometry::Polygon { coordinates } => coordinates
            .first()
            .map(|ring| ring.iter().map(|&c| c.into()).collect())
            .unwrap_or_default(),
    };

    if points.is_empty() {
        None
    } else {
        Some(AABB::from_points(points.iter()))
    }
}

fn hits_geometry(geometry: &Geometry, p: [f64; 2], tolerance: f64) -> bool {
    match geometry {
        Geometry::Point { coordinates } => {
            distance(p, (*coordinates).into()) <= tolerance
        }
        Geometry::LineString { coordinates } => match coordinates.as_slice() {
            [] => false,
            [only] => distance(p, (*only).into()) <= tolerance,
            _ => coordinates
                .windows(2)
                .any(|w| segment_distance(p, w[0].into(), w[1].into()) <= tolerance),
        },
        Geometry::Polygon { coordinates } => match coordinates.split_first() {
            Some((exterior, holes)) => {
                ring_contains(exterior, p) && !holes.iter().any(|h| ring_contains(h, p))
            }
            None => false,
        },
    }
}

/// Even-odd test; the ring may or may not repeat its first point
fn ring_contains(ring: &[LngLat], p: [f64; 2]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].lng, ring[i].lat);
        let (xj, yj) = (ring[j].lng, ring[j].lat);
        if (yi > p[1]) != (yj > p[1]) && p[0] < (xj - xi) * (p[1] - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

fn segment_distance(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let (dx, dy) = (b[0] - a[0], b[1] - a[1]);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return distance(p, a);
    }
    let t = (((p[0] - a[0]) * dx + (p[1] - a[1]) * dy) / len_sq).clamp(0.0, 1.0);
    distance(p, [a[0] + t * dx, a[1] + t * dy])
}
