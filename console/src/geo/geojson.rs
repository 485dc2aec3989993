//! Minimal GeoJSON model for map sources

use serde::{Deserialize, Serialize};

use super::types::{DeviceRecord, GeofenceRecord, LngLat};

/// Geometry variants rendered by the console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: LngLat },
    LineString { coordinates: Vec<LngLat> },
    Polygon { coordinates: Vec<Vec<LngLat>> },
}

/// Properties carried by every rendered feature
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: FeatureProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

/// Data accepted by a GeoJSON source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeoJson {
    Feature(Feature),
    FeatureCollection(FeatureCollection),
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            properties: FeatureProperties::default(),
        }
    }

    pub fn with_id(geometry: Geometry, id: impl Into<String>) -> Self {
        Self {
            geometry,
            properties: FeatureProperties {
                id: Some(id.into()),
            },
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.properties.id.as_deref()
    }

    /// Preview of an unfinished polygon: one ring, not closed
    pub fn draft_polygon(points: &[LngLat]) -> Self {
        Self::new(Geometry::Polygon {
            coordinates: vec![points.to_vec()],
        })
    }

    pub fn draft_path(points: &[LngLat]) -> Self {
        Self::new(Geometry::LineString {
            coordinates: points.to_vec(),
        })
    }
}

impl From<&GeofenceRecord> for Feature {
    fn from(record: &GeofenceRecord) -> Self {
        Feature::with_id(
            Geometry::Polygon {
                coordinates: record.geometry.polygon.clone(),
            },
            &record.geofence_id,
        )
    }
}

impl From<&DeviceRecord> for Feature {
    fn from(record: &DeviceRecord) -> Self {
        Feature::with_id(
            Geometry::LineString {
                coordinates: record.path.clone().unwrap_or_default(),
            },
            &record.device_id,
        )
    }
}

impl<'a, T> FromIterator<&'a T> for FeatureCollection
where
    Feature: From<&'a T>,
    T: 'a,
{
    fn from_iter<I: IntoIterator<Item = &'a T>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().map(Feature::from).collect(),
        }
    }
}

impl GeoJson {
    /// All features contained in this document
    pub fn features(&self) -> &[Feature] {
        match self {
            GeoJson::Feature(f) => std::slice::from_ref(f),
            GeoJson::FeatureCollection(c) => &c.features,
        }
    }
}

impl From<Feature> for GeoJson {
    fn from(f: Feature) -> Self {
        GeoJson::Feature(f)
    }
}

impl From<FeatureCollection> for GeoJson {
    fn from(c: FeatureCollection) -> Self {
        GeoJson::FeatureCollection(c)
    }
}
