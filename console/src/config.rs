//! Console configuration
//!
//! Configuration is loaded from environment variables, the same values the
//! static page used to receive as build-time placeholders.

use std::env;
use std::time::Duration;

use crate::geo::LngLat;

/// Main console configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Backend API configuration
    pub api: ApiConfig,

    /// Map configuration
    pub map: MapConfig,

    /// Position refresh configuration
    pub refresh: RefreshConfig,
}

/// Backend API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the REST proxy (no trailing slash)
    pub endpoint: String,
    /// Value sent in the `X-API-Key` header, if any
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Map-related configuration
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Cognito identity pool used for signing credentials
    pub identity_pool_id: Option<String>,
    /// Name of the location-service map resource
    pub map_name: String,
    /// Initial map centre
    pub center: LngLat,
    /// Initial map zoom
    pub zoom: f64,
    /// Hit-test tolerance for line layers, in degrees
    pub hit_tolerance: f64,
}

/// Position refresh loop configuration
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Delay between the end of one pass and the start of the next
    pub interval: Duration,
    /// Whether the loop runs at all
    pub enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            identity_pool_id: None,
            map_name: "explore.map".to_string(),
            center: LngLat::new(-3.6878047, 40.4763141),
            zoom: 15.0,
            hit_tolerance: 0.0005,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            enabled: true,
        }
    }
}

impl MapConfig {
    /// Region encoded in the identity pool id (`<region>:<uuid>`)
    pub fn region(&self) -> Option<&str> {
        self.identity_pool_id
            .as_deref()
            .and_then(region_from_identity_pool)
    }
}

/// Extract the region prefix of a Cognito identity pool id
pub fn region_from_identity_pool(pool_id: &str) -> Option<&str> {
    match pool_id.split_once(':') {
        Some((region, _)) if !region.is_empty() => Some(region),
        _ => None,
    }
}

fn parse_bool(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // API config
        if let Ok(url) = env::var("API_ENDPOINT")
            && !url.is_empty()
        {
            config.api.endpoint = url.trim_end_matches('/').to_string();
        }
        if let Ok(key) = env::var("API_KEY")
            && !key.is_empty()
        {
            config.api.api_key = Some(key);
        }
        if let Ok(val) = env::var("API_TIMEOUT_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            config.api.timeout = Duration::from_secs(secs);
        }

        // Map config
        if let Ok(id) = env::var("COGNITO_IDENTITY_POOL_ID")
            && !id.is_empty()
        {
            config.map.identity_pool_id = Some(id);
        }
        if let Ok(name) = env::var("MAP_NAME")
            && !name.is_empty()
        {
            config.map.map_name = name;
        }
        if let Ok(val) = env::var("MAP_CENTER_LNG")
            && let Ok(lng) = val.parse()
        {
            config.map.center.lng = lng;
        }
        if let Ok(val) = env::var("MAP_CENTER_LAT")
            && let Ok(lat) = val.parse()
        {
            config.map.center.lat = lat;
        }
        if let Ok(val) = env::var("MAP_ZOOM")
            && let Ok(zoom) = val.parse()
        {
            config.map.zoom = zoom;
        }
        if let Ok(val) = env::var("HIT_TOLERANCE_DEG")
            && let Ok(tol) = val.parse()
        {
            config.map.hit_tolerance = tol;
        }

        // Refresh config
        if let Ok(val) = env::var("POSITION_REFRESH_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.refresh.interval = Duration::from_millis(ms);
        }
        if let Ok(val) = env::var("POSITION_REFRESH_ENABLED") {
            config.refresh.enabled = parse_bool(&val);
        }

        config
    }
}
