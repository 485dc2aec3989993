//! Interaction controller
//!
//! Owns the UI mode, the drafts being drawn, the geofence/device caches and
//! the device markers. Every mutation goes through `&mut self`, so whoever
//! owns the `App` is the single writer.

use std::collections::HashMap;

use metrics::counter;
use tracing::{debug, info, warn};

use super::types::{
    CommitError, ControllerError, DeviceMarker, MIN_GEOFENCE_POINTS, Mode, PassSummary, Snapshot,
};
use crate::api::{LocationApi, Reply};
use crate::geo::{
    DeviceRecord, Feature, FeatureCollection, GeoJson, GeofenceRecord, LngLat, Place,
};
use crate::map::{DEVICE_MARKER_COLOR, Layer, MapClick, MapRenderer, MarkerId, SEARCH_MARKER_COLOR};

pub struct App<A, R> {
    api: A,
    renderer: R,

    mode: Mode,
    geofence_draft: Vec<LngLat>,
    device_draft: Vec<LngLat>,
    geofence_id_input: String,
    device_id_input: String,
    status: Option<String>,

    geofences: Vec<GeofenceRecord>,
    devices: Vec<DeviceRecord>,
    markers: HashMap<String, DeviceMarker>,
    search_markers: Vec<MarkerId>,
}

impl<A: LocationApi, R: MapRenderer> App<A, R> {
    pub fn new(api: A, renderer: R) -> Self {
        Self {
            api,
            renderer,
            mode: Mode::Default,
            geofence_draft: Vec::new(),
            device_draft: Vec::new(),
            geofence_id_input: String::new(),
            device_id_input: String::new(),
            status: None,
            geofences: Vec::new(),
            devices: Vec::new(),
            markers: HashMap::new(),
            search_markers: Vec::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn geofence_draft(&self) -> &[LngLat] {
        &self.geofence_draft
    }

    pub fn device_draft(&self) -> &[LngLat] {
        &self.device_draft
    }

    pub fn geofence_id_input(&self) -> &str {
        &self.geofence_id_input
    }

    pub fn device_id_input(&self) -> &str {
        &self.device_id_input
    }

    pub fn geofences(&self) -> &[GeofenceRecord] {
        &self.geofences
    }

    pub fn devices(&self) -> &[DeviceRecord] {
        &self.devices
    }

    pub fn marker(&self, device_id: &str) -> Option<&DeviceMarker> {
        self.markers.get(device_id)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn search_markers(&self) -> &[MarkerId] {
        &self.search_markers
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut device_positions: Vec<(String, LngLat)> = self
            .markers
            .iter()
            .map(|(id, m)| (id.clone(), m.position))
            .collect();
        device_positions.sort_by(|a, b| a.0.cmp(&b.0));

        Snapshot {
            mode: self.mode,
            cursor: self.mode.cursor(),
            status: self.status.clone(),
            geofence_draft: self.geofence_draft.clone(),
            device_draft: self.device_draft.clone(),
            geofence_ids: self.geofences.iter().map(|g| g.geofence_id.clone()).collect(),
            device_ids: self.devices.iter().map(|d| d.device_id.clone()).collect(),
            device_positions,
        }
    }

    // ------------------------------------------------------------------
    // Startup
    // ------------------------------------------------------------------

    /// Install the map sources and load both collections concurrently
    pub async fn init(&mut self) -> Result<(), ControllerError> {
        self.show_status("Initializing...");

        for layer in Layer::ALL {
            self.renderer.add_layer(layer);
        }
        self.renderer.set_cursor(self.mode.cursor());

        let fetched = tokio::try_join!(self.api.list_geofences(), self.api.list_devices());
        let result = match fetched {
            Ok((geofences, devices)) => {
                // Each collection is rendered even if the other failed
                let geofences = self.apply_geofences(geofences);
                let devices = self.apply_devices(devices);
                geofences.and(devices)
            }
            Err(e) => Err(e.into()),
        };

        self.hide_status();
        result
    }

    // ------------------------------------------------------------------
    // Mode state machine
    // ------------------------------------------------------------------

    pub fn toggle_default_mode(&mut self) {
        self.set_mode(Mode::Default);
    }

    pub fn toggle_geofence_creation_mode(&mut self) {
        self.set_mode(Mode::CreateGeofence);
    }

    pub fn toggle_device_creation_mode(&mut self) {
        self.set_mode(Mode::CreateDevice);
    }

    /// Switch modes; leaving a mode discards whatever was being drawn
    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        debug!("Switching mode {} -> {}", self.mode, mode);
        self.discard_drafts();
        self.mode = mode;
        self.renderer.set_cursor(mode.cursor());
    }

    pub fn set_geofence_id_input(&mut self, text: impl Into<String>) {
        self.geofence_id_input = text.into();
    }

    pub fn set_device_id_input(&mut self, text: impl Into<String>) {
        self.device_id_input = text.into();
    }

    pub fn on_mouse_move(&mut self) {
        self.renderer.set_cursor(self.mode.cursor());
    }

    /// Interpret a map click according to the current mode
    pub async fn on_click(&mut self, click: MapClick) -> Result<(), ControllerError> {
        debug!("Map clicked on mode {}", self.mode);
        match self.mode {
            Mode::Default => self.delete_under(&click).await,
            Mode::CreateGeofence => {
                self.geofence_draft.push(click.lng_lat);
                let preview = Feature::draft_polygon(&self.geofence_draft);
                self.renderer
                    .set_source_data(Layer::DraftGeofence, Some(preview.into()));
                Ok(())
            }
            Mode::CreateDevice => {
                self.device_draft.push(click.lng_lat);
                let preview = Feature::draft_path(&self.device_draft);
                self.renderer
                    .set_source_data(Layer::DraftDevice, Some(preview.into()));
                Ok(())
            }
        }
    }

    /// Delete the first geofence and the first device drawn under the click
    async fn delete_under(&mut self, click: &MapClick) -> Result<(), ControllerError> {
        let geofence_id = first_id(self.renderer.query_rendered_features(click, Layer::Geofences));
        let device_id = first_id(self.renderer.query_rendered_features(click, Layer::Devices));

        let mut result = Ok(());
        if let Some(id) = geofence_id {
            result = self.delete_geofence(&id).await;
        }
        if let Some(id) = device_id {
            let deleted = self.delete_device(&id).await;
            result = result.and(deleted);
        }
        result
    }

    // ------------------------------------------------------------------
    // Geofences
    // ------------------------------------------------------------------

    /// Send the drawn polygon to the backend, then reload geofences
    ///
    /// Validation failures leave the draft untouched. Once the request is
    /// attempted the draft, preview and id input are cleared and the mode
    /// returns to default whatever the outcome.
    pub async fn commit_geofence(&mut self) -> Result<(), CommitError> {
        if self.mode != Mode::CreateGeofence {
            return Err(CommitError::WrongMode {
                expected: Mode::CreateGeofence,
                actual: self.mode,
            });
        }
        if self.geofence_draft.len() < MIN_GEOFENCE_POINTS {
            return Err(CommitError::NotEnoughPoints {
                have: self.geofence_draft.len(),
                need: MIN_GEOFENCE_POINTS,
            });
        }
        let id = self.geofence_id_input.trim().to_string();
        if id.is_empty() {
            return Err(CommitError::MissingId("Geofence"));
        }

        self.show_status("Creating geofence...");
        let points = std::mem::take(&mut self.geofence_draft);
        let result = self.create_geofence(&id, &points).await;

        self.geofence_id_input.clear();
        self.renderer.set_source_data(Layer::DraftGeofence, None);
        self.toggle_default_mode();
        self.hide_status();

        record_commit("geofence", &result);
        result
    }

    async fn create_geofence(&mut self, id: &str, points: &[LngLat]) -> Result<(), CommitError> {
        let reply = self.api.create_geofence(id, points).await?;
        let refreshed = self.refresh_geofences().await;
        if let Some(message) = reply.error() {
            return Err(CommitError::Rejected {
                kind: "geofence",
                message: message.to_string(),
            });
        }

        info!("Created geofence {} with {} points", id, points.len());
        refreshed.map_err(commit_refresh_error)
    }

    pub async fn delete_geofence(&mut self, id: &str) -> Result<(), ControllerError> {
        self.show_status("Deleting geofence...");
        let result = self.delete_geofence_inner(id).await;
        self.hide_status();
        record_delete("geofence", &result);
        result
    }

    async fn delete_geofence_inner(&mut self, id: &str) -> Result<(), ControllerError> {
        let reply = self.api.delete_geofence(id).await?;
        self.refresh_geofences().await?;
        match reply.error() {
            Some(message) => Err(ControllerError::Backend(message.to_string())),
            None => {
                info!("Deleted geofence {}", id);
                Ok(())
            }
        }
    }

    /// Reload geofences from the backend and redraw them
    pub async fn refresh_geofences(&mut self) -> Result<(), ControllerError> {
        let reply = self.api.list_geofences().await?;
        self.apply_geofences(reply)
    }

    fn apply_geofences(&mut self, reply: Reply<Vec<GeofenceRecord>>) -> Result<(), ControllerError> {
        let geofences = match reply {
            Reply::Success(list) => list,
            Reply::Failure(body) => {
                warn!("Unable to list geofences: {}", body.error);
                return Err(ControllerError::Backend(body.error));
            }
        };

        let collection: FeatureCollection = geofences.iter().collect();
        self.geofences = geofences;
        self.renderer
            .set_source_data(Layer::Geofences, Some(GeoJson::from(collection)));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Devices
    // ------------------------------------------------------------------

    /// Send the drawn path (possibly empty) to the backend, then reload devices
    ///
    /// Same cleanup contract as `commit_geofence`.
    pub async fn commit_device(&mut self) -> Result<(), CommitError> {
        if self.mode != Mode::CreateDevice {
            return Err(CommitError::WrongMode {
                expected: Mode::CreateDevice,
                actual: self.mode,
            });
        }
        let id = self.device_id_input.trim().to_string();
        if id.is_empty() {
            return Err(CommitError::MissingId("Device"));
        }

        self.show_status("Creating device...");
        let path = std::mem::take(&mut self.device_draft);
        let path = (!path.is_empty()).then_some(path);
        let result = self.create_device(&id, path.as_deref()).await;

        self.device_id_input.clear();
        self.renderer.set_source_data(Layer::DraftDevice, None);
        self.toggle_default_mode();
        self.hide_status();

        record_commit("device", &result);
        result
    }

    async fn create_device(&mut self, id: &str, path: Option<&[LngLat]>) -> Result<(), CommitError> {
        let reply = self.api.create_device(id, path).await?;
        let refreshed = self.refresh_devices().await;
        if let Some(message) = reply.error() {
            return Err(CommitError::Rejected {
                kind: "device",
                message: message.to_string(),
            });
        }

        info!(
            "Created device {} with {} path points",
            id,
            path.map_or(0, <[LngLat]>::len)
        );
        refreshed.map_err(commit_refresh_error)
    }

    pub async fn delete_device(&mut self, id: &str) -> Result<(), ControllerError> {
        self.show_status("Deleting device...");
        let result = self.delete_device_inner(id).await;
        self.hide_status();
        record_delete("device", &result);
        result
    }

    async fn delete_device_inner(&mut self, id: &str) -> Result<(), ControllerError> {
        let reply = self.api.delete_device(id).await?;

        if reply.error().is_none() {
            // Gone on the backend, so drop it locally before the reload
            self.devices.retain(|d| d.device_id != id);
            self.render_devices();
            self.remove_marker(id);
        }

        self.refresh_devices().await?;
        match reply.error() {
            Some(message) => Err(ControllerError::Backend(message.to_string())),
            None => {
                info!("Deleted device {}", id);
                Ok(())
            }
        }
    }

    /// Reload devices from the backend and redraw their paths
    pub async fn refresh_devices(&mut self) -> Result<(), ControllerError> {
        let reply = self.api.list_devices().await?;
        self.apply_devices(reply)
    }

    fn apply_devices(&mut self, reply: Reply<Vec<DeviceRecord>>) -> Result<(), ControllerError> {
        let devices = match reply {
            Reply::Success(list) => list,
            Reply::Failure(body) => {
                warn!("Unable to list devices: {}", body.error);
                return Err(ControllerError::Backend(body.error));
            }
        };

        self.devices = devices;
        self.render_devices();

        // Markers live exactly as long as their device
        let stale: Vec<String> = self
            .markers
            .keys()
            .filter(|id| !self.devices.iter().any(|d| &d.device_id == *id))
            .cloned()
            .collect();
        for id in stale {
            self.remove_marker(&id);
        }
        Ok(())
    }

    fn render_devices(&mut self) {
        let collection: FeatureCollection = self.devices.iter().collect();
        self.renderer
            .set_source_data(Layer::Devices, Some(GeoJson::from(collection)));
    }

    fn remove_marker(&mut self, device_id: &str) {
        if let Some(entry) = self.markers.remove(device_id) {
            debug!("Removing marker for device {}", device_id);
            self.renderer.remove_marker(entry.marker);
        }
    }

    // ------------------------------------------------------------------
    // Positions
    // ------------------------------------------------------------------

    /// One sequential pass over every known device
    ///
    /// A device without a position, or whose lookup fails, is logged and
    /// skipped; the pass always visits every device.
    pub async fn update_device_positions(&mut self) -> PassSummary {
        let ids: Vec<String> = self.devices.iter().map(|d| d.device_id.clone()).collect();
        let mut summary = PassSummary::default();

        for id in ids {
            let position = match self.api.device_position(&id).await {
                Ok(Reply::Success(p)) => p.position,
                Ok(Reply::Failure(body)) => {
                    warn!(
                        "Unable to fetch position for device {} - maybe the location was never set in the first place? ({})",
                        id, body.error
                    );
                    summary.missing += 1;
                    continue;
                }
                Err(e) => {
                    warn!("Position request for device {} failed: {}", id, e);
                    summary.failed += 1;
                    continue;
                }
            };

            match self.markers.get_mut(&id) {
                Some(entry) => {
                    self.renderer.move_marker(entry.marker, position);
                    entry.position = position;
                    summary.moved += 1;
                }
                None => {
                    let marker = self.renderer.add_marker(position, DEVICE_MARKER_COLOR);
                    self.markers.insert(id, DeviceMarker { marker, position });
                    summary.created += 1;
                }
            }
        }

        counter!("geotrack_refresh_passes_total").increment(1);
        counter!("geotrack_missing_positions_total").increment(summary.missing as u64);
        summary
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Look up points of interest and mark each result on the map
    pub async fn search_pois(&mut self, term: &str) -> Result<Vec<Place>, ControllerError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ControllerError::EmptySearchTerm);
        }

        self.show_status("Searching...");
        let reply = self.api.search_pois(term).await;
        self.hide_status();

        let places: Vec<Place> = match reply? {
            Reply::Success(results) => results.into_iter().map(|r| r.place).collect(),
            Reply::Failure(body) => return Err(ControllerError::Backend(body.error)),
        };

        for marker in self.search_markers.drain(..) {
            self.renderer.remove_marker(marker);
        }
        for place in &places {
            let marker = self
                .renderer
                .add_marker(place.geometry.point, SEARCH_MARKER_COLOR);
            self.search_markers.push(marker);
        }
        info!("Search for {:?} returned {} places", term, places.len());
        Ok(places)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn discard_drafts(&mut self) {
        if !self.geofence_draft.is_empty() {
            self.geofence_draft.clear();
            self.renderer.set_source_data(Layer::DraftGeofence, None);
        }
        if !self.device_draft.is_empty() {
            self.device_draft.clear();
            self.renderer.set_source_data(Layer::DraftDevice, None);
        }
    }

    fn show_status(&mut self, message: &str) {
        info!("{}", message);
        self.status = Some(message.to_string());
    }

    fn hide_status(&mut self) {
        self.status = None;
    }
}

fn first_id(features: Vec<Feature>) -> Option<String> {
    features
        .into_iter()
        .next()
        .and_then(|f| f.properties.id)
}

/// The create call went through; only the reload failed
fn commit_refresh_error(e: ControllerError) -> CommitError {
    match e {
        ControllerError::Api(api) => CommitError::Api(api),
        other => CommitError::Reload(other.to_string()),
    }
}

fn record_delete(kind: &'static str, result: &Result<(), ControllerError>) {
    let outcome = if result.is_ok() { "ok" } else { "error" };
    if let Err(e) = result {
        warn!("Failed to delete {}: {}", kind, e);
    }
    counter!("geotrack_deletes_total", "kind" => kind, "outcome" => outcome).increment(1);
}

fn record_commit(kind: &'static str, result: &Result<(), CommitError>) {
    let outcome = if result.is_ok() { "ok" } else { "error" };
    if let Err(e) = result {
        warn!("Failed to create {}: {}", kind, e);
    }
    counter!("geotrack_commits_total", "kind" => kind, "outcome" => outcome).increment(1);
}
