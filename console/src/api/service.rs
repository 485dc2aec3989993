//! LocationApi trait definition

use async_trait::async_trait;

use super::types::{Ack, ApiError, Reply};
use crate::geo::{DevicePosition, DeviceRecord, GeofenceRecord, LngLat, PlaceResult};

/// Trait for the geofence/device backend (REST proxy or a test double)
///
/// Backend-reported failures come back as `Reply::Failure`; only failures to
/// obtain or read a reply are `Err`.
#[async_trait]
pub trait LocationApi: Send + Sync {
    /// `GET /geofences`
    async fn list_geofences(&self) -> Result<Reply<Vec<GeofenceRecord>>, ApiError>;

    /// `POST /geofences`
    async fn create_geofence(&self, id: &str, points: &[LngLat]) -> Result<Reply<Ack>, ApiError>;

    /// `DELETE /geofences/{id}`
    async fn delete_geofence(&self, id: &str) -> Result<Reply<Ack>, ApiError>;

    /// `GET /devices`
    async fn list_devices(&self) -> Result<Reply<Vec<DeviceRecord>>, ApiError>;

    /// `POST /devices`
    async fn create_device(
        &self,
        id: &str,
        path: Option<&[LngLat]>,
    ) -> Result<Reply<Ack>, ApiError>;

    /// `DELETE /devices/{id}`
    async fn delete_device(&self, id: &str) -> Result<Reply<Ack>, ApiError>;

    /// `GET /devices/{id}/position`
    async fn device_position(&self, id: &str) -> Result<Reply<DevicePosition>, ApiError>;

    /// `GET /pois?term=`
    async fn search_pois(&self, term: &str) -> Result<Reply<Vec<PlaceResult>>, ApiError>;
}
