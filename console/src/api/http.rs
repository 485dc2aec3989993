//! HTTP implementation of the backend client

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::service::LocationApi;
use super::types::{
    Ack, ApiError, CreateDeviceRequest, CreateGeofenceRequest, ErrorBody, Reply,
};
use crate::config::ApiConfig;
use crate::geo::{DevicePosition, DeviceRecord, GeofenceRecord, LngLat, PlaceResult};

const API_KEY_HEADER: &str = "X-API-Key";

/// Backend client for the REST proxy in front of the location service
#[derive(Clone)]
pub struct HttpLocationApi {
    client: Client,
    base: Url,
}

impl HttpLocationApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base = Url::parse(&config.endpoint)
            .map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidEndpoint(config.endpoint.clone()));
        }

        let mut headers = HeaderMap::new();
        if let Some(ref key) = config.api_key {
            let value = HeaderValue::from_str(key).map_err(|_| ApiError::InvalidApiKey)?;
            headers.insert(API_KEY_HEADER, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, base })
    }

    /// Base URL with `segments` appended, each one percent-encoded
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let url = self.url(segments);
        debug!("{} {}", method, url);
        self.client.request(method, url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Reply<T>, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        decode_reply(status, &body)
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<Reply<T>, ApiError> {
        self.send(self.request(Method::POST, segments).json(body))
            .await
    }
}

#[async_trait]
impl LocationApi for HttpLocationApi {
    async fn list_geofences(&self) -> Result<Reply<Vec<GeofenceRecord>>, ApiError> {
        self.send(self.request(Method::GET, &["geofences"])).await
    }

    async fn create_geofence(&self, id: &str, points: &[LngLat]) -> Result<Reply<Ack>, ApiError> {
        let body = CreateGeofenceRequest {
            id: id.to_string(),
            points: points.to_vec(),
        };
        self.post(&["geofences"], &body).await
    }

    async fn delete_geofence(&self, id: &str) -> Result<Reply<Ack>, ApiError> {
        self.send(self.request(Method::DELETE, &["geofences", id]))
            .await
    }

    async fn list_devices(&self) -> Result<Reply<Vec<DeviceRecord>>, ApiError> {
        self.send(self.request(Method::GET, &["devices"])).await
    }

    async fn create_device(
        &self,
        id: &str,
        path: Option<&[LngLat]>,
    ) -> Result<Reply<Ack>, ApiError> {
        let body = CreateDeviceRequest {
            device_id: id.to_string(),
            path: path.map(<[LngLat]>::to_vec),
        };
        self.post(&["devices"], &body).await
    }

    async fn delete_device(&self, id: &str) -> Result<Reply<Ack>, ApiError> {
        self.send(self.request(Method::DELETE, &["devices", id]))
            .await
    }

    async fn device_position(&self, id: &str) -> Result<Reply<DevicePosition>, ApiError> {
        self.send(self.request(Method::GET, &["devices", id, "position"]))
            .await
    }

    async fn search_pois(&self, term: &str) -> Result<Reply<Vec<PlaceResult>>, ApiError> {
        let request = self.request(Method::GET, &["pois"]).query(&[("term", term)]);
        self.send(request).await
    }
}

/// A non-2xx response only counts as a reply when it carries an `{error}` payload
fn decode_reply<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<Reply<T>, ApiError> {
    if !status.is_success() {
        return match serde_json::from_slice::<ErrorBody>(body) {
            Ok(failure) => Ok(Reply::Failure(failure)),
            Err(_) => Err(ApiError::Status {
                status: status.as_u16(),
            }),
        };
    }
    Ok(serde_json::from_slice(body)?)
}
