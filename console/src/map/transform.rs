//! Outbound map request transformation
//!
//! Style names are resolved to location-service style descriptors, and any
//! request bound for the AWS domain is signed. Signing and credential
//! retrieval are delegated to the `UrlSigner` and `CredentialProvider` seams.

use std::env;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

const AWS_DOMAIN: &str = "amazonaws.com";

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Credentials unavailable: {0}")]
    Credentials(String),

    #[error("Failed to sign URL: {0}")]
    Signing(String),
}

/// Kind of resource the renderer is requesting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Style,
    Source,
    Tile,
    Glyphs,
    SpriteImage,
    SpriteJson,
    Image,
    Unknown,
}

/// Temporary signing credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Source of signing credentials, refreshed out of band
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credentials(&self) -> Result<Credentials, TransformError>;
}

/// Produces a pre-signed form of a URL
pub trait UrlSigner: Send + Sync {
    fn sign_url(&self, url: &str, credentials: &Credentials) -> Result<String, TransformError>;
}

/// Credentials taken from the standard AWS environment variables
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and optional `AWS_SESSION_TOKEN`
    pub fn from_env() -> Option<Self> {
        let access_key_id = env::var("AWS_ACCESS_KEY_ID").ok()?;
        let secret_access_key = env::var("AWS_SECRET_ACCESS_KEY").ok()?;
        let session_token = env::var("AWS_SESSION_TOKEN").ok().filter(|t| !t.is_empty());
        Some(Self::new(Credentials {
            access_key_id,
            secret_access_key,
            session_token,
        }))
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn credentials(&self) -> Result<Credentials, TransformError> {
        Ok(self.credentials.clone())
    }
}

/// Style descriptor URL for a named map in `region`
pub fn resolve_style_url(map_name: &str, region: &str) -> String {
    format!(
        "https://maps.geo.{}.{}/maps/v0/maps/{}/style-descriptor",
        region, AWS_DOMAIN, map_name
    )
}

/// Rewrites renderer requests before they are sent
pub struct RequestTransformer<S> {
    region: String,
    signer: S,
    credentials: Credentials,
}

impl<S: UrlSigner> RequestTransformer<S> {
    /// Snapshot credentials from `provider` for subsequent requests
    pub async fn new(
        region: impl Into<String>,
        signer: S,
        provider: &dyn CredentialProvider,
    ) -> Result<Self, TransformError> {
        let credentials = provider.credentials().await?;
        Ok(Self {
            region: region.into(),
            signer,
            credentials,
        })
    }

    /// Swap in credentials refreshed by the provider
    pub async fn refresh(&mut self, provider: &dyn CredentialProvider) -> Result<(), TransformError> {
        self.credentials = provider.credentials().await?;
        Ok(())
    }

    pub fn transform(&self, url: &str, resource_type: ResourceType) -> Result<String, TransformError> {
        let url = if resource_type == ResourceType::Style && !url.contains("://") {
            resolve_style_url(url, &self.region)
        } else {
            url.to_string()
        };

        if url.contains(AWS_DOMAIN) {
            debug!("Signing {:?} request", resource_type);
            self.signer.sign_url(&url, &self.credentials)
        } else {
            Ok(url)
        }
    }
}
