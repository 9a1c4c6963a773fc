//! Cloud provider access
//!
//! The aggregator only depends on the [`CloudProvider`] trait: a handful of
//! typed, read-only list/get operations scoped to a compartment. [`OciClient`]
//! implements it over the OCI REST API with signed requests.

mod credentials;
mod oci;
mod signer;

pub use credentials::{OciCredentials, OciSettings};
pub use oci::{OciClient, OciConnector, OciEndpoints};
pub use signer::RequestSigner;

use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub use async_trait::async_trait;

/// Errors raised while talking to the provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("error reading private key {path:?}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("failed to sign request")]
    Signing,

    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service error ({status}) {code}: {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// A compute instance as returned by the list API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    #[serde(default)]
    pub display_name: Option<String>,
    pub shape: String,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
    #[serde(default)]
    pub shape_config: Option<ShapeConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShapeConfig {
    #[serde(default)]
    pub ocpus: Option<f64>,
    #[serde(default, rename = "memoryInGBs")]
    pub memory_in_gbs: Option<f64>,
}

/// Boot or block volume
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "sizeInGBs")]
    pub size_in_gbs: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIp {
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub lifetime: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BucketSummary {
    pub name: String,
}

/// Bucket details, only `approximateSize` is requested
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub name: String,
    #[serde(default)]
    pub approximate_size: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancer {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub shape_name: String,
    #[serde(default)]
    pub lifecycle_state: String,
}

/// Read-only resource queries used to compute free tier usage
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Instances in the RUNNING lifecycle state
    async fn list_running_instances(&self, compartment_id: &str) -> ProviderResult<Vec<Instance>>;

    async fn list_boot_volumes(&self, compartment_id: &str) -> ProviderResult<Vec<Volume>>;

    async fn list_block_volumes(&self, compartment_id: &str) -> ProviderResult<Vec<Volume>>;

    /// Region-scoped public IPs
    async fn list_public_ips(&self, compartment_id: &str) -> ProviderResult<Vec<PublicIp>>;

    /// Object storage namespace of the tenancy
    async fn get_namespace(&self) -> ProviderResult<String>;

    async fn list_buckets(
        &self,
        namespace: &str,
        compartment_id: &str,
    ) -> ProviderResult<Vec<BucketSummary>>;

    /// Bucket details including its approximate size in bytes
    async fn get_bucket(&self, namespace: &str, bucket_name: &str) -> ProviderResult<Bucket>;

    async fn list_load_balancers(&self, compartment_id: &str) -> ProviderResult<Vec<LoadBalancer>>;
}

/// Builds a provider for one usage collection
///
/// Connecting may fail (for example when the signing key cannot be read),
/// which fails the whole collection rather than an individual query.
#[async_trait]
pub trait ProviderConnector: Send + Sync {
    async fn connect(&self) -> ProviderResult<Arc<dyn CloudProvider>>;
}

/// Connector that always hands out the same provider
pub struct StaticConnector {
    provider: Arc<dyn CloudProvider>,
}

impl StaticConnector {
    pub fn new(provider: Arc<dyn CloudProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ProviderConnector for StaticConnector {
    async fn connect(&self) -> ProviderResult<Arc<dyn CloudProvider>> {
        Ok(self.provider.clone())
    }
}
