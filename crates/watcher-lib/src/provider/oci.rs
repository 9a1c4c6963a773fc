//! Read-only OCI REST binding
//!
//! Covers only the list/get operations needed to measure free tier usage:
//! - core services (instances, volumes, public IPs) on `iaas`, API 20160918
//! - load balancers on `iaas`, API 20170115
//! - object storage namespace and buckets on `objectstorage`

use anyhow::Context;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::signer::{http_date, RequestSigner};
use super::{
    async_trait, Bucket, BucketSummary, CloudProvider, Instance, LoadBalancer, OciCredentials,
    ProviderConnector, ProviderError, ProviderResult, PublicIp, Volume,
};

const CORE_API: &str = "20160918";
const LOAD_BALANCER_API: &str = "20170115";
const NEXT_PAGE_HEADER: &str = "opc-next-page";

/// Service endpoints for a region
#[derive(Debug, Clone)]
pub struct OciEndpoints {
    pub iaas: Url,
    pub object_storage: Url,
}

impl OciEndpoints {
    pub fn for_region(region: &str) -> anyhow::Result<Self> {
        Ok(Self {
            iaas: Url::parse(&format!("https://iaas.{}.oraclecloud.com/", region))
                .with_context(|| format!("Invalid region: {}", region))?,
            object_storage: Url::parse(&format!(
                "https://objectstorage.{}.oraclecloud.com/",
                region
            ))
            .with_context(|| format!("Invalid region: {}", region))?,
        })
    }

    /// Point every service at one base URL
    pub fn single(base: Url) -> Self {
        Self {
            iaas: base.clone(),
            object_storage: base,
        }
    }
}

/// Error body returned by OCI services
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// OCI client signing every request with an API key
pub struct OciClient {
    http: Client,
    signer: RequestSigner,
    endpoints: OciEndpoints,
}

impl OciClient {
    pub fn new(
        signer: RequestSigner,
        endpoints: OciEndpoints,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tier-watcher/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            signer,
            endpoints,
        })
    }

    fn url(base: &Url, segments: &[&str]) -> ProviderResult<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, url: Url) -> ProviderResult<Response> {
        let date = http_date(chrono::Utc::now());
        let authorization = self.signer.authorization("GET", &url, &date)?;

        debug!(url = %url, "OCI request");

        let response = self
            .http
            .get(url)
            .header(header::DATE, date)
            .header(header::AUTHORIZATION, authorization)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ServiceErrorBody>(&body) {
            Ok(parsed) => (parsed.code, parsed.message),
            Err(_) => (String::new(), body),
        };
        warn!(status = status.as_u16(), code = %code, "OCI request failed");

        Err(ProviderError::Service {
            status: status.as_u16(),
            code,
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ProviderResult<T> {
        let response = self.send(url).await?;
        response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }

    /// Fetch every page of a list operation
    async fn list_all<T: DeserializeOwned>(&self, url: Url) -> ProviderResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page: Option<String> = None;

        loop {
            let mut page_url = url.clone();
            if let Some(token) = &page {
                page_url.query_pairs_mut().append_pair("page", token);
            }

            let response = self.send(page_url).await?;
            let next = response
                .headers()
                .get(NEXT_PAGE_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_string);

            let batch: Vec<T> = response
                .json()
                .await
                .map_err(|e| ProviderError::Decode(e.to_string()))?;
            items.extend(batch);

            match next {
                Some(token) => page = Some(token),
                None => break,
            }
        }

        Ok(items)
    }

    fn core_list(&self, resource: &str, compartment_id: &str) -> ProviderResult<Url> {
        let mut url = Self::url(&self.endpoints.iaas, &[CORE_API, resource])?;
        url.query_pairs_mut()
            .append_pair("compartmentId", compartment_id);
        Ok(url)
    }
}

#[async_trait]
impl CloudProvider for OciClient {
    async fn list_running_instances(&self, compartment_id: &str) -> ProviderResult<Vec<Instance>> {
        let mut url = self.core_list("instances", compartment_id)?;
        url.query_pairs_mut()
            .append_pair("lifecycleState", "RUNNING");
        self.list_all(url).await
    }

    async fn list_boot_volumes(&self, compartment_id: &str) -> ProviderResult<Vec<Volume>> {
        let url = self.core_list("bootVolumes", compartment_id)?;
        self.list_all(url).await
    }

    async fn list_block_volumes(&self, compartment_id: &str) -> ProviderResult<Vec<Volume>> {
        let url = self.core_list("volumes", compartment_id)?;
        self.list_all(url).await
    }

    async fn list_public_ips(&self, compartment_id: &str) -> ProviderResult<Vec<PublicIp>> {
        let mut url = Self::url(&self.endpoints.iaas, &[CORE_API, "publicIps"])?;
        url.query_pairs_mut()
            .append_pair("scope", "REGION")
            .append_pair("compartmentId", compartment_id);
        self.list_all(url).await
    }

    async fn get_namespace(&self) -> ProviderResult<String> {
        let url = Self::url(&self.endpoints.object_storage, &["n", ""])?;
        self.get_json(url).await
    }

    async fn list_buckets(
        &self,
        namespace: &str,
        compartment_id: &str,
    ) -> ProviderResult<Vec<BucketSummary>> {
        let mut url = Self::url(&self.endpoints.object_storage, &["n", namespace, "b", ""])?;
        url.query_pairs_mut()
            .append_pair("compartmentId", compartment_id);
        self.list_all(url).await
    }

    async fn get_bucket(&self, namespace: &str, bucket_name: &str) -> ProviderResult<Bucket> {
        let mut url = Self::url(
            &self.endpoints.object_storage,
            &["n", namespace, "b", bucket_name],
        )?;
        url.query_pairs_mut()
            .append_pair("fields", "approximateSize");
        self.get_json(url).await
    }

    async fn list_load_balancers(&self, compartment_id: &str) -> ProviderResult<Vec<LoadBalancer>> {
        let mut url = Self::url(&self.endpoints.iaas, &[LOAD_BALANCER_API, "loadBalancers"])?;
        url.query_pairs_mut()
            .append_pair("compartmentId", compartment_id);
        self.list_all(url).await
    }
}

/// Builds a fresh [`OciClient`] per collection, re-reading the key file
pub struct OciConnector {
    credentials: OciCredentials,
    endpoints: OciEndpoints,
    timeout: Duration,
}

impl OciConnector {
    pub fn new(credentials: OciCredentials, timeout: Duration) -> anyhow::Result<Self> {
        let endpoints = OciEndpoints::for_region(&credentials.region)?;
        Ok(Self::with_endpoints(credentials, endpoints, timeout))
    }

    pub fn with_endpoints(
        credentials: OciCredentials,
        endpoints: OciEndpoints,
        timeout: Duration,
    ) -> Self {
        Self {
            credentials,
            endpoints,
            timeout,
        }
    }

    pub fn credentials(&self) -> &OciCredentials {
        &self.credentials
    }
}

#[async_trait]
impl ProviderConnector for OciConnector {
    async fn connect(&self) -> ProviderResult<Arc<dyn CloudProvider>> {
        let signer = RequestSigner::from_file(
            self.credentials.key_id(),
            &self.credentials.private_key_path,
        )
        .await?;

        let client = OciClient::new(signer, self.endpoints.clone(), self.timeout)?;
        Ok(Arc::new(client))
    }
}
