//! API client for communicating with the watcher

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;
use watcher_lib::api::API_KEY_HEADER;

/// API client for the watcher HTTP API
pub struct ApiClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Make a GET request, failing on any non-success status
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.fetch(path, false).await
    }

    /// Make a GET request for a usage report
    ///
    /// The watcher answers 500 and 503 with a report body describing the
    /// failure, so those are decoded like a success.
    pub async fn get_report<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.fetch(path, true).await
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, accept_reports: bool) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.context("Failed to send request")?;

        let status = response.status();
        let is_report = accept_reports
            && matches!(
                status,
                StatusCode::INTERNAL_SERVER_ERROR | StatusCode::SERVICE_UNAVAILABLE
            );
        if !status.is_success() && !is_report {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }
}
