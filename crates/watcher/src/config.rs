//! Watcher configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use watcher_lib::provider::OciSettings;

/// Optional config file, looked up as `tier-watcher.{toml,yaml,json}`
const CONFIG_FILE: &str = "tier-watcher";

/// Watcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WatcherConfig {
    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Static key required in `X-API-Key`; no check when unset
    #[serde(default)]
    pub api_key: Option<String>,

    /// Timeout for each provider request in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub oci_tenancy_id: Option<String>,
    #[serde(default)]
    pub oci_user_id: Option<String>,
    #[serde(default)]
    pub oci_fingerprint: Option<String>,
    #[serde(default)]
    pub oci_private_key_path: Option<String>,
    #[serde(default)]
    pub oci_region: Option<String>,
    #[serde(default)]
    pub oci_compartment_id: Option<String>,
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout() -> u64 {
    30
}

impl WatcherConfig {
    /// Load configuration from the config file and the process environment
    pub fn load() -> Result<Self> {
        Self::from_sources(None)
    }

    /// Same as [`load`](Self::load), reading variables from `env` instead of
    /// the process environment when given
    fn from_sources(env: Option<config::Map<String, String>>) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                config::Environment::default()
                    .ignore_empty(true)
                    .source(env),
            )
            .build()
            .context("failed to read configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("invalid configuration")?;

        if config.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be at least 1 second");
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn oci_settings(&self) -> OciSettings {
        OciSettings {
            tenancy_id: self.oci_tenancy_id.clone(),
            user_id: self.oci_user_id.clone(),
            fingerprint: self.oci_fingerprint.clone(),
            private_key_path: self.oci_private_key_path.clone(),
            region: self.oci_region.clone(),
            compartment_id: self.oci_compartment_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = WatcherConfig::from_sources(Some(env(&[]))).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.api_key.is_none());
        assert!(!config.oci_settings().is_configured());
    }

    #[test]
    fn test_environment_overrides() {
        let config = WatcherConfig::from_sources(Some(env(&[
            ("PORT", "8080"),
            ("API_KEY", "s3cret"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("OCI_TENANCY_ID", "ocid1.tenancy.oc1..aaa"),
            ("OCI_USER_ID", "ocid1.user.oc1..bbb"),
            ("OCI_FINGERPRINT", "aa:bb:cc"),
            ("OCI_PRIVATE_KEY_PATH", "/keys/oci.pem"),
            ("OCI_REGION", "eu-frankfurt-1"),
        ])))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.api_key.as_deref(), Some("s3cret"));
        assert_eq!(config.request_timeout_secs, 5);

        let credentials = config.oci_settings().resolve().unwrap();
        assert_eq!(credentials.region, "eu-frankfurt-1");
        assert_eq!(credentials.compartment_id(), "ocid1.tenancy.oc1..aaa");
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let config =
            WatcherConfig::from_sources(Some(env(&[("PORT", ""), ("OCI_REGION", "")]))).unwrap();

        assert_eq!(config.port, 3000);
        assert!(config.oci_region.is_none());
    }

    #[test]
    fn test_zero_request_timeout_is_rejected() {
        let err = WatcherConfig::from_sources(Some(env(&[("REQUEST_TIMEOUT_SECS", "0")])))
            .unwrap_err();
        assert!(err.to_string().contains("REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = WatcherConfig::from_sources(Some(env(&[("PORT", "not-a-port")])));
        assert!(result.is_err());
    }
}
