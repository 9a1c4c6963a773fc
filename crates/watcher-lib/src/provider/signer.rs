//! OCI HTTP request signatures
//!
//! Implements the `rsa-sha256` draft-cavage signature OCI uses for API key
//! authentication. Only body-less requests are signed, so the covered headers
//! are `date`, `(request-target)` and `host`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::rand::SystemRandom;
use ring::signature::{RsaKeyPair, RSA_PKCS1_SHA256};
use std::path::Path;
use tracing::debug;
use url::Url;

use super::{ProviderError, ProviderResult};

const SIGNED_HEADERS: &str = "date (request-target) host";

/// Signs requests with an API signing key
pub struct RequestSigner {
    key_id: String,
    key_pair: RsaKeyPair,
    rng: SystemRandom,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    /// Parse a PEM encoded RSA key (PKCS#8 or PKCS#1)
    pub fn from_pem(key_id: impl Into<String>, pem: &[u8]) -> ProviderResult<Self> {
        let mut reader = pem;
        let key_pair = loop {
            let item = rustls_pemfile::read_one(&mut reader)
                .map_err(|e| ProviderError::InvalidKey(e.to_string()))?;

            match item {
                Some(rustls_pemfile::Item::PKCS8Key(der)) => {
                    break RsaKeyPair::from_pkcs8(&der)
                        .map_err(|e| ProviderError::InvalidKey(e.to_string()))?;
                }
                Some(rustls_pemfile::Item::RSAKey(der)) => {
                    break RsaKeyPair::from_der(&der)
                        .map_err(|e| ProviderError::InvalidKey(e.to_string()))?;
                }
                Some(_) => continue,
                None => {
                    return Err(ProviderError::InvalidKey(
                        "no unencrypted RSA private key found in PEM data".to_string(),
                    ))
                }
            }
        };

        Ok(Self {
            key_id: key_id.into(),
            key_pair,
            rng: SystemRandom::new(),
        })
    }

    /// Read and parse the key file
    pub async fn from_file(key_id: impl Into<String>, path: &Path) -> ProviderResult<Self> {
        let pem = tokio::fs::read(path)
            .await
            .map_err(|source| ProviderError::KeyRead {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(path = %path.display(), "Loaded API signing key");
        Self::from_pem(key_id, &pem)
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// DER encoded public key, used to verify signatures in tests
    pub fn public_key(&self) -> &[u8] {
        self.key_pair.public().as_ref()
    }

    /// The string covered by the signature
    pub fn signing_string(method: &str, url: &Url, date: &str) -> String {
        format!(
            "date: {}\n(request-target): {} {}\nhost: {}",
            date,
            method.to_ascii_lowercase(),
            request_target(url),
            host_header(url)
        )
    }

    /// Build the `Authorization` header value for a request
    pub fn authorization(&self, method: &str, url: &Url, date: &str) -> ProviderResult<String> {
        let signing_string = Self::signing_string(method, url, date);
        let mut signature = vec![0u8; self.key_pair.public().modulus_len()];

        self.key_pair
            .sign(
                &RSA_PKCS1_SHA256,
                &self.rng,
                signing_string.as_bytes(),
                &mut signature,
            )
            .map_err(|_| ProviderError::Signing)?;

        Ok(format!(
            "Signature version=\"1\",keyId=\"{}\",algorithm=\"rsa-sha256\",headers=\"{}\",signature=\"{}\"",
            self.key_id,
            SIGNED_HEADERS,
            STANDARD.encode(&signature)
        ))
    }
}

/// Current time formatted for the `date` header
pub fn http_date(now: chrono::DateTime<chrono::Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Path and query as sent on the request line
fn request_target(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

/// Host header value, including the port when it is not the scheme default
pub(crate) fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}
