//! OCI API key credentials

use serde::Deserialize;
use std::path::PathBuf;

/// Raw, possibly incomplete credential settings as read from configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OciSettings {
    #[serde(default)]
    pub tenancy_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub private_key_path: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub compartment_id: Option<String>,
}

/// Complete credentials for signing OCI requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OciCredentials {
    pub tenancy_id: String,
    pub user_id: String,
    pub fingerprint: String,
    pub private_key_path: PathBuf,
    pub region: String,
    compartment_id: Option<String>,
}

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl OciSettings {
    /// Resolve into credentials; `None` unless every required value is set.
    ///
    /// The compartment is optional and defaults to the tenancy.
    pub fn resolve(&self) -> Option<OciCredentials> {
        Some(OciCredentials {
            tenancy_id: present(&self.tenancy_id)?,
            user_id: present(&self.user_id)?,
            fingerprint: present(&self.fingerprint)?,
            private_key_path: PathBuf::from(present(&self.private_key_path)?),
            region: present(&self.region)?,
            compartment_id: present(&self.compartment_id),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.resolve().is_some()
    }
}

impl OciCredentials {
    /// Compartment to monitor, the root compartment (tenancy) unless overridden
    pub fn compartment_id(&self) -> &str {
        self.compartment_id.as_deref().unwrap_or(&self.tenancy_id)
    }

    /// `keyId` used in the HTTP signature
    pub fn key_id(&self) -> String {
        format!("{}/{}/{}", self.tenancy_id, self.user_id, self.fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> OciSettings {
        OciSettings {
            tenancy_id: Some("ocid1.tenancy.test".to_string()),
            user_id: Some("ocid1.user.test".to_string()),
            fingerprint: Some("aa:bb:cc:dd".to_string()),
            private_key_path: Some("/tmp/test.pem".to_string()),
            region: Some("us-ashburn-1".to_string()),
            compartment_id: None,
        }
    }

    #[test]
    fn test_all_values_configured() {
        assert!(complete().is_configured());
    }

    #[test]
    fn test_missing_tenancy_is_not_configured() {
        let settings = OciSettings {
            tenancy_id: None,
            ..complete()
        };
        assert!(!settings.is_configured());
    }

    #[test]
    fn test_empty_value_is_not_configured() {
        let settings = OciSettings {
            region: Some(String::new()),
            ..complete()
        };
        assert!(!settings.is_configured());
    }

    #[test]
    fn test_whitespace_value_is_not_configured() {
        let settings = OciSettings {
            fingerprint: Some("  \t".to_string()),
            ..complete()
        };
        assert!(!settings.is_configured());
    }

    #[test]
    fn test_nothing_configured() {
        assert!(!OciSettings::default().is_configured());
    }

    #[test]
    fn test_compartment_defaults_to_tenancy() {
        let credentials = complete().resolve().unwrap();
        assert_eq!(credentials.compartment_id(), "ocid1.tenancy.test");

        let credentials = OciSettings {
            compartment_id: Some("ocid1.compartment.test".to_string()),
            ..complete()
        }
        .resolve()
        .unwrap();
        assert_eq!(credentials.compartment_id(), "ocid1.compartment.test");
    }

    #[test]
    fn test_key_id_format() {
        let credentials = complete().resolve().unwrap();
        assert_eq!(
            credentials.key_id(),
            "ocid1.tenancy.test/ocid1.user.test/aa:bb:cc:dd"
        );
    }
}
