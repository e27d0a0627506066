//! Configuration types for cirrus
//!
//! `dns-setup` reads a YAML file:
//!
//! ```yaml
//! credentials:
//!   access_id: AKIA...
//!   secret_key: ...
//! domains:
//!   example.com: zones/example.com.zone
//!   example.org: /etc/cirrus/example.org.zone
//! ```
//!
//! The flat layout of older definitions (`access_id`, `secret_key` and
//! `zones` at the top level) is accepted as well. `update-host` takes its
//! credentials from the `AWS_ACCESS_ID` and `AWS_SECRET_KEY` environment
//! variables.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable holding the provider access key id
pub const ACCESS_ID_ENV: &str = "AWS_ACCESS_ID";

/// Environment variable holding the provider secret key
pub const SECRET_KEY_ENV: &str = "AWS_SECRET_KEY";

/// Provider API credentials
///
/// The Debug implementation never shows the secret.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub access_id: String,
    pub secret_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_id", &self.access_id)
            .field("secret_key", &"<REDACTED>")
            .finish()
    }
}

impl Credentials {
    pub fn new(access_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_id: access_id.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Read credentials from `AWS_ACCESS_ID` / `AWS_SECRET_KEY`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through `lookup`, which maps a variable name to its value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        match (lookup(ACCESS_ID_ENV), lookup(SECRET_KEY_ENV)) {
            (Some(access_id), Some(secret_key)) => {
                let credentials = Self::new(access_id, secret_key);
                credentials.validate()?;
                Ok(credentials)
            }
            _ => Err(Error::config(format!(
                "Please set environment variables {} and {}",
                ACCESS_ID_ENV, SECRET_KEY_ENV
            ))),
        }
    }

    /// Validate the credentials
    pub fn validate(&self) -> Result<()> {
        if self.access_id.trim().is_empty() {
            return Err(Error::config("access_id cannot be empty"));
        }
        if self.secret_key.trim().is_empty() {
            return Err(Error::config("secret_key cannot be empty"));
        }
        Ok(())
    }
}

/// `dns-setup` configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Provider credentials
    #[serde(default)]
    pub credentials: Option<Credentials>,

    /// Legacy top-level access id
    #[serde(default)]
    access_id: Option<String>,

    /// Legacy top-level secret key
    #[serde(default)]
    secret_key: Option<String>,

    /// Domain name → zone file path
    #[serde(alias = "zones")]
    pub domains: BTreeMap<String, PathBuf>,

    /// Optional override of the provider API endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Directory relative zone file paths are resolved against
    #[serde(skip)]
    base_dir: PathBuf,
}

impl SyncConfig {
    /// Load and validate a YAML config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read config {}: {}", path.display(), e))
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_yaml_str(&text, base_dir)
    }

    /// Parse and validate YAML text; relative zone paths resolve against `base_dir`
    pub fn from_yaml_str(text: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut config: SyncConfig = serde_yaml::from_str(text)?;
        config.base_dir = base_dir.into();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.domains.is_empty() {
            return Err(Error::config("No domains configured"));
        }
        for (domain, path) in &self.domains {
            if domain.trim().is_empty() || domain.contains(char::is_whitespace) {
                return Err(Error::config(format!("Invalid domain name '{}'", domain)));
            }
            if path.as_os_str().is_empty() {
                return Err(Error::config(format!("No zone file given for {}", domain)));
            }
        }
        if let Some(credentials) = &self.credentials {
            credentials.validate()?;
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
                return Err(Error::config(format!(
                    "endpoint must use HTTP or HTTPS scheme. Got: {}",
                    endpoint
                )));
            }
        }
        Ok(())
    }

    /// Configured domains with their resolved zone file paths, in name order
    pub fn zone_files(&self) -> Vec<(String, PathBuf)> {
        self.domains
            .iter()
            .map(|(domain, path)| (domain.clone(), self.base_dir.join(path)))
            .collect()
    }

    /// Credentials from the file, falling back to the environment
    pub fn credentials(&self) -> Result<Credentials> {
        self.credentials_with(|key| std::env::var(key).ok())
    }

    fn credentials_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<Credentials> {
        if let Some(credentials) = &self.credentials {
            return Ok(credentials.clone());
        }
        if let (Some(access_id), Some(secret_key)) = (&self.access_id, &self.secret_key) {
            let credentials = Credentials::new(access_id, secret_key);
            credentials.validate()?;
            return Ok(credentials);
        }
        Credentials::from_lookup(lookup)
    }

    /// Provider configuration for this file
    pub fn provider_config(&self) -> Result<ProviderConfig> {
        Ok(ProviderConfig::Route53 {
            credentials: self.credentials()?,
            endpoint: self.endpoint.clone(),
        })
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// Amazon Route 53
    Route53 {
        credentials: Credentials,
        /// API base URL override (defaults to the public endpoint)
        endpoint: Option<String>,
    },
}

impl ProviderConfig {
    /// Route 53 with the default endpoint
    pub fn route53(credentials: Credentials) -> Self {
        ProviderConfig::Route53 {
            credentials,
            endpoint: None,
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<()> {
        match self {
            ProviderConfig::Route53 { credentials, .. } => credentials.validate(),
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Route53 { .. } => "route53",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_layout_and_resolves_relative_paths() {
        let yaml = "\
credentials:
  access_id: AKIDEXAMPLE
  secret_key: wJalrXUtnFEMI
domains:
  example.org: /etc/zones/example.org
  example.com: zones/example.com
";
        let config = SyncConfig::from_yaml_str(yaml, "/srv/dns").unwrap();
        assert_eq!(
            config.zone_files(),
            vec![
                ("example.com".to_string(), PathBuf::from("/srv/dns/zones/example.com")),
                ("example.org".to_string(), PathBuf::from("/etc/zones/example.org")),
            ]
        );
        assert_eq!(
            config.credentials().unwrap(),
            Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI")
        );
    }

    #[test]
    fn accepts_legacy_flat_layout() {
        let yaml = "access_id: AKID\nsecret_key: SECRET\nzones:\n  example.com: example.com.zone\n";
        let config = SyncConfig::from_yaml_str(yaml, "").unwrap();
        assert_eq!(config.domains.len(), 1);
        let provider = config.provider_config().unwrap();
        assert_eq!(provider.type_name(), "route53");
        assert_eq!(
            provider,
            ProviderConfig::route53(Credentials::new("AKID", "SECRET"))
        );
    }

    #[test]
    fn falls_back_to_environment_credentials() {
        let config = SyncConfig::from_yaml_str("domains:\n  example.com: z\n", "").unwrap();
        let credentials = config
            .credentials_with(|key| match key {
                ACCESS_ID_ENV => Some("ENVID".to_string()),
                SECRET_KEY_ENV => Some("ENVSECRET".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(credentials, Credentials::new("ENVID", "ENVSECRET"));

        let err = config.credentials_with(|_| None).unwrap_err();
        assert!(err.to_string().contains(ACCESS_ID_ENV));
    }

    #[test]
    fn rejects_invalid_configs() {
        assert!(SyncConfig::from_yaml_str("domains: {}\n", "").is_err());
        assert!(SyncConfig::from_yaml_str("domains:\n  \"bad name\": z\n", "").is_err());
        assert!(
            SyncConfig::from_yaml_str("domains:\n  example.com: z\nendpoint: ftp://x\n", "")
                .is_err()
        );
        assert!(matches!(
            SyncConfig::from_yaml_str("domains: [", ""),
            Err(Error::Yaml(_))
        ));
    }

    #[test]
    fn secret_is_redacted_in_debug() {
        let credentials = Credentials::new("AKID", "very-secret-key");
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("AKID"));
        assert!(!debug.contains("very-secret-key"));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dns.yaml");
        std::fs::write(&path, "domains:\n  example.com: example.com.zone\n").unwrap();
        let config = SyncConfig::load(&path).unwrap();
        assert_eq!(config.zone_files()[0].1, dir.path().join("example.com.zone"));
    }
}
