//! Check configuration, loaded from TOML or JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::catalog::Interface;
use crate::error::{ApiError, ApiResult};

/// Oldest ironic microversion exposing `/v1/conductors`.
const IRONIC_CONDUCTORS_MIN_VERSION: (u32, u32) = (1, 49);

/// Check instance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Keystone API root, e.g. `http://10.164.0.11/identity`.
    pub keystone_server_url: String,
    /// Keystone credentials.
    pub username: String,
    /// Password of `username`.
    pub password: String,
    /// Domain of the user.
    #[serde(default = "default_domain_id")]
    pub domain_id: String,
    /// Sent as `X-OpenStack-Nova-API-Version` when set.
    #[serde(default)]
    pub nova_microversion: Option<String>,
    /// Sent as `X-OpenStack-Ironic-API-Version` when set.
    #[serde(default)]
    pub ironic_microversion: Option<String>,
    /// Resolve `internal` catalog endpoints instead of `public` ones.
    #[serde(default)]
    pub use_internal_endpoints: bool,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Verify TLS certificates.
    #[serde(default = "default_true")]
    pub ssl_verify: bool,
    /// Poll the members of every keystone group.
    #[serde(default = "default_true")]
    pub collect_group_users: bool,
    /// Poll octavia statistics for every load balancer, listener and amphora.
    #[serde(default = "default_true")]
    pub collect_load_balancer_statistics: bool,
}

fn default_domain_id() -> String {
    String::from("default")
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            keystone_server_url: String::from("http://127.0.0.1:8080/identity"),
            username: String::from("admin"),
            password: String::new(),
            domain_id: default_domain_id(),
            nova_microversion: None,
            ironic_microversion: None,
            use_internal_endpoints: false,
            timeout_secs: default_timeout_secs(),
            ssl_verify: true,
            collect_group_users: true,
            collect_load_balancer_statistics: true,
        }
    }
}

impl CheckConfig {
    /// Reads a `.toml` or `.json` file, chosen by extension.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        let config: CheckConfig = match ext.to_lowercase().as_str() {
            "toml" => toml::from_str(&contents)?,
            "json" => serde_json::from_str(&contents)?,
            _ => anyhow::bail!("Unsupported config file extension: {}", ext),
        };
        Ok(config.validate()?)
    }

    /// Rejects unusable settings and normalizes the keystone URL.
    pub fn validate(mut self) -> ApiResult<Self> {
        let trimmed = self.keystone_server_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ApiError::InvalidConfig(
                "keystone_server_url must not be empty".to_string(),
            ));
        }
        if self.username.trim().is_empty() {
            return Err(ApiError::InvalidConfig("username must not be empty".to_string()));
        }
        self.keystone_server_url = trimmed.to_string();
        Ok(self)
    }

    /// Catalog interface selected by `use_internal_endpoints`.
    pub fn interface(&self) -> Interface {
        if self.use_internal_endpoints {
            Interface::Internal
        } else {
            Interface::Public
        }
    }

    /// Conductors are only listed by ironic microversions 1.49 and later.
    pub fn collect_conductor_metrics(&self) -> bool {
        match self.ironic_microversion.as_deref() {
            Some("latest") => true,
            Some(version) => parse_microversion(version)
                .map(|v| v >= IRONIC_CONDUCTORS_MIN_VERSION)
                .unwrap_or(false),
            None => false,
        }
    }
}

fn parse_microversion(version: &str) -> Option<(u32, u32)> {
    let (major, minor) = version.trim().split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}
