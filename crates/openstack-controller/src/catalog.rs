//! Service catalog model and endpoint resolution.
//!
//! The catalog is returned by keystone alongside every issued token. Resolution
//! walks it in order and the first entry carrying both the requested type and the
//! configured interface wins, so catalog ordering is significant when a type
//! appears more than once.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::component::ComponentType;
use crate::error::{ApiError, ApiResult};

/// Endpoint visibility advertised by keystone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    /// Reachable from outside the deployment.
    Public,
    /// Reachable from the management network.
    Internal,
    /// Administrative endpoint.
    Admin,
}

impl Interface {
    /// Name used by keystone.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interface::Public => "public",
            Interface::Internal => "internal",
            Interface::Admin => "admin",
        }
    }
}

/// One URL of a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEndpoint {
    /// Visibility of this URL.
    pub interface: Interface,
    /// Base URL of the service.
    pub url: String,
    /// Region of this URL.
    #[serde(default)]
    pub region_id: Option<String>,
}

/// A deployed service and its endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Raw service type; entries for services this crate does not poll are kept as-is.
    #[serde(rename = "type")]
    pub service_type: String,
    /// Service name, e.g. `nova`.
    #[serde(default)]
    pub name: Option<String>,
    /// Endpoints, one per interface and region.
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

/// Ordered list of catalog entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog(pub Vec<CatalogEntry>);

impl Catalog {
    /// Catalog holding `entries` in the order keystone listed them.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self(entries)
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if any entry carries this type, regardless of interface.
    pub fn contains(&self, component: ComponentType) -> bool {
        self.0.iter().any(|e| e.service_type == component.as_str())
    }

    /// First URL, in catalog order, whose entry type and endpoint interface both match.
    pub fn find_url(&self, component: ComponentType, interface: Interface) -> Option<&str> {
        self.0
            .iter()
            .filter(|entry| entry.service_type == component.as_str())
            .flat_map(|entry| entry.endpoints.iter())
            .find(|endpoint| endpoint.interface == interface)
            .map(|endpoint| endpoint.url.as_str())
    }
}

/// Maps component types to base URLs, memoizing results until the catalog is replaced.
#[derive(Debug)]
pub struct EndpointResolver {
    catalog: Catalog,
    interface: Interface,
    endpoints: HashMap<ComponentType, String>,
}

impl EndpointResolver {
    /// An empty resolver that picks endpoints with `interface`.
    pub fn new(interface: Interface) -> Self {
        Self {
            catalog: Catalog::default(),
            interface,
            endpoints: HashMap::new(),
        }
    }

    /// The installed catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Drops the catalog and every memoized endpoint.
    pub fn clear(&mut self) {
        self.catalog = Catalog::default();
        self.endpoints.clear();
    }

    /// Installs a freshly issued catalog; memoized endpoints from the old one are discarded.
    pub fn replace_catalog(&mut self, catalog: Catalog) {
        self.endpoints.clear();
        self.catalog = catalog;
    }

    /// Number of memoized resolutions.
    pub fn cached_len(&self) -> usize {
        self.endpoints.len()
    }

    /// Base URL of `component`, or `ComponentNotFound` when no entry matches.
    pub fn resolve(&mut self, component: ComponentType) -> ApiResult<String> {
        if let Some(url) = self.endpoints.get(&component) {
            debug!("cached endpoint of type {}", component);
            return Ok(url.clone());
        }
        let url = self
            .catalog
            .find_url(component, self.interface)
            .map(str::to_string)
            .ok_or(ApiError::ComponentNotFound { component })?;
        debug!("resolved {} endpoint ({}): {}", component, self.interface.as_str(), url);
        self.endpoints.insert(component, url.clone());
        Ok(url)
    }
}
