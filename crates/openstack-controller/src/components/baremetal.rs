//! Ironic.

use serde_json::Value;

use super::get_collection;
use crate::error::ApiResult;
use crate::http::HttpClient;

/// Ironic sub-client.
#[derive(Debug, Clone, PartialEq)]
pub struct BaremetalRest {
    endpoint: String,
    collect_conductor_metrics: bool,
}

impl BaremetalRest {
    /// Sub-client rooted at `endpoint`.
    pub fn new(endpoint: String, collect_conductor_metrics: bool) -> Self {
        Self {
            endpoint,
            collect_conductor_metrics,
        }
    }

    /// Base URL from the catalog.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether the negotiated microversion exposes conductors.
    pub fn collect_conductor_metrics(&self) -> bool {
        self.collect_conductor_metrics
    }

    /// `/v1/nodes/detail`
    pub fn nodes_url(&self) -> String {
        format!("{}/v1/nodes/detail", self.endpoint)
    }

    /// `/v1/conductors`
    pub fn conductors_url(&self) -> String {
        format!("{}/v1/conductors", self.endpoint)
    }

    /// Fetches [`Self::nodes_url`].
    pub async fn get_nodes(&self, http: &HttpClient) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.nodes_url(), "nodes").await
    }

    /// Fetches [`Self::conductors_url`].
    pub async fn get_conductors(&self, http: &HttpClient) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.conductors_url(), "conductors").await
    }
}
