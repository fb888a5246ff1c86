//! Neutron.

use serde_json::Value;

use super::{get_collection, get_object};
use crate::error::ApiResult;
use crate::http::HttpClient;

/// Neutron sub-client.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkRest {
    endpoint: String,
}

impl NetworkRest {
    /// Sub-client rooted at `endpoint`.
    pub fn new(endpoint: String) -> Self {
        Self { endpoint }
    }

    /// Base URL from the catalog.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `/v2.0/quotas/{project_id}`
    pub fn quotas_url(&self, project_id: &str) -> String {
        format!("{}/v2.0/quotas/{}", self.endpoint, project_id)
    }

    /// `/v2.0/agents`
    pub fn agents_url(&self) -> String {
        format!("{}/v2.0/agents", self.endpoint)
    }

    /// Fetches [`Self::quotas_url`].
    pub async fn get_quotas(&self, http: &HttpClient, project_id: &str) -> ApiResult<Value> {
        get_object(http, &self.quotas_url(project_id), "quota").await
    }

    /// Fetches [`Self::agents_url`].
    pub async fn get_agents(&self, http: &HttpClient) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.agents_url(), "agents").await
    }
}
