//! Nova.

use serde_json::Value;

use super::{encode, get_collection, get_object};
use crate::error::ApiResult;
use crate::http::HttpClient;

/// Nova sub-client. The endpoint already carries the API version (`.../compute/v2.1`).
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeRest {
    endpoint: String,
}

impl ComputeRest {
    /// Sub-client rooted at `endpoint`.
    pub fn new(endpoint: String) -> Self {
        Self { endpoint }
    }

    /// Base URL from the catalog.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `/limits`
    pub fn limits_url(&self) -> String {
        format!("{}/limits", self.endpoint)
    }

    /// `/os-services`
    pub fn services_url(&self) -> String {
        format!("{}/os-services", self.endpoint)
    }

    /// `/flavors/detail`
    pub fn flavors_url(&self) -> String {
        format!("{}/flavors/detail", self.endpoint)
    }

    /// `/flavors/{flavor_id}`
    pub fn flavor_url(&self, flavor_id: &str) -> String {
        format!("{}/flavors/{}", self.endpoint, flavor_id)
    }

    /// `/os-hypervisors/detail?with_servers=true`
    pub fn hypervisors_url(&self) -> String {
        format!("{}/os-hypervisors/detail?with_servers=true", self.endpoint)
    }

    /// `/os-aggregates`
    pub fn os_aggregates_url(&self) -> String {
        format!("{}/os-aggregates", self.endpoint)
    }

    /// `/os-quota-sets/{project_id}`
    pub fn quota_set_url(&self, project_id: &str) -> String {
        format!("{}/os-quota-sets/{}", self.endpoint, project_id)
    }

    /// `/servers/detail?project_id=`
    pub fn servers_url(&self, project_id: &str) -> String {
        format!("{}/servers/detail?project_id={}", self.endpoint, encode(project_id))
    }

    /// Fetches [`Self::limits_url`].
    pub async fn get_limits(&self, http: &HttpClient) -> ApiResult<Value> {
        get_object(http, &self.limits_url(), "limits").await
    }

    /// Fetches [`Self::services_url`].
    pub async fn get_services(&self, http: &HttpClient) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.services_url(), "services").await
    }

    /// Fetches [`Self::flavors_url`].
    pub async fn get_flavors(&self, http: &HttpClient) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.flavors_url(), "flavors").await
    }

    /// Fetches [`Self::flavor_url`].
    pub async fn get_flavor(&self, http: &HttpClient, flavor_id: &str) -> ApiResult<Value> {
        get_object(http, &self.flavor_url(flavor_id), "flavor").await
    }

    /// Fetches [`Self::hypervisors_url`].
    pub async fn get_hypervisors(&self, http: &HttpClient) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.hypervisors_url(), "hypervisors").await
    }

    /// Fetches [`Self::os_aggregates_url`].
    pub async fn get_os_aggregates(&self, http: &HttpClient) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.os_aggregates_url(), "aggregates").await
    }

    /// Fetches [`Self::quota_set_url`].
    pub async fn get_quota_set(&self, http: &HttpClient, project_id: &str) -> ApiResult<Value> {
        get_object(http, &self.quota_set_url(project_id), "quota_set").await
    }

    /// Fetches [`Self::servers_url`].
    pub async fn get_servers(&self, http: &HttpClient, project_id: &str) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.servers_url(project_id), "servers").await
    }
}
