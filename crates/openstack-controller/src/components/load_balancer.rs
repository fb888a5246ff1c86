//! Octavia.

use serde_json::Value;

use super::{encode, get_collection, get_object};
use crate::error::ApiResult;
use crate::http::HttpClient;

/// Octavia sub-client.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadBalancerRest {
    endpoint: String,
}

impl LoadBalancerRest {
    /// Sub-client rooted at `endpoint`.
    pub fn new(endpoint: String) -> Self {
        Self { endpoint }
    }

    /// Base URL from the catalog.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn lbaas(&self, resource: &str) -> String {
        format!("{}/v2/lbaas/{}", self.endpoint, resource)
    }

    fn octavia(&self, resource: &str) -> String {
        format!("{}/v2/octavia/{}", self.endpoint, resource)
    }

    /// `/v2/lbaas/loadbalancers?project_id=`
    pub fn loadbalancers_url(&self, project_id: &str) -> String {
        format!("{}?project_id={}", self.lbaas("loadbalancers"), encode(project_id))
    }

    /// `/v2/lbaas/listeners?project_id=`
    pub fn listeners_url(&self, project_id: &str) -> String {
        format!("{}?project_id={}", self.lbaas("listeners"), encode(project_id))
    }

    /// `/v2/lbaas/listeners?loadbalancer_id=&project_id=`
    pub fn listeners_by_loadbalancer_url(&self, loadbalancer_id: &str, project_id: &str) -> String {
        format!(
            "{}?loadbalancer_id={}&project_id={}",
            self.lbaas("listeners"),
            encode(loadbalancer_id),
            encode(project_id)
        )
    }

    /// `/v2/lbaas/pools?project_id=`
    pub fn pools_url(&self, project_id: &str) -> String {
        format!("{}?project_id={}", self.lbaas("pools"), encode(project_id))
    }

    /// `/v2/lbaas/pools?loadbalancer_id=&project_id=`
    pub fn pools_by_loadbalancer_url(&self, loadbalancer_id: &str, project_id: &str) -> String {
        format!(
            "{}?loadbalancer_id={}&project_id={}",
            self.lbaas("pools"),
            encode(loadbalancer_id),
            encode(project_id)
        )
    }

    /// `/v2/lbaas/pools/{pool_id}/members?project_id=`
    pub fn members_by_pool_url(&self, pool_id: &str, project_id: &str) -> String {
        format!(
            "{}?project_id={}",
            self.lbaas(&format!("pools/{}/members", pool_id)),
            encode(project_id)
        )
    }

    /// `/v2/lbaas/healthmonitors?project_id=`
    pub fn healthmonitors_url(&self, project_id: &str) -> String {
        format!("{}?project_id={}", self.lbaas("healthmonitors"), encode(project_id))
    }

    /// `/v2/lbaas/healthmonitors?pool_id=&project_id=`
    pub fn healthmonitors_by_pool_url(&self, pool_id: &str, project_id: &str) -> String {
        format!(
            "{}?pool_id={}&project_id={}",
            self.lbaas("healthmonitors"),
            encode(pool_id),
            encode(project_id)
        )
    }

    /// `/v2/lbaas/loadbalancers/{loadbalancer_id}/stats`
    pub fn loadbalancer_statistics_url(&self, loadbalancer_id: &str) -> String {
        self.lbaas(&format!("loadbalancers/{}/stats", loadbalancer_id))
    }

    /// `/v2/lbaas/listeners/{listener_id}/stats`
    pub fn listener_statistics_url(&self, listener_id: &str) -> String {
        self.lbaas(&format!("listeners/{}/stats", listener_id))
    }

    /// `/v2/octavia/amphorae`
    pub fn amphorae_url(&self) -> String {
        self.octavia("amphorae")
    }

    /// `/v2/octavia/amphorae?loadbalancer_id=`
    pub fn amphorae_by_loadbalancer_url(&self, loadbalancer_id: &str) -> String {
        format!("{}?loadbalancer_id={}", self.octavia("amphorae"), encode(loadbalancer_id))
    }

    /// `/v2/octavia/amphorae/{amphora_id}/stats`
    pub fn amphora_statistics_url(&self, amphora_id: &str) -> String {
        self.octavia(&format!("amphorae/{}/stats", amphora_id))
    }

    /// Fetches [`Self::loadbalancers_url`].
    pub async fn get_loadbalancers(&self, http: &HttpClient, project_id: &str) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.loadbalancers_url(project_id), "loadbalancers").await
    }

    /// Fetches [`Self::listeners_url`].
    pub async fn get_listeners(&self, http: &HttpClient, project_id: &str) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.listeners_url(project_id), "listeners").await
    }

    /// Fetches [`Self::listeners_by_loadbalancer_url`].
    pub async fn get_listeners_by_loadbalancer(
        &self,
        http: &HttpClient,
        loadbalancer_id: &str,
        project_id: &str,
    ) -> ApiResult<Vec<Value>> {
        let url = self.listeners_by_loadbalancer_url(loadbalancer_id, project_id);
        get_collection(http, &url, "listeners").await
    }

    /// Fetches [`Self::pools_url`].
    pub async fn get_pools(&self, http: &HttpClient, project_id: &str) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.pools_url(project_id), "pools").await
    }

    /// Fetches [`Self::pools_by_loadbalancer_url`].
    pub async fn get_pools_by_loadbalancer(
        &self,
        http: &HttpClient,
        loadbalancer_id: &str,
        project_id: &str,
    ) -> ApiResult<Vec<Value>> {
        let url = self.pools_by_loadbalancer_url(loadbalancer_id, project_id);
        get_collection(http, &url, "pools").await
    }

    /// Fetches [`Self::members_by_pool_url`].
    pub async fn get_members_by_pool(&self, http: &HttpClient, pool_id: &str, project_id: &str) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.members_by_pool_url(pool_id, project_id), "members").await
    }

    /// Fetches [`Self::healthmonitors_url`].
    pub async fn get_healthmonitors(&self, http: &HttpClient, project_id: &str) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.healthmonitors_url(project_id), "healthmonitors").await
    }

    /// Fetches [`Self::healthmonitors_by_pool_url`].
    pub async fn get_healthmonitors_by_pool(
        &self,
        http: &HttpClient,
        pool_id: &str,
        project_id: &str,
    ) -> ApiResult<Vec<Value>> {
        let url = self.healthmonitors_by_pool_url(pool_id, project_id);
        get_collection(http, &url, "healthmonitors").await
    }

    /// Fetches [`Self::loadbalancer_statistics_url`].
    pub async fn get_loadbalancer_statistics(&self, http: &HttpClient, loadbalancer_id: &str) -> ApiResult<Value> {
        get_object(http, &self.loadbalancer_statistics_url(loadbalancer_id), "stats").await
    }

    /// Fetches [`Self::listener_statistics_url`].
    pub async fn get_listener_statistics(&self, http: &HttpClient, listener_id: &str) -> ApiResult<Value> {
        get_object(http, &self.listener_statistics_url(listener_id), "stats").await
    }

    /// Fetches [`Self::amphorae_url`].
    pub async fn get_amphorae(&self, http: &HttpClient) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.amphorae_url(), "amphorae").await
    }

    /// Fetches [`Self::amphorae_by_loadbalancer_url`].
    pub async fn get_amphorae_by_loadbalancer(&self, http: &HttpClient, loadbalancer_id: &str) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.amphorae_by_loadbalancer_url(loadbalancer_id), "amphorae").await
    }

    /// One entry per listener served by the amphora.
    pub async fn get_amphora_statistics(&self, http: &HttpClient, amphora_id: &str) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.amphora_statistics_url(amphora_id), "amphora_stats").await
    }
}
