//! Keystone.

use serde_json::Value;

use super::get_collection;
use crate::error::ApiResult;
use crate::http::HttpClient;

/// Keystone v3 sub-client.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityRest {
    endpoint: String,
}

impl IdentityRest {
    /// Sub-client rooted at `endpoint`.
    pub fn new(endpoint: String) -> Self {
        Self { endpoint }
    }

    /// Base URL from the catalog.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `/v3/domains`
    pub fn domains_url(&self) -> String {
        format!("{}/v3/domains", self.endpoint)
    }

    /// `/v3/projects`
    pub fn projects_url(&self) -> String {
        format!("{}/v3/projects", self.endpoint)
    }

    /// `/v3/users`
    pub fn users_url(&self) -> String {
        format!("{}/v3/users", self.endpoint)
    }

    /// `/v3/groups`
    pub fn groups_url(&self) -> String {
        format!("{}/v3/groups", self.endpoint)
    }

    /// `/v3/groups/{group_id}/users`
    pub fn group_users_url(&self, group_id: &str) -> String {
        format!("{}/v3/groups/{}/users", self.endpoint, group_id)
    }

    /// `/v3/services`
    pub fn services_url(&self) -> String {
        format!("{}/v3/services", self.endpoint)
    }

    /// `/v3/registered_limits`
    pub fn registered_limits_url(&self) -> String {
        format!("{}/v3/registered_limits", self.endpoint)
    }

    /// `/v3/limits`
    pub fn limits_url(&self) -> String {
        format!("{}/v3/limits", self.endpoint)
    }

    /// Fetches [`Self::domains_url`].
    pub async fn get_domains(&self, http: &HttpClient) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.domains_url(), "domains").await
    }

    /// Fetches [`Self::projects_url`].
    pub async fn get_projects(&self, http: &HttpClient) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.projects_url(), "projects").await
    }

    /// Fetches [`Self::users_url`].
    pub async fn get_users(&self, http: &HttpClient) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.users_url(), "users").await
    }

    /// Fetches [`Self::groups_url`].
    pub async fn get_groups(&self, http: &HttpClient) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.groups_url(), "groups").await
    }

    /// Fetches [`Self::group_users_url`].
    pub async fn get_group_users(&self, http: &HttpClient, group_id: &str) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.group_users_url(group_id), "users").await
    }

    /// Fetches [`Self::services_url`].
    pub async fn get_services(&self, http: &HttpClient) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.services_url(), "services").await
    }

    /// Fetches [`Self::registered_limits_url`].
    pub async fn get_registered_limits(&self, http: &HttpClient) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.registered_limits_url(), "registered_limits").await
    }

    /// Fetches [`Self::limits_url`].
    pub async fn get_limits(&self, http: &HttpClient) -> ApiResult<Vec<Value>> {
        get_collection(http, &self.limits_url(), "limits").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let identity = IdentityRest::new("http://10.164.0.11/identity".to_string());
        assert_eq!(identity.domains_url(), "http://10.164.0.11/identity/v3/domains");
        assert_eq!(
            identity.group_users_url("89b36a4c32c44b0ea8856b6357f101ea"),
            "http://10.164.0.11/identity/v3/groups/89b36a4c32c44b0ea8856b6357f101ea/users"
        );
        assert_eq!(
            identity.registered_limits_url(),
            "http://10.164.0.11/identity/v3/registered_limits"
        );
    }
}
