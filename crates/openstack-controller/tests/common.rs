//! Mock OpenStack deployment shared by the integration tests.
//!
//! One wiremock server plays every service: keystone lives under `/identity`,
//! and each catalog entry points at its own path prefix on the same server.

#![allow(dead_code)]

use openstack_controller::{CheckConfig, ComponentType};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PROJECT_ID: &str = "1e6e233e637d4d55a50a62b63398ad15";
pub const TOKEN: &str = "gAAAAABlBHB4-token-1";

pub struct OpenStack {
    pub server: MockServer,
}

impl OpenStack {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn keystone_url(&self) -> String {
        format!("{}/identity", self.server.uri())
    }

    pub fn config(&self) -> CheckConfig {
        CheckConfig {
            keystone_server_url: self.keystone_url(),
            username: "admin".to_string(),
            password: "password".to_string(),
            timeout_secs: 5,
            ..CheckConfig::default()
        }
    }

    /// Path prefix every component is served under.
    pub fn prefix(component: ComponentType) -> String {
        match component {
            ComponentType::Identity => "/identity".to_string(),
            ComponentType::Compute => "/compute/v2.1".to_string(),
            ComponentType::Network => "/networking".to_string(),
            ComponentType::BlockStorage => format!("/volume/v3/{}", PROJECT_ID),
            ComponentType::Baremetal => "/baremetal".to_string(),
            ComponentType::LoadBalancer => "/load-balancer".to_string(),
        }
    }

    pub fn url(&self, component: ComponentType, resource: &str) -> String {
        format!("{}{}{}", self.server.uri(), Self::prefix(component), resource)
    }

    pub fn catalog(&self, components: &[ComponentType]) -> Value {
        let entries: Vec<Value> = components
            .iter()
            .map(|component| {
                let url = self.url(*component, "");
                json!({
                    "type": component.as_str(),
                    "name": component.service_name(),
                    "endpoints": [
                        {"interface": "admin", "url": url, "region_id": "RegionOne"},
                        {"interface": "public", "url": url, "region_id": "RegionOne"},
                        {"interface": "internal", "url": url, "region_id": "RegionOne"}
                    ]
                })
            })
            .collect();
        Value::Array(entries)
    }

    pub fn token_response(&self, token: &str, components: &[ComponentType]) -> ResponseTemplate {
        ResponseTemplate::new(201)
            .insert_header("X-Subject-Token", token)
            .set_body_json(json!({
                "token": {
                    "methods": ["password"],
                    "expires_at": "2023-09-13T10:21:45.000000Z",
                    "catalog": self.catalog(components)
                }
            }))
    }

    /// Keystone issues `TOKEN` with a catalog listing `components`.
    pub async fn mount_auth(&self, components: &[ComponentType]) {
        Mock::given(method("POST"))
            .and(path("/identity/v3/auth/tokens"))
            .respond_with(self.token_response(TOKEN, components))
            .mount(&self.server)
            .await;
    }

    /// Keystone issues `token-1` once, then `token-2` for every later request.
    pub async fn mount_rotating_auth(&self, components: &[ComponentType]) {
        Mock::given(method("POST"))
            .and(path("/identity/v3/auth/tokens"))
            .respond_with(self.token_response("token-1", components))
            .up_to_n_times(1)
            .mount(&self.server)
            .await;
        Mock::given(method("POST"))
            .and(path("/identity/v3/auth/tokens"))
            .respond_with(self.token_response("token-2", components))
            .mount(&self.server)
            .await;
    }

    /// `route` rejects `token-1` with 401 and serves `body` to `token-2`.
    pub async fn mount_expiring_json(&self, route: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("X-Auth-Token", "token-1"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("X-Auth-Token", "token-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_get(&self, route: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_json(&self, route: &str, body: Value) {
        self.mount_get(route, ResponseTemplate::new(200).set_body_json(body)).await;
    }

    /// Requests received so far for `route`, any method.
    pub async fn hits(&self, route: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == route)
            .count()
    }

    pub async fn auth_hits(&self) -> usize {
        self.hits("/identity/v3/auth/tokens").await
    }
}

pub fn route(component: ComponentType, resource: &str) -> String {
    format!("{}{}", OpenStack::prefix(component), resource)
}

pub fn all_components() -> Vec<ComponentType> {
    ComponentType::ALL.to_vec()
}
