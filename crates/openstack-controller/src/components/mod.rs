//! Per-service sub-clients.
//!
//! Each sub-client knows its base endpoint and how to build the request URLs of
//! its service. Fetch methods issue a single GET through the borrowed
//! [`HttpClient`] and hand back the named collection verbatim; they never retry
//! and never swallow errors.

pub mod baremetal;
pub mod block_storage;
pub mod compute;
pub mod identity;
pub mod load_balancer;
pub mod network;

pub use baremetal::BaremetalRest;
pub use block_storage::BlockStorageRest;
pub use compute::ComputeRest;
pub use identity::IdentityRest;
pub use load_balancer::LoadBalancerRest;
pub use network::NetworkRest;

use serde_json::Value;

use crate::component::ComponentType;
use crate::config::CheckConfig;
use crate::error::{ApiError, ApiResult};
use crate::http::HttpClient;

/// A constructed sub-client, tagged by the service it talks to.
#[derive(Debug, Clone)]
pub enum Component {
    /// Identity sub-client.
    Identity(IdentityRest),
    /// Compute sub-client.
    Compute(ComputeRest),
    /// Network sub-client.
    Network(NetworkRest),
    /// BlockStorage sub-client.
    BlockStorage(BlockStorageRest),
    /// Baremetal sub-client.
    Baremetal(BaremetalRest),
    /// LoadBalancer sub-client.
    LoadBalancer(LoadBalancerRest),
}

impl Component {
    /// Builds the sub-client for `component` rooted at `endpoint`.
    pub fn build(component: ComponentType, endpoint: String, config: &CheckConfig) -> Self {
        match component {
            ComponentType::Identity => Component::Identity(IdentityRest::new(endpoint)),
            ComponentType::Compute => Component::Compute(ComputeRest::new(endpoint)),
            ComponentType::Network => Component::Network(NetworkRest::new(endpoint)),
            ComponentType::BlockStorage => Component::BlockStorage(BlockStorageRest::new(endpoint)),
            ComponentType::Baremetal => Component::Baremetal(BaremetalRest::new(
                endpoint,
                config.collect_conductor_metrics(),
            )),
            ComponentType::LoadBalancer => Component::LoadBalancer(LoadBalancerRest::new(endpoint)),
        }
    }

    /// The type this sub-client serves.
    pub fn component_type(&self) -> ComponentType {
        match self {
            Component::Identity(_) => ComponentType::Identity,
            Component::Compute(_) => ComponentType::Compute,
            Component::Network(_) => ComponentType::Network,
            Component::BlockStorage(_) => ComponentType::BlockStorage,
            Component::Baremetal(_) => ComponentType::Baremetal,
            Component::LoadBalancer(_) => ComponentType::LoadBalancer,
        }
    }

    /// Base URL the sub-client was built with.
    pub fn endpoint(&self) -> &str {
        match self {
            Component::Identity(c) => c.endpoint(),
            Component::Compute(c) => c.endpoint(),
            Component::Network(c) => c.endpoint(),
            Component::BlockStorage(c) => c.endpoint(),
            Component::Baremetal(c) => c.endpoint(),
            Component::LoadBalancer(c) => c.endpoint(),
        }
    }
}

/// GETs `url` and returns the array stored under `key`.
pub(crate) async fn get_collection(http: &HttpClient, url: &str, key: &str) -> ApiResult<Vec<Value>> {
    match http.get(url).await?.into_field(key)? {
        Value::Array(items) => Ok(items),
        _ => Err(ApiError::Decode {
            url: url.to_string(),
            reason: format!("`{}` is not an array", key),
        }),
    }
}

/// GETs `url` and returns the object stored under `key`.
pub(crate) async fn get_object(http: &HttpClient, url: &str, key: &str) -> ApiResult<Value> {
    http.get(url).await?.into_field(key)
}

pub(crate) fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
