//! OpenStack component types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical OpenStack service category, as named by the `type` field of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentType {
    /// Keystone.
    Identity,
    /// Nova.
    Compute,
    /// Neutron.
    Network,
    /// Cinder.
    BlockStorage,
    /// Ironic.
    Baremetal,
    /// Octavia.
    LoadBalancer,
}

impl ComponentType {
    /// Every type, in the order a check run polls them.
    pub const ALL: [ComponentType; 6] = [
        ComponentType::Identity,
        ComponentType::Compute,
        ComponentType::Network,
        ComponentType::BlockStorage,
        ComponentType::Baremetal,
        ComponentType::LoadBalancer,
    ];

    /// Catalog `type` string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Identity => "identity",
            ComponentType::Compute => "compute",
            ComponentType::Network => "network",
            ComponentType::BlockStorage => "block-storage",
            ComponentType::Baremetal => "baremetal",
            ComponentType::LoadBalancer => "load-balancer",
        }
    }

    /// Project name of the service, used as the metric namespace.
    pub fn service_name(&self) -> &'static str {
        match self {
            ComponentType::Identity => "keystone",
            ComponentType::Compute => "nova",
            ComponentType::Network => "neutron",
            ComponentType::BlockStorage => "cinder",
            ComponentType::Baremetal => "ironic",
            ComponentType::LoadBalancer => "octavia",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentType::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown component type: {}", s))
    }
}
