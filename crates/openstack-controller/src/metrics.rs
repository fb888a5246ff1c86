//! Projection of raw API objects into named numeric metrics.
//!
//! Nested objects are flattened with `.`, camelCase keys are converted to
//! snake_case, and only the fields listed for a resource kind survive.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{ApiError, ApiResult};

/// Metric name to value.
pub type Metrics = BTreeMap<String, f64>;

/// Entity identifier to entity, as returned by every collection query.
pub type EntityMap = BTreeMap<String, Entity>;

/// One polled resource: descriptive attributes (used as tags) plus its metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Entity {
    /// Descriptive fields, turned into tags.
    pub attributes: BTreeMap<String, Value>,
    /// Metric name to value.
    pub metrics: Metrics,
}

impl Entity {
    /// Copies the listed attributes out of `object`; absent ones are recorded as null.
    pub fn from_object(object: &Value, attributes: &[&str], metrics: Metrics) -> Self {
        let attributes = attributes
            .iter()
            .map(|key| (key.to_string(), object.get(*key).cloned().unwrap_or(Value::Null)))
            .collect();
        Self { attributes, metrics }
    }

    /// Sets one attribute, replacing any previous value.
    pub fn with_attribute(mut self, key: &str, value: Value) -> Self {
        self.attributes.insert(key.to_string(), value);
        self
    }

    /// The attribute as a string, if it is one.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/// Which fields of a resource become metrics, and under what prefix.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    /// Metric name prefix, e.g. `openstack.nova.server`.
    pub prefix: &'static str,
    /// Normalized field names kept as metrics.
    pub fields: &'static [&'static str],
}

/// Keystone domains.
pub const KEYSTONE_DOMAINS: MetricSpec = MetricSpec {
    prefix: "openstack.keystone.domains",
    fields: &["enabled"],
};

/// Keystone projects.
pub const KEYSTONE_PROJECTS: MetricSpec = MetricSpec {
    prefix: "openstack.keystone.projects",
    fields: &["enabled"],
};

/// Keystone users.
pub const KEYSTONE_USERS: MetricSpec = MetricSpec {
    prefix: "openstack.keystone.users",
    fields: &["enabled"],
};

/// Keystone groups.
pub const KEYSTONE_GROUPS: MetricSpec = MetricSpec {
    prefix: "openstack.keystone.groups",
    fields: &[],
};

/// Keystone services.
pub const KEYSTONE_SERVICES: MetricSpec = MetricSpec {
    prefix: "openstack.keystone.services",
    fields: &["enabled"],
};

/// Keystone limits.
pub const KEYSTONE_LIMITS: MetricSpec = MetricSpec {
    prefix: "openstack.keystone.limits",
    fields: &["limit"],
};

/// Nova limits.
pub const NOVA_LIMITS: MetricSpec = MetricSpec {
    prefix: "openstack.nova.limits",
    fields: &[
        "absolute.max_image_meta",
        "absolute.max_personality",
        "absolute.max_personality_size",
        "absolute.max_security_group_rules",
        "absolute.max_security_groups",
        "absolute.max_server_group_members",
        "absolute.max_server_groups",
        "absolute.max_server_meta",
        "absolute.max_total_cores",
        "absolute.max_total_floating_ips",
        "absolute.max_total_instances",
        "absolute.max_total_keypairs",
        "absolute.max_total_ram_size",
        "absolute.total_cores_used",
        "absolute.total_floating_ips_used",
        "absolute.total_instances_used",
        "absolute.total_ram_used",
        "absolute.total_security_groups_used",
        "absolute.total_server_groups_used",
    ],
};

/// Nova services.
pub const NOVA_SERVICES: MetricSpec = MetricSpec {
    prefix: "openstack.nova.service",
    fields: &["up"],
};

/// Nova flavors.
pub const NOVA_FLAVORS: MetricSpec = MetricSpec {
    prefix: "openstack.nova.flavor",
    fields: &["disk", "ephemeral", "ram", "rxtx_factor", "swap", "vcpus"],
};

/// Nova hypervisors.
pub const NOVA_HYPERVISORS: MetricSpec = MetricSpec {
    prefix: "openstack.nova.hypervisor",
    fields: &[
        "current_workload",
        "disk_available_least",
        "free_disk_gb",
        "free_ram_mb",
        "local_gb",
        "local_gb_used",
        "memory_mb",
        "memory_mb_used",
        "running_vms",
        "vcpus",
        "vcpus_used",
    ],
};

/// Nova quota sets.
pub const NOVA_QUOTA_SETS: MetricSpec = MetricSpec {
    prefix: "openstack.nova.quota_set",
    fields: &[
        "cores",
        "fixed_ips",
        "floating_ips",
        "injected_file_content_bytes",
        "injected_file_path_bytes",
        "injected_files",
        "instances",
        "key_pairs",
        "metadata_items",
        "ram",
        "security_group_rules",
        "security_groups",
        "server_group_members",
        "server_groups",
    ],
};

/// Nova servers.
pub const NOVA_SERVERS: MetricSpec = MetricSpec {
    prefix: "openstack.nova.server",
    fields: &["power_state"],
};

/// Nova server flavors.
pub const NOVA_SERVER_FLAVORS: MetricSpec = MetricSpec {
    prefix: "openstack.nova.server.flavor",
    fields: &["disk", "ephemeral", "ram", "rxtx_factor", "swap", "vcpus"],
};

/// Neutron quotas.
pub const NEUTRON_QUOTAS: MetricSpec = MetricSpec {
    prefix: "openstack.neutron.quotas",
    fields: &[
        "floatingip",
        "network",
        "port",
        "rbac_policy",
        "router",
        "security_group",
        "security_group_rule",
        "subnet",
        "subnetpool",
    ],
};

/// Neutron agents.
pub const NEUTRON_AGENTS: MetricSpec = MetricSpec {
    prefix: "openstack.neutron.agents",
    fields: &["admin_state_up", "alive"],
};

/// Ironic nodes.
pub const IRONIC_NODES: MetricSpec = MetricSpec {
    prefix: "openstack.ironic.node",
    fields: &["maintenance", "power_state", "retired"],
};

/// Ironic conductors.
pub const IRONIC_CONDUCTORS: MetricSpec = MetricSpec {
    prefix: "openstack.ironic.conductor",
    fields: &["alive"],
};

/// Octavia loadbalancers.
pub const OCTAVIA_LOADBALANCERS: MetricSpec = MetricSpec {
    prefix: "openstack.octavia.loadbalancer",
    fields: &["admin_state_up"],
};

/// Octavia listeners.
pub const OCTAVIA_LISTENERS: MetricSpec = MetricSpec {
    prefix: "openstack.octavia.listener",
    fields: &[
        "admin_state_up",
        "connection_limit",
        "timeout_client_data",
        "timeout_member_connect",
        "timeout_member_data",
        "timeout_tcp_inspect",
    ],
};

/// Octavia pools.
pub const OCTAVIA_POOLS: MetricSpec = MetricSpec {
    prefix: "openstack.octavia.pool",
    fields: &["admin_state_up"],
};

/// Octavia members.
pub const OCTAVIA_MEMBERS: MetricSpec = MetricSpec {
    prefix: "openstack.octavia.pool.member",
    fields: &["admin_state_up", "weight"],
};

/// Octavia healthmonitors.
pub const OCTAVIA_HEALTHMONITORS: MetricSpec = MetricSpec {
    prefix: "openstack.octavia.healthmonitor",
    fields: &["admin_state_up", "delay", "max_retries", "max_retries_down", "timeout"],
};

const OCTAVIA_STATS_FIELDS: &[&str] = &[
    "active_connections",
    "bytes_in",
    "bytes_out",
    "request_errors",
    "total_connections",
];

/// Octavia loadbalancer statistics.
pub const OCTAVIA_LOADBALANCER_STATS: MetricSpec = MetricSpec {
    prefix: "openstack.octavia.loadbalancer",
    fields: OCTAVIA_STATS_FIELDS,
};

/// Octavia listener statistics.
pub const OCTAVIA_LISTENER_STATS: MetricSpec = MetricSpec {
    prefix: "openstack.octavia.listener",
    fields: OCTAVIA_STATS_FIELDS,
};

/// Octavia amphorae.
pub const OCTAVIA_AMPHORAE: MetricSpec = MetricSpec {
    prefix: "openstack.octavia.amphora",
    fields: &[],
};

/// Octavia amphora statistics.
pub const OCTAVIA_AMPHORA_STATS: MetricSpec = MetricSpec {
    prefix: "openstack.octavia.amphora",
    fields: OCTAVIA_STATS_FIELDS,
};

/// Projects `object` through `spec` with keys and values left as they are.
pub fn normalized_metrics(object: &Value, spec: MetricSpec) -> Metrics {
    normalized_metrics_with(object, spec, |key| key.to_string(), |_, value| value.clone())
}

/// Like [`normalized_metrics`], with a value transform (applied to the flattened
/// source key) and a key rename (applied before the field filter).
pub fn normalized_metrics_with<K, V>(object: &Value, spec: MetricSpec, key_fn: K, value_fn: V) -> Metrics
where
    K: Fn(&str) -> String,
    V: Fn(&str, &Value) -> Value,
{
    let mut flat = Vec::new();
    flatten(object, None, &mut flat);

    let mut metrics = Metrics::new();
    for (key, value) in flat {
        let value = value_fn(&key, value);
        let key = key_fn(&key);
        if !spec.fields.contains(&key.as_str()) {
            continue;
        }
        if let Some(number) = as_number(&value) {
            metrics.insert(format!("{}.{}", spec.prefix, key), number);
        }
    }
    metrics
}

/// Drops a `namespace:` qualifier such as `OS-EXT-STS:` from an already snake-cased key.
pub fn strip_namespace(key: &str) -> String {
    key.rsplit(':').next().unwrap_or(key).to_string()
}

fn flatten<'a>(value: &'a Value, prefix: Option<&str>, out: &mut Vec<(String, &'a Value)>) {
    match value {
        Value::Object(map) => flatten_object(map, prefix, out),
        other => {
            if let Some(prefix) = prefix {
                out.push((prefix.to_string(), other));
            }
        }
    }
}

fn flatten_object<'a>(map: &'a Map<String, Value>, prefix: Option<&str>, out: &mut Vec<(String, &'a Value)>) {
    for (key, value) in map {
        let key = to_snake_case(key);
        let full = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key,
        };
        flatten(value, Some(&full), out);
    }
}

/// `maxTotalRAMSize` -> `max_total_ram_size`, `OS-FLV-EXT-DATA:ephemeral` -> `os_flv_ext_data:ephemeral`.
pub fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase() || prev.is_ascii_digit() || (prev.is_ascii_uppercase() && next_is_lower) {
                out.push('_');
            }
        }
        out.push(if c == '-' { '_' } else { c.to_ascii_lowercase() });
    }
    out
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) if s.is_empty() => Some(0.0),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Entity identifier; numeric ids (host aggregates) are rendered as strings.
pub fn entity_id(object: &Value, url: &str) -> ApiResult<String> {
    match object.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(ApiError::missing_key(url, "id")),
    }
}
