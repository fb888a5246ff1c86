use serde_json::Value;
use tracing::debug;

use super::ApiRest;
use crate::components::LoadBalancerRest;
use crate::error::{ApiError, ApiResult};
use crate::http::HttpClient;
use crate::metrics::{
    normalized_metrics, Entity, EntityMap, Metrics, MetricSpec, OCTAVIA_AMPHORAE, OCTAVIA_AMPHORA_STATS,
    OCTAVIA_HEALTHMONITORS, OCTAVIA_LISTENERS, OCTAVIA_LISTENER_STATS, OCTAVIA_LOADBALANCERS,
    OCTAVIA_LOADBALANCER_STATS, OCTAVIA_MEMBERS, OCTAVIA_POOLS,
};

const LOADBALANCER_ATTRIBUTES: &[&str] = &[
    "name",
    "provisioning_status",
    "operating_status",
    "vip_address",
    "provider",
];
const LISTENER_ATTRIBUTES: &[&str] = &[
    "name",
    "protocol",
    "protocol_port",
    "provisioning_status",
    "operating_status",
    "default_pool_id",
];
const POOL_ATTRIBUTES: &[&str] = &[
    "name",
    "protocol",
    "lb_algorithm",
    "provisioning_status",
    "operating_status",
];
const MEMBER_ATTRIBUTES: &[&str] = &[
    "name",
    "address",
    "protocol_port",
    "provisioning_status",
    "operating_status",
];
const HEALTHMONITOR_ATTRIBUTES: &[&str] = &[
    "name",
    "type",
    "http_method",
    "url_path",
    "provisioning_status",
    "operating_status",
];
const AMPHORA_ATTRIBUTES: &[&str] = &[
    "loadbalancer_id",
    "compute_id",
    "status",
    "role",
    "lb_network_ip",
    "ha_ip",
];

fn entity_for(spec: MetricSpec, attributes: &'static [&'static str]) -> impl Fn(&Value) -> Entity {
    move |object| Entity::from_object(object, attributes, normalized_metrics(object, spec))
}

/// An octavia collection, with the ids that scope it.
#[derive(Debug, Clone)]
enum Collection {
    Loadbalancers { project_id: String },
    Listeners { project_id: String },
    ListenersByLoadbalancer { project_id: String, loadbalancer_id: String },
    Pools { project_id: String },
    PoolsByLoadbalancer { project_id: String, loadbalancer_id: String },
    MembersByPool { project_id: String, pool_id: String },
    Healthmonitors { project_id: String },
    HealthmonitorsByPool { project_id: String, pool_id: String },
    Amphorae,
    AmphoraeByLoadbalancer { loadbalancer_id: String },
}

impl Collection {
    fn name(&self) -> &'static str {
        match self {
            Collection::Loadbalancers { .. } => "loadbalancers",
            Collection::Listeners { .. } => "listeners",
            Collection::ListenersByLoadbalancer { .. } => "listeners by loadbalancer",
            Collection::Pools { .. } => "pools",
            Collection::PoolsByLoadbalancer { .. } => "pools by loadbalancer",
            Collection::MembersByPool { .. } => "members by pool",
            Collection::Healthmonitors { .. } => "healthmonitors",
            Collection::HealthmonitorsByPool { .. } => "healthmonitors by pool",
            Collection::Amphorae => "amphorae",
            Collection::AmphoraeByLoadbalancer { .. } => "amphorae by loadbalancer",
        }
    }

    fn url(&self, lb: &LoadBalancerRest) -> String {
        match self {
            Collection::Loadbalancers { project_id } => lb.loadbalancers_url(project_id),
            Collection::Listeners { project_id } => lb.listeners_url(project_id),
            Collection::ListenersByLoadbalancer { project_id, loadbalancer_id } => {
                lb.listeners_by_loadbalancer_url(loadbalancer_id, project_id)
            }
            Collection::Pools { project_id } => lb.pools_url(project_id),
            Collection::PoolsByLoadbalancer { project_id, loadbalancer_id } => {
                lb.pools_by_loadbalancer_url(loadbalancer_id, project_id)
            }
            Collection::MembersByPool { project_id, pool_id } => lb.members_by_pool_url(pool_id, project_id),
            Collection::Healthmonitors { project_id } => lb.healthmonitors_url(project_id),
            Collection::HealthmonitorsByPool { project_id, pool_id } => {
                lb.healthmonitors_by_pool_url(pool_id, project_id)
            }
            Collection::Amphorae => lb.amphorae_url(),
            Collection::AmphoraeByLoadbalancer { loadbalancer_id } => lb.amphorae_by_loadbalancer_url(loadbalancer_id),
        }
    }

    async fn fetch(&self, lb: &LoadBalancerRest, http: &HttpClient) -> ApiResult<Vec<Value>> {
        match self {
            Collection::Loadbalancers { project_id } => lb.get_loadbalancers(http, project_id).await,
            Collection::Listeners { project_id } => lb.get_listeners(http, project_id).await,
            Collection::ListenersByLoadbalancer { project_id, loadbalancer_id } => {
                lb.get_listeners_by_loadbalancer(http, loadbalancer_id, project_id).await
            }
            Collection::Pools { project_id } => lb.get_pools(http, project_id).await,
            Collection::PoolsByLoadbalancer { project_id, loadbalancer_id } => {
                lb.get_pools_by_loadbalancer(http, loadbalancer_id, project_id).await
            }
            Collection::MembersByPool { project_id, pool_id } => {
                lb.get_members_by_pool(http, pool_id, project_id).await
            }
            Collection::Healthmonitors { project_id } => lb.get_healthmonitors(http, project_id).await,
            Collection::HealthmonitorsByPool { project_id, pool_id } => {
                lb.get_healthmonitors_by_pool(http, pool_id, project_id).await
            }
            Collection::Amphorae => lb.get_amphorae(http).await,
            Collection::AmphoraeByLoadbalancer { loadbalancer_id } => {
                lb.get_amphorae_by_loadbalancer(http, loadbalancer_id).await
            }
        }
    }

    fn projection(&self) -> (MetricSpec, &'static [&'static str]) {
        match self {
            Collection::Loadbalancers { .. } => (OCTAVIA_LOADBALANCERS, LOADBALANCER_ATTRIBUTES),
            Collection::Listeners { .. } | Collection::ListenersByLoadbalancer { .. } => {
                (OCTAVIA_LISTENERS, LISTENER_ATTRIBUTES)
            }
            Collection::Pools { .. } | Collection::PoolsByLoadbalancer { .. } => (OCTAVIA_POOLS, POOL_ATTRIBUTES),
            Collection::MembersByPool { .. } => (OCTAVIA_MEMBERS, MEMBER_ATTRIBUTES),
            Collection::Healthmonitors { .. } | Collection::HealthmonitorsByPool { .. } => {
                (OCTAVIA_HEALTHMONITORS, HEALTHMONITOR_ATTRIBUTES)
            }
            Collection::Amphorae | Collection::AmphoraeByLoadbalancer { .. } => {
                (OCTAVIA_AMPHORAE, AMPHORA_ATTRIBUTES)
            }
        }
    }
}

impl ApiRest {
    /// Load balancers of `project_id`.
    pub async fn get_load_balancer_loadbalancers(&mut self, project_id: &str) -> ApiResult<Option<EntityMap>> {
        self.get_load_balancer_collection(Collection::Loadbalancers {
            project_id: project_id.to_string(),
        })
        .await
    }

    /// Listeners of `project_id`.
    pub async fn get_load_balancer_listeners(&mut self, project_id: &str) -> ApiResult<Option<EntityMap>> {
        self.get_load_balancer_collection(Collection::Listeners {
            project_id: project_id.to_string(),
        })
        .await
    }

    /// Listeners attached to one load balancer.
    pub async fn get_load_balancer_listeners_by_loadbalancer(
        &mut self,
        project_id: &str,
        loadbalancer_id: &str,
    ) -> ApiResult<Option<EntityMap>> {
        self.get_load_balancer_collection(Collection::ListenersByLoadbalancer {
            project_id: project_id.to_string(),
            loadbalancer_id: loadbalancer_id.to_string(),
        })
        .await
    }

    /// Pools of `project_id`.
    pub async fn get_load_balancer_pools(&mut self, project_id: &str) -> ApiResult<Option<EntityMap>> {
        self.get_load_balancer_collection(Collection::Pools {
            project_id: project_id.to_string(),
        })
        .await
    }

    /// Pools attached to one load balancer.
    pub async fn get_load_balancer_pools_by_loadbalancer(
        &mut self,
        project_id: &str,
        loadbalancer_id: &str,
    ) -> ApiResult<Option<EntityMap>> {
        self.get_load_balancer_collection(Collection::PoolsByLoadbalancer {
            project_id: project_id.to_string(),
            loadbalancer_id: loadbalancer_id.to_string(),
        })
        .await
    }

    /// Members of one pool.
    pub async fn get_load_balancer_members_by_pool(
        &mut self,
        project_id: &str,
        pool_id: &str,
    ) -> ApiResult<Option<EntityMap>> {
        self.get_load_balancer_collection(Collection::MembersByPool {
            project_id: project_id.to_string(),
            pool_id: pool_id.to_string(),
        })
        .await
    }

    /// Health monitors of `project_id`.
    pub async fn get_load_balancer_healthmonitors(&mut self, project_id: &str) -> ApiResult<Option<EntityMap>> {
        self.get_load_balancer_collection(Collection::Healthmonitors {
            project_id: project_id.to_string(),
        })
        .await
    }

    /// Health monitors of one pool.
    pub async fn get_load_balancer_healthmonitors_by_pool(
        &mut self,
        project_id: &str,
        pool_id: &str,
    ) -> ApiResult<Option<EntityMap>> {
        self.get_load_balancer_collection(Collection::HealthmonitorsByPool {
            project_id: project_id.to_string(),
            pool_id: pool_id.to_string(),
        })
        .await
    }

    /// Traffic counters of one load balancer.
    pub async fn get_load_balancer_loadbalancer_statistics(&mut self, loadbalancer_id: &str) -> ApiResult<Option<Metrics>> {
        debug!("getting load-balancer loadbalancer statistics");
        let loadbalancer_id = loadbalancer_id.to_string();
        self.with_reauth("load-balancer loadbalancer statistics", move |api| {
            let loadbalancer_id = loadbalancer_id.clone();
            Box::pin(async move { api.fetch_loadbalancer_statistics(&loadbalancer_id).await })
        })
        .await
    }

    /// Traffic counters of one listener.
    pub async fn get_load_balancer_listener_statistics(&mut self, listener_id: &str) -> ApiResult<Option<Metrics>> {
        debug!("getting load-balancer listener statistics");
        let listener_id = listener_id.to_string();
        self.with_reauth("load-balancer listener statistics", move |api| {
            let listener_id = listener_id.clone();
            Box::pin(async move { api.fetch_listener_statistics(&listener_id).await })
        })
        .await
    }

    /// All amphorae visible to the token; octavia does not filter them by project.
    pub async fn get_load_balancer_amphorae(&mut self) -> ApiResult<Option<EntityMap>> {
        self.get_load_balancer_collection(Collection::Amphorae).await
    }

    /// Amphorae backing one load balancer.
    pub async fn get_load_balancer_amphorae_by_loadbalancer(
        &mut self,
        loadbalancer_id: &str,
    ) -> ApiResult<Option<EntityMap>> {
        self.get_load_balancer_collection(Collection::AmphoraeByLoadbalancer {
            loadbalancer_id: loadbalancer_id.to_string(),
        })
        .await
    }

    /// Per-listener statistics of one amphora, keyed by listener id.
    pub async fn get_load_balancer_amphora_statistics(&mut self, amphora_id: &str) -> ApiResult<Option<EntityMap>> {
        debug!("getting load-balancer amphora statistics");
        let amphora_id = amphora_id.to_string();
        self.with_reauth("load-balancer amphora statistics", move |api| {
            let amphora_id = amphora_id.clone();
            Box::pin(async move { api.fetch_amphora_statistics(&amphora_id).await })
        })
        .await
    }

    async fn get_load_balancer_collection(&mut self, collection: Collection) -> ApiResult<Option<EntityMap>> {
        let what = format!("load-balancer {}", collection.name());
        debug!("getting {}", what);
        self.with_reauth(&what, move |api| {
            let collection = collection.clone();
            Box::pin(async move { api.fetch_load_balancer_collection(&collection).await })
        })
        .await
    }

    async fn fetch_load_balancer_collection(&mut self, collection: &Collection) -> ApiResult<Option<EntityMap>> {
        let lb = self.load_balancer()?;
        let url = collection.url(&lb);
        if self.already_called(&url) {
            return Ok(None);
        }
        let items = collection.fetch(&lb, &self.http).await?;
        let (spec, attributes) = collection.projection();
        self.collected(url, &items, entity_for(spec, attributes))
    }

    async fn fetch_loadbalancer_statistics(&mut self, loadbalancer_id: &str) -> ApiResult<Option<Metrics>> {
        let lb = self.load_balancer()?;
        let url = lb.loadbalancer_statistics_url(loadbalancer_id);
        if self.already_called(&url) {
            return Ok(None);
        }
        let stats = lb.get_loadbalancer_statistics(&self.http, loadbalancer_id).await?;
        self.mark_called(url);
        Ok(Some(normalized_metrics(&stats, OCTAVIA_LOADBALANCER_STATS)))
    }

    async fn fetch_listener_statistics(&mut self, listener_id: &str) -> ApiResult<Option<Metrics>> {
        let lb = self.load_balancer()?;
        let url = lb.listener_statistics_url(listener_id);
        if self.already_called(&url) {
            return Ok(None);
        }
        let stats = lb.get_listener_statistics(&self.http, listener_id).await?;
        self.mark_called(url);
        Ok(Some(normalized_metrics(&stats, OCTAVIA_LISTENER_STATS)))
    }

    async fn fetch_amphora_statistics(&mut self, amphora_id: &str) -> ApiResult<Option<EntityMap>> {
        let lb = self.load_balancer()?;
        let url = lb.amphora_statistics_url(amphora_id);
        if self.already_called(&url) {
            return Ok(None);
        }
        let stats = lb.get_amphora_statistics(&self.http, amphora_id).await?;
        let entities = amphora_statistics(&stats, &url)?;
        self.mark_called(url);
        Ok(Some(entities))
    }
}

fn amphora_statistics(stats: &[Value], url: &str) -> ApiResult<EntityMap> {
    stats
        .iter()
        .map(|entry| {
            let listener_id = entry
                .get("listener_id")
                .and_then(Value::as_str)
                .ok_or_else(|| ApiError::missing_key(url, "listener_id"))?;
            let entity = Entity::from_object(
                entry,
                &["loadbalancer_id", "listener_id"],
                normalized_metrics(entry, OCTAVIA_AMPHORA_STATS),
            );
            Ok((listener_id.to_string(), entity))
        })
        .collect()
}
