//! One controller check run: drives [`ApiRest`] across every component and
//! turns what it returns into metrics and service checks.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

use crate::api::{ApiRest, AuthProject};
use crate::component::ComponentType;
use crate::config::CheckConfig;
use crate::error::{ApiError, ApiResult};
use crate::metrics::{EntityMap, Metrics};

/// A gauge sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    /// Dotted metric name, e.g. `openstack.nova.server.count`.
    pub name: String,
    /// Sample value.
    pub value: f64,
    /// `key:value` tags.
    pub tags: Vec<String>,
}

/// Outcome of a service check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceCheckStatus {
    /// The API answered.
    Ok,
    /// The API could not be reached or answered with an error.
    Critical,
}

/// Availability of one API, `openstack.<service>.api.up`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceCheck {
    /// Check name.
    pub name: String,
    /// OK or CRITICAL.
    pub status: ServiceCheckStatus,
    /// `key:value` tags.
    pub tags: Vec<String>,
}

/// Everything one run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckReport {
    /// Gauges in emission order.
    pub metrics: Vec<Metric>,
    /// Service checks in emission order.
    pub service_checks: Vec<ServiceCheck>,
    /// Components absent from the catalog, in the order they were found missing.
    pub missing_components: Vec<ComponentType>,
}

impl CheckReport {
    /// First metric called `name`.
    pub fn metric(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Every metric called `name`, one per tagged entity.
    pub fn metrics_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Metric> + 'a {
        self.metrics.iter().filter(move |m| m.name == name)
    }

    /// First service check called `name`.
    pub fn service_check(&self, name: &str) -> Option<&ServiceCheck> {
        self.service_checks.iter().find(|c| c.name == name)
    }
}

/// The controller check, configured once and run any number of times.
pub struct OpenStackControllerCheck {
    config: CheckConfig,
}

impl OpenStackControllerCheck {
    /// A check for one keystone deployment; `config` is validated when the check runs.
    pub fn new(config: CheckConfig) -> Self {
        Self { config }
    }

    /// Runs one check with a fresh facade, so the called-endpoint set starts empty.
    ///
    /// Only an invalid configuration fails the run. A failed authorization logs
    /// and yields an empty report; every other failure is confined to the
    /// metrics it would have produced.
    pub async fn run(&self) -> ApiResult<CheckReport> {
        let mut api = ApiRest::new(self.config.clone())?;
        let mut run = CheckRun::new(&api);

        if let Err(e) = api.authorize().await {
            error!("Exception while authorizing user: {}", e);
            return Ok(run.report);
        }
        info!("User successfully authorized");

        run.report_response_times(&mut api).await;
        run.report_identity(&mut api).await;
        run.report_compute(&mut api).await;
        run.report_network(&mut api).await;
        run.report_baremetal(&mut api).await;
        run.report_load_balancer(&mut api).await;
        run.report_projects(&mut api).await;
        Ok(run.report)
    }
}

struct CheckRun {
    base_tags: Vec<String>,
    collect_group_users: bool,
    collect_load_balancer_statistics: bool,
    /// Missing from the catalog or failing its response-time check; not polled again this run.
    skipped: BTreeSet<ComponentType>,
    report: CheckReport,
}

impl CheckRun {
    fn new(api: &ApiRest) -> Self {
        let config = api.config();
        Self {
            base_tags: vec![format!("keystone_server:{}", config.keystone_server_url)],
            collect_group_users: config.collect_group_users,
            collect_load_balancer_statistics: config.collect_load_balancer_statistics,
            skipped: BTreeSet::new(),
            report: CheckReport::default(),
        }
    }

    fn enabled(&self, component: ComponentType) -> bool {
        !self.skipped.contains(&component)
    }

    fn component_missing(&mut self, component: ComponentType) {
        self.skipped.insert(component);
        if !self.report.missing_components.contains(&component) {
            info!("{}", ApiError::ComponentNotFound { component });
            self.report.missing_components.push(component);
        }
    }

    /// Unwraps a facade result; failures were already logged or are logged here.
    fn absorb<T>(&mut self, what: &str, result: ApiResult<Option<T>>) -> Option<T> {
        match result {
            Ok(value) => value,
            Err(ApiError::ComponentNotFound { component }) => {
                self.component_missing(component);
                None
            }
            Err(e) => {
                error!("Exception while reporting {}: {}", what, e);
                None
            }
        }
    }

    async fn report_response_times(&mut self, api: &mut ApiRest) {
        for component in ComponentType::ALL {
            let result = match component {
                ComponentType::BlockStorage => api.get_block_storage_response_time().await,
                _ => api.get_response_time(component).await,
            };
            let service = component.service_name();
            let check_name = format!("openstack.{}.api.up", service);
            match result {
                Ok(Some(elapsed_ms)) => {
                    debug!("{} response time: {}ms", component, elapsed_ms);
                    self.gauge(&format!("openstack.{}.response_time", service), elapsed_ms, &[]);
                    self.service_check(&check_name, ServiceCheckStatus::Ok);
                }
                Ok(None) => {}
                Err(ApiError::ComponentNotFound { component }) => self.component_missing(component),
                Err(e) => {
                    warn!("{} is unreachable: {}", component, e);
                    self.skipped.insert(component);
                    self.service_check(&check_name, ServiceCheckStatus::Critical);
                }
            }
        }
    }

    async fn report_identity(&mut self, api: &mut ApiRest) {
        if !self.enabled(ComponentType::Identity) {
            return;
        }
        let result = api.get_identity_domains().await;
        if let Some(domains) = self.absorb("identity domains", result) {
            self.entities("openstack.keystone.domains.count", "domain", &domains, &[]);
        }
        let result = api.get_identity_projects().await;
        if let Some(projects) = self.absorb("identity projects", result) {
            self.entities("openstack.keystone.projects.count", "project", &projects, &[]);
        }
        let result = api.get_identity_users().await;
        if let Some(users) = self.absorb("identity users", result) {
            self.entities("openstack.keystone.users.count", "user", &users, &[]);
        }
        let result = api.get_identity_groups().await;
        if let Some(groups) = self.absorb("identity groups", result) {
            self.entities("openstack.keystone.groups.count", "group", &groups, &[]);
            if self.collect_group_users {
                for (group_id, group) in &groups {
                    let result = api.get_identity_group_users(group_id).await;
                    if let Some(users) = self.absorb("identity group users", result) {
                        let mut tags = vec![format!("group_id:{}", group_id)];
                        if let Some(name) = group.attribute_str("name") {
                            tags.push(format!("group_name:{}", name));
                        }
                        self.gauge("openstack.keystone.groups.users", users.len() as f64, &tags);
                    }
                }
            }
        }
        let result = api.get_identity_services().await;
        if let Some(services) = self.absorb("identity services", result) {
            self.entities("openstack.keystone.services.count", "service", &services, &[]);
        }
        let result = api.get_identity_limits().await;
        if let Some(limits) = self.absorb("identity limits", result) {
            self.entities("openstack.keystone.limits.count", "limit", &limits, &[]);
        }
    }

    async fn report_compute(&mut self, api: &mut ApiRest) {
        if !self.enabled(ComponentType::Compute) {
            return;
        }
        let result = api.get_compute_limits().await;
        if let Some(limits) = self.absorb("compute limits", result) {
            self.metrics(&limits, &[]);
        }
        let result = api.get_compute_services().await;
        if let Some(services) = self.absorb("compute services", result) {
            self.entities("openstack.nova.service.count", "service", &services, &[]);
        }
        let result = api.get_compute_flavors().await;
        if let Some(flavors) = self.absorb("compute flavors", result) {
            self.entities("openstack.nova.flavor.count", "flavor", &flavors, &[]);
        }
        let result = api.get_compute_hypervisors().await;
        if let Some(hypervisors) = self.absorb("compute hypervisors", result) {
            self.entities("openstack.nova.hypervisor.count", "hypervisor", &hypervisors, &[]);
        }
        let result = api.get_compute_os_aggregates().await;
        if let Some(aggregates) = self.absorb("compute os-aggregates", result) {
            self.entities("openstack.nova.aggregate.count", "aggregate", &aggregates, &[]);
        }
    }

    async fn report_network(&mut self, api: &mut ApiRest) {
        if !self.enabled(ComponentType::Network) {
            return;
        }
        let result = api.get_network_agents().await;
        if let Some(agents) = self.absorb("network agents", result) {
            self.entities("openstack.neutron.agents.count", "agent", &agents, &[]);
        }
    }

    async fn report_baremetal(&mut self, api: &mut ApiRest) {
        if !self.enabled(ComponentType::Baremetal) {
            return;
        }
        let result = api.get_baremetal_nodes().await;
        if let Some(nodes) = self.absorb("baremetal nodes", result) {
            self.entities("openstack.ironic.node.count", "node", &nodes, &[]);
        }
        let result = api.get_baremetal_conductors().await;
        if let Some(conductors) = self.absorb("baremetal conductors", result) {
            self.entities("openstack.ironic.conductor.count", "conductor", &conductors, &[]);
        }
    }

    async fn report_load_balancer(&mut self, api: &mut ApiRest) {
        if !self.enabled(ComponentType::LoadBalancer) {
            return;
        }
        let result = api.get_load_balancer_amphorae().await;
        if let Some(amphorae) = self.absorb("load-balancer amphorae", result) {
            self.entities("openstack.octavia.amphora.count", "amphora", &amphorae, &[]);
        }
    }

    /// Re-authorizes scoped to each auth project and reports its resources.
    async fn report_projects(&mut self, api: &mut ApiRest) {
        let result = api.get_auth_projects().await;
        let Some(projects) = self.absorb("auth projects", result) else {
            return;
        };
        for project in &projects {
            api.set_current_project(Some(project.id.clone()));
            if let Err(e) = api.authorize().await {
                error!("Exception while authorizing user for project {}: {}", project.id, e);
                continue;
            }
            let tags = vec![
                format!("project_id:{}", project.id),
                format!("project_name:{}", project.name),
            ];
            self.report_project(api, project, &tags).await;
        }
        api.set_current_project(None);
    }

    async fn report_project(&mut self, api: &mut ApiRest, project: &AuthProject, tags: &[String]) {
        if self.enabled(ComponentType::Compute) {
            let result = api.get_compute_quota_set(&project.id).await;
            if let Some(quota_sets) = self.absorb("compute quota set", result) {
                self.entities("openstack.nova.quota_set.count", "quota_set", &quota_sets, tags);
            }
            let result = api.get_compute_servers(&project.id).await;
            if let Some(servers) = self.absorb("compute servers", result) {
                self.entities("openstack.nova.server.count", "server", &servers, tags);
            }
        }
        if self.enabled(ComponentType::Network) {
            let result = api.get_network_quotas(&project.id).await;
            if let Some(quotas) = self.absorb("network quotas", result) {
                for entity in quotas.values() {
                    self.metrics(&entity.metrics, tags);
                }
            }
        }
        if self.enabled(ComponentType::LoadBalancer) {
            self.report_project_load_balancers(api, &project.id, tags).await;
        }
    }

    async fn report_project_load_balancers(&mut self, api: &mut ApiRest, project_id: &str, tags: &[String]) {
        let result = api.get_load_balancer_loadbalancers(project_id).await;
        if let Some(loadbalancers) = self.absorb("load-balancer loadbalancers", result) {
            self.entities("openstack.octavia.loadbalancer.count", "loadbalancer", &loadbalancers, tags);
            for loadbalancer_id in loadbalancers.keys() {
                let lb_tags = with_tag(tags, "loadbalancer_id", loadbalancer_id);
                if self.collect_load_balancer_statistics {
                    let result = api.get_load_balancer_loadbalancer_statistics(loadbalancer_id).await;
                    if let Some(stats) = self.absorb("load-balancer loadbalancer statistics", result) {
                        self.metrics(&stats, &lb_tags);
                    }
                }
                let result = api.get_load_balancer_amphorae_by_loadbalancer(loadbalancer_id).await;
                if let Some(amphorae) = self.absorb("load-balancer amphorae by loadbalancer", result) {
                    if self.collect_load_balancer_statistics {
                        for amphora_id in amphorae.keys() {
                            let result = api.get_load_balancer_amphora_statistics(amphora_id).await;
                            if let Some(stats) = self.absorb("load-balancer amphora statistics", result) {
                                let amphora_tags = with_tag(&lb_tags, "amphora_id", amphora_id);
                                self.entities("openstack.octavia.amphora.listener.count", "listener", &stats, &amphora_tags);
                            }
                        }
                    }
                }
            }
        }

        let result = api.get_load_balancer_listeners(project_id).await;
        if let Some(listeners) = self.absorb("load-balancer listeners", result) {
            self.entities("openstack.octavia.listener.count", "listener", &listeners, tags);
            if self.collect_load_balancer_statistics {
                for listener_id in listeners.keys() {
                    let result = api.get_load_balancer_listener_statistics(listener_id).await;
                    if let Some(stats) = self.absorb("load-balancer listener statistics", result) {
                        self.metrics(&stats, &with_tag(tags, "listener_id", listener_id));
                    }
                }
            }
        }

        let result = api.get_load_balancer_pools(project_id).await;
        if let Some(pools) = self.absorb("load-balancer pools", result) {
            self.entities("openstack.octavia.pool.count", "pool", &pools, tags);
            for pool_id in pools.keys() {
                let result = api.get_load_balancer_members_by_pool(project_id, pool_id).await;
                if let Some(members) = self.absorb("load-balancer members by pool", result) {
                    let pool_tags = with_tag(tags, "pool_id", pool_id);
                    self.entities("openstack.octavia.pool.member.count", "member", &members, &pool_tags);
                }
            }
        }

        let result = api.get_load_balancer_healthmonitors(project_id).await;
        if let Some(healthmonitors) = self.absorb("load-balancer healthmonitors", result) {
            self.entities("openstack.octavia.healthmonitor.count", "healthmonitor", &healthmonitors, tags);
        }
    }

    fn gauge(&mut self, name: &str, value: f64, tags: &[String]) {
        let mut all = self.base_tags.clone();
        all.extend_from_slice(tags);
        self.report.metrics.push(Metric {
            name: name.to_string(),
            value,
            tags: all,
        });
    }

    fn metrics(&mut self, metrics: &Metrics, tags: &[String]) {
        for (name, value) in metrics {
            self.gauge(name, *value, tags);
        }
    }

    /// Emits `count_name` (zero for an empty map) and every entity's metrics,
    /// tagged with its id and attributes.
    fn entities(&mut self, count_name: &str, kind: &str, entities: &EntityMap, tags: &[String]) {
        self.gauge(count_name, entities.len() as f64, tags);
        for (id, entity) in entities {
            let mut entity_tags = with_tag(tags, &format!("{}_id", kind), id);
            for (key, value) in &entity.attributes {
                let key = if key == "name" { format!("{}_name", kind) } else { key.clone() };
                attribute_tags(&key, value, &mut entity_tags);
            }
            self.metrics(&entity.metrics, &entity_tags);
        }
    }

    fn service_check(&mut self, name: &str, status: ServiceCheckStatus) {
        self.report.service_checks.push(ServiceCheck {
            name: name.to_string(),
            status,
            tags: self.base_tags.clone(),
        });
    }
}

fn with_tag(tags: &[String], key: &str, value: &str) -> Vec<String> {
    let mut out = tags.to_vec();
    out.push(format!("{}:{}", key, value));
    out
}

fn attribute_tags(key: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Null | Value::Object(_) => {}
        Value::String(s) => out.push(format!("{}:{}", key, s)),
        Value::Array(items) => {
            for item in items {
                attribute_tags(key, item, out);
            }
        }
        other => out.push(format!("{}:{}", key, other)),
    }
}
