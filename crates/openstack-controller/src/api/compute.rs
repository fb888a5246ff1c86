use serde_json::Value;
use tracing::debug;

use super::ApiRest;
use crate::components::ComputeRest;
use crate::error::ApiResult;
use crate::metrics::{
    entity_id, normalized_metrics, normalized_metrics_with, strip_namespace, Entity, EntityMap, Metrics,
    NOVA_FLAVORS, NOVA_HYPERVISORS, NOVA_LIMITS, NOVA_QUOTA_SETS, NOVA_SERVERS, NOVA_SERVER_FLAVORS, NOVA_SERVICES,
};

impl ApiRest {
    /// Absolute compute limits of the token's project.
    pub async fn get_compute_limits(&mut self) -> ApiResult<Option<Metrics>> {
        debug!("getting compute limits");
        self.with_reauth("compute limits", |api| Box::pin(api.fetch_compute_limits()))
            .await
    }

    /// Nova services keyed by id; `state` becomes the `up` metric.
    pub async fn get_compute_services(&mut self) -> ApiResult<Option<EntityMap>> {
        debug!("getting compute services");
        self.with_reauth("compute services", |api| Box::pin(api.fetch_compute_services()))
            .await
    }

    /// Every flavor, with an unset swap reported as 0.
    pub async fn get_compute_flavors(&mut self) -> ApiResult<Option<EntityMap>> {
        debug!("getting compute flavors");
        self.with_reauth("compute flavors", |api| Box::pin(api.fetch_compute_flavors()))
            .await
    }

    /// Hypervisors with their servers listed.
    pub async fn get_compute_hypervisors(&mut self) -> ApiResult<Option<EntityMap>> {
        debug!("getting compute hypervisors");
        self.with_reauth("compute hypervisors", |api| Box::pin(api.fetch_compute_hypervisors()))
            .await
    }

    /// Host aggregates; attributes only.
    pub async fn get_compute_os_aggregates(&mut self) -> ApiResult<Option<EntityMap>> {
        debug!("getting compute os-aggregates");
        self.with_reauth("compute os-aggregates", |api| Box::pin(api.fetch_compute_os_aggregates()))
            .await
    }

    /// Quota set of `project_id`, keyed by the quota set id.
    pub async fn get_compute_quota_set(&mut self, project_id: &str) -> ApiResult<Option<EntityMap>> {
        debug!("getting compute quota set");
        let project_id = project_id.to_string();
        self.with_reauth("compute quota set", move |api| {
            let project_id = project_id.clone();
            Box::pin(async move { api.fetch_compute_quota_set(&project_id).await })
        })
        .await
    }

    /// Servers of `project_id`, each enriched with the metrics of its flavor.
    pub async fn get_compute_servers(&mut self, project_id: &str) -> ApiResult<Option<EntityMap>> {
        debug!("getting compute servers");
        let project_id = project_id.to_string();
        self.with_reauth("compute servers", move |api| {
            let project_id = project_id.clone();
            Box::pin(async move { api.fetch_compute_servers(&project_id).await })
        })
        .await
    }

    async fn fetch_compute_limits(&mut self) -> ApiResult<Option<Metrics>> {
        let compute = self.compute()?;
        let url = compute.limits_url();
        if self.already_called(&url) {
            return Ok(None);
        }
        let limits = compute.get_limits(&self.http).await?;
        self.mark_called(url);
        Ok(Some(normalized_metrics(&limits, NOVA_LIMITS)))
    }

    async fn fetch_compute_services(&mut self) -> ApiResult<Option<EntityMap>> {
        let compute = self.compute()?;
        let url = compute.services_url();
        if self.already_called(&url) {
            return Ok(None);
        }
        let services = compute.get_services(&self.http).await?;
        self.collected(url, &services, service_entity)
    }

    async fn fetch_compute_flavors(&mut self) -> ApiResult<Option<EntityMap>> {
        let compute = self.compute()?;
        let url = compute.flavors_url();
        if self.already_called(&url) {
            return Ok(None);
        }
        let flavors = compute.get_flavors(&self.http).await?;
        self.collected(url, &flavors, |flavor| {
            let metrics = normalized_metrics_with(flavor, NOVA_FLAVORS, strip_namespace, swap_or_zero);
            Entity::from_object(flavor, &["name"], metrics)
        })
    }

    async fn fetch_compute_hypervisors(&mut self) -> ApiResult<Option<EntityMap>> {
        let compute = self.compute()?;
        let url = compute.hypervisors_url();
        if self.already_called(&url) {
            return Ok(None);
        }
        let hypervisors = compute.get_hypervisors(&self.http).await?;
        self.collected(url, &hypervisors, |hypervisor| {
            Entity::from_object(hypervisor, &["state", "status"], normalized_metrics(hypervisor, NOVA_HYPERVISORS))
                .with_attribute("name", attribute(hypervisor, "hypervisor_hostname"))
                .with_attribute("type", attribute(hypervisor, "hypervisor_type"))
        })
    }

    async fn fetch_compute_os_aggregates(&mut self) -> ApiResult<Option<EntityMap>> {
        let compute = self.compute()?;
        let url = compute.os_aggregates_url();
        if self.already_called(&url) {
            return Ok(None);
        }
        let aggregates = compute.get_os_aggregates(&self.http).await?;
        self.collected(url, &aggregates, |aggregate| {
            Entity::from_object(aggregate, &["name", "availability_zone", "hosts"], Metrics::new())
        })
    }

    async fn fetch_compute_quota_set(&mut self, project_id: &str) -> ApiResult<Option<EntityMap>> {
        let compute = self.compute()?;
        let url = compute.quota_set_url(project_id);
        if self.already_called(&url) {
            return Ok(None);
        }
        let quota_set = compute.get_quota_set(&self.http, project_id).await?;
        let id = entity_id(&quota_set, &url)?;
        self.mark_called(url);
        let entity = Entity::from_object(&quota_set, &[], normalized_metrics(&quota_set, NOVA_QUOTA_SETS));
        Ok(Some(EntityMap::from([(id, entity)])))
    }

    async fn fetch_compute_servers(&mut self, project_id: &str) -> ApiResult<Option<EntityMap>> {
        let compute = self.compute()?;
        let url = compute.servers_url(project_id);
        if self.already_called(&url) {
            return Ok(None);
        }
        let servers = compute.get_servers(&self.http, project_id).await?;

        let mut entities = EntityMap::new();
        for server in &servers {
            let mut entity = server_entity(server);
            if let Some(flavor) = server.get("flavor").filter(|f| f.is_object()) {
                let (flavor_name, flavor_metrics) = self.server_flavor(&compute, flavor).await?;
                debug!("server_flavor: {:?} {:?}", flavor_name, flavor_metrics);
                entity = entity.with_attribute("flavor_name", flavor_name);
                entity.metrics.extend(flavor_metrics);
            }
            entities.insert(entity_id(server, &url)?, entity);
        }
        // Only a fully enriched map counts as called, so a retry after a
        // rejected flavor lookup refetches the servers.
        self.mark_called(url);
        Ok(Some(entities))
    }

    /// Name and `openstack.nova.server.flavor.*` metrics of a server's flavor.
    ///
    /// Older microversions only embed the flavor id, so the flavor is fetched.
    /// From 2.47 on the flavor is embedded without an id and read in place.
    async fn server_flavor(&self, compute: &ComputeRest, flavor: &Value) -> ApiResult<(Value, Metrics)> {
        match flavor.get("id").and_then(Value::as_str) {
            Some(flavor_id) => {
                let detail = compute.get_flavor(&self.http, flavor_id).await?;
                let metrics = normalized_metrics_with(&detail, NOVA_SERVER_FLAVORS, strip_namespace, swap_or_zero);
                Ok((attribute(&detail, "name"), metrics))
            }
            None => {
                let metrics = normalized_metrics_with(flavor, NOVA_SERVER_FLAVORS, strip_namespace, swap_or_zero);
                Ok((attribute(flavor, "original_name"), metrics))
            }
        }
    }
}

fn attribute(object: &Value, key: &str) -> Value {
    object.get(key).cloned().unwrap_or(Value::Null)
}

/// Nova reports an unset swap as `""` or null.
fn swap_or_zero(key: &str, value: &Value) -> Value {
    if strip_namespace(key) == "swap" && (value.is_null() || value.as_str() == Some("")) {
        Value::from(0)
    } else {
        value.clone()
    }
}

fn service_entity(service: &Value) -> Entity {
    let name = service
        .get("binary")
        .and_then(Value::as_str)
        .map(|binary| Value::from(binary.replace('-', "_")))
        .unwrap_or(Value::Null);
    let metrics = normalized_metrics_with(
        service,
        NOVA_SERVICES,
        |key| if key == "state" { "up".to_string() } else { key.to_string() },
        |key, value| {
            if key == "state" {
                Value::from(u8::from(value.as_str() == Some("up")))
            } else {
                value.clone()
            }
        },
    );
    Entity::from_object(service, &["zone", "host", "status", "state"], metrics).with_attribute("name", name)
}

fn server_entity(server: &Value) -> Entity {
    let status = server
        .get("status")
        .and_then(Value::as_str)
        .map(|status| Value::from(status.to_lowercase()))
        .unwrap_or(Value::Null);
    let metrics = normalized_metrics_with(server, NOVA_SERVERS, strip_namespace, |_, value| value.clone());
    Entity::from_object(server, &["name"], metrics)
        .with_attribute("status", status)
        .with_attribute("hypervisor_hostname", attribute(server, "OS-EXT-SRV-ATTR:hypervisor_hostname"))
        .with_attribute("instance_hostname", attribute(server, "OS-EXT-SRV-ATTR:hostname"))
}
