//! Neutron and ironic queries.

use serde_json::Value;
use tracing::{debug, info};

use super::ApiRest;
use crate::error::ApiResult;
use crate::metrics::{
    entity_id, normalized_metrics, Entity, EntityMap, IRONIC_CONDUCTORS, IRONIC_NODES, NEUTRON_AGENTS,
    NEUTRON_QUOTAS,
};

impl ApiRest {
    /// Network quota of `project_id`, keyed by the project id.
    pub async fn get_network_quotas(&mut self, project_id: &str) -> ApiResult<Option<EntityMap>> {
        debug!("getting network quotas");
        let project_id = project_id.to_string();
        self.with_reauth("network quotas", move |api| {
            let project_id = project_id.clone();
            Box::pin(async move { api.fetch_network_quotas(&project_id).await })
        })
        .await
    }

    /// Neutron agents keyed by id.
    pub async fn get_network_agents(&mut self) -> ApiResult<Option<EntityMap>> {
        debug!("getting network agents");
        self.with_reauth("network agents", |api| Box::pin(api.fetch_network_agents()))
            .await
    }

    /// Ironic nodes keyed by uuid.
    pub async fn get_baremetal_nodes(&mut self) -> ApiResult<Option<EntityMap>> {
        debug!("getting baremetal nodes");
        self.with_reauth("baremetal nodes", |api| Box::pin(api.fetch_baremetal_nodes()))
            .await
    }

    /// Requires ironic microversion 1.49 or later; earlier versions yield `None`.
    pub async fn get_baremetal_conductors(&mut self) -> ApiResult<Option<EntityMap>> {
        debug!("getting baremetal conductors");
        self.with_reauth("baremetal conductors", |api| Box::pin(api.fetch_baremetal_conductors()))
            .await
    }

    async fn fetch_network_quotas(&mut self, project_id: &str) -> ApiResult<Option<EntityMap>> {
        let network = self.network()?;
        let url = network.quotas_url(project_id);
        if self.already_called(&url) {
            return Ok(None);
        }
        let quota = network.get_quotas(&self.http, project_id).await?;
        self.mark_called(url);
        let entity = Entity::from_object(&quota, &[], normalized_metrics(&quota, NEUTRON_QUOTAS));
        Ok(Some(EntityMap::from([(project_id.to_string(), entity)])))
    }

    async fn fetch_network_agents(&mut self) -> ApiResult<Option<EntityMap>> {
        let network = self.network()?;
        let url = network.agents_url();
        if self.already_called(&url) {
            return Ok(None);
        }
        let agents = network.get_agents(&self.http).await?;
        self.collected(url, &agents, |agent| {
            Entity::from_object(
                agent,
                &["host", "availability_zone", "binary", "agent_type"],
                normalized_metrics(agent, NEUTRON_AGENTS),
            )
        })
    }

    async fn fetch_baremetal_nodes(&mut self) -> ApiResult<Option<EntityMap>> {
        let baremetal = self.baremetal()?;
        let url = baremetal.nodes_url();
        if self.already_called(&url) {
            return Ok(None);
        }
        let nodes = baremetal.get_nodes(&self.http).await?;
        // Nodes are identified by `uuid`, not `id`.
        let entities = nodes
            .iter()
            .map(|node| {
                let id = match node.get("uuid") {
                    Some(Value::String(uuid)) => uuid.clone(),
                    _ => entity_id(node, &url)?,
                };
                let entity = Entity::from_object(
                    node,
                    &["name", "conductor_group", "power_state", "provision_state"],
                    normalized_metrics(node, IRONIC_NODES),
                );
                Ok((id, entity))
            })
            .collect::<ApiResult<EntityMap>>()?;
        self.mark_called(url);
        Ok(Some(entities))
    }

    async fn fetch_baremetal_conductors(&mut self) -> ApiResult<Option<EntityMap>> {
        let baremetal = self.baremetal()?;
        if !baremetal.collect_conductor_metrics() {
            info!(
                "Ironic conductors metrics are not available. \
                 Please specify an `ironic_microversion` greater than 1.49 to receive these metrics"
            );
            return Ok(None);
        }
        let url = baremetal.conductors_url();
        if self.already_called(&url) {
            return Ok(None);
        }
        let conductors = baremetal.get_conductors(&self.http).await?;
        self.mark_called(url);
        // Conductors have no id; the hostname is unique.
        let entities = conductors
            .iter()
            .filter_map(|conductor| {
                let hostname = conductor.get("hostname").and_then(Value::as_str)?;
                let entity = Entity::from_object(
                    conductor,
                    &["hostname", "conductor_group"],
                    normalized_metrics(conductor, IRONIC_CONDUCTORS),
                );
                Some((hostname.to_string(), entity))
            })
            .collect();
        Ok(Some(entities))
    }
}
