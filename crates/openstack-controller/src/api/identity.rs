use serde_json::Value;
use tracing::debug;

use super::{entities, ApiRest};
use crate::error::ApiResult;
use crate::metrics::{
    normalized_metrics, normalized_metrics_with, Entity, EntityMap, Metrics, KEYSTONE_DOMAINS, KEYSTONE_GROUPS,
    KEYSTONE_LIMITS, KEYSTONE_PROJECTS, KEYSTONE_SERVICES, KEYSTONE_USERS,
};

const LIMIT_ATTRIBUTES: &[&str] = &["resource_name", "service_id", "region_id", "domain_id", "project_id"];

impl ApiRest {
    /// Keystone domains keyed by id.
    pub async fn get_identity_domains(&mut self) -> ApiResult<Option<EntityMap>> {
        debug!("getting identity domains");
        self.with_reauth("identity domains", |api| Box::pin(api.fetch_identity_domains()))
            .await
    }

    /// Keystone projects keyed by id.
    pub async fn get_identity_projects(&mut self) -> ApiResult<Option<EntityMap>> {
        debug!("getting identity projects");
        self.with_reauth("identity projects", |api| Box::pin(api.fetch_identity_projects()))
            .await
    }

    /// Keystone users keyed by id.
    pub async fn get_identity_users(&mut self) -> ApiResult<Option<EntityMap>> {
        debug!("getting identity users");
        self.with_reauth("identity users", |api| Box::pin(api.fetch_identity_users()))
            .await
    }

    /// Keystone groups keyed by id.
    pub async fn get_identity_groups(&mut self) -> ApiResult<Option<EntityMap>> {
        debug!("getting identity groups");
        self.with_reauth("identity groups", |api| Box::pin(api.fetch_identity_groups()))
            .await
    }

    /// Members of one group. Not deduplicated: each group has its own URL.
    pub async fn get_identity_group_users(&mut self, group_id: &str) -> ApiResult<Option<EntityMap>> {
        debug!("getting identity group users");
        let group_id = group_id.to_string();
        self.with_reauth("identity group users", move |api| {
            let group_id = group_id.clone();
            Box::pin(async move { api.fetch_identity_group_users(&group_id).await })
        })
        .await
    }

    /// Services registered in keystone, keyed by id.
    pub async fn get_identity_services(&mut self) -> ApiResult<Option<EntityMap>> {
        debug!("getting identity services");
        self.with_reauth("identity services", |api| Box::pin(api.fetch_identity_services()))
            .await
    }

    /// Registered (default) limits and project/domain limits, merged into one map.
    pub async fn get_identity_limits(&mut self) -> ApiResult<Option<EntityMap>> {
        debug!("getting identity limits");
        self.with_reauth("identity limits", |api| Box::pin(api.fetch_identity_limits()))
            .await
    }

    async fn fetch_identity_domains(&mut self) -> ApiResult<Option<EntityMap>> {
        let identity = self.identity()?;
        let url = identity.domains_url();
        if self.already_called(&url) {
            return Ok(None);
        }
        let domains = identity.get_domains(&self.http).await?;
        self.collected(url, &domains, |domain| {
            Entity::from_object(domain, &["name", "tags"], normalized_metrics(domain, KEYSTONE_DOMAINS))
        })
    }

    async fn fetch_identity_projects(&mut self) -> ApiResult<Option<EntityMap>> {
        let identity = self.identity()?;
        let url = identity.projects_url();
        if self.already_called(&url) {
            return Ok(None);
        }
        let projects = identity.get_projects(&self.http).await?;
        self.collected(url, &projects, |project| {
            Entity::from_object(
                project,
                &["name", "domain_id", "tags"],
                normalized_metrics(project, KEYSTONE_PROJECTS),
            )
        })
    }

    async fn fetch_identity_users(&mut self) -> ApiResult<Option<EntityMap>> {
        let identity = self.identity()?;
        let url = identity.users_url();
        if self.already_called(&url) {
            return Ok(None);
        }
        let users = identity.get_users(&self.http).await?;
        self.collected(url, &users, |user| {
            Entity::from_object(user, &["name", "domain_id"], normalized_metrics(user, KEYSTONE_USERS))
        })
    }

    async fn fetch_identity_groups(&mut self) -> ApiResult<Option<EntityMap>> {
        let identity = self.identity()?;
        let url = identity.groups_url();
        if self.already_called(&url) {
            return Ok(None);
        }
        let groups = identity.get_groups(&self.http).await?;
        self.collected(url, &groups, |group| {
            Entity::from_object(group, &["name", "domain_id"], normalized_metrics(group, KEYSTONE_GROUPS))
        })
    }

    async fn fetch_identity_group_users(&mut self, group_id: &str) -> ApiResult<Option<EntityMap>> {
        let identity = self.identity()?;
        let url = identity.group_users_url(group_id);
        debug!("group_users_endpoint: {}", url);
        let users = identity.get_group_users(&self.http, group_id).await?;
        self.collected(url, &users, |user| Entity::from_object(user, &["name"], Metrics::new()))
    }

    async fn fetch_identity_services(&mut self) -> ApiResult<Option<EntityMap>> {
        let identity = self.identity()?;
        let url = identity.services_url();
        if self.already_called(&url) {
            return Ok(None);
        }
        let services = identity.get_services(&self.http).await?;
        self.collected(url, &services, |service| {
            Entity::from_object(service, &["name", "type"], normalized_metrics(service, KEYSTONE_SERVICES))
        })
    }

    async fn fetch_identity_limits(&mut self) -> ApiResult<Option<EntityMap>> {
        let identity = self.identity()?;
        let registered_url = identity.registered_limits_url();
        let limits_url = identity.limits_url();

        // Both collections are fetched and mapped before either URL is marked,
        // so a retry after a rejected second request starts from scratch.
        let registered = if self.already_called(&registered_url) {
            None
        } else {
            let items = identity.get_registered_limits(&self.http).await?;
            Some(entities(&items, &registered_url, |limit| limit_entity(limit, "default_limit"))?)
        };
        let project_limits = if self.already_called(&limits_url) {
            None
        } else {
            let items = identity.get_limits(&self.http).await?;
            Some(entities(&items, &limits_url, |limit| limit_entity(limit, "resource_limit"))?)
        };

        if registered.is_some() {
            self.mark_called(registered_url);
        }
        if project_limits.is_some() {
            self.mark_called(limits_url);
        }
        Ok(match (registered, project_limits) {
            (None, None) => None,
            (registered, project_limits) => {
                let mut limits = registered.unwrap_or_default();
                limits.extend(project_limits.unwrap_or_default());
                Some(limits)
            }
        })
    }
}

/// Both limit kinds report their value as `limit`, whatever the source field is called.
fn limit_entity(limit: &Value, value_field: &'static str) -> Entity {
    let metrics = normalized_metrics_with(
        limit,
        KEYSTONE_LIMITS,
        |key| if key == value_field { "limit".to_string() } else { key.to_string() },
        |_, value| value.clone(),
    );
    Entity::from_object(limit, LIMIT_ATTRIBUTES, metrics)
}
