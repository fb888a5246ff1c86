//! OpenStack API facade.
//!
//! [`ApiRest`] owns everything one check run needs: the HTTP client and its bearer
//! token, the service catalog with its memoized endpoint resolutions, the lazily
//! built sub-clients, and the set of URLs already polled during the run.
//!
//! Every resource query goes through [`ApiRest::with_reauth`], which re-authorizes
//! once on a 401/403 and retries the query exactly once.

mod compute;
mod identity;
mod load_balancer;
mod network;
mod retry;

use serde_json::Value;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::catalog::{Catalog, EndpointResolver};
use crate::component::ComponentType;
use crate::components::{
    BaremetalRest, BlockStorageRest, Component, ComputeRest, IdentityRest, LoadBalancerRest, NetworkRest,
};
use crate::config::CheckConfig;
use crate::error::{ApiError, ApiResult};
use crate::http::HttpClient;
use crate::metrics::{entity_id, Entity, EntityMap};
use crate::session::{AuthRequest, AuthState, TokenResponse};

pub use retry::ReauthFuture;

/// URLs already fetched during the current run, in the order they were fetched.
#[derive(Debug, Default, Clone)]
pub struct CalledEndpoints {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl CalledEndpoints {
    /// True if `url` was already fetched this run.
    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Records `url`; false if it was already present.
    pub fn insert(&mut self, url: String) -> bool {
        if self.seen.insert(url.clone()) {
            self.order.push(url);
            true
        } else {
            false
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Fetched URLs in fetch order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

/// Auth project visible to the configured user.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AuthProject {
    /// Keystone project id.
    pub id: String,
    /// Project name, empty when keystone omits it.
    pub name: String,
}

/// Facade over every OpenStack API polled by the check.
///
/// One instance serves one run and is not shared across threads.
pub struct ApiRest {
    config: CheckConfig,
    http: HttpClient,
    resolver: EndpointResolver,
    components: HashMap<ComponentType, Component>,
    called_endpoints: CalledEndpoints,
    current_project_id: Option<String>,
    state: AuthState,
    authorizations: u32,
}

impl ApiRest {
    /// Validates `config` and builds an unauthenticated facade.
    pub fn new(config: CheckConfig) -> ApiResult<Self> {
        let config = config.validate()?;
        let http = HttpClient::new(&config)?;
        let resolver = EndpointResolver::new(config.interface());
        Ok(Self {
            config,
            http,
            resolver,
            components: HashMap::new(),
            called_endpoints: CalledEndpoints::default(),
            current_project_id: None,
            state: AuthState::Unauthenticated,
            authorizations: 0,
        })
    }

    /// The validated configuration.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Whether the last `authorize()` succeeded.
    pub fn auth_state(&self) -> AuthState {
        self.state
    }

    /// Successful `authorize()` calls so far.
    pub fn authorization_count(&self) -> u32 {
        self.authorizations
    }

    /// Catalog installed by the last successful `authorize()`.
    pub fn catalog(&self) -> &Catalog {
        self.resolver.catalog()
    }

    /// URLs fetched so far this run.
    pub fn called_endpoints(&self) -> &CalledEndpoints {
        &self.called_endpoints
    }

    /// Sub-clients built since the last `authorize()`.
    pub fn cached_component_count(&self) -> usize {
        self.components.len()
    }

    /// Endpoints resolved since the last `authorize()`.
    pub fn cached_endpoint_count(&self) -> usize {
        self.resolver.cached_len()
    }

    /// Project the next `authorize()` scopes to.
    pub fn current_project(&self) -> Option<&str> {
        self.current_project_id.as_deref()
    }

    /// Scope for the next `authorize()`; takes effect only once re-authorized.
    pub fn set_current_project(&mut self, project_id: Option<String>) {
        self.current_project_id = project_id;
    }

    /// True if the catalog lists `component` under any interface.
    pub fn component_in_catalog(&self, component: ComponentType) -> bool {
        self.resolver.catalog().contains(component)
    }

    /// Requests a new token and catalog.
    ///
    /// The catalog and both caches are dropped before the request goes out, so
    /// nothing resolved under the previous token survives a failed attempt.
    pub async fn authorize(&mut self) -> ApiResult<()> {
        self.resolver.clear();
        self.components.clear();
        self.http.clear_auth_token();
        self.state = AuthState::Unauthenticated;

        let url = format!("{}/v3/auth/tokens", self.config.keystone_server_url);
        let body = AuthRequest::password(
            &self.config.username,
            &self.config.password,
            &self.config.domain_id,
            self.current_project_id.as_deref(),
        );
        debug!("auth_tokens_endpoint: {}", url);
        debug!("scope: {:?}", body.scope());

        let response = self.http.post_json(&url, &body).await?;
        let token = response.subject_token.clone().ok_or(ApiError::MissingSubjectToken)?;
        let parsed: TokenResponse = serde_json::from_value(response.body).map_err(|e| ApiError::Decode {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        debug!("catalog has {} entries", parsed.token.catalog.len());
        self.resolver.replace_catalog(parsed.token.catalog);
        self.http.set_auth_token(token);
        self.state = AuthState::Authenticated;
        self.authorizations += 1;
        Ok(())
    }

    /// Base URL of `component` under the configured interface.
    pub fn endpoint(&mut self, component: ComponentType) -> ApiResult<String> {
        self.resolver.resolve(component)
    }

    /// Round-trip time of the component's API root in milliseconds, or `None` if
    /// that root was already timed this run.
    ///
    /// Not wrapped by the re-authorization policy: failures reach the caller, which
    /// turns them into a service check status.
    pub async fn get_response_time(&mut self, component: ComponentType) -> ApiResult<Option<f64>> {
        let endpoint = self.endpoint(component)?;
        debug!("{} endpoint: {}", component, endpoint);
        if self.already_called(&endpoint) {
            return Ok(None);
        }
        let response = self.http.get(&endpoint).await?;
        self.mark_called(endpoint);
        Ok(Some(response.elapsed_ms()))
    }

    /// Like [`ApiRest::get_response_time`], probing the cinder root without the project suffix.
    pub async fn get_block_storage_response_time(&mut self) -> ApiResult<Option<f64>> {
        debug!("getting block-storage response time");
        let block_storage = self.block_storage()?;
        let url = block_storage.response_time_url();
        if self.already_called(&url) {
            return Ok(None);
        }
        let elapsed = block_storage.get_response_time(&self.http).await?;
        self.mark_called(url);
        Ok(Some(elapsed))
    }

    /// Projects the configured user may scope a token to.
    pub async fn get_auth_projects(&mut self) -> ApiResult<Option<Vec<AuthProject>>> {
        debug!("getting auth projects");
        self.with_reauth("auth projects", |api| Box::pin(api.fetch_auth_projects()))
            .await
    }

    async fn fetch_auth_projects(&mut self) -> ApiResult<Option<Vec<AuthProject>>> {
        let url = format!("{}/v3/auth/projects", self.config.keystone_server_url);
        debug!("auth_projects_endpoint: {}", url);
        let response = self.http.get(&url).await?;
        let projects = response
            .array("projects")?
            .iter()
            .map(|project| {
                Ok(AuthProject {
                    id: entity_id(project, &url)?,
                    name: project
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                })
            })
            .collect::<ApiResult<Vec<_>>>()?;
        Ok(Some(projects))
    }

    fn component(&mut self, component: ComponentType) -> ApiResult<&Component> {
        match self.components.entry(component) {
            Entry::Occupied(entry) => {
                debug!("cached component of type {}", component);
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let endpoint = self.resolver.resolve(component)?;
                let built = entry.insert(Component::build(component, endpoint, &self.config));
                debug!("built {} sub-client at {}", built.component_type(), built.endpoint());
                Ok(built)
            }
        }
    }

    fn identity(&mut self) -> ApiResult<IdentityRest> {
        match self.component(ComponentType::Identity)? {
            Component::Identity(c) => Ok(c.clone()),
            _ => Err(mismatch(ComponentType::Identity)),
        }
    }

    fn compute(&mut self) -> ApiResult<ComputeRest> {
        match self.component(ComponentType::Compute)? {
            Component::Compute(c) => Ok(c.clone()),
            _ => Err(mismatch(ComponentType::Compute)),
        }
    }

    fn network(&mut self) -> ApiResult<NetworkRest> {
        match self.component(ComponentType::Network)? {
            Component::Network(c) => Ok(c.clone()),
            _ => Err(mismatch(ComponentType::Network)),
        }
    }

    fn block_storage(&mut self) -> ApiResult<BlockStorageRest> {
        match self.component(ComponentType::BlockStorage)? {
            Component::BlockStorage(c) => Ok(c.clone()),
            _ => Err(mismatch(ComponentType::BlockStorage)),
        }
    }

    fn baremetal(&mut self) -> ApiResult<BaremetalRest> {
        match self.component(ComponentType::Baremetal)? {
            Component::Baremetal(c) => Ok(c.clone()),
            _ => Err(mismatch(ComponentType::Baremetal)),
        }
    }

    fn load_balancer(&mut self) -> ApiResult<LoadBalancerRest> {
        match self.component(ComponentType::LoadBalancer)? {
            Component::LoadBalancer(c) => Ok(c.clone()),
            _ => Err(mismatch(ComponentType::LoadBalancer)),
        }
    }

    fn already_called(&self, url: &str) -> bool {
        if self.called_endpoints.contains(url) {
            debug!("{} already called", url);
            true
        } else {
            debug!("endpoint: {}", url);
            false
        }
    }

    fn mark_called(&mut self, url: String) {
        self.called_endpoints.insert(url);
    }

    /// Marks `url` as fetched and maps its items into entities.
    fn collected<F>(&mut self, url: String, items: &[Value], to_entity: F) -> ApiResult<Option<EntityMap>>
    where
        F: Fn(&Value) -> Entity,
    {
        let map = entities(items, &url, to_entity)?;
        self.mark_called(url);
        Ok(Some(map))
    }
}

fn mismatch(component: ComponentType) -> ApiError {
    info!("cached sub-client for {} has the wrong kind", component);
    ApiError::ComponentNotFound { component }
}

/// Keys each item by its `id` and maps it into an [`Entity`].
pub(crate) fn entities<F>(items: &[Value], url: &str, to_entity: F) -> ApiResult<EntityMap>
where
    F: Fn(&Value) -> Entity,
{
    items
        .iter()
        .map(|item| Ok((entity_id(item, url)?, to_entity(item))))
        .collect()
}
