//! Facade behavior against a mock OpenStack deployment: authorization,
//! endpoint resolution, re-authorization, and per-run deduplication.

mod common;

use common::{all_components, route, OpenStack, PROJECT_ID, TOKEN};
use openstack_controller::{ApiError, ApiRest, AuthState, CheckConfig, ComponentType};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn domains_body() -> serde_json::Value {
    json!({"domains": [
        {"id": "default", "name": "Default", "enabled": true, "tags": []},
        {"id": "03e40b01788d403e98e4b9a20210492e", "name": "New domain", "enabled": false, "tags": ["prod"]}
    ]})
}

async fn authorized(config: CheckConfig) -> ApiRest {
    let mut api = ApiRest::new(config).unwrap();
    api.authorize().await.unwrap();
    api
}

#[tokio::test]
async fn test_authorize_installs_catalog_and_token() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    Mock::given(method("GET"))
        .and(path("/identity/v3/domains"))
        .and(header("X-Auth-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(domains_body()))
        .expect(1)
        .mount(&openstack.server)
        .await;

    let mut api = authorized(openstack.config()).await;
    assert_eq!(api.auth_state(), AuthState::Authenticated);
    assert_eq!(api.catalog().len(), 6);
    assert!(api.component_in_catalog(ComponentType::LoadBalancer));

    let domains = api.get_identity_domains().await.unwrap().unwrap();
    assert_eq!(domains.len(), 2);
    assert_eq!(domains["default"].attribute_str("name"), Some("Default"));
    assert_eq!(
        domains["03e40b01788d403e98e4b9a20210492e"]
            .metrics
            .get("openstack.keystone.domains.enabled"),
        Some(&0.0)
    );
}

#[tokio::test]
async fn test_authorize_sends_unscoped_password_grant() {
    let openstack = OpenStack::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .and(body_partial_json(json!({
            "auth": {
                "identity": {"methods": ["password"], "password": {"user": {"name": "admin", "domain": {"id": "default"}}}},
                "scope": "unscoped"
            }
        })))
        .respond_with(openstack.token_response(TOKEN, &all_components()))
        .expect(1)
        .mount(&openstack.server)
        .await;

    let mut api = ApiRest::new(openstack.config()).unwrap();
    api.authorize().await.unwrap();
}

#[tokio::test]
async fn test_authorize_scoped_to_current_project() {
    let openstack = OpenStack::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .and(body_partial_json(json!({"auth": {"scope": {"project": {"id": PROJECT_ID}}}})))
        .respond_with(openstack.token_response(TOKEN, &all_components()))
        .expect(1)
        .mount(&openstack.server)
        .await;

    let mut api = ApiRest::new(openstack.config()).unwrap();
    api.set_current_project(Some(PROJECT_ID.to_string()));
    api.authorize().await.unwrap();
}

#[tokio::test]
async fn test_authorize_failure_propagates() {
    let openstack = OpenStack::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&openstack.server)
        .await;

    let mut api = ApiRest::new(openstack.config()).unwrap();
    let err = api.authorize().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(api.auth_state(), AuthState::Unauthenticated);
    assert!(api.catalog().is_empty());
}

#[tokio::test]
async fn test_authorize_without_subject_token_fails() {
    let openstack = OpenStack::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"token": {"catalog": []}})))
        .mount(&openstack.server)
        .await;

    let mut api = ApiRest::new(openstack.config()).unwrap();
    assert!(matches!(api.authorize().await, Err(ApiError::MissingSubjectToken)));
}

#[tokio::test]
async fn test_failed_authorize_clears_previous_resolutions() {
    let openstack = OpenStack::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .respond_with(openstack.token_response(TOKEN, &all_components()))
        .up_to_n_times(1)
        .mount(&openstack.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&openstack.server)
        .await;

    let mut api = authorized(openstack.config()).await;
    assert!(api.endpoint(ComponentType::Compute).is_ok());
    assert_eq!(api.cached_endpoint_count(), 1);

    assert!(api.authorize().await.is_err());
    assert_eq!(api.cached_endpoint_count(), 0);
    assert_eq!(api.cached_component_count(), 0);
    assert!(api.catalog().is_empty());

    let err = api.get_compute_flavors().await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::ComponentNotFound {
            component: ComponentType::Compute
        }
    ));
    assert_eq!(openstack.hits(&route(ComponentType::Compute, "/flavors/detail")).await, 0);
}

#[tokio::test]
async fn test_same_endpoint_fetched_once_per_run() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack.mount_json("/identity/v3/domains", domains_body()).await;

    let mut api = authorized(openstack.config()).await;
    assert!(api.get_identity_domains().await.unwrap().is_some());
    assert!(api.get_identity_domains().await.unwrap().is_none());

    assert_eq!(openstack.hits("/identity/v3/domains").await, 1);
    assert_eq!(api.called_endpoints().len(), 1);
}

#[tokio::test]
async fn test_distinct_endpoints_fetched_separately() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack.mount_json("/identity/v3/domains", domains_body()).await;
    openstack
        .mount_json(
            "/identity/v3/projects",
            json!({"projects": [{"id": PROJECT_ID, "name": "admin", "domain_id": "default", "enabled": true, "tags": []}]}),
        )
        .await;

    let mut api = authorized(openstack.config()).await;
    api.get_identity_domains().await.unwrap();
    let projects = api.get_identity_projects().await.unwrap().unwrap();

    assert_eq!(projects[PROJECT_ID].attribute_str("domain_id"), Some("default"));
    assert_eq!(openstack.hits("/identity/v3/domains").await, 1);
    assert_eq!(openstack.hits("/identity/v3/projects").await, 1);
    let called: Vec<&str> = api.called_endpoints().iter().collect();
    assert!(called[0].ends_with("/identity/v3/domains"));
    assert!(called[1].ends_with("/identity/v3/projects"));
}

#[tokio::test]
async fn test_empty_collection_is_empty_map() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack.mount_json("/identity/v3/domains", json!({"domains": []})).await;

    let mut api = authorized(openstack.config()).await;
    let domains = api.get_identity_domains().await.unwrap();
    assert_eq!(domains.map(|d| d.len()), Some(0));
}

#[tokio::test]
async fn test_unauthorized_reauthorizes_and_retries_once() {
    let openstack = OpenStack::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .respond_with(openstack.token_response("token-1", &all_components()))
        .up_to_n_times(1)
        .mount(&openstack.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .respond_with(openstack.token_response("token-2", &all_components()))
        .mount(&openstack.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/identity/v3/domains"))
        .and(header("X-Auth-Token", "token-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&openstack.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/identity/v3/domains"))
        .and(header("X-Auth-Token", "token-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(domains_body()))
        .expect(1)
        .mount(&openstack.server)
        .await;

    let mut api = authorized(openstack.config()).await;
    // Build the identity sub-client under the first token.
    assert!(api.endpoint(ComponentType::Identity).is_ok());

    let domains = api.get_identity_domains().await.unwrap().unwrap();
    assert_eq!(domains.len(), 2);
    assert_eq!(openstack.auth_hits().await, 2);
    assert_eq!(api.authorization_count(), 2);
    assert_eq!(api.auth_state(), AuthState::Authenticated);
}

#[tokio::test]
async fn test_servers_survive_rejected_flavor_lookup() {
    let openstack = OpenStack::start().await;
    openstack.mount_rotating_auth(&all_components()).await;
    openstack
        .mount_json(
            &route(ComponentType::Compute, "/servers/detail"),
            json!({"servers": [{"id": "2c653a68", "name": "server-a", "status": "ACTIVE", "flavor": {"id": "1"}}]}),
        )
        .await;
    openstack
        .mount_expiring_json(
            &route(ComponentType::Compute, "/flavors/1"),
            json!({"flavor": {"id": "1", "name": "m1.tiny", "vcpus": 1, "ram": 512, "disk": 1}}),
        )
        .await;

    let mut api = authorized(openstack.config()).await;
    let servers = api.get_compute_servers(PROJECT_ID).await.unwrap().unwrap();

    let server = &servers["2c653a68"];
    assert_eq!(server.attribute_str("flavor_name"), Some("m1.tiny"));
    assert_eq!(server.metrics.get("openstack.nova.server.flavor.ram"), Some(&512.0));
    assert_eq!(openstack.auth_hits().await, 2);
    assert_eq!(openstack.hits(&route(ComponentType::Compute, "/servers/detail")).await, 2);

    // The enriched result counts as fetched.
    assert!(api.get_compute_servers(PROJECT_ID).await.unwrap().is_none());
    assert_eq!(openstack.hits(&route(ComponentType::Compute, "/servers/detail")).await, 2);
}

#[tokio::test]
async fn test_identity_limits_survive_rejected_project_limits() {
    let openstack = OpenStack::start().await;
    openstack.mount_rotating_auth(&all_components()).await;
    openstack
        .mount_json(
            "/identity/v3/registered_limits",
            json!({"registered_limits": [{"id": "r1", "resource_name": "image_size_total", "default_limit": 1000}]}),
        )
        .await;
    openstack
        .mount_expiring_json(
            "/identity/v3/limits",
            json!({"limits": [{"id": "l1", "project_id": PROJECT_ID, "resource_name": "image_size_total", "resource_limit": 5}]}),
        )
        .await;

    let mut api = authorized(openstack.config()).await;
    let limits = api.get_identity_limits().await.unwrap().unwrap();

    let mut keys: Vec<&str> = limits.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["l1", "r1"]);
    assert_eq!(limits["r1"].metrics.get("openstack.keystone.limits.limit"), Some(&1000.0));
    assert_eq!(openstack.hits("/identity/v3/registered_limits").await, 2);
    assert_eq!(openstack.auth_hits().await, 2);

    assert!(api.get_identity_limits().await.unwrap().is_none());
}

#[tokio::test]
async fn test_undecodable_servers_are_fetched_again() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack
        .mount_json(
            &route(ComponentType::Compute, "/servers/detail"),
            json!({"servers": [{"name": "no-id"}]}),
        )
        .await;

    let mut api = authorized(openstack.config()).await;
    assert!(matches!(
        api.get_compute_servers(PROJECT_ID).await,
        Err(ApiError::Decode { .. })
    ));
    assert!(api.get_compute_servers(PROJECT_ID).await.is_err());
    assert_eq!(openstack.hits(&route(ComponentType::Compute, "/servers/detail")).await, 2);
}

#[tokio::test]
async fn test_forbidden_twice_yields_no_data() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack
        .mount_get("/identity/v3/users", ResponseTemplate::new(403))
        .await;

    let mut api = authorized(openstack.config()).await;
    let users = api.get_identity_users().await.unwrap();

    assert!(users.is_none());
    assert_eq!(openstack.hits("/identity/v3/users").await, 2);
    assert_eq!(openstack.auth_hits().await, 2);
}

#[tokio::test]
async fn test_reauthorization_failure_propagates() {
    let openstack = OpenStack::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .respond_with(openstack.token_response(TOKEN, &all_components()))
        .up_to_n_times(1)
        .mount(&openstack.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&openstack.server)
        .await;
    openstack
        .mount_get("/identity/v3/groups", ResponseTemplate::new(401))
        .await;

    let mut api = authorized(openstack.config()).await;
    let err = api.get_identity_groups().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(openstack.hits("/identity/v3/groups").await, 1);
}

#[tokio::test]
async fn test_server_error_does_not_reauthorize() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack
        .mount_get("/identity/v3/services", ResponseTemplate::new(500))
        .await;

    let mut api = authorized(openstack.config()).await;
    assert!(api.get_identity_services().await.unwrap().is_none());
    assert_eq!(openstack.auth_hits().await, 1);
    assert_eq!(openstack.hits("/identity/v3/services").await, 1);
    // Failed fetches are not recorded, so a later call tries again.
    assert!(api.called_endpoints().is_empty());
}

#[tokio::test]
async fn test_malformed_body_propagates() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack
        .mount_get("/identity/v3/services", ResponseTemplate::new(200).set_body_string("not json"))
        .await;

    let mut api = authorized(openstack.config()).await;
    assert!(matches!(
        api.get_identity_services().await,
        Err(ApiError::Decode { .. })
    ));
}

#[tokio::test]
async fn test_missing_identity_component() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&[ComponentType::Compute]).await;
    openstack.mount_json("/identity/v3/domains", domains_body()).await;

    let mut api = authorized(openstack.config()).await;
    let err = api.get_identity_domains().await.unwrap_err();

    assert!(matches!(
        err,
        ApiError::ComponentNotFound {
            component: ComponentType::Identity
        }
    ));
    assert_eq!(err.to_string(), "`identity` component not found in catalog");
    assert_eq!(openstack.hits("/identity/v3/domains").await, 0);
}

#[tokio::test]
async fn test_internal_interface_preference() {
    let openstack = OpenStack::start().await;
    let catalog = json!([{
        "type": "compute",
        "endpoints": [
            {"interface": "public", "url": "http://public.example/compute/v2.1"},
            {"interface": "internal", "url": format!("{}/compute/v2.1", openstack.server.uri())}
        ]
    }]);
    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("X-Subject-Token", TOKEN)
                .set_body_json(json!({"token": {"catalog": catalog}})),
        )
        .mount(&openstack.server)
        .await;

    let config = CheckConfig {
        use_internal_endpoints: true,
        ..openstack.config()
    };
    let mut api = authorized(config).await;
    assert_eq!(
        api.endpoint(ComponentType::Compute).unwrap(),
        format!("{}/compute/v2.1", openstack.server.uri())
    );
}

#[tokio::test]
async fn test_response_time_of_api_root() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    // Keystone answers its root with 300 Multiple Choices.
    openstack
        .mount_get(
            "/identity",
            ResponseTemplate::new(300).set_body_json(json!({"versions": {"values": []}})),
        )
        .await;

    let mut api = authorized(openstack.config()).await;
    let elapsed = api.get_response_time(ComponentType::Identity).await.unwrap();
    assert!(elapsed.is_some_and(|ms| ms >= 0.0));
    assert!(api.get_response_time(ComponentType::Identity).await.unwrap().is_none());
    assert_eq!(openstack.hits("/identity").await, 1);
}

#[tokio::test]
async fn test_response_time_failure_is_not_absorbed() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack.mount_get("/networking", ResponseTemplate::new(503)).await;

    let mut api = authorized(openstack.config()).await;
    let err = api.get_response_time(ComponentType::Network).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(openstack.auth_hits().await, 1);
}

#[tokio::test]
async fn test_block_storage_response_time_drops_project() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack
        .mount_json("/volume/v3", json!({"versions": [{"id": "v3.0", "status": "CURRENT"}]}))
        .await;

    let mut api = authorized(openstack.config()).await;
    assert!(api.get_block_storage_response_time().await.unwrap().is_some());
    assert!(api.get_block_storage_response_time().await.unwrap().is_none());
    assert_eq!(openstack.hits("/volume/v3").await, 1);
}

#[tokio::test]
async fn test_microversion_headers_sent() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    Mock::given(method("GET"))
        .and(path(route(ComponentType::Compute, "/flavors/detail")))
        .and(header("X-OpenStack-Nova-API-Version", "2.93"))
        .and(header("X-OpenStack-Ironic-API-Version", "1.80"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"flavors": [
            {"id": "1", "name": "m1.tiny", "ram": 512, "disk": 1, "swap": "", "OS-FLV-EXT-DATA:ephemeral": 0, "vcpus": 1, "rxtx_factor": 1.0}
        ]})))
        .expect(1)
        .mount(&openstack.server)
        .await;

    let config = CheckConfig {
        nova_microversion: Some("2.93".to_string()),
        ironic_microversion: Some("1.80".to_string()),
        ..openstack.config()
    };
    let mut api = authorized(config).await;
    let flavors = api.get_compute_flavors().await.unwrap().unwrap();
    assert_eq!(flavors["1"].metrics.get("openstack.nova.flavor.swap"), Some(&0.0));
    assert_eq!(flavors["1"].metrics.get("openstack.nova.flavor.ephemeral"), Some(&0.0));
}

#[tokio::test]
async fn test_identity_limits_merged() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack
        .mount_json(
            "/identity/v3/registered_limits",
            json!({"registered_limits": [{
                "id": "9f489d63900841f3902cf2b8c5d4e0d2",
                "service_id": "9408080f1970482aa0e38bc2d4ea34b7",
                "region_id": "RegionOne",
                "resource_name": "image_size_total",
                "default_limit": 1000
            }]}),
        )
        .await;
    openstack
        .mount_json(
            "/identity/v3/limits",
            json!({"limits": [{
                "id": "25a04c7a065c430590881c646cdcdd58",
                "service_id": "9408080f1970482aa0e38bc2d4ea34b7",
                "project_id": PROJECT_ID,
                "resource_name": "image_size_total",
                "resource_limit": 5
            }]}),
        )
        .await;

    let mut api = authorized(openstack.config()).await;
    let limits = api.get_identity_limits().await.unwrap().unwrap();

    assert_eq!(limits.len(), 2);
    assert_eq!(
        limits["9f489d63900841f3902cf2b8c5d4e0d2"]
            .metrics
            .get("openstack.keystone.limits.limit"),
        Some(&1000.0)
    );
    let project_limit = &limits["25a04c7a065c430590881c646cdcdd58"];
    assert_eq!(project_limit.metrics.get("openstack.keystone.limits.limit"), Some(&5.0));
    assert_eq!(project_limit.attribute_str("project_id"), Some(PROJECT_ID));
}

#[tokio::test]
async fn test_group_users() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack
        .mount_json(
            "/identity/v3/groups/89b36a4c32c44b0ea8856b6357f101ea/users",
            json!({"users": [{"id": "e3f5b1d6", "name": "demo", "domain_id": "default"}]}),
        )
        .await;

    let mut api = authorized(openstack.config()).await;
    let users = api
        .get_identity_group_users("89b36a4c32c44b0ea8856b6357f101ea")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(users["e3f5b1d6"].attribute_str("name"), Some("demo"));
}

#[tokio::test]
async fn test_compute_services_and_limits() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack
        .mount_json(
            &route(ComponentType::Compute, "/os-services"),
            json!({"services": [
                {"id": "s1", "binary": "nova-conductor", "host": "ctl", "zone": "internal", "status": "enabled", "state": "up"},
                {"id": "s2", "binary": "nova-compute", "host": "cmp", "zone": "nova", "status": "enabled", "state": "down"}
            ]}),
        )
        .await;
    openstack
        .mount_json(
            &route(ComponentType::Compute, "/limits"),
            json!({"limits": {"rate": [], "absolute": {"maxTotalCores": 20, "totalCoresUsed": 3, "maxTotalRAMSize": 51200}}}),
        )
        .await;

    let mut api = authorized(openstack.config()).await;
    let services = api.get_compute_services().await.unwrap().unwrap();
    assert_eq!(services["s1"].attribute_str("name"), Some("nova_conductor"));
    assert_eq!(services["s2"].metrics.get("openstack.nova.service.up"), Some(&0.0));

    let limits = api.get_compute_limits().await.unwrap().unwrap();
    assert_eq!(limits.get("openstack.nova.limits.absolute.max_total_cores"), Some(&20.0));
    assert_eq!(limits.get("openstack.nova.limits.absolute.max_total_ram_size"), Some(&51200.0));
}

#[tokio::test]
async fn test_compute_quota_set_keyed_by_id() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack
        .mount_json(
            &route(ComponentType::Compute, &format!("/os-quota-sets/{}", PROJECT_ID)),
            json!({"quota_set": {"id": PROJECT_ID, "cores": 20, "instances": 10, "ram": 51200}}),
        )
        .await;

    let mut api = authorized(openstack.config()).await;
    let quota_sets = api.get_compute_quota_set(PROJECT_ID).await.unwrap().unwrap();
    assert_eq!(
        quota_sets[PROJECT_ID].metrics.get("openstack.nova.quota_set.cores"),
        Some(&20.0)
    );
}

#[tokio::test]
async fn test_compute_servers_with_flavors() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    Mock::given(method("GET"))
        .and(path(route(ComponentType::Compute, "/servers/detail")))
        .and(query_param("project_id", PROJECT_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"servers": [
            {
                "id": "2c653a68",
                "name": "server-a",
                "status": "ACTIVE",
                "OS-EXT-STS:power_state": 1,
                "OS-EXT-SRV-ATTR:hypervisor_hostname": "cmp",
                "flavor": {"id": "1"}
            },
            {
                "id": "5102fbbf",
                "name": "server-b",
                "status": "SHUTOFF",
                "OS-EXT-STS:power_state": 4,
                "flavor": {"original_name": "m1.small", "vcpus": 1, "ram": 2048, "disk": 20, "ephemeral": 0, "swap": 0}
            }
        ]})))
        .mount(&openstack.server)
        .await;
    openstack
        .mount_json(
            &route(ComponentType::Compute, "/flavors/1"),
            json!({"flavor": {"id": "1", "name": "m1.tiny", "vcpus": 1, "ram": 512, "disk": 1, "swap": "", "OS-FLV-EXT-DATA:ephemeral": 0}}),
        )
        .await;

    let mut api = authorized(openstack.config()).await;
    let servers = api.get_compute_servers(PROJECT_ID).await.unwrap().unwrap();

    let a = &servers["2c653a68"];
    assert_eq!(a.attribute_str("status"), Some("active"));
    assert_eq!(a.attribute_str("flavor_name"), Some("m1.tiny"));
    assert_eq!(a.metrics.get("openstack.nova.server.power_state"), Some(&1.0));
    assert_eq!(a.metrics.get("openstack.nova.server.flavor.ram"), Some(&512.0));
    assert_eq!(a.metrics.get("openstack.nova.server.flavor.swap"), Some(&0.0));

    let b = &servers["5102fbbf"];
    assert_eq!(b.attribute_str("flavor_name"), Some("m1.small"));
    assert_eq!(b.metrics.get("openstack.nova.server.power_state"), Some(&4.0));
    assert_eq!(b.metrics.get("openstack.nova.server.flavor.ram"), Some(&2048.0));
}

#[tokio::test]
async fn test_compute_hypervisors_and_aggregates() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    Mock::given(method("GET"))
        .and(path(route(ComponentType::Compute, "/os-hypervisors/detail")))
        .and(query_param("with_servers", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hypervisors": [{
            "id": "h1",
            "hypervisor_hostname": "cmp",
            "hypervisor_type": "QEMU",
            "state": "up",
            "status": "enabled",
            "vcpus": 8,
            "vcpus_used": 2,
            "memory_mb": 16000
        }]})))
        .mount(&openstack.server)
        .await;
    openstack
        .mount_json(
            &route(ComponentType::Compute, "/os-aggregates"),
            json!({"aggregates": [{"id": 1, "name": "agg", "availability_zone": "nova", "hosts": ["cmp"]}]}),
        )
        .await;

    let mut api = authorized(openstack.config()).await;
    let hypervisors = api.get_compute_hypervisors().await.unwrap().unwrap();
    assert_eq!(hypervisors["h1"].attribute_str("name"), Some("cmp"));
    assert_eq!(hypervisors["h1"].attribute_str("type"), Some("QEMU"));
    assert_eq!(hypervisors["h1"].metrics.get("openstack.nova.hypervisor.vcpus_used"), Some(&2.0));

    let aggregates = api.get_compute_os_aggregates().await.unwrap().unwrap();
    assert_eq!(aggregates["1"].attribute_str("availability_zone"), Some("nova"));
}

#[tokio::test]
async fn test_network_quotas_and_agents() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack
        .mount_json(
            &route(ComponentType::Network, &format!("/v2.0/quotas/{}", PROJECT_ID)),
            json!({"quota": {"network": 100, "port": 500, "router": 10}}),
        )
        .await;
    openstack
        .mount_json(
            &route(ComponentType::Network, "/v2.0/agents"),
            json!({"agents": [{"id": "a1", "agent_type": "DHCP agent", "host": "ctl", "admin_state_up": true, "alive": true}]}),
        )
        .await;

    let mut api = authorized(openstack.config()).await;
    let quotas = api.get_network_quotas(PROJECT_ID).await.unwrap().unwrap();
    assert_eq!(quotas[PROJECT_ID].metrics.get("openstack.neutron.quotas.port"), Some(&500.0));

    let agents = api.get_network_agents().await.unwrap().unwrap();
    assert_eq!(agents["a1"].metrics.get("openstack.neutron.agents.alive"), Some(&1.0));
}

#[tokio::test]
async fn test_baremetal_conductors_need_microversion() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack
        .mount_json(
            &route(ComponentType::Baremetal, "/v1/conductors"),
            json!({"conductors": [{"hostname": "ctl", "conductor_group": "", "alive": true}]}),
        )
        .await;

    let mut api = authorized(openstack.config()).await;
    assert!(api.get_baremetal_conductors().await.unwrap().is_none());
    assert_eq!(openstack.hits(&route(ComponentType::Baremetal, "/v1/conductors")).await, 0);

    let config = CheckConfig {
        ironic_microversion: Some("1.80".to_string()),
        ..openstack.config()
    };
    let mut api = authorized(config).await;
    let conductors = api.get_baremetal_conductors().await.unwrap().unwrap();
    assert_eq!(conductors["ctl"].metrics.get("openstack.ironic.conductor.alive"), Some(&1.0));
}

#[tokio::test]
async fn test_baremetal_nodes_keyed_by_uuid() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack
        .mount_json(
            &route(ComponentType::Baremetal, "/v1/nodes/detail"),
            json!({"nodes": [{"uuid": "54855e59", "name": "node-0", "maintenance": false, "retired": false, "power_state": "power on"}]}),
        )
        .await;

    let mut api = authorized(openstack.config()).await;
    let nodes = api.get_baremetal_nodes().await.unwrap().unwrap();
    assert_eq!(nodes["54855e59"].metrics.get("openstack.ironic.node.maintenance"), Some(&0.0));
}

#[tokio::test]
async fn test_load_balancer_queries() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    Mock::given(method("GET"))
        .and(path(route(ComponentType::LoadBalancer, "/v2/lbaas/pools")))
        .and(query_param("loadbalancer_id", "lb1"))
        .and(query_param("project_id", PROJECT_ID))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pools": [
            {"id": "pool1", "name": "pool", "protocol": "HTTP", "admin_state_up": true}
        ]})))
        .expect(1)
        .mount(&openstack.server)
        .await;
    Mock::given(method("GET"))
        .and(path(route(ComponentType::LoadBalancer, "/v2/lbaas/healthmonitors")))
        .and(query_param("pool_id", "pool1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"healthmonitors": [
            {"id": "hm1", "type": "HTTP", "delay": 5, "max_retries": 3, "timeout": 4, "admin_state_up": true}
        ]})))
        .expect(1)
        .mount(&openstack.server)
        .await;
    openstack
        .mount_json(
            &route(ComponentType::LoadBalancer, "/v2/lbaas/loadbalancers/lb1/stats"),
            json!({"stats": {"active_connections": 0, "bytes_in": 1024, "bytes_out": 2048, "request_errors": 0, "total_connections": 4}}),
        )
        .await;

    let mut api = authorized(openstack.config()).await;
    let pools = api
        .get_load_balancer_pools_by_loadbalancer(PROJECT_ID, "lb1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pools["pool1"].metrics.get("openstack.octavia.pool.admin_state_up"), Some(&1.0));

    let monitors = api
        .get_load_balancer_healthmonitors_by_pool(PROJECT_ID, "pool1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(monitors["hm1"].metrics.get("openstack.octavia.healthmonitor.delay"), Some(&5.0));

    let stats = api.get_load_balancer_loadbalancer_statistics("lb1").await.unwrap().unwrap();
    assert_eq!(stats.get("openstack.octavia.loadbalancer.bytes_out"), Some(&2048.0));
}

#[tokio::test]
async fn test_auth_projects() {
    let openstack = OpenStack::start().await;
    openstack.mount_auth(&all_components()).await;
    openstack
        .mount_json(
            "/identity/v3/auth/projects",
            json!({"projects": [
                {"id": PROJECT_ID, "name": "admin", "domain_id": "default"},
                {"id": "6e39099cccde4f809b003d9e0dd09304", "name": "demo", "domain_id": "default"}
            ]}),
        )
        .await;

    let mut api = authorized(openstack.config()).await;
    let projects = api.get_auth_projects().await.unwrap().unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0].id, PROJECT_ID);
    assert_eq!(projects[1].name, "demo");
}
