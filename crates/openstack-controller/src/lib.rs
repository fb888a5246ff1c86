//! OpenStack controller check: catalog-based service discovery, token
//! re-authorization, and per-component API polling.

#![warn(missing_docs)]

pub mod api;
pub mod catalog;
pub mod check;
pub mod cli;
pub mod component;
pub mod components;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod session;

pub use api::{ApiRest, AuthProject, CalledEndpoints};
pub use catalog::{Catalog, CatalogEndpoint, CatalogEntry, EndpointResolver, Interface};
pub use check::{CheckReport, Metric, OpenStackControllerCheck, ServiceCheck, ServiceCheckStatus};
pub use component::ComponentType;
pub use config::CheckConfig;
pub use error::{ApiError, ApiResult};
pub use metrics::{Entity, EntityMap, Metrics};
pub use session::AuthState;
