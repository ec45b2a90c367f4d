//! Controllers that give every service account a pull secret for the integrated registry.
//!
//! Three controllers cooperate through a shared [`DockerUrl`]:
//!
//! - [`DockercfgController`] creates a token secret and a matching `kubernetes.io/dockercfg`
//!   secret for each service account and links the latter as a mountable and image pull secret
//! - [`DockercfgTokenDeletedController`] deletes a dockercfg secret when its token secret goes away
//! - [`DockerRegistryServiceController`] follows the registry service's cluster IP and rewrites
//!   every managed dockercfg secret when it moves
//!
//! Each controller is started with `run` and stopped with `stop`; both are idempotent.
#![deny(unsafe_code)]

pub mod dockercfg;
pub mod dockercfg_controller;
mod docker_url;
pub mod error;
mod lifecycle;
pub mod registry_service;
pub mod token_deleted;

#[cfg(test)]
mod mock;

pub use docker_url::DockerUrl;
pub use dockercfg_controller::DockercfgController;
pub use error::{Error, Result};
pub use registry_service::DockerRegistryServiceController;
pub use token_deleted::DockercfgTokenDeletedController;

use std::time::Duration;

/// Registry location used while no registry service exists
pub const DEFAULT_DOCKER_URL: &str = "docker-registry.default.svc.cluster.local";
/// Secret type of service account token secrets
pub const SECRET_TYPE_SERVICE_ACCOUNT_TOKEN: &str = "kubernetes.io/service-account-token";
/// Secret type of dockercfg pull secrets
pub const SECRET_TYPE_DOCKERCFG: &str = "kubernetes.io/dockercfg";
/// Data key holding the token of a token secret
pub const SERVICE_ACCOUNT_TOKEN_KEY: &str = "token";
/// Data key holding the config of a dockercfg secret
pub const DOCKER_CONFIG_KEY: &str = ".dockercfg";

pub use origin_core::annotations::TOKEN_SECRET_NAME;

/// Options shared by the controllers in this crate
#[derive(Clone, Debug, Default)]
pub struct Options {
    /// Period after which every watched object is processed again.
    ///
    /// `None` only processes objects when they change.
    pub resync: Option<Duration>,
}

fn field_selector_for_type(secret_type: &str) -> String {
    format!("type={secret_type}")
}
