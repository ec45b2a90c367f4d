//! The `.dockercfg` document stored in pull secrets
use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// User name service accounts authenticate to the registry with
pub const SERVICE_ACCOUNT_USERNAME: &str = "serviceaccount";
/// Placeholder email required by old docker clients
pub const SERVICE_ACCOUNT_EMAIL: &str = "serviceaccount@example.org";

/// Credentials for one registry
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DockerConfigEntry {
    /// Registry user name
    #[serde(default)]
    pub username: String,
    /// Registry password; for service accounts this is the API token
    #[serde(default)]
    pub password: String,
    /// Email, ignored by current registries
    #[serde(default)]
    pub email: String,
    /// base64 of `username:password`
    #[serde(default)]
    pub auth: String,
}

impl DockerConfigEntry {
    /// An entry with `auth` derived from the user name and password
    pub fn new(username: &str, password: &str, email: &str) -> Self {
        Self {
            username: username.to_owned(),
            password: password.to_owned(),
            email: email.to_owned(),
            auth: STANDARD.encode(format!("{username}:{password}")),
        }
    }
}

/// Registry location to credentials
pub type DockerConfig = BTreeMap<String, DockerConfigEntry>;

/// The config a service account uses to pull from `registry` with `token`
pub fn service_account_config(registry: &str, token: &str) -> DockerConfig {
    let entry = DockerConfigEntry::new(SERVICE_ACCOUNT_USERNAME, token, SERVICE_ACCOUNT_EMAIL);
    DockerConfig::from([(registry.to_owned(), entry)])
}

/// Decode the JSON content of a `.dockercfg` key
pub fn decode(data: &[u8]) -> Result<DockerConfig> {
    serde_json::from_slice(data).map_err(Error::Dockercfg)
}

/// Encode a config as the content of a `.dockercfg` key
pub fn encode(config: &DockerConfig) -> Result<Vec<u8>> {
    serde_json::to_vec(config).map_err(Error::Dockercfg)
}

/// Move the only registry of `config` to `location`.
///
/// Configs written for service accounts name a single registry; anything else was not written
/// by us and is rejected.
pub fn relocate(mut config: DockerConfig, location: &str) -> Result<DockerConfig> {
    if config.len() != 1 {
        return Err(Error::RegistryCount(config.len()));
    }
    if let Some((_, entry)) = config.pop_first() {
        config.insert(location.to_owned(), entry);
    }
    Ok(config)
}
