//! Error handling in [`origin-controllers`][crate]
use thiserror::Error;

/// Possible errors while reconciling service accounts, secrets and services
#[derive(Error, Debug)]
pub enum Error {
    /// A call to the API server failed
    #[error("api request failed: {0}")]
    Kube(#[from] kube::Error),

    /// The token controller never filled in a token secret
    #[error("token never generated for {0}")]
    TokenNeverGenerated(String),

    /// A watched object lacks a name or namespace
    #[error("object is missing {0}")]
    MissingObjectKey(&'static str),

    /// A dockercfg document could not be encoded or decoded
    #[error("invalid dockercfg: {0}")]
    Dockercfg(#[source] serde_json::Error),

    /// A dockercfg document does not hold exactly one registry
    #[error("expected exactly one registry in dockercfg, found {0}")]
    RegistryCount(usize),
}

impl Error {
    /// True for an API conflict (HTTP 409)
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Kube(kube::Error::Api(resp)) if resp.code == 409)
    }

    /// True for an API not found (HTTP 404)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Kube(kube::Error::Api(resp)) if resp.code == 404)
    }
}

/// Convenient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
