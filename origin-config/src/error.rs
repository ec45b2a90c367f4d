//! Error handling in [`origin-config`][crate]
use std::path::PathBuf;
use thiserror::Error;

/// Possible errors when loading, writing or using server configuration
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read a config or certificate file
    #[error("could not read file {}: {source}", .path.display())]
    ReadFile {
        /// The file
        path: PathBuf,
        /// The underlying io error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a config file
    #[error("could not write file {}: {source}", .path.display())]
    WriteFile {
        /// The file
        path: PathBuf,
        /// The underlying io error
        #[source]
        source: std::io::Error,
    },

    /// A config file is not valid YAML or JSON for its type
    #[error("could not parse file {}: {source}", .path.display())]
    Parse {
        /// The file
        path: PathBuf,
        /// The underlying decode error
        #[source]
        source: serde_yaml::Error,
    },

    /// A config could not be encoded
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_yaml::Error),

    /// A path cannot be expressed relative to the base directory
    #[error("can't make {path} relative to {base}")]
    Relativize {
        /// The path
        path: String,
        /// The base directory
        base: String,
    },

    /// A CA bundle holds no usable certificates
    #[error("error reading {}: {reason}", .path.display())]
    CertificateBundle {
        /// The bundle file
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// The master has no `oauthConfig`
    #[error("oauthConfig is required to build the authentication config")]
    MissingOAuthConfig,

    /// Failed to load a kubeconfig file
    #[error("failed to load kubeconfig {}: {source}", .path.display())]
    Kubeconfig {
        /// The kubeconfig file
        path: PathBuf,
        /// The underlying kubeconfig error
        #[source]
        source: kube::config::KubeconfigError,
    },

    /// Failed to build a client from a valid kubeconfig
    #[error("failed to create client: {0}")]
    Client(#[source] kube::Error),
}

/// Convenient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
