//! Error handling in [`origin-cli`][crate]
use origin_core::Aggregate;
use std::path::PathBuf;
use thiserror::Error;

/// Possible errors from the command line tools
#[derive(Error, Debug)]
pub enum Error {
    /// A file could not be read
    #[error("could not read file {}: {source}", .path.display())]
    ReadFile {
        /// The file
        path: PathBuf,
        /// The underlying io error
        #[source]
        source: std::io::Error,
    },

    /// A commit statistics file is not JSON
    #[error("could not decode commit statistics: {0}")]
    DecodeCommits(#[source] serde_json::Error),

    /// Commit statistics do not have the expected layout
    #[error("unexpected commit statistics layout: {0}")]
    CommitLayout(String),

    /// A `type/name` argument names a type this tool does not know
    #[error("the server doesn't have a resource type {0:?}")]
    UnknownResource(String),

    /// A resource argument has more than one `/`
    #[error("invalid resource format: {0}")]
    InvalidResourceFormat(String),

    /// A resource argument names something other than a group
    #[error("{0:?} is not a group")]
    NotAGroup(String),

    /// A whitelist scope without entries
    #[error("a list of unique group identifiers is required for sync scope {0}")]
    EmptyWhitelist(crate::sync_groups::Scope),

    /// The sync config failed validation
    #[error("validation of LDAP sync config failed: {0}")]
    InvalidSyncConfig(#[source] Aggregate),

    /// The sync config uses a schema this tool cannot sync
    #[error("invalid schema-specific query template type")]
    InvalidSchema,

    /// Neither a mapping nor name attributes were configured
    #[error("not enough information to build a group name mapper")]
    NoGroupNameMapper,

    /// The LDAP connection settings are unusable
    #[error("could not determine LDAP client configuration: {0}")]
    LdapClientConfig(#[source] origin_groupsync::Error),

    /// A sync-groups building block could not be set up
    #[error(transparent)]
    GroupSync(#[from] origin_groupsync::Error),

    /// Loading a config file failed
    #[error(transparent)]
    Config(#[from] origin_config::Error),

    /// No client could be built from the default kubeconfig or the cluster environment
    #[error("failed to create client: {0}")]
    Client(#[source] kube::Error),

    /// Printing a result failed
    #[error("failed to print output: {0}")]
    Output(String),

    /// Independent failures collected during a run
    #[error(transparent)]
    Aggregate(Aggregate),
}

/// Convenient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
