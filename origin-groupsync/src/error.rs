//! Error handling in [`origin-groupsync`][crate]
use thiserror::Error;

/// Possible errors while syncing groups
#[derive(Error, Debug)]
pub enum Error {
    /// The LDAP URL cannot be used
    #[error("invalid LDAP URL {url:?}: {reason}")]
    InvalidUrl {
        /// The URL as configured
        url: String,
        /// What is wrong with it
        reason: String,
    },

    /// A query template cannot be used
    #[error("invalid LDAP query: {0}")]
    InvalidQuery(String),

    /// A DN lookup would leave the subtree of the query
    #[error("search for entry with dn={dn:?} would search outside of the base dn specified (dn={base:?})")]
    OutsideBaseDn {
        /// The DN looked up
        dn: String,
        /// The base DN of the query
        base: String,
    },

    /// `ldapsearch` could not be started
    #[error("could not run {program}: {source}")]
    SpawnSearch {
        /// The program
        program: String,
        /// The underlying io error
        #[source]
        source: std::io::Error,
    },

    /// The bind password could not be handed to `ldapsearch`
    #[error("could not write the LDAP bind password file: {0}")]
    PasswordFile(#[source] std::io::Error),

    /// `ldapsearch` exited with a failure
    #[error("LDAP search failed ({status}): {stderr}")]
    Search {
        /// How the tool exited
        status: std::process::ExitStatus,
        /// What the tool printed to stderr
        stderr: String,
    },

    /// The output of `ldapsearch` is not valid LDIF
    #[error("invalid LDIF: {0}")]
    Ldif(String),

    /// No entry has the UID
    #[error("search for entry with {attribute}={uid:?} returned no results")]
    EntryNotFound {
        /// The UID attribute
        attribute: String,
        /// The UID
        uid: String,
    },

    /// Several entries have the UID
    #[error("search for entry with {attribute}={uid:?} returned {count} results, expected exactly one")]
    MultipleEntries {
        /// The UID attribute
        attribute: String,
        /// The UID
        uid: String,
        /// Number of entries found
        count: usize,
    },

    /// An entry lacks every attribute that could name it
    #[error("no value for any of the attributes {attributes:?} on entry {dn:?}")]
    MissingAttribute {
        /// The entry
        dn: String,
        /// The attributes tried
        attributes: Vec<String>,
    },

    /// The user-defined mapping has no name for a group
    #[error("no OpenShift group name mapped for LDAP group UID {0:?}")]
    UnmappedGroup(String),

    /// An OpenShift group named in a whitelist does not exist
    #[error("group {0:?} not found")]
    GroupNotFound(String),

    /// An OpenShift group may not be written by this sync
    #[error("group {group:?}: {reason}")]
    GroupConflict {
        /// The group
        group: String,
        /// Why it cannot be synced
        reason: String,
    },

    /// A call to the API server failed
    #[error("api request failed: {0}")]
    Kube(#[from] kube::Error),
}

/// Convenient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
