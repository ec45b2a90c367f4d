//! Server configuration for OpenShift masters, nodes and LDAP group sync.
//!
//! Config files are YAML (or JSON) documents decoded into the types in [`types`].
//! [`load`] reads them and resolves relative file references, [`validation`] reports every
//! problem as a field error, and [`helpers`] derives CA pools, OAuth settings and API clients.
#![deny(unsafe_code)]

pub mod error;
pub mod helpers;
pub mod load;
pub mod types;
pub mod validation;

pub use error::{Error, Result};
pub use types::{LdapSyncConfig, MasterConfig, NodeConfig};
