//! Synchronise OpenShift groups with the groups of an LDAP directory.
//!
//! A sync is assembled from small strategies, each behind a trait in [`interfaces`]:
//! a lister picks the LDAP group UIDs to sync, a member extractor resolves each group's user
//! entries, and mappers turn LDAP entries into OpenShift user and group names. The
//! [`LdapGroupSyncer`] drives them and writes the result through a [`GroupClient`].
//!
//! Directory access goes through a [`Searcher`]; [`LdapSearch`] runs the `ldapsearch` tool and
//! parses its LDIF output.
#![deny(unsafe_code)]

pub mod error;
pub mod interfaces;
pub mod ldaputil;
pub mod ldif;
pub mod listers;
pub mod mappers;
pub mod rfc2307;
pub mod search;
pub mod syncer;

pub use error::{Error, Result};
pub use interfaces::{
    GroupClient, LdapGroupGetter, LdapGroupLister, LdapGroupNameMapper, LdapMemberExtractor,
    LdapUserNameMapper,
};
pub use ldaputil::{LdapClientConfig, LdapQueryOnAttribute, SearchRequest};
pub use ldif::Entry;
pub use search::{LdapSearch, Searcher};
pub use syncer::LdapGroupSyncer;
