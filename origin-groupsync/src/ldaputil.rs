//! LDAP connection settings, query templates and filter escaping
use crate::{Error, Result};
use origin_config::types::{DerefAliases, LdapQuery, Scope};
use std::fmt::{self, Write};
use url::Url;

/// Port of `ldap://` URLs without one
pub const DEFAULT_LDAP_PORT: u16 = 389;
/// Port of `ldaps://` URLs without one
pub const DEFAULT_LDAPS_PORT: u16 = 636;

/// Transport of an LDAP connection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scheme {
    /// Plain LDAP, upgraded with StartTLS unless insecure
    Ldap,
    /// LDAP over TLS
    Ldaps,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scheme::Ldap => "ldap",
            Scheme::Ldaps => "ldaps",
        })
    }
}

/// How to reach and authenticate to an LDAP server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LdapClientConfig {
    /// Transport
    pub scheme: Scheme,
    /// `host:port`, with the scheme's default port filled in
    pub host: String,
    /// DN to bind as; anonymous when empty
    pub bind_dn: String,
    /// Password for `bind_dn`
    pub bind_password: String,
    /// CA bundle to verify the server with; system roots when empty
    pub ca: String,
    /// Skip TLS entirely on `ldap://` URLs
    pub insecure: bool,
}

impl LdapClientConfig {
    /// Interpret an RFC 2255 URL such as `ldap://host:389/ou=users,dc=example,dc=com?uid`.
    ///
    /// Only the scheme and host matter here; the search parts are configured by queries.
    pub fn new(url: &str, bind_dn: &str, bind_password: &str, ca: &str, insecure: bool) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidUrl {
            url: url.to_owned(),
            reason: reason.to_owned(),
        };
        let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
        let (scheme, default_port) = match parsed.scheme() {
            "ldap" => (Scheme::Ldap, DEFAULT_LDAP_PORT),
            "ldaps" => (Scheme::Ldaps, DEFAULT_LDAPS_PORT),
            other => return Err(invalid(&format!("unsupported scheme {other:?}"))),
        };
        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("no host"))?;
        let port = parsed.port().unwrap_or(default_port);
        Ok(Self {
            scheme,
            host: format!("{host}:{port}"),
            bind_dn: bind_dn.to_owned(),
            bind_password: bind_password.to_owned(),
            ca: ca.to_owned(),
            insecure,
        })
    }

    /// Whether a plain connection must be upgraded before binding
    pub fn start_tls(&self) -> bool {
        self.scheme == Scheme::Ldap && !self.insecure
    }

    /// The host without its port
    pub fn host_name(&self) -> &str {
        self.host.rsplit_once(':').map_or(self.host.as_str(), |(name, _)| name)
    }

    /// The server URL, without search parts
    pub fn url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

/// Escape a value for use inside an LDAP filter (RFC 4515)
pub fn escape_filter(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for b in value.bytes() {
        if b > 0x7f || matches!(b, b'(' | b')' | b'*' | b'\\' | 0) {
            // infallible for String
            let _ = write!(escaped, "\\{b:02x}");
        } else {
            escaped.push(char::from(b));
        }
    }
    escaped
}

/// One search, as sent to the directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    /// Where the search starts
    pub base_dn: String,
    /// How deep it goes
    pub scope: Scope,
    /// Alias handling
    pub deref_aliases: DerefAliases,
    /// Server-side time limit in seconds, 0 for none
    pub timeout: i32,
    /// The filter
    pub filter: String,
    /// Attributes to return
    pub attributes: Vec<String>,
}

/// A query template whose results are identified by one attribute.
///
/// The attribute `dn` stands for the entry's distinguished name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LdapQueryOnAttribute {
    /// Where searches start
    pub base_dn: String,
    /// How deep searches go
    pub scope: Scope,
    /// Alias handling
    pub deref_aliases: DerefAliases,
    /// Server-side time limit in seconds
    pub timeout: i32,
    /// Filter selecting every entry of interest
    pub filter: String,
    /// Attribute holding the UID of an entry
    pub query_attribute: String,
}

impl LdapQueryOnAttribute {
    /// Internalize a configured query
    pub fn new(query: &LdapQuery, attribute: &str) -> Result<Self> {
        Ok(Self {
            base_dn: query.base_dn.clone(),
            scope: query.scope.parse().map_err(Error::InvalidQuery)?,
            deref_aliases: query.deref_aliases.parse().map_err(Error::InvalidQuery)?,
            timeout: query.timeout,
            filter: query.filter.clone(),
            query_attribute: attribute.to_owned(),
        })
    }

    /// Whether entries are identified by their DN
    pub fn is_dn(&self) -> bool {
        self.query_attribute.eq_ignore_ascii_case("dn")
    }

    /// Search for every entry the template selects
    pub fn all(&self, attributes: &[String]) -> SearchRequest {
        SearchRequest {
            base_dn: self.base_dn.clone(),
            scope: self.scope,
            deref_aliases: self.deref_aliases,
            timeout: self.timeout,
            filter: self.filter.clone(),
            attributes: attributes.to_vec(),
        }
    }

    /// Search for the entry with the given UID
    pub fn for_uid(&self, uid: &str, attributes: &[String]) -> Result<SearchRequest> {
        if self.is_dn() {
            if !uid.to_lowercase().ends_with(&self.base_dn.to_lowercase()) {
                return Err(Error::OutsideBaseDn {
                    dn: uid.to_owned(),
                    base: self.base_dn.clone(),
                });
            }
            return Ok(SearchRequest {
                base_dn: uid.to_owned(),
                scope: Scope::Base,
                ..self.all(attributes)
            });
        }
        Ok(SearchRequest {
            filter: format!("(&{}({}={}))", self.filter, self.query_attribute, escape_filter(uid)),
            ..self.all(attributes)
        })
    }
}
