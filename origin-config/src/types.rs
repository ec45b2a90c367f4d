//! Server configuration files: `MasterConfig`, `NodeConfig` and `LDAPSyncConfig`
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// A certificate and its private key
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CertInfo {
    /// PEM encoded certificate
    #[serde(default)]
    pub cert_file: String,
    /// PEM encoded private key for `cert_file`
    #[serde(default)]
    pub key_file: String,
}

/// Where and how a server listens
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServingInfo {
    /// `host:port` to listen on
    #[serde(default)]
    pub bind_address: String,
    /// Serving certificate; plain http when empty
    #[serde(flatten)]
    pub server_cert: CertInfo,
    /// Bundle of CAs that client certificates are verified against
    #[serde(default, rename = "clientCA")]
    pub client_ca: String,
}

/// How to reach etcd
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EtcdConnectionInfo {
    /// Etcd URL
    #[serde(default)]
    pub url: String,
    /// CA bundle for the etcd serving certificate
    #[serde(default)]
    pub ca: String,
    /// Client certificate presented to etcd
    #[serde(flatten)]
    pub client_cert: CertInfo,
}

/// Configuration for an embedded etcd
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EtcdConfig {
    /// Client-facing endpoint
    #[serde(default)]
    pub serving_info: ServingInfo,
    /// Data directory
    #[serde(default)]
    pub storage_directory: String,
}

/// Web console serving configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssetConfig {
    /// Console endpoint
    #[serde(default)]
    pub serving_info: ServingInfo,
    /// Public URL of the console
    #[serde(default, rename = "publicURL")]
    pub public_url: String,
}

/// Embedded DNS server
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DnsConfig {
    /// `host:port` to serve DNS on
    #[serde(default)]
    pub bind_address: String,
}

/// Settings for the embedded Kubernetes master
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesMasterConfig {
    /// Address advertised to cluster members
    #[serde(default, rename = "masterIP")]
    pub master_ip: String,
    /// CIDR that service IPs are allocated from
    #[serde(default)]
    pub services_subnet: String,
    /// Scheduler policy file
    #[serde(default)]
    pub scheduler_config_file: String,
}

/// Authorization policy bootstrap
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConfig {
    /// Policy loaded when the master starts for the first time
    #[serde(default)]
    pub bootstrap_policy_file: String,
    /// Namespace holding the master policy
    #[serde(default)]
    pub master_authorization_namespace: String,
    /// Namespace holding shared templates and image streams
    #[serde(default, rename = "openShiftSharedResourcesNamespace")]
    pub openshift_shared_resources_namespace: String,
}

/// Kubeconfig files the master uses for its own clients
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MasterClients {
    /// Used by deployer pods
    #[serde(default)]
    pub deployer_kube_config: String,
    /// Loopback connection to the OpenShift API
    #[serde(default, rename = "openShiftLoopbackKubeConfig")]
    pub openshift_loopback_kube_config: String,
    /// Connection to the Kubernetes API
    #[serde(default)]
    pub kubernetes_kube_config: String,
}

/// Session cookie configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionAuthenticationConfig {
    /// Secrets used to sign and encrypt sessions; the first one signs
    #[serde(default)]
    pub session_secrets: Vec<String>,
    /// Cookie name
    #[serde(default)]
    pub session_name: String,
    /// Session lifetime
    #[serde(default)]
    pub session_max_age_seconds: i32,
}

/// How grant requests from OAuth clients are handled
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrantConfig {
    /// One of [`GRANT_HANDLER_TYPES`]
    #[serde(default)]
    pub method: String,
}

/// Valid values of [`GrantConfig::method`]
pub const GRANT_HANDLER_TYPES: &[&str] = &["auto", "deny", "prompt"];

/// Valid values of [`OAuthRedirectingIdentityProvider::provider`]
pub const OAUTH_PROVIDER_TYPES: &[&str] = &["github", "google"];

/// Where an identity provider may be used
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProviderUsage {
    /// `oauth`, `web` or `api`
    #[serde(default)]
    pub provider_scope: String,
}

/// A remote server plus the credentials used to reach it
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConnectionInfo {
    /// Remote URL
    #[serde(default)]
    pub url: String,
    /// CA bundle for the remote serving certificate
    #[serde(default)]
    pub ca: String,
    /// Client certificate presented to the remote server
    #[serde(flatten)]
    pub client_cert: CertInfo,
}

/// The known identity provider implementations, selected by `kind`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum Provider {
    /// Trust a user name taken from a request header
    #[serde(rename = "XRemoteUserIdentityProvider")]
    XRemoteUser {
        /// CA used to verify the proxy's client certificate
        #[serde(default, rename = "caFile")]
        ca_file: String,
        /// Headers checked for the user name, in order
        #[serde(default)]
        headers: Vec<String>,
    },
    /// Validate credentials against a remote basic-auth endpoint
    #[serde(rename = "BasicAuthPasswordIdentityProvider")]
    BasicAuthPassword(RemoteConnectionInfo),
    /// Validate credentials against an htpasswd file
    #[serde(rename = "HTPasswdPasswordIdentityProvider")]
    HtpasswdPassword {
        /// htpasswd file
        #[serde(default)]
        file: String,
    },
    /// Redirect to an external OAuth server
    #[serde(rename = "OAuthRedirectingIdentityProvider")]
    OAuthRedirecting(OAuthRedirectingIdentityProvider),
}

/// An external OAuth server
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuthRedirectingIdentityProvider {
    /// OAuth client id
    #[serde(default, rename = "clientID")]
    pub client_id: String,
    /// OAuth client secret
    #[serde(default, rename = "clientSecret")]
    pub client_secret: String,
    /// One of [`OAUTH_PROVIDER_TYPES`]
    #[serde(default)]
    pub provider: String,
}

/// The `provider` stanza of an identity provider.
///
/// A provider of an unknown `kind` still loads, so that validation can report it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ProviderObject {
    /// A recognised provider
    Known(Provider),
    /// Anything else, kept verbatim
    Unknown(serde_json::Value),
}

impl ProviderObject {
    /// The `kind` of an unrecognised provider, empty when it has none
    pub fn unknown_kind(&self) -> Option<String> {
        match self {
            ProviderObject::Known(_) => None,
            ProviderObject::Unknown(value) => Some(
                value
                    .get("kind")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
            ),
        }
    }
}

impl Default for ProviderObject {
    fn default() -> Self {
        ProviderObject::Unknown(serde_json::Value::Null)
    }
}

/// A named identity provider
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProvider {
    /// Prefixed to user names coming from this provider
    #[serde(default)]
    pub name: String,
    /// Where the provider applies
    #[serde(default)]
    pub usage: IdentityProviderUsage,
    /// Provider implementation
    #[serde(default)]
    pub provider: ProviderObject,
}

/// The built-in OAuth server
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OAuthConfig {
    /// CA for client certificates presented by an authenticating proxy
    #[serde(default, rename = "proxyCA")]
    pub proxy_ca: String,
    /// Internal master URL used for token exchange
    #[serde(default, rename = "masterURL")]
    pub master_url: String,
    /// Master URL as seen by browsers
    #[serde(default, rename = "masterPublicURL")]
    pub master_public_url: String,
    /// Console URL that logins may redirect to
    #[serde(default, rename = "assetPublicURL")]
    pub asset_public_url: String,
    /// Identity providers, consulted in order
    #[serde(default)]
    pub identity_providers: Vec<IdentityProvider>,
    /// Grant handling
    #[serde(default)]
    pub grant_config: GrantConfig,
    /// Session handling; sessions are disabled when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_authentication_config: Option<SessionAuthenticationConfig>,
}

/// Configuration of an OpenShift master
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MasterConfig {
    /// API endpoint
    #[serde(default)]
    pub serving_info: ServingInfo,
    /// How to reach etcd
    #[serde(default)]
    pub etcd_client_info: EtcdConnectionInfo,
    /// Embedded etcd, when enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etcd_config: Option<EtcdConfig>,
    /// Built-in OAuth server, when enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_config: Option<OAuthConfig>,
    /// Web console, when enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_config: Option<AssetConfig>,
    /// Embedded DNS, when enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_config: Option<DnsConfig>,
    /// Embedded Kubernetes master, when enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_master_config: Option<KubernetesMasterConfig>,
    /// Policy bootstrap
    #[serde(default)]
    pub policy_config: PolicyConfig,
    /// Kubeconfigs for internal clients
    #[serde(default)]
    pub master_clients: MasterClients,
}

/// Configuration of an OpenShift node
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    /// Name the node registers under
    #[serde(default)]
    pub node_name: String,
    /// Kubelet endpoint
    #[serde(default)]
    pub serving_info: ServingInfo,
    /// Kubeconfig for connecting to the master
    #[serde(default)]
    pub master_kube_config: String,
    /// Root of pod volumes
    #[serde(default)]
    pub volume_directory: String,
    /// Cluster DNS address handed to pods
    #[serde(default, rename = "dnsIP")]
    pub dns_ip: String,
    /// Image of the pod infrastructure container
    #[serde(default)]
    pub network_container_image: String,
}

/// LDAP search scope
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Scope {
    /// Only the base object
    Base,
    /// Immediate children of the base
    SingleLevel,
    /// The base and everything below it
    #[default]
    WholeSubtree,
}

/// LDAP alias dereferencing behaviour
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DerefAliases {
    /// Never dereference
    Never,
    /// Dereference while searching below the base
    InSearching,
    /// Dereference when locating the base
    FindingBase,
    /// Always dereference
    #[default]
    Always,
}

/// Values accepted for [`LdapQuery::scope`]
pub const SCOPES: &[&str] = &["base", "one", "sub"];
/// Values accepted for [`LdapQuery::deref_aliases`]
pub const DEREF_ALIASES: &[&str] = &["never", "search", "base", "always"];

impl FromStr for Scope {
    type Err = String;

    /// An empty string selects the default
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "sub" => Ok(Scope::WholeSubtree),
            "base" => Ok(Scope::Base),
            "one" => Ok(Scope::SingleLevel),
            other => Err(format!("not a valid LDAP search scope: {other}")),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Base => "base",
            Scope::SingleLevel => "one",
            Scope::WholeSubtree => "sub",
        })
    }
}

impl FromStr for DerefAliases {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "always" => Ok(DerefAliases::Always),
            "never" => Ok(DerefAliases::Never),
            "search" => Ok(DerefAliases::InSearching),
            "base" => Ok(DerefAliases::FindingBase),
            other => Err(format!("not a valid LDAP alias dereferencing behavior: {other}")),
        }
    }
}

/// Renders the spelling `ldapsearch -a` expects
impl fmt::Display for DerefAliases {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DerefAliases::Never => "never",
            DerefAliases::InSearching => "search",
            DerefAliases::FindingBase => "find",
            DerefAliases::Always => "always",
        })
    }
}

/// A search template
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LdapQuery {
    /// DN of the search base
    #[serde(default, rename = "baseDN")]
    pub base_dn: String,
    /// `base`, `one` or `sub`; `sub` when empty
    #[serde(default)]
    pub scope: String,
    /// `never`, `search`, `base` or `always`; `always` when empty
    #[serde(default)]
    pub deref_aliases: String,
    /// Server-side time limit in seconds, 0 for none
    #[serde(default)]
    pub timeout: i32,
    /// Search filter, e.g. `(objectClass=groupOfNames)`
    #[serde(default)]
    pub filter: String,
}

/// Group and user layout of an RFC 2307 directory
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Rfc2307Config {
    /// Query returning every group entry
    #[serde(default)]
    pub all_groups_query: LdapQuery,
    /// Attribute uniquely identifying a group; `dn` for the entry DN
    #[serde(default, rename = "groupUIDAttribute")]
    pub group_uid_attribute: String,
    /// Attributes holding the group name, first match wins
    #[serde(default)]
    pub group_name_attributes: Vec<String>,
    /// Attributes listing the group's members
    #[serde(default)]
    pub group_membership_attributes: Vec<String>,
    /// Query returning every user entry
    #[serde(default)]
    pub all_users_query: LdapQuery,
    /// Attribute uniquely identifying a user; `dn` for the entry DN
    #[serde(default, rename = "userUIDAttribute")]
    pub user_uid_attribute: String,
    /// Attributes holding the user name, first match wins
    #[serde(default)]
    pub user_name_attributes: Vec<String>,
}

/// How OpenShift groups are synced from an LDAP server
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LdapSyncConfig {
    /// `ldap://host:port` or `ldaps://host:port`
    #[serde(default)]
    pub url: String,
    /// DN to bind as; anonymous when empty
    #[serde(default, rename = "bindDN")]
    pub bind_dn: String,
    /// Password for `bind_dn`
    #[serde(default)]
    pub bind_password: String,
    /// Connect without TLS
    #[serde(default)]
    pub insecure: bool,
    /// CA bundle for the server certificate
    #[serde(default)]
    pub ca: String,
    /// Explicit LDAP group UID to OpenShift group name mapping
    #[serde(default, rename = "groupUIDNameMapping")]
    pub group_uid_name_mapping: BTreeMap<String, String>,
    /// RFC 2307 schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rfc2307: Option<Rfc2307Config>,
    /// Active Directory schema; recognised but not supported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_directory: Option<serde_json::Value>,
    /// Augmented Active Directory schema; recognised but not supported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub augmented_active_directory: Option<serde_json::Value>,
}
