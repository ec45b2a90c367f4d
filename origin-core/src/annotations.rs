//! Well-known annotation and label keys
/// Name of the service account a secret belongs to
pub const SERVICE_ACCOUNT_NAME: &str = "kubernetes.io/service-account.name";
/// UID of the service account a secret belongs to
pub const SERVICE_ACCOUNT_UID: &str = "kubernetes.io/service-account.uid";
/// On a dockercfg secret, the name of the token secret whose token it carries
pub const TOKEN_SECRET_NAME: &str = "openshift.io/token-secret.name";

/// LDAP server URL a group was synced from
pub const LDAP_URL: &str = "openshift.io/ldap.url";
/// LDAP UID of the entry a group was synced from
pub const LDAP_UID: &str = "openshift.io/ldap.uid";
/// RFC 3339 time of the last sync of a group
pub const LDAP_SYNC_TIME: &str = "openshift.io/ldap.sync-time";
/// Label carrying the LDAP host (without port) a group was synced from
pub const LDAP_HOST_LABEL: &str = "openshift.io/ldap.host";
