//! Validation of server configuration.
//!
//! Every function returns an [`ErrorList`] whose field names are relative to the section
//! being validated; callers nest them with [`ErrorList::prefix`].
use crate::types::{
    CertInfo, DerefAliases, GrantConfig, IdentityProvider, KubernetesMasterConfig, LdapQuery, LdapSyncConfig,
    MasterConfig, NodeConfig, OAuthConfig, PolicyConfig, Provider, ProviderObject, RemoteConnectionInfo, Rfc2307Config,
    Scope, ServingInfo, SessionAuthenticationConfig, DEREF_ALIASES, GRANT_HANDLER_TYPES, OAUTH_PROVIDER_TYPES, SCOPES,
};
use origin_core::{
    field::{Error, ErrorList},
    validation::name_is_dns_label,
};
use std::net::IpAddr;

/// Split `host:port` at the last colon.
///
/// IPv6 hosts must be bracketed and a bare host with several colons is rejected; the port may be empty.
pub fn split_host_port(hostport: &str) -> Result<(&str, &str), &'static str> {
    let Some(colon) = hostport.rfind(':') else {
        return Err("missing port in address");
    };
    let (host, start) = if let Some(rest) = hostport.strip_prefix('[') {
        let Some(end) = rest.find(']').map(|i| i + 1) else {
            return Err("missing ']' in address");
        };
        if end + 1 == hostport.len() {
            return Err("missing port in address");
        }
        if end + 1 != colon {
            return Err(if hostport.as_bytes()[end + 1] == b':' {
                "too many colons in address"
            } else {
                "missing port in address"
            });
        }
        (&hostport[1..end], end + 1)
    } else {
        let host = &hostport[..colon];
        if host.contains(':') {
            return Err("too many colons in address");
        }
        (host, colon)
    };
    if hostport[1..].contains('[') || hostport[start + 1..].contains(']') {
        return Err("unexpected bracket in address");
    }
    if !hostport.starts_with('[') && hostport.contains(']') {
        return Err("unexpected bracket in address");
    }
    Ok((host, &hostport[colon + 1..]))
}

/// `bindAddress` must be a `host:port`
pub fn validate_bind_address(bind_address: &str) -> ErrorList {
    let mut errs = ErrorList::new();
    if bind_address.is_empty() {
        errs.push(Error::required("bindAddress", ""));
    } else if split_host_port(bind_address).is_err() {
        errs.push(Error::invalid("bindAddress", bind_address, "must be a host:port"));
    }
    errs
}

/// The path must be given and must exist
pub fn validate_file(path: &str, field: &str) -> ErrorList {
    let mut errs = ErrorList::new();
    if path.is_empty() {
        errs.push(Error::required(field, ""));
    } else if std::fs::metadata(path).is_err() {
        errs.push(Error::invalid(field, path, "could not read file"));
    }
    errs
}

/// A kubeconfig reference must point at an existing file
pub fn validate_kube_config(path: &str, field: &str) -> ErrorList {
    validate_file(path, field)
}

/// A certificate requires its key and vice versa; both must exist
pub fn validate_cert_info(info: &CertInfo) -> ErrorList {
    let mut errs = ErrorList::new();
    if !info.cert_file.is_empty() {
        if info.key_file.is_empty() {
            errs.push(Error::required("keyFile", ""));
        }
        errs.extend(validate_file(&info.cert_file, "certFile"));
    }
    if !info.key_file.is_empty() {
        if info.cert_file.is_empty() {
            errs.push(Error::required("certFile", ""));
        }
        errs.extend(validate_file(&info.key_file, "keyFile"));
    }
    errs
}

/// Bind address, serving certificate and client CA
pub fn validate_serving_info(info: &ServingInfo) -> ErrorList {
    let mut errs = validate_bind_address(&info.bind_address);
    errs.extend(validate_cert_info(&info.server_cert));
    if !info.client_ca.is_empty() {
        if info.server_cert.cert_file.is_empty() || info.server_cert.key_file.is_empty() {
            errs.push(Error::invalid(
                "clientCA",
                info.client_ca.as_str(),
                "cannot specify a clientCA without a certFile",
            ));
        }
        errs.extend(validate_file(&info.client_ca, "clientCA"));
    }
    errs
}

/// The value must be an IP address other than `0.0.0.0` or `::`
pub fn validate_specified_ip(ip: &str, field: &str) -> ErrorList {
    let mut errs = ErrorList::new();
    match ip.parse::<IpAddr>() {
        Err(_) => errs.push(Error::invalid(field, ip, "must be a valid IP")),
        Ok(addr) if addr.is_unspecified() => errs.push(Error::invalid(field, ip, "cannot be an unspecified IP")),
        Ok(_) => {}
    }
    errs
}

fn is_cidr(value: &str) -> bool {
    let Some((ip, bits)) = value.split_once('/') else {
        return false;
    };
    if bits.is_empty() || !bits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let Ok(bits) = bits.parse::<u8>() else {
        return false;
    };
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(_)) => bits <= 32,
        Ok(IpAddr::V6(_)) => bits <= 128,
        Err(_) => false,
    }
}

/// Master IP, service network and scheduler policy
pub fn validate_kubernetes_master_config(config: &KubernetesMasterConfig) -> ErrorList {
    let mut errs = ErrorList::new();
    if !config.master_ip.is_empty() {
        errs.extend(validate_specified_ip(&config.master_ip, "masterIP"));
    }
    if !config.services_subnet.is_empty() && !is_cidr(config.services_subnet.trim()) {
        errs.push(Error::invalid(
            "servicesSubnet",
            config.services_subnet.as_str(),
            "must be a valid CIDR notation IP range (e.g. 172.30.17.0/24)",
        ));
    }
    if !config.scheduler_config_file.is_empty() {
        errs.extend(validate_file(&config.scheduler_config_file, "schedulerConfigFile"));
    }
    errs
}

/// Required, and a valid DNS-1123 label
pub fn validate_namespace(namespace: &str, field: &str) -> ErrorList {
    let mut errs = ErrorList::new();
    if namespace.is_empty() {
        errs.push(Error::required(field, ""));
    } else if !name_is_dns_label(namespace, false).is_empty() {
        errs.push(Error::invalid(field, namespace, "must be a valid namespace"));
    }
    errs
}

/// Bootstrap policy file and the policy namespaces
pub fn validate_policy_config(config: &PolicyConfig) -> ErrorList {
    let mut errs = validate_file(&config.bootstrap_policy_file, "bootstrapPolicyFile");
    errs.extend(validate_namespace(
        &config.master_authorization_namespace,
        "masterAuthorizationNamespace",
    ));
    errs.extend(validate_namespace(
        &config.openshift_shared_resources_namespace,
        "openShiftSharedResourcesNamespace",
    ));
    errs
}

/// Session cookies need secrets and a name
pub fn validate_session_authentication_config(config: &SessionAuthenticationConfig) -> ErrorList {
    let mut errs = ErrorList::new();
    if config.session_secrets.is_empty() {
        errs.push(Error::required("sessionSecrets", ""));
    }
    if config.session_name.is_empty() {
        errs.push(Error::required("sessionName", ""));
    }
    errs
}

/// The grant method must be known
pub fn validate_grant_config(config: &GrantConfig) -> ErrorList {
    let mut errs = ErrorList::new();
    if !GRANT_HANDLER_TYPES.contains(&config.method.as_str()) {
        errs.push(Error::invalid(
            "method",
            config.method.as_str(),
            format!("must be one of: {}", GRANT_HANDLER_TYPES.join(", ")),
        ));
    }
    errs
}

/// URL, CA and client certificate of a remote server
pub fn validate_remote_connection_info(info: &RemoteConnectionInfo) -> ErrorList {
    let mut errs = ErrorList::new();
    if info.url.is_empty() {
        errs.push(Error::required("url", ""));
    }
    if !info.ca.is_empty() {
        errs.extend(validate_file(&info.ca, "ca"));
    }
    errs.extend(validate_cert_info(&info.client_cert));
    errs
}

/// Usage plus the settings of the selected provider kind
pub fn validate_identity_provider(provider: &IdentityProvider) -> ErrorList {
    let mut errs = ErrorList::new();
    if provider.usage.provider_scope.is_empty() {
        errs.push(Error::required("usage.providerScope", ""));
    }

    match &provider.provider {
        ProviderObject::Unknown(_) => {
            let kind = provider.provider.unknown_kind().unwrap_or_default();
            errs.push(Error::invalid(
                "provider",
                kind.as_str(),
                format!("{kind:?} is invalid in this context"),
            ));
        }
        ProviderObject::Known(Provider::XRemoteUser { ca_file, headers }) => {
            if !ca_file.is_empty() {
                errs.extend(validate_file(ca_file, "provider.caFile"));
            }
            if headers.is_empty() {
                errs.push(Error::required("provider.headers", ""));
            }
        }
        ProviderObject::Known(Provider::BasicAuthPassword(info)) => {
            errs.extend(validate_remote_connection_info(info).prefix("provider"));
        }
        ProviderObject::Known(Provider::HtpasswdPassword { file }) => {
            errs.extend(validate_file(file, "provider.file"));
        }
        ProviderObject::Known(Provider::OAuthRedirecting(oauth)) => {
            if oauth.client_id.is_empty() {
                errs.push(Error::required("provider.clientID", ""));
            }
            if oauth.client_secret.is_empty() {
                errs.push(Error::required("provider.clientSecret", ""));
            }
            if !OAUTH_PROVIDER_TYPES.contains(&oauth.provider.as_str()) {
                errs.push(Error::not_supported(
                    "provider.provider",
                    oauth.provider.as_str(),
                    OAUTH_PROVIDER_TYPES,
                ));
            }
        }
    }
    errs
}

/// The built-in OAuth server
pub fn validate_oauth_config(config: &OAuthConfig) -> ErrorList {
    let mut errs = ErrorList::new();
    if !config.proxy_ca.is_empty() {
        errs.extend(validate_file(&config.proxy_ca, "proxyCA"));
    }
    for (value, field) in [
        (&config.master_url, "masterURL"),
        (&config.master_public_url, "masterPublicURL"),
        (&config.asset_public_url, "assetPublicURL"),
    ] {
        if value.is_empty() {
            errs.push(Error::required(field, ""));
        }
    }
    if let Some(session) = &config.session_authentication_config {
        errs.extend(validate_session_authentication_config(session).prefix("sessionAuthenticationConfig"));
    }
    errs.extend(validate_grant_config(&config.grant_config).prefix("grantConfig"));
    for (i, provider) in config.identity_providers.iter().enumerate() {
        errs.extend(validate_identity_provider(provider).prefix(&format!("identityProvider[{i}]")));
    }
    errs
}

/// A complete master config
pub fn validate_master_config(config: &MasterConfig) -> ErrorList {
    let mut errs = validate_serving_info(&config.serving_info).prefix("servingInfo");
    if let Some(assets) = &config.asset_config {
        errs.extend(validate_serving_info(&assets.serving_info).prefix("assetConfig.servingInfo"));
    }
    if let Some(dns) = &config.dns_config {
        errs.extend(validate_bind_address(&dns.bind_address).prefix("dnsConfig"));
    }
    if let Some(kube) = &config.kubernetes_master_config {
        errs.extend(validate_kubernetes_master_config(kube).prefix("kubernetesMasterConfig"));
    }
    errs.extend(validate_policy_config(&config.policy_config).prefix("policyConfig"));
    if let Some(oauth) = &config.oauth_config {
        errs.extend(validate_oauth_config(oauth).prefix("oauthConfig"));
    }

    let clients = &config.master_clients;
    let mut client_errs = validate_kube_config(&clients.deployer_kube_config, "deployerKubeConfig");
    client_errs.extend(validate_kube_config(
        &clients.openshift_loopback_kube_config,
        "openShiftLoopbackKubeConfig",
    ));
    client_errs.extend(validate_kube_config(&clients.kubernetes_kube_config, "kubernetesKubeConfig"));
    errs.extend(client_errs.prefix("masterClients"));
    errs
}

/// A complete node config
pub fn validate_node_config(config: &NodeConfig) -> ErrorList {
    let mut errs = ErrorList::new();
    if config.node_name.is_empty() {
        errs.push(Error::required("nodeName", ""));
    }
    errs.extend(validate_serving_info(&config.serving_info).prefix("servingInfo"));
    errs.extend(validate_kube_config(&config.master_kube_config, "masterKubeConfig"));
    if !config.dns_ip.is_empty() {
        errs.extend(validate_specified_ip(&config.dns_ip, "dnsIP"));
    }
    if config.network_container_image.is_empty() {
        errs.push(Error::required("networkContainerImage", ""));
    }
    errs
}

/// A master and node running in one process
pub fn validate_all_in_one_config(master: &MasterConfig, node: &NodeConfig) -> ErrorList {
    let mut errs = validate_master_config(master).prefix("masterConfig");
    errs.extend(validate_node_config(node).prefix("nodeConfig"));
    errs
}

fn is_balanced_filter(filter: &str) -> bool {
    if !(filter.starts_with('(') && filter.ends_with(')')) {
        return false;
    }
    let mut depth = 0i32;
    for (i, c) in filter.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 || (depth == 0 && i + 1 != filter.len()) {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// A search template: base DN, scope, deref behaviour, timeout and filter
pub fn validate_ldap_query(query: &LdapQuery) -> ErrorList {
    let mut errs = ErrorList::new();
    if query.base_dn.is_empty() {
        errs.push(Error::required("baseDN", ""));
    } else if !query.base_dn.contains('=') {
        errs.push(Error::invalid("baseDN", query.base_dn.as_str(), "must be a valid DN"));
    }
    if query.scope.parse::<Scope>().is_err() {
        errs.push(Error::not_supported("scope", query.scope.as_str(), SCOPES));
    }
    if query.deref_aliases.parse::<DerefAliases>().is_err() {
        errs.push(Error::not_supported("derefAliases", query.deref_aliases.as_str(), DEREF_ALIASES));
    }
    if query.timeout < 0 {
        errs.push(Error::invalid(
            "timeout",
            query.timeout.to_string(),
            "timeout must be equal to or greater than zero",
        ));
    }
    if query.filter.is_empty() {
        errs.push(Error::required("filter", ""));
    } else if !is_balanced_filter(&query.filter) {
        errs.push(Error::invalid(
            "filter",
            query.filter.as_str(),
            "must be an LDAP filter enclosed in parentheses",
        ));
    }
    errs
}

fn validate_rfc2307_config(config: &Rfc2307Config, has_name_mapping: bool) -> ErrorList {
    let mut errs = validate_ldap_query(&config.all_groups_query).prefix("allGroupsQuery");
    if config.group_uid_attribute.is_empty() {
        errs.push(Error::required("groupUIDAttribute", ""));
    }
    if config.group_name_attributes.is_empty() && !has_name_mapping {
        errs.push(Error::required(
            "groupNameAttributes",
            "required unless groupUIDNameMapping is given",
        ));
    }
    if config.group_membership_attributes.is_empty() {
        errs.push(Error::required("groupMembershipAttributes", ""));
    }
    errs.extend(validate_ldap_query(&config.all_users_query).prefix("allUsersQuery"));
    if config.user_uid_attribute.is_empty() {
        errs.push(Error::required("userUIDAttribute", ""));
    }
    if config.user_name_attributes.is_empty() {
        errs.push(Error::required("userNameAttributes", ""));
    }
    errs
}

/// Connection settings plus exactly one supported schema
pub fn validate_ldap_sync_config(config: &LdapSyncConfig) -> ErrorList {
    let mut errs = ErrorList::new();

    let scheme = if config.url.is_empty() {
        errs.push(Error::required("url", ""));
        None
    } else {
        match url::Url::parse(&config.url) {
            Ok(url) if matches!(url.scheme(), "ldap" | "ldaps") => Some(url.scheme().to_owned()),
            Ok(url) => {
                errs.push(Error::not_supported("url", url.scheme(), &["ldap", "ldaps"]));
                None
            }
            Err(e) => {
                errs.push(Error::invalid("url", config.url.as_str(), e.to_string()));
                None
            }
        }
    };

    if config.bind_dn.is_empty() != config.bind_password.is_empty() {
        errs.push(Error::invalid(
            "bindDN",
            config.bind_dn.as_str(),
            "bindDN and bindPassword must both be specified, or both be empty",
        ));
    }

    if config.insecure {
        if scheme.as_deref() == Some("ldaps") {
            errs.push(Error::invalid(
                "url",
                config.url.as_str(),
                "cannot use the ldaps scheme with insecure=true",
            ));
        }
        if !config.ca.is_empty() {
            errs.push(Error::invalid("ca", config.ca.as_str(), "cannot specify a ca with insecure=true"));
        }
    } else if !config.ca.is_empty() {
        errs.extend(validate_file(&config.ca, "ca"));
    }

    let schemas = [
        config.rfc2307.is_some(),
        config.active_directory.is_some(),
        config.augmented_active_directory.is_some(),
    ]
    .into_iter()
    .filter(|set| *set)
    .count();
    if schemas > 1 {
        errs.push(Error::invalid(
            "",
            "",
            format!("only one schema-specific config is allowed; found {schemas}"),
        ));
    } else if schemas == 0 {
        errs.push(Error::required("", "a schema-specific config is required"));
    }

    if config.active_directory.is_some() {
        errs.push(Error::not_supported("activeDirectory", "activeDirectory", &["rfc2307"]));
    }
    if config.augmented_active_directory.is_some() {
        errs.push(Error::not_supported(
            "augmentedActiveDirectory",
            "augmentedActiveDirectory",
            &["rfc2307"],
        ));
    }
    if let Some(rfc2307) = &config.rfc2307 {
        errs.extend(
            validate_rfc2307_config(rfc2307, !config.group_uid_name_mapping.is_empty()).prefix("rfc2307"),
        );
    }
    errs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EtcdConfig, OAuthRedirectingIdentityProvider};
    use origin_core::field::ErrorType;

    fn fields(errs: &ErrorList) -> Vec<String> {
        errs.iter().map(|e| e.field.clone()).collect()
    }

    #[test]
    fn bind_address_properties() {
        let errs = validate_bind_address("");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.iter().next().unwrap().type_, ErrorType::Required);

        let errs = validate_bind_address("1.2.3.4");
        assert_eq!(errs.len(), 1);
        let err = errs.iter().next().unwrap();
        assert_eq!(err.type_, ErrorType::Invalid);
        assert_eq!(err.to_string(), r#"bindAddress: Invalid value: "1.2.3.4": must be a host:port"#);

        assert!(validate_bind_address("1.2.3.4:8080").is_empty());
    }

    #[test]
    fn split_host_port_follows_go_rules() {
        assert_eq!(split_host_port("0.0.0.0:8443"), Ok(("0.0.0.0", "8443")));
        assert_eq!(split_host_port(":53"), Ok(("", "53")));
        assert_eq!(split_host_port("[::1]:8443"), Ok(("::1", "8443")));
        assert_eq!(split_host_port("host:"), Ok(("host", "")));
        assert_eq!(split_host_port("::1:8443"), Err("too many colons in address"));
        assert_eq!(split_host_port("[::1]"), Err("missing port in address"));
        assert_eq!(split_host_port("[::1]8443"), Err("missing port in address"));
        assert_eq!(split_host_port("[::1"), Err("missing ']' in address"));
        assert_eq!(split_host_port("a]b:80"), Err("unexpected bracket in address"));
    }

    #[test]
    fn serving_info_requires_cert_for_client_ca() {
        let dir = tempfile::tempdir().unwrap();
        let ca = dir.path().join("ca.crt");
        std::fs::write(&ca, "").unwrap();
        let info = ServingInfo {
            bind_address: "0.0.0.0:8443".into(),
            client_ca: ca.display().to_string(),
            ..ServingInfo::default()
        };
        let errs = validate_serving_info(&info);
        assert_eq!(fields(&errs), vec!["clientCA"]);
        assert!(errs.to_string().contains("cannot specify a clientCA without a certFile"));
    }

    #[test]
    fn cert_info_needs_both_halves() {
        let errs = validate_cert_info(&CertInfo {
            cert_file: "/nonexistent/server.crt".into(),
            key_file: String::new(),
        });
        assert_eq!(fields(&errs), vec!["keyFile", "certFile"]);
        assert_eq!(errs.iter().nth(1).unwrap().detail, "could not read file");
    }

    #[test]
    fn specified_ips() {
        assert!(validate_specified_ip("10.0.0.1", "dnsIP").is_empty());
        assert!(validate_specified_ip("fd00::1", "dnsIP").is_empty());
        let errs = validate_specified_ip("0.0.0.0", "dnsIP");
        assert_eq!(errs.iter().next().unwrap().detail, "cannot be an unspecified IP");
        let errs = validate_specified_ip("ten", "dnsIP");
        assert_eq!(errs.iter().next().unwrap().detail, "must be a valid IP");
    }

    #[test]
    fn kubernetes_master_subnet_is_trimmed() {
        let mut config = KubernetesMasterConfig {
            services_subnet: " 172.30.0.0/16 ".into(),
            ..KubernetesMasterConfig::default()
        };
        assert!(validate_kubernetes_master_config(&config).is_empty());
        config.services_subnet = "172.30.0.0/33".into();
        assert_eq!(fields(&validate_kubernetes_master_config(&config)), vec!["servicesSubnet"]);
    }

    #[test]
    fn namespaces() {
        assert!(validate_namespace("openshift", "ns").is_empty());
        assert_eq!(
            validate_namespace("", "ns").iter().next().unwrap().type_,
            ErrorType::Required
        );
        assert_eq!(
            validate_namespace("Not_Valid", "ns").iter().next().unwrap().detail,
            "must be a valid namespace"
        );
    }

    #[test]
    fn identity_providers_are_checked_by_kind() {
        let provider = IdentityProvider {
            name: "github".into(),
            usage: Default::default(),
            provider: ProviderObject::Known(Provider::OAuthRedirecting(OAuthRedirectingIdentityProvider {
                client_id: "id".into(),
                client_secret: String::new(),
                provider: "gitlab".into(),
            })),
        };
        let errs = validate_identity_provider(&provider);
        assert_eq!(fields(&errs), vec![
            "usage.providerScope",
            "provider.clientSecret",
            "provider.provider"
        ]);

        let unknown = IdentityProvider {
            provider: ProviderObject::Unknown(serde_json::json!({"kind": "Kerberos"})),
            ..IdentityProvider::default()
        };
        let errs = validate_identity_provider(&unknown);
        assert_eq!(
            errs.iter().nth(1).unwrap().to_string(),
            r#"provider: Invalid value: "Kerberos": "Kerberos" is invalid in this context"#
        );
    }

    #[test]
    fn oauth_config_nests_its_sections() {
        let config = OAuthConfig {
            master_url: "https://m:8443".into(),
            master_public_url: "https://m:8443".into(),
            asset_public_url: "https://m:8443/console/".into(),
            grant_config: GrantConfig { method: "sometimes".into() },
            session_authentication_config: Some(SessionAuthenticationConfig::default()),
            identity_providers: vec![IdentityProvider {
                usage: crate::types::IdentityProviderUsage {
                    provider_scope: "oauth".into(),
                },
                provider: ProviderObject::Known(Provider::XRemoteUser {
                    ca_file: String::new(),
                    headers: vec![],
                }),
                ..IdentityProvider::default()
            }],
            ..OAuthConfig::default()
        };
        let errs = validate_oauth_config(&config);
        assert_eq!(fields(&errs), vec![
            "sessionAuthenticationConfig.sessionSecrets",
            "sessionAuthenticationConfig.sessionName",
            "grantConfig.method",
            "identityProvider[0].provider.headers",
        ]);
    }

    #[test]
    fn master_config_prefixes_sections() {
        let config = MasterConfig {
            etcd_config: Some(EtcdConfig::default()),
            ..MasterConfig::default()
        };
        let errs = validate_master_config(&config);
        let fields = fields(&errs);
        assert_eq!(fields[0], "servingInfo.bindAddress");
        assert!(fields.contains(&"policyConfig.bootstrapPolicyFile".to_owned()));
        assert!(fields.contains(&"policyConfig.masterAuthorizationNamespace".to_owned()));
        assert!(fields.contains(&"masterClients.openShiftLoopbackKubeConfig".to_owned()));
        assert!(!fields.iter().any(|f| f.starts_with("oauthConfig")));
    }

    #[test]
    fn node_and_all_in_one() {
        let dir = tempfile::tempdir().unwrap();
        let kubeconfig = dir.path().join("node.kubeconfig");
        std::fs::write(&kubeconfig, "").unwrap();
        let node = NodeConfig {
            node_name: "node1".into(),
            serving_info: ServingInfo {
                bind_address: "0.0.0.0:10250".into(),
                ..ServingInfo::default()
            },
            master_kube_config: kubeconfig.display().to_string(),
            dns_ip: "0.0.0.0".into(),
            ..NodeConfig::default()
        };
        let errs = validate_node_config(&node);
        assert_eq!(fields(&errs), vec!["dnsIP", "networkContainerImage"]);

        let errs = validate_all_in_one_config(&MasterConfig::default(), &node);
        let fields = fields(&errs);
        assert!(fields.iter().any(|f| f == "masterConfig.servingInfo.bindAddress"));
        assert!(fields.iter().any(|f| f == "nodeConfig.networkContainerImage"));
    }

    fn query(filter: &str) -> LdapQuery {
        LdapQuery {
            base_dn: "ou=groups,dc=example,dc=com".into(),
            scope: "sub".into(),
            deref_aliases: "never".into(),
            timeout: 0,
            filter: filter.into(),
        }
    }

    fn rfc2307_config() -> LdapSyncConfig {
        LdapSyncConfig {
            url: "ldap://ldap.example.com:389".into(),
            rfc2307: Some(Rfc2307Config {
                all_groups_query: query("(objectClass=groupOfNames)"),
                group_uid_attribute: "dn".into(),
                group_name_attributes: vec!["cn".into()],
                group_membership_attributes: vec!["member".into()],
                all_users_query: query("(objectClass=inetOrgPerson)"),
                user_uid_attribute: "dn".into(),
                user_name_attributes: vec!["mail".into()],
            }),
            ..LdapSyncConfig::default()
        }
    }

    #[test]
    fn valid_ldap_sync_config() {
        let errs = validate_ldap_sync_config(&rfc2307_config());
        assert!(errs.is_empty(), "{errs}");
    }

    #[test]
    fn ldap_connection_settings() {
        let mut config = rfc2307_config();
        config.url = "ldaps://ldap.example.com".into();
        config.insecure = true;
        config.ca = "/etc/ldap/ca.crt".into();
        config.bind_dn = "cn=admin,dc=example,dc=com".into();
        let errs = validate_ldap_sync_config(&config);
        assert_eq!(fields(&errs), vec!["bindDN", "url", "ca"]);

        config = rfc2307_config();
        config.url = "http://ldap.example.com".into();
        let errs = validate_ldap_sync_config(&config);
        assert_eq!(errs.iter().next().unwrap().type_, ErrorType::NotSupported);
    }

    #[test]
    fn ldap_schemas() {
        let mut config = rfc2307_config();
        config.active_directory = Some(serde_json::json!({}));
        let errs = validate_ldap_sync_config(&config);
        assert!(errs.to_string().contains("only one schema-specific config is allowed; found 2"));
        let ad = errs.iter().find(|e| e.field == "activeDirectory").unwrap();
        assert_eq!(ad.type_, ErrorType::NotSupported);
        assert_eq!(ad.detail, "supported values: \"rfc2307\"");

        config.rfc2307 = None;
        config.active_directory = None;
        config.augmented_active_directory = Some(serde_json::json!({}));
        let errs = validate_ldap_sync_config(&config);
        assert_eq!(fields(&errs), vec!["augmentedActiveDirectory"]);
        assert_eq!(errs.iter().next().unwrap().type_, ErrorType::NotSupported);

        config.augmented_active_directory = None;
        let errs = validate_ldap_sync_config(&config);
        assert_eq!(errs.iter().next().unwrap().type_, ErrorType::Required);
    }

    #[test]
    fn group_name_attributes_may_come_from_a_mapping() {
        let mut config = rfc2307_config();
        if let Some(rfc) = config.rfc2307.as_mut() {
            rfc.group_name_attributes.clear();
        }
        let errs = validate_ldap_sync_config(&config);
        assert_eq!(fields(&errs), vec!["rfc2307.groupNameAttributes"]);

        config
            .group_uid_name_mapping
            .insert("cn=admins,ou=groups,dc=example,dc=com".into(), "admins".into());
        assert!(validate_ldap_sync_config(&config).is_empty());
    }

    #[test]
    fn ldap_queries() {
        assert!(validate_ldap_query(&query("(&(objectClass=x)(cn=y))")).is_empty());
        let bad = LdapQuery {
            base_dn: String::new(),
            scope: "tree".into(),
            deref_aliases: "sometimes".into(),
            timeout: -1,
            filter: "objectClass=x".into(),
        };
        assert_eq!(fields(&validate_ldap_query(&bad)), vec![
            "baseDN",
            "scope",
            "derefAliases",
            "timeout",
            "filter"
        ]);
        assert!(!validate_ldap_query(&query("(a)(b)")).is_empty());
    }
}
