//! File references, CA pools and clients derived from server configuration
use crate::{
    error::{Error, Result},
    types::{MasterConfig, NodeConfig, OAuthConfig, ServingInfo},
};
use std::path::{Component, Path, PathBuf};

/// Every path-valued field of a master config.
///
/// Sections that are absent contribute nothing.
pub fn master_file_references(config: &mut MasterConfig) -> Vec<&mut String> {
    let mut refs = vec![
        &mut config.serving_info.server_cert.cert_file,
        &mut config.serving_info.server_cert.key_file,
        &mut config.serving_info.client_ca,
        &mut config.etcd_client_info.client_cert.cert_file,
        &mut config.etcd_client_info.client_cert.key_file,
        &mut config.etcd_client_info.ca,
    ];

    if let Some(etcd) = &mut config.etcd_config {
        refs.push(&mut etcd.serving_info.server_cert.cert_file);
        refs.push(&mut etcd.serving_info.server_cert.key_file);
        refs.push(&mut etcd.serving_info.client_ca);
        refs.push(&mut etcd.storage_directory);
    }

    if let Some(oauth) = &mut config.oauth_config {
        refs.push(&mut oauth.proxy_ca);
    }

    if let Some(assets) = &mut config.asset_config {
        refs.push(&mut assets.serving_info.server_cert.cert_file);
        refs.push(&mut assets.serving_info.server_cert.key_file);
        refs.push(&mut assets.serving_info.client_ca);
    }

    refs.push(&mut config.master_clients.deployer_kube_config);
    refs.push(&mut config.master_clients.openshift_loopback_kube_config);
    refs.push(&mut config.master_clients.kubernetes_kube_config);
    refs
}

/// Every path-valued field of a node config
pub fn node_file_references(config: &mut NodeConfig) -> Vec<&mut String> {
    vec![
        &mut config.serving_info.server_cert.cert_file,
        &mut config.serving_info.server_cert.key_file,
        &mut config.serving_info.client_ca,
        &mut config.master_kube_config,
        &mut config.volume_directory,
    ]
}

/// Join every non-empty relative path onto `base`
pub fn resolve_paths(refs: Vec<&mut String>, base: &Path) {
    for path in refs {
        if !path.is_empty() && !Path::new(path.as_str()).is_absolute() {
            *path = base.join(path.as_str()).to_string_lossy().into_owned();
        }
    }
}

/// Rewrite every non-empty path relative to `base`
pub fn relativize_paths(refs: Vec<&mut String>, base: &Path) -> Result<()> {
    for path in refs {
        if !path.is_empty() {
            *path = relative_to(Path::new(path.as_str()), base)?
                .to_string_lossy()
                .into_owned();
        }
    }
    Ok(())
}

fn clean(path: &Path) -> Vec<Component<'_>> {
    let mut out: Vec<Component<'_>> = Vec::new();
    for c in path.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(c),
            },
            c => out.push(c),
        }
    }
    out
}

/// Lexical equivalent of `target` relative to `base`
fn relative_to(target: &Path, base: &Path) -> Result<PathBuf> {
    let err = || Error::Relativize {
        path: target.display().to_string(),
        base: base.display().to_string(),
    };
    if target.is_absolute() != base.is_absolute() {
        return Err(err());
    }
    let target_parts = clean(target);
    let base_parts = clean(base);
    let common = target_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for part in &base_parts[common..] {
        if *part == Component::ParentDir {
            return Err(err());
        }
        rel.push("..");
    }
    for part in &target_parts[common..] {
        rel.push(part.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    Ok(rel)
}

/// True when the server is configured with a serving certificate
pub fn use_tls(serving_info: &ServingInfo) -> bool {
    !serving_info.server_cert.cert_file.is_empty()
}

/// A set of DER encoded CA certificates
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CertPool {
    certs: Vec<Vec<u8>>,
}

impl CertPool {
    /// An empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a certificate unless the pool already holds it
    pub fn add_cert(&mut self, der: Vec<u8>) {
        if !self.certs.contains(&der) {
            self.certs.push(der);
        }
    }

    /// Add every certificate in a PEM bundle file.
    ///
    /// The file must hold at least one `CERTIFICATE` block.
    pub fn append_from_pem_file(&mut self, path: &Path) -> Result<()> {
        for der in certs_from_pem_file(path)? {
            self.add_cert(der);
        }
        Ok(())
    }

    /// The certificates, in insertion order
    pub fn certs(&self) -> &[Vec<u8>] {
        &self.certs
    }

    /// Number of certificates
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// True when the pool holds nothing
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}

fn certs_from_pem_file(path: &Path) -> Result<Vec<Vec<u8>>> {
    let data = std::fs::read(path).map_err(|source| Error::ReadFile {
        path: path.to_owned(),
        source,
    })?;
    let blocks = pem::parse_many(&data).map_err(|e| Error::CertificateBundle {
        path: path.to_owned(),
        reason: e.to_string(),
    })?;
    let certs = blocks
        .into_iter()
        .filter(|block| block.tag() == "CERTIFICATE")
        .map(|block| block.into_contents())
        .collect::<Vec<_>>();
    if certs.is_empty() {
        return Err(Error::CertificateBundle {
            path: path.to_owned(),
            reason: "data does not contain any valid RSA or ECDSA certificates".into(),
        });
    }
    Ok(certs)
}

fn pool_from(files: &[&str]) -> Result<CertPool> {
    let mut pool = CertPool::new();
    for file in files.iter().filter(|f| !f.is_empty()) {
        pool.append_from_pem_file(Path::new(file))?;
    }
    Ok(pool)
}

/// CAs used to verify client certificates presented to the API server
pub fn api_client_cert_ca_pool(config: &MasterConfig) -> Result<CertPool> {
    pool_from(&[&config.serving_info.client_ca])
}

/// Every CA a client certificate may chain to: the OAuth proxy CA plus the API client CAs
pub fn client_cert_ca_pool(config: &MasterConfig) -> Result<CertPool> {
    let proxy_ca = config
        .oauth_config
        .as_ref()
        .map(|oauth| oauth.proxy_ca.as_str())
        .unwrap_or_default();
    pool_from(&[proxy_ca, &config.serving_info.client_ca])
}

/// Roots for verifying the API server's own certificate
pub fn api_server_cert_ca_pool(config: &MasterConfig) -> Result<CertPool> {
    pool_from(&[&config.serving_info.client_ca])
}

/// Settings for the built-in OAuth server
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// OAuth settings copied from the master config
    pub options: OAuthConfig,
    /// Redirect URI prefixes a web console login may return to
    pub asset_public_addresses: Vec<String>,
    /// Roots for the master's serving certificate
    pub master_roots: CertPool,
}

/// Derive the OAuth server settings from a master config
pub fn build_auth_config(config: &MasterConfig) -> Result<AuthConfig> {
    let options = config.oauth_config.clone().ok_or(Error::MissingOAuthConfig)?;
    let master_roots = api_server_cert_ca_pool(config)?;
    // TODO: make the development console addresses configurable
    let asset_public_addresses = vec![
        options.asset_public_url.clone(),
        "http://localhost:9000".to_owned(),
        "https://localhost:9000".to_owned(),
    ];
    Ok(AuthConfig {
        options,
        asset_public_addresses,
        master_roots,
    })
}

/// A client for the cluster described by an explicit kubeconfig file
pub async fn kube_client(kubeconfig: &Path) -> Result<kube::Client> {
    use kube::config::{KubeConfigOptions, Kubeconfig};

    let to_err = |source| Error::Kubeconfig {
        path: kubeconfig.to_owned(),
        source,
    };
    let file = Kubeconfig::read_from(kubeconfig).map_err(to_err)?;
    let config = kube::Config::from_custom_kubeconfig(file, &KubeConfigOptions::default())
        .await
        .map_err(to_err)?;
    kube::Client::try_from(config).map_err(Error::Client)
}
