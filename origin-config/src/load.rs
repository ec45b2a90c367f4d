//! Reading and writing config files
use crate::{
    error::{Error, Result},
    helpers::{master_file_references, node_file_references, relativize_paths, resolve_paths},
    types::{LdapSyncConfig, MasterConfig, NodeConfig},
};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

/// Decode a YAML or JSON file
pub fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
        path: path.to_owned(),
        source,
    })?;
    serde_yaml::from_str(&data).map_err(|source| Error::Parse {
        path: path.to_owned(),
        source,
    })
}

fn write_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let data = serde_yaml::to_string(value).map_err(Error::Serialize)?;
    std::fs::write(path, data).map_err(|source| Error::WriteFile {
        path: path.to_owned(),
        source,
    })
}

fn base_dir(path: &Path) -> Result<PathBuf> {
    let abs = std::path::absolute(path).map_err(|source| Error::ReadFile {
        path: path.to_owned(),
        source,
    })?;
    Ok(abs.parent().map(Path::to_path_buf).unwrap_or_default())
}

/// Load a master config; relative file references are resolved against the file's directory
pub fn read_master_config(path: &Path) -> Result<MasterConfig> {
    let mut config: MasterConfig = read_file(path)?;
    resolve_paths(master_file_references(&mut config), &base_dir(path)?);
    tracing::debug!(path = %path.display(), "loaded master config");
    Ok(config)
}

/// Load a node config; relative file references are resolved against the file's directory
pub fn read_node_config(path: &Path) -> Result<NodeConfig> {
    let mut config: NodeConfig = read_file(path)?;
    resolve_paths(node_file_references(&mut config), &base_dir(path)?);
    tracing::debug!(path = %path.display(), "loaded node config");
    Ok(config)
}

/// Load an LDAP sync config
pub fn read_ldap_sync_config(path: &Path) -> Result<LdapSyncConfig> {
    read_file(path)
}

/// Write a master config with file references relative to the destination directory
pub fn write_master_config(config: &MasterConfig, path: &Path) -> Result<()> {
    let mut config = config.clone();
    relativize_paths(master_file_references(&mut config), &base_dir(path)?)?;
    write_file(&config, path)
}

/// Write a node config with file references relative to the destination directory
pub fn write_node_config(config: &NodeConfig, path: &Path) -> Result<()> {
    let mut config = config.clone();
    relativize_paths(node_file_references(&mut config), &base_dir(path)?)?;
    write_file(&config, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_config_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node-config.yaml");
        std::fs::write(
            &path,
            r#"
nodeName: node1
masterKubeConfig: node.kubeconfig
volumeDirectory: /var/lib/origin/volumes
servingInfo:
  bindAddress: 0.0.0.0:10250
  certFile: server.crt
  keyFile: server.key
"#,
        )
        .unwrap();

        let config = read_node_config(&path).unwrap();
        assert_eq!(config.node_name, "node1");
        assert_eq!(
            Path::new(&config.master_kube_config),
            dir.path().join("node.kubeconfig")
        );
        assert_eq!(config.volume_directory, "/var/lib/origin/volumes");
        assert_eq!(config.serving_info.client_ca, "");

        let out = dir.path().join("written.yaml");
        write_node_config(&config, &out).unwrap();
        let raw: serde_yaml::Value = serde_yaml::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(raw["masterKubeConfig"].as_str(), Some("node.kubeconfig"));
        assert_eq!(raw["servingInfo"]["certFile"].as_str(), Some("server.crt"));
    }

    #[test]
    fn json_master_config_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master-config.json");
        std::fs::write(
            &path,
            r#"{"servingInfo": {"bindAddress": "0.0.0.0:8443"}, "oauthConfig": {"masterURL": "https://m:8443", "proxyCA": "proxy.crt"}}"#,
        )
        .unwrap();
        let config = read_master_config(&path).unwrap();
        assert_eq!(config.serving_info.bind_address, "0.0.0.0:8443");
        let oauth = config.oauth_config.unwrap();
        assert_eq!(Path::new(&oauth.proxy_ca), dir.path().join("proxy.crt"));
        assert!(config.etcd_config.is_none());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_ldap_sync_config(Path::new("/nonexistent/sync.yaml")).unwrap_err();
        assert!(err.to_string().starts_with("could not read file /nonexistent/sync.yaml"));
    }
}
