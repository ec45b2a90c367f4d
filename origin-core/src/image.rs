//! The cluster-wide image configuration, `images.config.openshift.io`
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Cluster-wide settings for how images are imported and pulled.
///
/// There is a single instance of this resource and it must be named `cluster`.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[kube(
    group = "config.openshift.io",
    version = "v1",
    kind = "Image",
    plural = "images",
    status = "ImageStatus",
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    /// Registries that normal users may import images from
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_registries_for_import: Vec<RegistryLocation>,
    /// Hostnames under which the internal registry is reachable from outside
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_registry_hostnames: Vec<String>,
    /// ConfigMap in `openshift-config` holding additional trusted CAs
    #[serde(default)]
    pub additional_trusted_ca: ConfigMapNameReference,
    /// Registry access rules for individual image pulls
    #[serde(default)]
    pub registry_sources: RegistrySources,
}

/// A registry domain and whether it may be reached without TLS
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryLocation {
    /// Registry domain, optionally with a port
    pub domain_name: String,
    /// Allow plain http or unverified https
    #[serde(default)]
    pub insecure: bool,
}

/// Reference to a ConfigMap by name
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ConfigMapNameReference {
    /// ConfigMap name
    #[serde(default)]
    pub name: String,
}

/// Registry allow and deny lists
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySources {
    /// Registries that do not have a valid TLS certificate or only speak http
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub insecure_registries: Vec<String>,
    /// Registries that may not be pulled from
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_registries: Vec<String>,
    /// The only registries that may be pulled from
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_registries: Vec<String>,
}

/// Observed image configuration
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageStatus {
    /// Hostname of the internal registry as seen from inside the cluster
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub internal_registry_hostname: String,
    /// Hostnames of the internal registry as seen from outside the cluster
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_registry_hostnames: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::Resource;

    #[test]
    fn image_is_a_cluster_scoped_config_resource() {
        assert_eq!(Image::api_version(&()), "config.openshift.io/v1");
        assert_eq!(Image::plural(&()), "images");
        assert_eq!(Image::url_path(&(), None), "/apis/config.openshift.io/v1/images");
    }

    #[test]
    fn decodes_from_yaml() {
        let image: Image = serde_yaml::from_str(
            r#"
apiVersion: config.openshift.io/v1
kind: Image
metadata:
  name: cluster
spec:
  externalRegistryHostnames: ["registry.example.com"]
  registrySources:
    insecureRegistries: ["insecure.example.com:5000"]
"#,
        )
        .unwrap();
        assert_eq!(image.metadata.name.as_deref(), Some("cluster"));
        assert_eq!(image.spec.external_registry_hostnames, vec!["registry.example.com"]);
        assert_eq!(image.spec.registry_sources.insecure_registries.len(), 1);
        assert!(image.status.is_none());
    }
}
