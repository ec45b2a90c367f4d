//! Follows the integrated registry service and moves dockercfg secrets with it
use crate::{
    dockercfg, field_selector_for_type, lifecycle::Lifecycle, DockerUrl, Options, Result,
    DEFAULT_DOCKER_URL, DOCKER_CONFIG_KEY, SECRET_TYPE_DOCKERCFG, TOKEN_SECRET_NAME,
};
use futures::StreamExt;
use k8s_openapi::{
    api::core::v1::{Secret, Service},
    ByteString,
};
use kube::{
    api::{ListParams, PostParams},
    runtime::{watcher, WatchStreamExt},
    Api, Client, ResourceExt,
};
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument, warn};

/// Watches the registry service. Whenever its address changes, the shared [`DockerUrl`] is
/// updated and every dockercfg secret created for a service account is rewritten to point
/// at the new address.
pub struct DockerRegistryServiceController {
    client: Client,
    docker_url: DockerUrl,
    namespace: String,
    service_name: String,
    lifecycle: Lifecycle,
}

impl DockerRegistryServiceController {
    /// A stopped controller for the service `service_name` in `namespace`.
    ///
    /// Service updates are only acted on when the cluster IP changes, so
    /// [`Options::resync`] has no effect.
    pub fn new(
        client: Client,
        docker_url: DockerUrl,
        namespace: &str,
        service_name: &str,
        _options: Options,
    ) -> Self {
        Self {
            client,
            docker_url,
            namespace: namespace.to_owned(),
            service_name: service_name.to_owned(),
            lifecycle: Lifecycle::default(),
        }
    }

    /// Start watching the registry service in the background
    pub fn run(&self) {
        let client = self.client.clone();
        let docker_url = self.docker_url.clone();
        let namespace = self.namespace.clone();
        let tracker = ServiceTracker::new(&self.service_name);
        self.lifecycle.start("docker-registry-service", move || {
            watch_registry_service(client, docker_url, namespace, tracker)
        });
    }

    /// Stop the background watch
    pub fn stop(&self) {
        self.lifecycle.stop();
    }
}

async fn watch_registry_service(client: Client, docker_url: DockerUrl, namespace: String, mut tracker: ServiceTracker) {
    let api = Api::<Service>::namespaced(client.clone(), &namespace);
    let cfg = watcher::Config::default().fields(&format!("metadata.name={}", tracker.name));
    let mut events = watcher(api, cfg).default_backoff().boxed();
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => {
                if let Some(location) = tracker.observe(event) {
                    if let Err(err) = location_changed(&client, &docker_url, &location).await {
                        error!(%err, %location, "failed to move dockercfg secrets");
                    }
                }
            }
            Err(err) => warn!(%err, "registry service watch failed"),
        }
    }
}

/// Where clients reach a registry service with the given cluster IP
pub fn service_location(cluster_ip: &str) -> &str {
    if cluster_ip.is_empty() || cluster_ip == "None" {
        DEFAULT_DOCKER_URL
    } else {
        cluster_ip
    }
}

fn cluster_ip(service: &Service) -> String {
    service
        .spec
        .as_ref()
        .and_then(|spec| spec.cluster_ip.clone())
        .unwrap_or_default()
}

/// Last seen cluster IP of the registry service.
///
/// Turns watch events into registry location changes: an add always moves the registry, an
/// update only when the cluster IP differs, and a delete moves it back to the default.
#[derive(Debug)]
pub(crate) struct ServiceTracker {
    name: String,
    cluster_ip: Option<String>,
    relisted: bool,
}

impl ServiceTracker {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            cluster_ip: None,
            relisted: false,
        }
    }

    /// Record `event` and return the new registry location, if it moved
    pub(crate) fn observe(&mut self, event: watcher::Event<Service>) -> Option<String> {
        match event {
            watcher::Event::Init => {
                self.relisted = false;
                None
            }
            watcher::Event::InitApply(service) | watcher::Event::Apply(service) => {
                if service.name_any() != self.name {
                    return None;
                }
                self.relisted = true;
                let ip = cluster_ip(&service);
                match self.cluster_ip.replace(ip.clone()) {
                    Some(previous) if previous == ip => None,
                    _ => Some(service_location(&ip).to_owned()),
                }
            }
            watcher::Event::InitDone => {
                // the service vanished while the watch was down
                if !self.relisted && self.cluster_ip.take().is_some() {
                    Some(DEFAULT_DOCKER_URL.to_owned())
                } else {
                    None
                }
            }
            watcher::Event::Delete(service) => {
                if service.name_any() != self.name {
                    return None;
                }
                self.cluster_ip = None;
                Some(DEFAULT_DOCKER_URL.to_owned())
            }
        }
    }
}

/// Point the shared [`DockerUrl`] and every service account dockercfg secret at `location`.
///
/// Secrets that cannot be rewritten are logged and skipped.
#[instrument(skip(client, docker_url))]
pub(crate) async fn location_changed(client: &Client, docker_url: &DockerUrl, location: &str) -> Result<()> {
    docker_url.set(location).await;
    info!("registry location changed");

    let api = Api::<Secret>::all(client.clone());
    let lp = ListParams::default().fields(&field_selector_for_type(SECRET_TYPE_DOCKERCFG));
    let secrets = api.list(&lp).await?;
    for secret in secrets
        .items
        .into_iter()
        .filter(|s| s.annotations().contains_key(TOKEN_SECRET_NAME))
    {
        let namespace = secret.namespace().unwrap_or_default();
        let name = secret.name_any();
        match relocate_secret(client, secret, location).await {
            Ok(()) => debug!(%namespace, %name, "moved dockercfg secret"),
            Err(err) => error!(%err, %namespace, %name, "failed to move dockercfg secret"),
        }
    }
    Ok(())
}

async fn relocate_secret(client: &Client, mut secret: Secret, location: &str) -> Result<()> {
    let data = secret.data.get_or_insert_with(BTreeMap::new);
    let config = dockercfg::decode(data.get(DOCKER_CONFIG_KEY).map_or(&[][..], |cfg| cfg.0.as_slice()))?;
    let config = dockercfg::relocate(config, location)?;
    data.insert(DOCKER_CONFIG_KEY.to_owned(), ByteString(dockercfg::encode(&config)?));

    let api: Api<Secret> = Api::namespaced(client.clone(), &secret.namespace().unwrap_or_default());
    api.replace(&secret.name_any(), &PostParams::default(), &secret).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{testcontext, timeout_after_1s};
    use base64::{engine::general_purpose::STANDARD, Engine};
    use http::Method;
    use serde_json::{json, Value};

    fn service(name: &str, ip: Option<&str>) -> Service {
        serde_json::from_value(json!({
            "metadata": { "name": name, "namespace": "default" },
            "spec": { "clusterIP": ip },
        }))
        .unwrap()
    }

    #[test]
    fn headless_and_missing_ips_use_the_default() {
        assert_eq!(service_location(""), DEFAULT_DOCKER_URL);
        assert_eq!(service_location("None"), DEFAULT_DOCKER_URL);
        assert_eq!(service_location("172.30.0.5"), "172.30.0.5");
    }

    #[test]
    fn tracker_reports_moves_only() {
        let mut tracker = ServiceTracker::new("docker-registry");
        let add = watcher::Event::Apply(service("docker-registry", Some("172.30.0.5")));
        assert_eq!(tracker.observe(add), Some("172.30.0.5".into()));

        let same = watcher::Event::Apply(service("docker-registry", Some("172.30.0.5")));
        assert_eq!(tracker.observe(same), None);

        let other = watcher::Event::Apply(service("router", Some("172.30.0.9")));
        assert_eq!(tracker.observe(other), None);

        let moved = watcher::Event::Apply(service("docker-registry", Some("172.30.0.6")));
        assert_eq!(tracker.observe(moved), Some("172.30.0.6".into()));

        let deleted = watcher::Event::Delete(service("docker-registry", Some("172.30.0.6")));
        assert_eq!(tracker.observe(deleted), Some(DEFAULT_DOCKER_URL.into()));

        let headless = watcher::Event::Apply(service("docker-registry", None));
        assert_eq!(tracker.observe(headless), Some(DEFAULT_DOCKER_URL.into()));
    }

    #[test]
    fn relist_without_the_service_counts_as_delete() {
        let mut tracker = ServiceTracker::new("docker-registry");
        tracker.observe(watcher::Event::Apply(service("docker-registry", Some("172.30.0.5"))));
        assert_eq!(tracker.observe(watcher::Event::Init), None);
        assert_eq!(tracker.observe(watcher::Event::InitDone), Some(DEFAULT_DOCKER_URL.into()));

        // relisting an unchanged service is quiet
        tracker.observe(watcher::Event::Apply(service("docker-registry", Some("172.30.0.5"))));
        tracker.observe(watcher::Event::Init);
        let relisted = watcher::Event::InitApply(service("docker-registry", Some("172.30.0.5")));
        assert_eq!(tracker.observe(relisted), None);
        assert_eq!(tracker.observe(watcher::Event::InitDone), None);
    }

    fn dockercfg_secret(name: &str, token: Option<&str>, cfg: &str) -> Value {
        let mut annotations = json!({});
        if let Some(token) = token {
            annotations["openshift.io/token-secret.name"] = json!(token);
        }
        json!({
            "metadata": { "name": name, "namespace": "myproject", "annotations": annotations },
            "type": "kubernetes.io/dockercfg",
            "data": { ".dockercfg": STANDARD.encode(cfg) },
        })
    }

    #[tokio::test]
    async fn location_change_rewrites_managed_secrets() {
        let (client, mut server) = testcontext();
        let docker_url = DockerUrl::default();
        let single = r#"{"docker-registry.default.svc.cluster.local":{"username":"serviceaccount","password":"t","email":"serviceaccount@example.org","auth":"x"}}"#;
        let double = r#"{"a":{"username":"u","password":"p","email":"e"},"b":{"username":"u","password":"p","email":"e"}}"#;

        let scenario = tokio::spawn(async move {
            let list = server.expect(Method::GET, "/api/v1/secrets").await;
            assert!(list.query.contains("fieldSelector=type%3Dkubernetes.io%2Fdockercfg"));
            list.respond(json!({
                "kind": "SecretList",
                "apiVersion": "v1",
                "metadata": {},
                "items": [
                    dockercfg_secret("managed", Some("builder-token-a"), single),
                    dockercfg_secret("unmanaged", None, single),
                    dockercfg_secret("two-registries", Some("builder-token-b"), double),
                    dockercfg_secret("garbage", Some("builder-token-c"), "{"),
                ]
            }));

            let update = server
                .expect(Method::PUT, "/api/v1/namespaces/myproject/secrets/managed")
                .await;
            let raw = STANDARD
                .decode(update.body["data"][".dockercfg"].as_str().unwrap())
                .unwrap();
            let cfg: Value = serde_json::from_slice(&raw).unwrap();
            assert_eq!(cfg["172.30.0.5"]["password"], "t");
            assert_eq!(cfg.as_object().unwrap().len(), 1);
            let updated = update.body.clone();
            update.respond(updated);
        });

        location_changed(&client, &docker_url, "172.30.0.5").await.unwrap();
        assert_eq!(docker_url.get().await, "172.30.0.5");
        timeout_after_1s(scenario).await;
    }
}
