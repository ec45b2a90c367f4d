//! Gives every service account a dockercfg pull secret for the integrated registry
use crate::{
    dockercfg, lifecycle::Lifecycle, DockerUrl, Error, Options, Result, DOCKER_CONFIG_KEY,
    SECRET_TYPE_DOCKERCFG, SECRET_TYPE_SERVICE_ACCOUNT_TOKEN, SERVICE_ACCOUNT_TOKEN_KEY,
    TOKEN_SECRET_NAME,
};
use futures::StreamExt;
use k8s_openapi::{
    api::core::v1::{LocalObjectReference, ObjectReference, Secret, ServiceAccount},
    apimachinery::pkg::apis::meta::v1::ObjectMeta,
    ByteString,
};
use kube::{
    api::{DeleteParams, PostParams},
    runtime::{
        controller::{self, Action},
        watcher, Controller,
    },
    Api, Client, ResourceExt,
};
use origin_core::annotations::{SERVICE_ACCOUNT_NAME, SERVICE_ACCOUNT_UID};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    time::Duration,
};
use tracing::{debug, error, instrument, warn};

const DOCKERCFG_INFIX: &str = "-dockercfg-";
const TOKEN_INFIX: &str = "-token-";
// generateName appends five random characters and names are capped at 63
const MAX_NAME_LENGTH: usize = 63;
const RANDOM_LENGTH: usize = 5;
const MAX_SERVICE_ACCOUNT_NAME_LENGTH: usize = MAX_NAME_LENGTH - RANDOM_LENGTH - DOCKERCFG_INFIX.len();

const TOKEN_POLL_ATTEMPTS: usize = 21;
const TOKEN_POLL_INTERVAL: Duration = Duration::from_millis(100);

fn usable_name_prefix(name: &str) -> &str {
    match name.char_indices().nth(MAX_SERVICE_ACCOUNT_NAME_LENGTH) {
        Some((end, _)) => &name[..end],
        None => name,
    }
}

/// Name prefix of the dockercfg secrets generated for a service account
pub fn dockercfg_secret_prefix(service_account: &str) -> String {
    format!("{}{DOCKERCFG_INFIX}", usable_name_prefix(service_account))
}

/// Name prefix of the token secrets generated for a service account
pub fn token_secret_prefix(service_account: &str) -> String {
    format!("{}{TOKEN_INFIX}", usable_name_prefix(service_account))
}

pub(crate) struct Context {
    client: Client,
    docker_url: DockerUrl,
    resync: Option<Duration>,
}

impl Context {
    pub(crate) fn new(client: Client, docker_url: DockerUrl, resync: Option<Duration>) -> Self {
        Self {
            client,
            docker_url,
            resync,
        }
    }
}

/// Watches all service accounts and makes sure each links exactly one generated dockercfg
/// secret, both as a mountable secret and as an image pull secret.
pub struct DockercfgController {
    client: Client,
    docker_url: DockerUrl,
    options: Options,
    lifecycle: Lifecycle,
}

impl DockercfgController {
    /// A stopped controller writing secrets for the registry in `docker_url`
    pub fn new(client: Client, docker_url: DockerUrl, options: Options) -> Self {
        Self {
            client,
            docker_url,
            options,
            lifecycle: Lifecycle::default(),
        }
    }

    /// The registry location this controller writes
    pub fn docker_url(&self) -> &DockerUrl {
        &self.docker_url
    }

    /// Start watching service accounts in the background
    pub fn run(&self) {
        let api = Api::<ServiceAccount>::all(self.client.clone());
        let ctx = Arc::new(Context::new(
            self.client.clone(),
            self.docker_url.clone(),
            self.options.resync,
        ));
        self.lifecycle.start("dockercfg", move || {
            Controller::new(api, watcher::Config::default())
                .run(reconcile, error_policy, ctx)
                .for_each(|res| async move {
                    match res {
                        Ok((obj, _)) => debug!(%obj, "reconciled"),
                        Err(controller::Error::ReconcilerFailed(..)) => {}
                        Err(err) => warn!(%err, "controller error"),
                    }
                })
        });
    }

    /// Stop the background watch
    pub fn stop(&self) {
        self.lifecycle.stop();
    }
}

pub(crate) fn requeue(resync: Option<Duration>) -> Action {
    resync.map_or_else(Action::await_change, Action::requeue)
}

#[instrument(skip(sa, ctx), fields(namespace = %sa.namespace().unwrap_or_default(), name = %sa.name_any()))]
async fn reconcile(sa: Arc<ServiceAccount>, ctx: Arc<Context>) -> Result<Action> {
    ensure_dockercfg_secret(&ctx, &sa).await?;
    Ok(requeue(ctx.resync))
}

fn error_policy(sa: Arc<ServiceAccount>, err: &Error, ctx: Arc<Context>) -> Action {
    error!(%err, service_account = %sa.name_any(), "failed to ensure dockercfg secret");
    requeue(ctx.resync)
}

enum Link {
    Current,
    Stale,
}

/// Link a dockercfg secret to `sa`, creating one when none is referenced
pub(crate) async fn ensure_dockercfg_secret(ctx: &Context, sa: &ServiceAccount) -> Result<()> {
    let name = sa.metadata.name.as_deref().ok_or(Error::MissingObjectKey(".metadata.name"))?;
    let ns = sa
        .metadata
        .namespace
        .as_deref()
        .ok_or(Error::MissingObjectKey(".metadata.namespace"))?;
    let prefix = dockercfg_secret_prefix(name);

    let pull_secret = sa
        .image_pull_secrets
        .iter()
        .flatten()
        .map(|r| r.name.as_str())
        .find(|n| n.starts_with(&prefix));
    let mountable_secret = sa
        .secrets
        .iter()
        .flatten()
        .filter_map(|r| r.name.as_deref())
        .find(|n| n.starts_with(&prefix));

    match (pull_secret, mountable_secret) {
        (Some(_), Some(_)) => return Ok(()),
        (Some(existing), None) | (None, Some(existing)) => {
            return match add_references(ctx, sa, existing).await {
                Ok(_) => Ok(()),
                // the account changed under us, its update event comes next
                Err(err) if err.is_conflict() => Ok(()),
                Err(err) => Err(err),
            };
        }
        (None, None) => {}
    }

    let secrets: Api<Secret> = Api::namespaced(ctx.client.clone(), ns);
    let created = create_dockercfg_secret(ctx, &secrets, sa, name).await?;
    let created_name = created.name_any();
    let link = add_references(ctx, sa, &created_name).await;
    match link {
        Ok(Link::Current) => Ok(()),
        Err(err) if !err.is_conflict() => Err(err),
        Ok(Link::Stale) | Err(_) => {
            // the token secret goes away through the token deletion controller
            if let Err(err) = secrets.delete(&created_name, &DeleteParams::default()).await {
                error!(%err, secret = %created_name, "failed to delete unreferenced dockercfg secret");
            }
            Ok(())
        }
    }
}

fn secret_names(sa: &ServiceAccount) -> (BTreeSet<String>, BTreeSet<String>) {
    let mountable = sa.secrets.iter().flatten().filter_map(|r| r.name.clone()).collect();
    let pull = sa.image_pull_secrets.iter().flatten().map(|r| r.name.clone()).collect();
    (mountable, pull)
}

/// Reference `secret_name` as a mountable and pull secret of the live version of `cached`
async fn add_references(ctx: &Context, cached: &ServiceAccount, secret_name: &str) -> Result<Link> {
    let api: Api<ServiceAccount> = Api::namespaced(ctx.client.clone(), &cached.namespace().unwrap_or_default());
    let mut live = api.get(&cached.name_any()).await?;

    let live_names = secret_names(&live);
    if live_names != secret_names(cached) {
        debug!(
            decided_at = ?cached.resource_version(),
            live = ?live.resource_version(),
            "cannot add reference based on stale data"
        );
        return Ok(Link::Stale);
    }
    let (mountable, pull) = live_names;

    let mut changed = false;
    if !mountable.contains(secret_name) {
        live.secrets.get_or_insert_with(Vec::new).push(ObjectReference {
            name: Some(secret_name.to_owned()),
            ..ObjectReference::default()
        });
        changed = true;
    }
    if !pull.contains(secret_name) {
        live.image_pull_secrets
            .get_or_insert_with(Vec::new)
            .push(LocalObjectReference {
                name: secret_name.to_owned(),
            });
        changed = true;
    }

    if changed {
        api.replace(&live.name_any(), &PostParams::default(), &live).await?;
    }
    Ok(Link::Current)
}

fn owner_annotations(sa: &ServiceAccount, name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (SERVICE_ACCOUNT_NAME.to_owned(), name.to_owned()),
        (SERVICE_ACCOUNT_UID.to_owned(), sa.uid().unwrap_or_default()),
    ])
}

/// Create a token secret for `sa` and wait for the token controller to fill it in
async fn create_token_secret(secrets: &Api<Secret>, sa: &ServiceAccount, name: &str) -> Result<Secret> {
    let token_secret = Secret {
        metadata: ObjectMeta {
            generate_name: Some(token_secret_prefix(name)),
            namespace: sa.namespace(),
            annotations: Some(owner_annotations(sa, name)),
            ..ObjectMeta::default()
        },
        type_: Some(SECRET_TYPE_SERVICE_ACCOUNT_TOKEN.to_owned()),
        data: Some(BTreeMap::new()),
        ..Secret::default()
    };
    let created = secrets.create(&PostParams::default(), &token_secret).await?;
    let token_name = created.name_any();

    for _ in 0..TOKEN_POLL_ATTEMPTS {
        let live = secrets.get(&token_name).await?;
        if live
            .data
            .as_ref()
            .is_some_and(|data| data.contains_key(SERVICE_ACCOUNT_TOKEN_KEY))
        {
            return Ok(live);
        }
        tokio::time::sleep(TOKEN_POLL_INTERVAL).await;
    }

    if let Err(err) = secrets.delete(&token_name, &DeleteParams::default()).await {
        error!(%err, secret = %token_name, "failed to delete token secret");
    }
    Err(Error::TokenNeverGenerated(token_name))
}

/// Create a dockercfg secret carrying a fresh token of `sa`
async fn create_dockercfg_secret(
    ctx: &Context,
    secrets: &Api<Secret>,
    sa: &ServiceAccount,
    name: &str,
) -> Result<Secret> {
    let token_secret = create_token_secret(secrets, sa, name).await?;
    let token = token_secret
        .data
        .as_ref()
        .and_then(|data| data.get(SERVICE_ACCOUNT_TOKEN_KEY))
        .map(|token| String::from_utf8_lossy(&token.0).into_owned())
        .unwrap_or_default();

    let mut annotations = owner_annotations(sa, name);
    annotations.insert(TOKEN_SECRET_NAME.to_owned(), token_secret.name_any());

    // the registry may not move until this secret exists
    let registry = ctx.docker_url.lock().await;
    let config = dockercfg::encode(&dockercfg::service_account_config(&registry, &token))?;
    let dockercfg_secret = Secret {
        metadata: ObjectMeta {
            generate_name: Some(dockercfg_secret_prefix(name)),
            namespace: sa.namespace(),
            annotations: Some(annotations),
            ..ObjectMeta::default()
        },
        type_: Some(SECRET_TYPE_DOCKERCFG.to_owned()),
        data: Some(BTreeMap::from([(DOCKER_CONFIG_KEY.to_owned(), ByteString(config))])),
        ..Secret::default()
    };
    let created = secrets.create(&PostParams::default(), &dockercfg_secret).await?;
    drop(registry);
    Ok(created)
}
