//! Removes the dockercfg secret of a token secret that was deleted
use crate::{
    field_selector_for_type, lifecycle::Lifecycle, Options, Result, SECRET_TYPE_DOCKERCFG,
    SECRET_TYPE_SERVICE_ACCOUNT_TOKEN, TOKEN_SECRET_NAME,
};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{DeleteParams, ListParams},
    runtime::{watcher, WatchStreamExt},
    Api, Client, ResourceExt,
};
use std::collections::BTreeSet;
use tracing::{error, info, instrument, warn};

/// Watches service account token secrets. When one is deleted, the dockercfg secret whose
/// `openshift.io/token-secret.name` annotation names it is deleted too.
///
/// Only deletions matter here, so [`Options::resync`] has no effect.
pub struct DockercfgTokenDeletedController {
    client: Client,
    lifecycle: Lifecycle,
}

impl DockercfgTokenDeletedController {
    /// A stopped controller
    pub fn new(client: Client, _options: Options) -> Self {
        Self {
            client,
            lifecycle: Lifecycle::default(),
        }
    }

    /// Start watching token secrets in the background
    pub fn run(&self) {
        let client = self.client.clone();
        self.lifecycle.start("dockercfg-token-deleted", move || watch_token_secrets(client));
    }

    /// Stop the background watch
    pub fn stop(&self) {
        self.lifecycle.stop();
    }
}

async fn watch_token_secrets(client: Client) {
    let api = Api::<Secret>::all(client.clone());
    let cfg = watcher::Config::default().fields(&field_selector_for_type(SECRET_TYPE_SERVICE_ACCOUNT_TOKEN));
    let mut known = KnownTokens::default();
    let mut events = watcher(api, cfg).default_backoff().boxed();
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => {
                for token in known.observe(event) {
                    if let Err(err) = token_deleted(&client, &token).await {
                        error!(%err, namespace = %token.namespace, token = %token.name, "failed to clean up dockercfg secret");
                    }
                }
            }
            Err(err) => warn!(%err, "token secret watch failed"),
        }
    }
}

/// Namespace and name of a token secret
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct TokenRef {
    pub(crate) namespace: String,
    pub(crate) name: String,
}

impl From<&Secret> for TokenRef {
    fn from(secret: &Secret) -> Self {
        Self {
            namespace: secret.namespace().unwrap_or_default(),
            name: secret.name_any(),
        }
    }
}

/// Token secrets seen so far.
///
/// A re-list replaces the set; anything missing from the new list was deleted while the watch
/// was down.
#[derive(Debug, Default)]
pub(crate) struct KnownTokens {
    current: BTreeSet<TokenRef>,
    relist: Option<BTreeSet<TokenRef>>,
}

impl KnownTokens {
    /// Record `event` and return the tokens it shows as deleted
    pub(crate) fn observe(&mut self, event: watcher::Event<Secret>) -> Vec<TokenRef> {
        match event {
            watcher::Event::Apply(secret) => {
                self.current.insert(TokenRef::from(&secret));
                Vec::new()
            }
            watcher::Event::Delete(secret) => {
                let token = TokenRef::from(&secret);
                self.current.remove(&token);
                vec![token]
            }
            watcher::Event::Init => {
                self.relist = Some(BTreeSet::new());
                Vec::new()
            }
            watcher::Event::InitApply(secret) => {
                self.relist.get_or_insert_with(BTreeSet::new).insert(TokenRef::from(&secret));
                Vec::new()
            }
            watcher::Event::InitDone => {
                let listed = self.relist.take().unwrap_or_default();
                let previous = std::mem::replace(&mut self.current, listed);
                previous.difference(&self.current).cloned().collect()
            }
        }
    }
}

/// Delete the dockercfg secret that carries the token of `token`, if any
#[instrument(skip(client))]
pub(crate) async fn token_deleted(client: &Client, token: &TokenRef) -> Result<()> {
    let api: Api<Secret> = Api::namespaced(client.clone(), &token.namespace);
    let lp = ListParams::default().fields(&field_selector_for_type(SECRET_TYPE_DOCKERCFG));
    let candidates = api.list(&lp).await?;
    let Some(dockercfg) = candidates
        .items
        .iter()
        .find(|s| s.annotations().get(TOKEN_SECRET_NAME) == Some(&token.name))
    else {
        return Ok(());
    };

    let name = dockercfg.name_any();
    match api.delete(&name, &DeleteParams::default()).await {
        Ok(_) => {
            info!(secret = %name, "deleted dockercfg secret of removed token");
            Ok(())
        }
        Err(kube::Error::Api(resp)) if resp.code == 404 => Ok(()),
        Err(err) => Err(err.into()),
    }
}
