use crate::DEFAULT_DOCKER_URL;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// The registry location written into dockercfg secrets.
///
/// Cloning shares the same location. The registry service controller writes it, the dockercfg
/// controller holds the lock while it creates a secret so a concurrent move waits until that
/// secret exists and can be rewritten.
#[derive(Clone, Debug)]
pub struct DockerUrl(Arc<Mutex<String>>);

impl Default for DockerUrl {
    fn default() -> Self {
        Self::new(DEFAULT_DOCKER_URL)
    }
}

impl DockerUrl {
    /// A location starting at `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self(Arc::new(Mutex::new(url.into())))
    }

    /// The current location
    pub async fn get(&self) -> String {
        self.0.lock().await.clone()
    }

    /// Replace the location, waiting for any secret creation in progress
    pub async fn set(&self, url: impl Into<String>) {
        *self.0.lock().await = url.into();
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, String> {
        self.0.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_the_location() {
        let url = DockerUrl::default();
        assert_eq!(url.get().await, DEFAULT_DOCKER_URL);
        let other = url.clone();
        other.set("172.30.0.10").await;
        assert_eq!(url.get().await, "172.30.0.10");
    }
}
