use parking_lot::Mutex;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Start/stop bookkeeping for a controller's background task
#[derive(Debug, Default)]
pub(crate) struct Lifecycle {
    running: Mutex<Option<CancellationToken>>,
}

impl Lifecycle {
    /// Spawn the future built by `work` unless a previous one is still running
    pub(crate) fn start<F>(&self, name: &'static str, work: impl FnOnce() -> F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut running = self.running.lock();
        if running.is_some() {
            debug!(controller = name, "already running");
            return;
        }
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let work = work();
        tokio::spawn(async move {
            tokio::select! {
                () = cancelled.cancelled() => info!(controller = name, "stopped"),
                () = work => info!(controller = name, "watch ended"),
            }
        });
        info!(controller = name, "started");
        *running = Some(token);
    }

    /// Signal the running task to stop; a no-op when nothing runs
    pub(crate) fn stop(&self) {
        if let Some(token) = self.running.lock().take() {
            token.cancel();
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }
}
