//! Process-wide behaviour controlled through the environment
//!
//! - `OPENSHIFT_ON_PANIC=crash` logs a panic and exits with status 2
//! - `GOMAXPROCS` caps the number of runtime worker threads
//! - `OPENSHIFT_PROFILE` is accepted but profiling is not available
use std::num::NonZeroUsize;
use tracing::{error, warn};

/// Exit status of a process that crashed on panic
pub const CRASH_EXIT_CODE: i32 = 2;

/// Install the panic behaviour selected by `mode`
///
/// Returns whether a hook was installed.
pub fn behavior_on_panic(mode: &str) -> bool {
    if mode != "crash" {
        return false;
    }
    std::panic::set_hook(Box::new(|info| {
        error!("{info}");
        eprintln!("{info}");
        std::process::exit(CRASH_EXIT_CODE);
    }));
    true
}

/// Worker threads for a `GOMAXPROCS` value; every CPU when unset or unusable
pub fn worker_threads(max_procs: Option<&str>) -> usize {
    match max_procs.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => match value.parse::<NonZeroUsize>() {
            Ok(n) => n.get(),
            Err(_) => {
                warn!(value, "ignoring invalid GOMAXPROCS");
                cpus()
            }
        },
        None => cpus(),
    }
}

fn cpus() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Acknowledge a profiling request
pub fn profile(mode: &str) {
    if !mode.is_empty() {
        warn!(mode, "profiling is not supported, ignoring OPENSHIFT_PROFILE");
    }
}

/// Apply every setting from the environment and build the runtime the binaries run on
pub fn runtime_from_env() -> std::io::Result<tokio::runtime::Runtime> {
    let var = |name: &str| std::env::var(name).unwrap_or_default();
    behavior_on_panic(&var("OPENSHIFT_ON_PANIC"));
    profile(&var("OPENSHIFT_PROFILE"));
    let max_procs = std::env::var("GOMAXPROCS").ok();
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads(max_procs.as_deref()))
        .enable_all()
        .build()
}
