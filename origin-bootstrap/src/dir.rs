//! Per-component configuration directories
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Base for temporary config dirs; Docker for Mac can only mount from `/tmp`
fn temp_base() -> PathBuf {
    if cfg!(target_os = "macos") {
        PathBuf::from("/tmp")
    } else {
        std::env::temp_dir()
    }
}

/// The directory `component` keeps its configuration in
///
/// With a `host_dir` this is `host_dir/component`, created if missing. Otherwise a fresh
/// temporary directory named `component-*` is created and left in place for the caller.
pub fn config_dir(host_dir: Option<&Path>, component: &str) -> Result<PathBuf> {
    if let Some(host_dir) = host_dir.filter(|d| !d.as_os_str().is_empty()) {
        let path = host_dir.join(component);
        std::fs::create_dir_all(&path).map_err(|source| Error::CreateDir {
            path: path.clone(),
            source,
        })?;
        return Ok(path);
    }
    let base = temp_base();
    tempfile::Builder::new()
        .prefix(&format!("{component}-"))
        .tempdir_in(&base)
        .map(tempfile::TempDir::keep)
        .map_err(|source| Error::CreateDir { path: base, source })
}
