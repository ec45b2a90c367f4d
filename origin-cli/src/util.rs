//! Small path and argument helpers shared by the commands
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Resources this tool can address as `type/name`, with the spellings accepted for each
const RESOURCES: &[(&str, &[&str])] = &[
    ("groups", &["groups", "group"]),
    ("users", &["users", "user"]),
];

/// `path` made absolute against `base`, or against the working directory when `base` is empty
pub fn make_abs(path: &Path, base: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }
    let base = if base.as_os_str().is_empty() {
        std::env::current_dir()?
    } else {
        base.to_owned()
    };
    Ok(base.join(path))
}

/// The absolute form of `path` for messages, or `path` itself if that fails
pub fn display_filename(path: &str) -> String {
    std::path::absolute(path)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| path.to_owned())
}

/// Split `type/name` into the canonical resource and the name.
///
/// A bare name belongs to `default_resource`.
pub fn resolve_resource(default_resource: &str, resource: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = resource.split('/').collect();
    match parts.as_slice() {
        [name] => Ok((default_resource.to_owned(), (*name).to_owned())),
        [kind, name] => {
            let kind_lower = kind.to_ascii_lowercase();
            let (canonical, _) = RESOURCES
                .iter()
                .find(|(_, names)| names.contains(&kind_lower.as_str()))
                .ok_or_else(|| Error::UnknownResource((*kind).to_owned()))?;
            Ok(((*canonical).to_owned(), (*name).to_owned()))
        }
        _ => Err(Error::InvalidResourceFormat(resource.to_owned())),
    }
}
