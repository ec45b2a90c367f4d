//! Admission plugins shipped with this crate
use crate::registry::Plugins;

pub mod image;

/// Register every plugin in this crate
pub fn register_all(plugins: &Plugins) {
    image::register(plugins);
}
