//! Admission control for OpenShift custom resources.
//!
//! Plugins implement [`ValidationInterface`] and are looked up by name in a [`Plugins`]
//! registry. [`CustomResourceValidator`] adapts per-object validation functions to the
//! create/update/status-update protocol, and [`webhook`] exposes the enabled plugins as a
//! Kubernetes validating admission webhook.
#![deny(unsafe_code)]

pub mod attributes;
pub mod customresource;
pub mod error;
pub mod interfaces;
pub mod plugins;
pub mod registry;
pub mod webhook;

pub use attributes::{Attributes, GroupResource};
pub use customresource::{require_name_cluster, CustomResourceValidator, ObjectValidator};
pub use error::{Error, Result};
pub use interfaces::{Handler, Interface, ValidationInterface};
pub use registry::Plugins;

/// A registry holding every plugin in this crate
pub fn default_plugins() -> Plugins {
    let plugins = Plugins::new();
    plugins::register_all(&plugins);
    plugins
}
