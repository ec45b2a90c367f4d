//! Helpers used by `oc cluster up` style bootstrapping.
//!
//! - [`Runner`] builds and runs one-shot `docker run` invocations
//! - [`config_dir`] picks the directory a component keeps its configuration in
//! - [`NodeStartConfig`] generates an initial node configuration inside the node image
#![deny(unsafe_code)]

pub mod dir;
pub mod error;
pub mod kubelet;
pub mod run;

pub use dir::config_dir;
pub use error::{Error, Result};
pub use kubelet::NodeStartConfig;
pub use run::Runner;
