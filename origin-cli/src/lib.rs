//! Shared pieces of the Origin command line tools.
//!
//! The binaries in `src/bin` are thin: they parse flags with `clap`, set up logging and the
//! runtime through [`logging`] and [`serviceability`], and call into the modules here or
//! into the library crates of the workspace.
#![deny(unsafe_code)]

pub mod commit_parse;
pub mod error;
pub mod logging;
pub mod serviceability;
pub mod sync_groups;
pub mod util;

pub use error::{Error, Result};
