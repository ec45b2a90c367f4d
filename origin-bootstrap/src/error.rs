//! Error handling in [`origin-bootstrap`][crate]
use std::{path::PathBuf, process::ExitStatus};
use thiserror::Error;

/// Possible errors when bootstrapping
#[derive(Error, Debug)]
pub enum Error {
    /// The container runtime could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// The executable
        program: String,
        /// The underlying io error
        #[source]
        source: std::io::Error,
    },

    /// The container exited unsuccessfully
    #[error("container run failed ({status}): {stderr}")]
    Run {
        /// Exit status of the runtime
        status: ExitStatus,
        /// What the container wrote to stderr
        stderr: String,
    },

    /// No image was given to a [`Runner`](crate::Runner)
    #[error("no image specified")]
    MissingImage,

    /// A directory could not be created
    #[error("could not create directory {}: {source}", .path.display())]
    CreateDir {
        /// The directory
        path: PathBuf,
        /// The underlying io error
        #[source]
        source: std::io::Error,
    },

    /// Progress output could not be written
    #[error("failed to write output: {0}")]
    Output(#[source] std::io::Error),

    /// Generating the initial node configuration failed
    #[error("could not create OpenShift configuration: {0}")]
    NodeConfig(#[source] Box<Error>),
}

/// Convenient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
