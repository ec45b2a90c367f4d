//! Admission failures
use origin_core::field::ErrorList;
use thiserror::Error;

/// Why a request was rejected, or why a plugin could not be built
#[derive(Error, Debug)]
pub enum Error {
    /// The object failed validation
    #[error("{kind} {name:?} is invalid: {errors}")]
    Invalid {
        /// `Kind.group` of the object
        kind: String,
        /// Object name
        name: String,
        /// Every field problem found
        errors: ErrorList,
    },

    /// The request is not permitted at all
    #[error("{resource} {name:?} is forbidden: {reason}")]
    Forbidden {
        /// `resource.group` being acted on
        resource: String,
        /// Object name
        name: String,
        /// Why
        reason: String,
    },

    /// The request is missing data a plugin needs
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No plugin is registered under this name
    #[error("unknown admission plugin: {0}")]
    UnknownPlugin(String),

    /// A plugin rejected its configuration
    #[error("invalid configuration for admission plugin {plugin}: {reason}")]
    PluginConfig {
        /// Plugin name
        plugin: String,
        /// What was wrong
        reason: String,
    },
}

impl Error {
    /// HTTP status code the API server would answer with
    pub fn code(&self) -> u16 {
        match self {
            Error::Invalid { .. } => 422,
            Error::Forbidden { .. } => 403,
            Error::BadRequest(_) => 400,
            Error::UnknownPlugin(_) | Error::PluginConfig { .. } => 500,
        }
    }
}

/// Convenient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;
