use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by [`Builder::build`](crate::Builder::build).
///
/// Every variant is terminal: the build stops at the first failure and no
/// partially merged configuration is returned.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot build configuration from a nil default")]
    NilSource,

    #[error("failed to read config file '{}': {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file '{}': {source}", path.display())]
    FileParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value in config file '{}': {source}", path.display())]
    FileValue {
        path: PathBuf,
        #[source]
        source: FieldError,
    },

    #[error("failed to load environment files: {0}")]
    EnvFiles(#[source] io::Error),

    #[error("failed to override configuration from environment: {0}")]
    Coercion(#[from] CoercionError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// A single environment value that could not be converted into its field's type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind} value {value:?} for {key} (field `{field}`): {reason}")]
pub struct CoercionError {
    /// Rust field path, e.g. `database.port`
    pub field: String,
    /// Full environment key including the prefix
    pub key: String,
    /// Raw value found in the environment
    pub value: String,
    /// Semantic kind of the destination field
    pub kind: &'static str,
    pub reason: String,
}

/// A value from a config file that does not fit its field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field `{field}`: {reason}")]
pub struct FieldError {
    /// Rust field path, e.g. `server.timeout`
    pub field: String,
    pub reason: String,
}

/// Result type alias for configuration builds
pub type Result<T> = std::result::Result<T, ConfigError>;
