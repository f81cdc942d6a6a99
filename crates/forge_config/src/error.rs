//! Error types for configuration resolution.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while resolving the effective configuration.
///
/// Every variant is fatal: no component construction can be correctly
/// parameterized without both configuration sources.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable not set: {0}")]
    MissingEnv(String),

    #[error("Failed to read configuration source {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration source {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Configuration source {0} is not a JSON object")]
    NotAnObject(String),
}
