//! Error types for the provisioning engine.
//!
//! Every error here is unrecoverable within the engine: an infrastructure
//! build is either fully planned and executed, or the run is reported as
//! failed to its caller. There is no retry, rollback or partial-success
//! handling in this layer.

use thiserror::Error;

use crate::component::ComponentId;

/// Result type alias for engine operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while planning or executing a deployment.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("No builder registered for component: {0}")]
    BuilderNotFound(ComponentId),

    #[error("Dangling dependency: {node} input '{input}' references inactive component {source}")]
    DanglingDependency {
        node: ComponentId,
        input: String,
        source: ComponentId,
    },

    #[error("Construction order conflict: {0}")]
    OrderConflict(String),

    #[error("Component construction failed: {component} - {message}")]
    BuildFailed {
        component: ComponentId,
        message: String,
    },

    #[error("Component {source} produced no output '{key}' required by {node}")]
    MissingOutput {
        node: ComponentId,
        source: ComponentId,
        key: String,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Feature flag publish failed: {flag} - {message}")]
    FlagPublishFailed { flag: String, message: String },

    #[error("Manifest write failed: {0}")]
    ManifestWriteFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] forge_config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
