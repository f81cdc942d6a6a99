//! # forge_config
//!
//! Configuration resolution for CloudForge deployments.
//!
//! This crate owns the front of the provisioning pipeline: loading the two
//! externally supplied configuration documents, merging them into one
//! effective configuration (overlay wins on collision), and deriving the
//! deployment namespace that disambiguates every resource name in a run.
//!
//! # Example
//!
//! ```rust,ignore
//! use forge_config::{ConfigLoader, Namespace};
//!
//! let loader = ConfigLoader::from_env()?;
//! let mut config = loader.load().await?;
//!
//! let namespace = Namespace::derive(&config);
//! config.stamp_namespace(
//!     &namespace.stage,
//!     &namespace.unique_suffix,
//!     &namespace.deployment_prefix,
//! );
//! ```

pub mod error;
pub mod loader;
pub mod merge;
pub mod namespace;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, BOOTSTRAP_FILE, DEFAULTS_FILE_ENV, PROFILE_DIR_ENV};
pub use merge::{EffectiveConfig, KEY_PREFIX, KEY_STAGE, KEY_UUID};
pub use namespace::{
    Namespace, NamespaceField, DEFAULT_NAME_PREFIX, DEFAULT_STAGE, UUID_SENTINEL,
};
