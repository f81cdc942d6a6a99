//! Configuration source loading.
//!
//! The two sources are JSON documents resolved from the process environment:
//! the deployment profile (`bootstrap.json` inside the directory named by
//! `FORGE_PROFILE_DIR`) and the release defaults file named by
//! `FORGE_DEFAULTS_FILE`. Both must load before provisioning can start;
//! failure of either is fatal to the whole run.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::EffectiveConfig;

/// Environment variable naming the deployment profile directory.
pub const PROFILE_DIR_ENV: &str = "FORGE_PROFILE_DIR";

/// Environment variable naming the release defaults document.
pub const DEFAULTS_FILE_ENV: &str = "FORGE_DEFAULTS_FILE";

/// Profile document filename inside the profile directory.
pub const BOOTSTRAP_FILE: &str = "bootstrap.json";

/// Loader for the two configuration sources.
pub struct ConfigLoader {
    bootstrap_path: PathBuf,
    defaults_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve source paths from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        let profile_dir = env::var(PROFILE_DIR_ENV)
            .map_err(|_| ConfigError::MissingEnv(PROFILE_DIR_ENV.to_string()))?;
        let defaults_path = env::var(DEFAULTS_FILE_ENV)
            .map_err(|_| ConfigError::MissingEnv(DEFAULTS_FILE_ENV.to_string()))?;

        Ok(Self {
            bootstrap_path: Path::new(&profile_dir).join(BOOTSTRAP_FILE),
            defaults_path: PathBuf::from(defaults_path),
        })
    }

    /// Build a loader with explicit source paths.
    pub fn new(bootstrap_path: impl Into<PathBuf>, defaults_path: impl Into<PathBuf>) -> Self {
        Self {
            bootstrap_path: bootstrap_path.into(),
            defaults_path: defaults_path.into(),
        }
    }

    /// Path of the profile document (`bootstrap.json`).
    pub fn bootstrap_path(&self) -> &Path {
        &self.bootstrap_path
    }

    /// Path of the defaults document.
    pub fn defaults_path(&self) -> &Path {
        &self.defaults_path
    }

    /// Load both sources and merge them, defaults over profile.
    ///
    /// The profile document is the base and the defaults document is the
    /// overlay, so a key present in the defaults file wins.
    pub async fn load(&self) -> ConfigResult<EffectiveConfig> {
        let base = read_document(&self.bootstrap_path).await?;
        let overlay = read_document(&self.defaults_path).await?;
        debug!(
            base = %self.bootstrap_path.display(),
            overlay = %self.defaults_path.display(),
            "Merged configuration sources"
        );
        Ok(EffectiveConfig::merge(base, overlay))
    }
}

/// Read one JSON object document into a key/value mapping.
async fn read_document(path: &Path) -> ConfigResult<BTreeMap<String, Value>> {
    let display = path.display().to_string();

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;

    let value: Value = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
        path: display.clone(),
        message: e.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(ConfigError::NotAnObject(display)),
    }
}
