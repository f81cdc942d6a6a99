//! File-backed implementations of the engine's external sinks.
//!
//! The parameter store keeps string parameters in one JSON document so the
//! published feature flags can be retrieved by later deployment phases; the
//! manifest writer dumps the final output manifest as pretty JSON for the
//! installation phase to consume.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use forge_core::{CoreError, CoreResult, ManifestSink, OutputManifest, ParameterStore};

/// One persisted string parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredParam {
    value: String,
    description: String,
}

/// Parameter store persisted as a single JSON document.
pub struct JsonFileParameterStore {
    path: PathBuf,
}

impl JsonFileParameterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> CoreResult<BTreeMap<String, StoredParam>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                CoreError::InvalidState(format!(
                    "parameter store {} is corrupt: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(CoreError::Io(e)),
        }
    }
}

#[async_trait]
impl ParameterStore for JsonFileParameterStore {
    async fn put_string(&self, key: &str, value: &str, description: &str) -> CoreResult<()> {
        let mut params = self.read_all().await?;
        params.insert(
            key.to_string(),
            StoredParam {
                value: value.to_string(),
                description: description.to_string(),
            },
        );

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&params)
            .map_err(|e| CoreError::InvalidState(e.to_string()))?;
        tokio::fs::write(&self.path, json).await?;
        debug!("Stored parameter {} in {}", key, self.path.display());
        Ok(())
    }
}

/// Manifest writer persisting the run's outputs as pretty JSON.
pub struct JsonManifestWriter {
    path: PathBuf,
}

impl JsonManifestWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ManifestSink for JsonManifestWriter {
    async fn persist(&self, manifest: &OutputManifest) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(manifest.entries())
            .map_err(|e| CoreError::ManifestWriteFailed(e.to_string()))?;
        tokio::fs::write(&self.path, json).await?;
        debug!(
            entries = manifest.len(),
            path = %self.path.display(),
            "Persisted output manifest"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_param_store_accumulates() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileParameterStore::new(dir.path().join("params.json"));

        store
            .put_string("/cloudforge/feature/with_location", "True", "Feature")
            .await
            .unwrap();
        store
            .put_string("/cloudforge/feature/with_analytics", "False", "Feature")
            .await
            .unwrap();

        let params = store.read_all().await.unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params["/cloudforge/feature/with_location"].value, "True");
        assert_eq!(params["/cloudforge/feature/with_analytics"].value, "False");
    }

    #[tokio::test]
    async fn test_param_store_overwrites_key() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileParameterStore::new(dir.path().join("params.json"));

        store.put_string("k", "one", "").await.unwrap();
        store.put_string("k", "two", "").await.unwrap();

        let params = store.read_all().await.unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params["k"].value, "two");
    }

    #[tokio::test]
    async fn test_manifest_writer_round_trip() {
        let dir = TempDir::new().unwrap();
        let writer = JsonManifestWriter::new(dir.path().join("out").join("manifest.json"));

        let mut manifest = OutputManifest::new();
        manifest.append("api_endpoint", "https://api", "API endpoint");
        writer.persist(&manifest).await.unwrap();

        let content = tokio::fs::read_to_string(writer.path()).await.unwrap();
        let entries: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["key"], "api_endpoint");
        assert_eq!(entries[0]["value"], "https://api");
    }
}
