//! The output manifest: every attribute published during a run, in order.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;

/// One published attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub key: String,
    pub value: String,
    pub description: String,
}

/// Ordered, append-only collection of published outputs.
///
/// The engine performs no uniqueness validation: appending an existing key
/// again overwrites it in consumer-visible order, and consumers take the
/// last value for a key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputManifest {
    entries: Vec<ManifestEntry>,
}

impl OutputManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry.
    pub fn append(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        description: impl Into<String>,
    ) {
        self.entries.push(ManifestEntry {
            key: key.into(),
            value: value.into(),
            description: description.into(),
        });
    }

    /// All entries in append order.
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// The effective value for a key: the last one appended.
    pub fn latest(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Write-only destination for the final manifest, consumed by a later
/// installation phase. External collaborator; a write failure is fatal.
#[async_trait]
pub trait ManifestSink: Send + Sync {
    async fn persist(&self, manifest: &OutputManifest) -> CoreResult<()>;
}
