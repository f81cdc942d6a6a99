//! Deployment namespace derivation.
//!
//! Every resource created during a run carries the deployment prefix and a
//! short unique suffix so that independent builds can coexist in the same
//! account without name collisions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::merge::EffectiveConfig;

/// Default name prefix when the configuration does not supply one.
pub const DEFAULT_NAME_PREFIX: &str = "iot";

/// Default stage when the configuration does not supply one.
pub const DEFAULT_STAGE: &str = "dev";

/// Sentinel suffix if UUID generation yields an empty trailing segment.
pub const UUID_SENTINEL: &str = "BADUUID";

/// The deployment-scoped namespace, computed once per run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Namespace {
    /// Name prefix appended to every resource (`name_prefix` key or "iot").
    pub name_prefix: String,
    /// Deployment stage label (`stage` key or "dev").
    pub stage: String,
    /// Short random suffix, stable for the duration of the run.
    pub unique_suffix: String,
    /// `name_prefix + "_" + stage`.
    pub deployment_prefix: String,
}

/// Namespace fields addressable from component input declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamespaceField {
    NamePrefix,
    Stage,
    UniqueSuffix,
    DeploymentPrefix,
}

impl Namespace {
    /// Derive the namespace from the merged configuration.
    ///
    /// Never fails. The unique suffix is the last dash-delimited segment of
    /// a freshly generated UUID-v4, generated exactly once per run, so it is
    /// not deterministic across runs.
    pub fn derive(config: &EffectiveConfig) -> Self {
        Self::derive_with_uuid(config, &Uuid::new_v4().to_string())
    }

    /// Derivation with a caller-supplied UUID string (exercised by tests).
    pub fn derive_with_uuid(config: &EffectiveConfig, long_uuid: &str) -> Self {
        let name_prefix = match config.get_str("name_prefix") {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => DEFAULT_NAME_PREFIX.to_string(),
        };
        let stage = match config.get_str("stage") {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => DEFAULT_STAGE.to_string(),
        };

        let last_part = long_uuid.split('-').next_back().unwrap_or("");
        let unique_suffix = if last_part.is_empty() {
            UUID_SENTINEL.to_string()
        } else {
            last_part.to_string()
        };

        let deployment_prefix = format!("{}_{}", name_prefix, stage);

        Self {
            name_prefix,
            stage,
            unique_suffix,
            deployment_prefix,
        }
    }

    /// Read a namespace field by its addressable name.
    pub fn field(&self, field: NamespaceField) -> &str {
        match field {
            NamespaceField::NamePrefix => &self.name_prefix,
            NamespaceField::Stage => &self.stage,
            NamespaceField::UniqueSuffix => &self.unique_suffix,
            NamespaceField::DeploymentPrefix => &self.deployment_prefix,
        }
    }
}

impl std::fmt::Display for NamespaceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NamespaceField::NamePrefix => "name_prefix",
            NamespaceField::Stage => "stage",
            NamespaceField::UniqueSuffix => "unique_suffix",
            NamespaceField::DeploymentPrefix => "deployment_prefix",
        };
        write!(f, "{}", s)
    }
}
