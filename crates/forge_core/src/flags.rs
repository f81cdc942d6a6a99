//! Feature flags and their publication to the persisted parameter store.
//!
//! Each optional component is gated by one boolean flag. Flag values come
//! from static per-release constants, not from the effective configuration;
//! later deployment phases retrieve them from the parameter store under
//! `<root>/feature/<name>`.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::component::ComponentId;
use crate::error::{CoreError, CoreResult};

/// Root path for persisted feature parameters.
pub const FEATURE_PARAM_ROOT: &str = "/cloudforge";

/// Flag gating the directory/authentication component.
pub const FLAG_DIRECTORY: &str = "with_directory";

/// Flag gating the wide-column analytics store.
pub const FLAG_ANALYTICS: &str = "with_analytics";

/// Flag gating the time-series store.
pub const FLAG_TIMESERIES: &str = "with_timeseries";

/// Flag for location awareness. Publishes only; gates no component.
pub const FLAG_LOCATION: &str = "with_location";

/// Whether the post-deployment cleanup step participates in the build.
/// A release constant like the flags; off in this release.
pub const RUN_CLEANUP_STEP: bool = false;

/// One named boolean switch controlling an optional component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlag {
    pub name: String,
    pub enabled: bool,
    pub description: String,
}

impl FeatureFlag {
    pub fn new(name: impl Into<String>, enabled: bool, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled,
            description: description.into(),
        }
    }

    /// Parameter store key for this flag.
    pub fn param_key(&self) -> String {
        format!("{}/feature/{}", FEATURE_PARAM_ROOT, self.name)
    }

    /// String-typed parameter value, `"True"` or `"False"`.
    pub fn param_value(&self) -> &'static str {
        if self.enabled {
            "True"
        } else {
            "False"
        }
    }
}

/// Write-only persisted key/value sink for string parameters.
///
/// External collaborator; a write failure is fatal to the run since later
/// deployment phases depend on complete published state.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn put_string(&self, key: &str, value: &str, description: &str) -> CoreResult<()>;
}

/// The ordered feature flag table for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlagRegistry {
    flags: Vec<FeatureFlag>,
}

impl FeatureFlagRegistry {
    /// The static per-release flag table.
    pub fn release_defaults() -> Self {
        Self::new(vec![
            FeatureFlag::new(FLAG_DIRECTORY, true, "Feature: with directory"),
            FeatureFlag::new(FLAG_ANALYTICS, true, "Feature: with analytics store"),
            FeatureFlag::new(FLAG_TIMESERIES, true, "Feature: with timeseries store"),
            FeatureFlag::new(FLAG_LOCATION, true, "Feature: with location"),
        ])
    }

    /// Build a registry from an explicit table. Exists so a
    /// configuration-driven table can be swapped in without touching the
    /// publish or active-set logic.
    pub fn new(flags: Vec<FeatureFlag>) -> Self {
        Self { flags }
    }

    /// All flags in table order.
    pub fn flags(&self) -> &[FeatureFlag] {
        &self.flags
    }

    /// Whether a named flag is enabled. Unknown names are disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.flags
            .iter()
            .any(|flag| flag.name == name && flag.enabled)
    }

    /// Publish every flag, enabled or not, exactly once.
    pub async fn publish_all(&self, store: &dyn ParameterStore) -> CoreResult<()> {
        for flag in &self.flags {
            store
                .put_string(&flag.param_key(), flag.param_value(), &flag.description)
                .await
                .map_err(|e| CoreError::FlagPublishFailed {
                    flag: flag.name.clone(),
                    message: e.to_string(),
                })?;
            info!("Published feature flag {} = {}", flag.name, flag.param_value());
        }
        Ok(())
    }

    /// The components participating in this run: every structurally
    /// mandatory component, each optional component whose flag is enabled,
    /// and the cleanup step when the release enables it.
    pub fn active_components(&self) -> BTreeSet<ComponentId> {
        let mut active = BTreeSet::new();
        for id in ComponentId::catalog() {
            let included = match id {
                ComponentId::Directory => self.is_enabled(FLAG_DIRECTORY),
                ComponentId::AnalyticsStore => self.is_enabled(FLAG_ANALYTICS),
                ComponentId::TimeseriesStore => self.is_enabled(FLAG_TIMESERIES),
                ComponentId::Cleanup => RUN_CLEANUP_STEP,
                _ => id.is_mandatory(),
            };
            if included {
                active.insert(*id);
            }
        }
        active
    }
}
