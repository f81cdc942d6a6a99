//! End-to-end deployment driver.
//!
//! Control flow: load and merge the configuration sources, derive the
//! namespace and stamp it back into the configuration, publish the feature
//! flags, build the dependency graph over the active component set, execute
//! it, then hand the manifest to the persistence collaborator.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use forge_config::{ConfigLoader, Namespace};

use crate::component::ComponentId;
use crate::context::RunContext;
use crate::error::{CoreError, CoreResult};
use crate::flags::{FeatureFlagRegistry, ParameterStore};
use crate::graph::DependencyGraph;
use crate::manifest::{ManifestSink, OutputManifest};
use crate::registry::BuilderRegistry;
use crate::resolver::{Resolver, RunReport};

/// A computed plan: what would be constructed, and in what order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentPlan {
    pub namespace: Namespace,
    pub active: BTreeSet<ComponentId>,
    pub order: Vec<ComponentId>,
}

/// Everything a completed run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentOutcome {
    pub namespace: Namespace,
    pub report: RunReport,
}

/// Drives a whole deployment from configuration to persisted manifest.
pub struct Orchestrator {
    registry: Arc<BuilderRegistry>,
    flags: FeatureFlagRegistry,
}

impl Orchestrator {
    pub fn new(registry: Arc<BuilderRegistry>, flags: FeatureFlagRegistry) -> Self {
        Self { registry, flags }
    }

    /// The feature flag table for this run.
    pub fn flags(&self) -> &FeatureFlagRegistry {
        &self.flags
    }

    /// Compute the plan without any side effects beyond reading the two
    /// configuration sources.
    pub async fn plan(&self, loader: &ConfigLoader) -> CoreResult<DeploymentPlan> {
        let config = loader.load().await?;
        let namespace = Namespace::derive(&config);

        let active = self.flags.active_components();
        let graph = DependencyGraph::build(&active)?;
        let order = Resolver::execution_order(&graph)?;

        Ok(DeploymentPlan {
            namespace,
            active,
            order,
        })
    }

    /// Execute a full deployment run.
    pub async fn run(
        &self,
        loader: &ConfigLoader,
        store: &dyn ParameterStore,
        sink: &dyn ManifestSink,
    ) -> CoreResult<DeploymentOutcome> {
        // Both configuration sources must resolve before anything else
        // happens; a failure here aborts with no side effects.
        let mut config = loader.load().await?;
        let namespace = Namespace::derive(&config);
        config.stamp_namespace(
            &namespace.stage,
            &namespace.unique_suffix,
            &namespace.deployment_prefix,
        );
        info!(
            prefix = %namespace.deployment_prefix,
            suffix = %namespace.unique_suffix,
            "Derived deployment namespace"
        );

        self.flags.publish_all(store).await?;

        let active = self.flags.active_components();
        let mut graph = DependencyGraph::build(&active)?;

        let resolver = Resolver::new(self.registry.clone());
        let mut ctx = RunContext::new(namespace.clone(), config);
        let mut report = resolver.run(&mut graph, &mut ctx).await?;

        append_namespace_trailer(&mut report.manifest, &namespace);

        sink.persist(&report.manifest)
            .await
            .map_err(|e| CoreError::ManifestWriteFailed(e.to_string()))?;

        Ok(DeploymentOutcome { namespace, report })
    }
}

/// Trailer entries recording the run's namespace for later phases.
fn append_namespace_trailer(manifest: &mut OutputManifest, namespace: &Namespace) {
    manifest.append(
        "uuid_suffix",
        &namespace.unique_suffix,
        "Deployment UUID suffix",
    );
    manifest.append(
        "name_prefix",
        &namespace.name_prefix,
        "Deployment name prefix",
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{FeatureFlag, FLAG_ANALYTICS, FLAG_DIRECTORY, FLAG_LOCATION, FLAG_TIMESERIES};

    #[test]
    fn test_trailer_entries() {
        let mut manifest = OutputManifest::new();
        let namespace = Namespace::derive_with_uuid(&Default::default(), "x-y-abc123");

        append_namespace_trailer(&mut manifest, &namespace);

        assert_eq!(manifest.latest("uuid_suffix"), Some("abc123"));
        assert_eq!(manifest.latest("name_prefix"), Some("iot"));
    }

    #[test]
    fn test_flags_accessor_reflects_table() {
        let flags = FeatureFlagRegistry::new(vec![
            FeatureFlag::new(FLAG_DIRECTORY, false, ""),
            FeatureFlag::new(FLAG_ANALYTICS, true, ""),
            FeatureFlag::new(FLAG_TIMESERIES, true, ""),
            FeatureFlag::new(FLAG_LOCATION, true, ""),
        ]);
        let orchestrator = Orchestrator::new(Arc::new(BuilderRegistry::new()), flags);

        assert!(!orchestrator.flags().is_enabled(FLAG_DIRECTORY));
        assert!(orchestrator.flags().is_enabled(FLAG_ANALYTICS));
    }
}
