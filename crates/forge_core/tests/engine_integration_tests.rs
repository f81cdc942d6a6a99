//! End-to-end engine scenarios: graph execution, failure isolation and the
//! full orchestrated run against file-backed configuration sources.

use std::collections::BTreeSet;
use std::fs;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use forge_config::ConfigLoader;
use forge_core::{
    BuildContext, BuilderRegistry, ComponentBuilder, ComponentId, ComponentOutputs, CoreError,
    CoreResult, DependencyGraph, FeatureFlag, FeatureFlagRegistry, ManifestSink, OutputManifest,
    Orchestrator, ParameterStore, Resolver, RunContext, FLAG_ANALYTICS, FLAG_DIRECTORY,
    FLAG_LOCATION, FLAG_TIMESERIES,
};

/// Builder that records its invocation and returns canned outputs.
struct ScriptedBuilder {
    id: ComponentId,
    outputs: ComponentOutputs,
    fail: bool,
    invocations: Arc<Mutex<Vec<ComponentId>>>,
}

#[async_trait]
impl ComponentBuilder for ScriptedBuilder {
    fn id(&self) -> ComponentId {
        self.id
    }

    fn description(&self) -> &str {
        "Scripted builder"
    }

    async fn build(&self, _ctx: &BuildContext<'_>) -> CoreResult<ComponentOutputs> {
        self.invocations.lock().unwrap().push(self.id);
        if self.fail {
            return Err(CoreError::InvalidState("provisioning rejected".to_string()));
        }
        Ok(self.outputs.clone())
    }
}

struct Harness {
    registry: BuilderRegistry,
    invocations: Arc<Mutex<Vec<ComponentId>>>,
}

impl Harness {
    fn new() -> Self {
        Self {
            registry: BuilderRegistry::new(),
            invocations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with_builder(mut self, id: ComponentId, outputs: ComponentOutputs) -> Self {
        self.registry.register(Arc::new(ScriptedBuilder {
            id,
            outputs,
            fail: false,
            invocations: self.invocations.clone(),
        }));
        self
    }

    fn with_failing_builder(mut self, id: ComponentId) -> Self {
        self.registry.register(Arc::new(ScriptedBuilder {
            id,
            outputs: ComponentOutputs::new(),
            fail: true,
            invocations: self.invocations.clone(),
        }));
        self
    }

    fn invoked(&self) -> Vec<ComponentId> {
        self.invocations.lock().unwrap().clone()
    }
}

fn run_context() -> RunContext {
    let config = forge_config::EffectiveConfig::default();
    let namespace = forge_config::Namespace::derive_with_uuid(&config, "0-0-cafe");
    RunContext::new(namespace, config)
}

fn graph_of(ids: &[ComponentId]) -> DependencyGraph {
    let active: BTreeSet<ComponentId> = ids.iter().copied().collect();
    DependencyGraph::build(&active).unwrap()
}

#[tokio::test]
async fn network_then_datastore_end_to_end() {
    let harness = Harness::new()
        .with_builder(
            ComponentId::Network,
            ComponentOutputs::new()
                .with("isolation_group", "vpc-42", "Isolation group")
                .with("security_group", "sg-42", "Security group"),
        )
        .with_builder(
            ComponentId::PrimaryDatastore,
            ComponentOutputs::new().with("db_endpoint", "db.internal", "Database endpoint"),
        );

    let resolver = Resolver::new(Arc::new(harness.registry));
    let mut graph = graph_of(&[ComponentId::Network, ComponentId::PrimaryDatastore]);
    let mut ctx = run_context();

    let report = resolver.run(&mut graph, &mut ctx).await.unwrap();

    assert_eq!(
        report.order,
        vec![ComponentId::Network, ComponentId::PrimaryDatastore]
    );
    let keys: Vec<&str> = report
        .manifest
        .entries()
        .iter()
        .map(|e| e.key.as_str())
        .collect();
    assert_eq!(keys, vec!["isolation_group", "security_group", "db_endpoint"]);
    assert_eq!(report.manifest.latest("db_endpoint"), Some("db.internal"));
}

#[tokio::test]
async fn failed_component_blocks_dependents() {
    // access-control fails; network (ordering-dependent) and the
    // datastore behind it must never be attempted.
    let harness = Harness::new()
        .with_failing_builder(ComponentId::AccessControl)
        .with_builder(
            ComponentId::Network,
            ComponentOutputs::new().with("isolation_group", "vpc-1", ""),
        )
        .with_builder(
            ComponentId::PrimaryDatastore,
            ComponentOutputs::new().with("db_endpoint", "db", ""),
        );
    let invoked = harness.invocations.clone();

    let resolver = Resolver::new(Arc::new(harness.registry));
    let mut graph = graph_of(&[
        ComponentId::AccessControl,
        ComponentId::Network,
        ComponentId::PrimaryDatastore,
    ]);
    let mut ctx = run_context();

    let err = resolver.run(&mut graph, &mut ctx).await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::BuildFailed {
            component: ComponentId::AccessControl,
            ..
        }
    ));
    assert_eq!(*invoked.lock().unwrap(), vec![ComponentId::AccessControl]);
    assert_eq!(ctx.constructed_count(), 0);
    assert!(!graph.node(ComponentId::Network).unwrap().is_constructed());
}

#[tokio::test]
async fn dangling_reference_constructs_nothing() {
    let active: BTreeSet<ComponentId> = [ComponentId::ComputeLayer].into_iter().collect();
    let err = DependencyGraph::build(&active).unwrap_err();
    assert!(matches!(err, CoreError::DanglingDependency { .. }));
}

#[derive(Default)]
struct MemoryStore {
    writes: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ParameterStore for MemoryStore {
    async fn put_string(&self, key: &str, value: &str, _description: &str) -> CoreResult<()> {
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct MemorySink {
    persisted: Mutex<Option<OutputManifest>>,
}

#[async_trait]
impl ManifestSink for MemorySink {
    async fn persist(&self, manifest: &OutputManifest) -> CoreResult<()> {
        *self.persisted.lock().unwrap() = Some(manifest.clone());
        Ok(())
    }
}

fn write_config_sources(dir: &TempDir) -> ConfigLoader {
    let bootstrap = dir.path().join("bootstrap.json");
    fs::write(
        &bootstrap,
        r#"{"name_prefix": "acme", "stage": "qa", "db_name": "forge"}"#,
    )
    .unwrap();
    let defaults = dir.path().join("defaults.json");
    fs::write(&defaults, r#"{"log_level": "info", "region": "us-east-1"}"#).unwrap();
    ConfigLoader::new(bootstrap, defaults)
}

/// Flag table with only the analytics store enabled, so the active set is
/// small enough to wire builders for by hand.
fn minimal_flags() -> FeatureFlagRegistry {
    FeatureFlagRegistry::new(vec![
        FeatureFlag::new(FLAG_DIRECTORY, false, "Feature: with directory"),
        FeatureFlag::new(FLAG_ANALYTICS, true, "Feature: with analytics store"),
        FeatureFlag::new(FLAG_TIMESERIES, false, "Feature: with timeseries store"),
        FeatureFlag::new(FLAG_LOCATION, true, "Feature: with location"),
    ])
}

fn full_harness() -> Harness {
    Harness::new()
        .with_builder(
            ComponentId::AccessControl,
            ComponentOutputs::new().with("runtime_role", "role-1", "Runtime role"),
        )
        .with_builder(
            ComponentId::Network,
            ComponentOutputs::new()
                .with("isolation_group", "vpc-9", "Isolation group")
                .with("security_group", "sg-9", "Security group"),
        )
        .with_builder(
            ComponentId::Storage,
            ComponentOutputs::new().with("asset_bucket", "bucket-9", "Asset bucket"),
        )
        .with_builder(
            ComponentId::RuntimeLayer,
            ComponentOutputs::new().with("layer_ref", "layer-9", "Runtime layer"),
        )
        .with_builder(
            ComponentId::BootstrapCompute,
            ComponentOutputs::new().with("messaging_endpoint", "mqtt.local", "Endpoint"),
        )
        .with_builder(
            ComponentId::AnalyticsStore,
            ComponentOutputs::new().with("table_name", "telemetry", "Analytics table"),
        )
        .with_builder(
            ComponentId::PrimaryDatastore,
            ComponentOutputs::new().with("db_endpoint", "db.local", "Database endpoint"),
        )
        .with_builder(
            ComponentId::ComputeLayer,
            ComponentOutputs::new().with("api_endpoint", "https://api", "API endpoint"),
        )
}

#[tokio::test]
async fn orchestrated_run_publishes_flags_and_manifest() {
    let dir = TempDir::new().unwrap();
    let loader = write_config_sources(&dir);
    let harness = full_harness();
    let invoked = harness.invocations.clone();

    let orchestrator = Orchestrator::new(Arc::new(harness.registry), minimal_flags());
    let store = MemoryStore::default();
    let sink = MemorySink::default();

    let outcome = orchestrator.run(&loader, &store, &sink).await.unwrap();

    assert_eq!(outcome.namespace.deployment_prefix, "acme_qa");

    // Every flag published exactly once, enabled or not.
    let writes = store.writes.lock().unwrap();
    assert_eq!(writes.len(), 4);
    assert!(writes.contains(&(
        "/cloudforge/feature/with_directory".to_string(),
        "False".to_string()
    )));
    assert!(writes.contains(&(
        "/cloudforge/feature/with_analytics".to_string(),
        "True".to_string()
    )));

    // Flag-gated components stayed out of the build.
    let order = invoked.lock().unwrap();
    assert!(!order.contains(&ComponentId::Directory));
    assert!(!order.contains(&ComponentId::TimeseriesStore));
    assert!(order.contains(&ComponentId::AnalyticsStore));

    // Persisted manifest carries component outputs plus the trailer.
    let persisted = sink.persisted.lock().unwrap();
    let manifest = persisted.as_ref().unwrap();
    assert_eq!(manifest.latest("api_endpoint"), Some("https://api"));
    assert_eq!(manifest.latest("name_prefix"), Some("acme"));
    assert!(manifest.latest("uuid_suffix").is_some());
}

#[tokio::test]
async fn orchestrated_plan_has_no_side_effects() {
    let dir = TempDir::new().unwrap();
    let loader = write_config_sources(&dir);
    let harness = full_harness();
    let invoked = harness.invocations.clone();

    let orchestrator = Orchestrator::new(Arc::new(harness.registry), minimal_flags());
    let plan = orchestrator.plan(&loader).await.unwrap();

    assert_eq!(plan.namespace.deployment_prefix, "acme_qa");
    assert!(plan.active.contains(&ComponentId::AnalyticsStore));
    assert!(!plan.active.contains(&ComponentId::Directory));
    assert_eq!(plan.order.first(), Some(&ComponentId::AccessControl));
    assert_eq!(plan.order.last(), Some(&ComponentId::ComputeLayer));
    assert!(invoked.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_config_source_aborts_before_flags() {
    let dir = TempDir::new().unwrap();
    let loader = ConfigLoader::new(
        dir.path().join("absent-bootstrap.json"),
        dir.path().join("absent-defaults.json"),
    );

    let orchestrator = Orchestrator::new(Arc::new(BuilderRegistry::new()), minimal_flags());
    let store = MemoryStore::default();
    let sink = MemorySink::default();

    let err = orchestrator.run(&loader, &store, &sink).await.unwrap_err();
    assert!(matches!(err, CoreError::Config(_)));
    assert!(store.writes.lock().unwrap().is_empty());
    assert!(sink.persisted.lock().unwrap().is_none());
}
