//! Component model: identifiers, attribute references, nodes and the
//! builder trait implemented by external provisioning collaborators.
//!
//! A component is one named infrastructure subsystem. The engine never
//! creates cloud resources itself; it resolves each component's inputs and
//! hands them to a registered [`ComponentBuilder`], which returns the named
//! outputs the rest of the graph consumes.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use forge_config::NamespaceField;

use crate::context::BuildContext;
use crate::error::CoreResult;

/// The fixed catalog of components a deployment can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentId {
    /// Identity and access roles consumed by everything else.
    AccessControl,
    /// Directory and user authentication pool.
    Directory,
    /// Network isolation layer the datastores live inside.
    Network,
    /// Object storage buckets for static assets.
    Storage,
    /// Shared runtime layer used by all compute units.
    RuntimeLayer,
    /// Bootstrap compute unit used during setup and teardown.
    BootstrapCompute,
    /// Wide-column analytics store for raw telemetry.
    AnalyticsStore,
    /// Primary relational datastore.
    PrimaryDatastore,
    /// Time-series store fed by messaging rules.
    TimeseriesStore,
    /// The compute-layer fleet and its API surface.
    ComputeLayer,
    /// Optional post-deployment cleanup step.
    Cleanup,
}

/// Construction phases enforcing the fixed partial order.
///
/// Capability providers complete before the datastores, the datastores
/// before the compute layer, the compute layer before cleanup. This
/// convention is what breaks the known compute-layer/messaging-rule cycle:
/// the compute layer is always constructed after everything that provides
/// capability to it and before anything that targets it. The reverse data
/// need (the compute layer consuming a not-yet-created messaging endpoint)
/// is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Foundation,
    Datastores,
    Compute,
    Cleanup,
}

impl ComponentId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentId::AccessControl => "access-control",
            ComponentId::Directory => "directory",
            ComponentId::Network => "network",
            ComponentId::Storage => "storage",
            ComponentId::RuntimeLayer => "runtime-layer",
            ComponentId::BootstrapCompute => "bootstrap-compute",
            ComponentId::AnalyticsStore => "analytics-store",
            ComponentId::PrimaryDatastore => "primary-datastore",
            ComponentId::TimeseriesStore => "timeseries-store",
            ComponentId::ComputeLayer => "compute-layer",
            ComponentId::Cleanup => "cleanup",
        }
    }

    /// The full catalog in declaration order. This order doubles as the
    /// deterministic tie-break when two components are ready at once.
    pub fn catalog() -> &'static [ComponentId] {
        &[
            ComponentId::AccessControl,
            ComponentId::Directory,
            ComponentId::Network,
            ComponentId::Storage,
            ComponentId::RuntimeLayer,
            ComponentId::BootstrapCompute,
            ComponentId::AnalyticsStore,
            ComponentId::PrimaryDatastore,
            ComponentId::TimeseriesStore,
            ComponentId::ComputeLayer,
            ComponentId::Cleanup,
        ]
    }

    /// Position in the catalog, used as the deterministic tie-break.
    pub fn catalog_index(&self) -> usize {
        Self::catalog()
            .iter()
            .position(|c| c == self)
            .unwrap_or(usize::MAX)
    }

    /// Construction phase this component belongs to.
    pub fn phase(&self) -> Phase {
        match self {
            ComponentId::AccessControl
            | ComponentId::Directory
            | ComponentId::Network
            | ComponentId::Storage
            | ComponentId::RuntimeLayer
            | ComponentId::BootstrapCompute => Phase::Foundation,
            ComponentId::AnalyticsStore
            | ComponentId::PrimaryDatastore
            | ComponentId::TimeseriesStore => Phase::Datastores,
            ComponentId::ComputeLayer => Phase::Compute,
            ComponentId::Cleanup => Phase::Cleanup,
        }
    }

    /// Whether the component is structurally mandatory.
    ///
    /// Mandatory components have no feature flag; there is no switch to
    /// disable access roles or the network layer.
    pub fn is_mandatory(&self) -> bool {
        matches!(
            self,
            ComponentId::AccessControl
                | ComponentId::Network
                | ComponentId::Storage
                | ComponentId::RuntimeLayer
                | ComponentId::BootstrapCompute
                | ComponentId::PrimaryDatastore
                | ComponentId::ComputeLayer
        )
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Required because `CoreError` variants carry a field named `source`, which
// thiserror treats as the error source and therefore must implement `Error`.
impl std::error::Error for ComponentId {}

/// Reference to a construction input: a literal drawn from the effective
/// configuration or namespace, or another component's published output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeRef {
    /// Pass-through value from the effective configuration.
    Config(String),
    /// Field of the derived deployment namespace.
    Namespace(NamespaceField),
    /// Named output of another component.
    Output { source: ComponentId, key: String },
}

impl AttributeRef {
    pub fn config(key: impl Into<String>) -> Self {
        Self::Config(key.into())
    }

    pub fn namespace(field: NamespaceField) -> Self {
        Self::Namespace(field)
    }

    pub fn output(source: ComponentId, key: impl Into<String>) -> Self {
        Self::Output {
            source,
            key: key.into(),
        }
    }

    /// The component this reference depends on, if any.
    pub fn source(&self) -> Option<ComponentId> {
        match self {
            AttributeRef::Output { source, .. } => Some(*source),
            _ => None,
        }
    }
}

/// One named output published by a constructed component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputValue {
    pub key: String,
    pub value: String,
    pub description: String,
}

/// Ordered set of outputs returned by a component builder.
///
/// Order is preserved so the manifest reflects the order outputs were
/// published in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentOutputs {
    values: Vec<OutputValue>,
}

impl ComponentOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an output value.
    pub fn push(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        description: impl Into<String>,
    ) {
        self.values.push(OutputValue {
            key: key.into(),
            value: value.into(),
            description: description.into(),
        });
    }

    /// Builder-style append.
    pub fn with(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.push(key, value, description);
        self
    }

    /// Look up an output value by key (last write wins).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .rev()
            .find(|v| v.key == key)
            .map(|v| v.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputValue> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A node in the dependency graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentNode {
    pub id: ComponentId,
    /// Declared construction inputs, keyed by input name.
    pub inputs: BTreeMap<String, AttributeRef>,
    /// Components that must be fully constructed before this one.
    pub depends_on: BTreeSet<ComponentId>,
    /// Outputs, populated exactly once when construction succeeds.
    pub outputs: Option<ComponentOutputs>,
}

impl ComponentNode {
    pub fn new(id: ComponentId) -> Self {
        Self {
            id,
            inputs: BTreeMap::new(),
            depends_on: BTreeSet::new(),
            outputs: None,
        }
    }

    pub fn is_constructed(&self) -> bool {
        self.outputs.is_some()
    }
}

/// Trait implemented by the external collaborator that actually creates a
/// component's cloud resources.
///
/// A builder is invoked with the derived namespace, the effective
/// configuration and the resolved values of its declared inputs, and
/// returns its own named outputs. That is the entire contract the engine
/// requires from every concrete component implementation.
#[async_trait]
pub trait ComponentBuilder: Send + Sync {
    /// The component this builder constructs.
    fn id(&self) -> ComponentId;

    /// Human-readable description of what gets created.
    fn description(&self) -> &str;

    /// Create the component's resources.
    ///
    /// Construction is assumed side-effecting and not safely concurrent
    /// with its peers; the resolver calls builders strictly sequentially.
    async fn build(&self, ctx: &BuildContext<'_>) -> CoreResult<ComponentOutputs>;
}

impl std::fmt::Debug for dyn ComponentBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ComponentBuilder({})", self.id())
    }
}
