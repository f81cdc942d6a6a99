//! Dependency graph construction from the static component catalog.
//!
//! Data edges are inferred automatically wherever a node's declared inputs
//! reference another node's outputs; ordering edges are asserted explicitly
//! for sequencing constraints that exist outside data flow (access roles
//! must exist before the network layer is provisioned even though the
//! network consumes none of their outputs).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use forge_config::NamespaceField;

use crate::component::{AttributeRef, ComponentId, ComponentNode};
use crate::error::{CoreError, CoreResult};

/// Kind of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// One node's construction input is literally another node's output.
    Data,
    /// Sequencing constraint unrelated to data flow.
    Ordering,
}

/// A declared input in the static catalog.
struct InputSpec {
    name: &'static str,
    reference: AttributeRef,
    /// Optional inputs are dropped, not dangling, when their source
    /// component's flag is off.
    optional: bool,
}

impl InputSpec {
    fn required(name: &'static str, reference: AttributeRef) -> Self {
        Self {
            name,
            reference,
            optional: false,
        }
    }

    fn optional(name: &'static str, reference: AttributeRef) -> Self {
        Self {
            name,
            reference,
            optional: true,
        }
    }
}

/// Ordering-only edge rules: `(from, to)` pairs where `from` must be fully
/// constructed before `to` starts, for reasons outside data flow.
const ORDERING_RULES: &[(ComponentId, ComponentId)] = &[
    (ComponentId::AccessControl, ComponentId::Network),
    (ComponentId::AccessControl, ComponentId::Directory),
    (ComponentId::Directory, ComponentId::BootstrapCompute),
    (ComponentId::AccessControl, ComponentId::ComputeLayer),
    (ComponentId::Network, ComponentId::Cleanup),
    (ComponentId::Directory, ComponentId::Cleanup),
    (ComponentId::PrimaryDatastore, ComponentId::Cleanup),
    (ComponentId::ComputeLayer, ComponentId::Cleanup),
];

/// Declared construction inputs for each component in the catalog.
fn catalog_inputs(id: ComponentId) -> Vec<InputSpec> {
    use AttributeRef as Ref;
    use ComponentId::*;

    match id {
        AccessControl => vec![
            InputSpec::required(
                "deployment_prefix",
                Ref::namespace(NamespaceField::DeploymentPrefix),
            ),
            InputSpec::required("unique_suffix", Ref::namespace(NamespaceField::UniqueSuffix)),
        ],
        Directory => vec![
            InputSpec::required(
                "deployment_prefix",
                Ref::namespace(NamespaceField::DeploymentPrefix),
            ),
            InputSpec::required("use_sso", Ref::config("use_sso")),
        ],
        Network => vec![
            InputSpec::required(
                "deployment_prefix",
                Ref::namespace(NamespaceField::DeploymentPrefix),
            ),
            InputSpec::required("unique_suffix", Ref::namespace(NamespaceField::UniqueSuffix)),
        ],
        Storage => vec![
            InputSpec::required(
                "deployment_prefix",
                Ref::namespace(NamespaceField::DeploymentPrefix),
            ),
            InputSpec::required("unique_suffix", Ref::namespace(NamespaceField::UniqueSuffix)),
        ],
        RuntimeLayer => vec![InputSpec::required(
            "deployment_prefix",
            Ref::namespace(NamespaceField::DeploymentPrefix),
        )],
        BootstrapCompute => vec![
            InputSpec::required(
                "isolation_group",
                Ref::output(Network, "isolation_group"),
            ),
            InputSpec::required(
                "runtime_role",
                Ref::output(AccessControl, "runtime_role"),
            ),
            InputSpec::required("layer_ref", Ref::output(RuntimeLayer, "layer_ref")),
            InputSpec::required("log_level", Ref::config("log_level")),
        ],
        AnalyticsStore => vec![
            InputSpec::required(
                "isolation_group",
                Ref::output(Network, "isolation_group"),
            ),
            InputSpec::required("table_name", Ref::config("analytics_table_name")),
        ],
        PrimaryDatastore => vec![
            InputSpec::required(
                "isolation_group",
                Ref::output(Network, "isolation_group"),
            ),
            InputSpec::required("db_port", Ref::config("database_tcp_port")),
            InputSpec::required("https_port", Ref::config("https_tcp_port")),
            InputSpec::required("db_username", Ref::config("db_username")),
            InputSpec::required("db_password_key", Ref::config("db_password_key")),
            InputSpec::required("db_name", Ref::config("db_name")),
        ],
        TimeseriesStore => vec![
            InputSpec::required(
                "deployment_prefix",
                Ref::namespace(NamespaceField::DeploymentPrefix),
            ),
            InputSpec::required("unique_suffix", Ref::namespace(NamespaceField::UniqueSuffix)),
        ],
        ComputeLayer => vec![
            InputSpec::required(
                "security_group",
                Ref::output(Network, "security_group"),
            ),
            InputSpec::required("db_endpoint", Ref::output(PrimaryDatastore, "db_endpoint")),
            InputSpec::required("layer_ref", Ref::output(RuntimeLayer, "layer_ref")),
            InputSpec::required(
                "messaging_endpoint",
                Ref::output(BootstrapCompute, "messaging_endpoint"),
            ),
            InputSpec::optional(
                "user_pool_arn",
                Ref::output(Directory, "user_pool_arn"),
            ),
            InputSpec::optional(
                "analytics_table",
                Ref::output(AnalyticsStore, "table_name"),
            ),
            InputSpec::optional(
                "timeseries_database",
                Ref::output(TimeseriesStore, "database_name"),
            ),
            InputSpec::required("log_level", Ref::config("log_level")),
            InputSpec::required("region", Ref::config("region")),
            InputSpec::required("timeout_secs", Ref::config("compute_timeout_secs")),
        ],
        Cleanup => Vec::new(),
    }
}

/// The dependency graph for one run: active component nodes plus their
/// `depends_on` edges, each edge tagged data or ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyGraph {
    nodes: BTreeMap<ComponentId, ComponentNode>,
    edges: BTreeMap<(ComponentId, ComponentId), EdgeKind>,
}

impl DependencyGraph {
    /// Build the graph over the active component set.
    ///
    /// Only active nodes are included and an edge is retained only when both
    /// endpoints are active. An active node whose required input references
    /// an inactive component's output is a fatal dangling dependency: there
    /// is no sensible default for a missing identifier.
    pub fn build(active: &BTreeSet<ComponentId>) -> CoreResult<Self> {
        let mut nodes = BTreeMap::new();
        let mut edges = BTreeMap::new();

        for id in ComponentId::catalog() {
            if !active.contains(id) {
                continue;
            }
            let mut node = ComponentNode::new(*id);

            for spec in catalog_inputs(*id) {
                if let Some(source) = spec.reference.source() {
                    if !active.contains(&source) {
                        if spec.optional {
                            debug!(
                                node = %id,
                                input = spec.name,
                                source = %source,
                                "Dropping optional input; source inactive"
                            );
                            continue;
                        }
                        return Err(CoreError::DanglingDependency {
                            node: *id,
                            input: spec.name.to_string(),
                            source,
                        });
                    }
                    node.depends_on.insert(source);
                    edges.insert((source, *id), EdgeKind::Data);
                }
                node.inputs.insert(spec.name.to_string(), spec.reference);
            }

            nodes.insert(*id, node);
        }

        for (from, to) in ORDERING_RULES {
            if !active.contains(from) || !active.contains(to) {
                continue;
            }
            // Data edges dominate: data flow already implies ordering.
            edges.entry((*from, *to)).or_insert(EdgeKind::Ordering);
            if let Some(node) = nodes.get_mut(to) {
                node.depends_on.insert(*from);
            }
        }

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            "Built dependency graph"
        );

        Ok(Self { nodes, edges })
    }

    pub fn node(&self, id: ComponentId) -> Option<&ComponentNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: ComponentId) -> Option<&mut ComponentNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// All nodes, keyed by id.
    pub fn nodes(&self) -> impl Iterator<Item = &ComponentNode> {
        self.nodes.values()
    }

    /// Node ids in catalog order.
    pub fn ids(&self) -> Vec<ComponentId> {
        let mut ids: Vec<ComponentId> = self.nodes.keys().copied().collect();
        ids.sort_by_key(|id| id.catalog_index());
        ids
    }

    /// Kind of the edge between two nodes, if present.
    pub fn edge_kind(&self, from: ComponentId, to: ComponentId) -> Option<EdgeKind> {
        self.edges.get(&(from, to)).copied()
    }

    /// All edges as `(from, to, kind)`.
    pub fn edges(&self) -> impl Iterator<Item = (ComponentId, ComponentId, EdgeKind)> + '_ {
        self.edges.iter().map(|((f, t), k)| (*f, *t, *k))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
