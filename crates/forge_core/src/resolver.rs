//! Dependency resolution and sequential graph execution.
//!
//! The resolver computes a deterministic construction order and drives each
//! component's builder in that order. Construction is strictly sequential:
//! the underlying provisioning side effects are not assumed concurrent-safe
//! or idempotent, and a deterministic, auditable order is preferred over
//! throughput.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::component::{AttributeRef, ComponentId, Phase};
use crate::context::{BuildContext, RunContext};
use crate::error::{CoreError, CoreResult};
use crate::graph::DependencyGraph;
use crate::manifest::OutputManifest;
use crate::registry::BuilderRegistry;

/// Timing record for one constructed component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRecord {
    pub id: ComponentId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Outcome of one resolver run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Construction order that was executed.
    pub order: Vec<ComponentId>,
    /// One record per successfully constructed component, in order.
    pub records: Vec<BuildRecord>,
    /// Everything published during the run.
    pub manifest: OutputManifest,
}

/// Drives construction of a dependency graph.
pub struct Resolver {
    registry: Arc<BuilderRegistry>,
}

impl Resolver {
    pub fn new(registry: Arc<BuilderRegistry>) -> Self {
        Self { registry }
    }

    /// Compute the construction order for a graph.
    ///
    /// The fixed phase order (capability providers, then datastores, then
    /// the compute layer, then cleanup) is enforced by convention rather
    /// than derived from the edge table; it is what breaks the known
    /// compute-layer/messaging-rule cycle. Within a phase, nodes are
    /// ordered by Kahn's algorithm over `depends_on`, ties broken by
    /// catalog position so the order is stable across runs.
    pub fn execution_order(graph: &DependencyGraph) -> CoreResult<Vec<ComponentId>> {
        // An edge pointing backwards across phases would contradict the
        // convention; reject it instead of silently reordering.
        for (from, to, _) in graph.edges() {
            if from.phase() > to.phase() {
                return Err(CoreError::OrderConflict(format!(
                    "edge {from} -> {to} crosses phases backwards ({:?} after {:?})",
                    from.phase(),
                    to.phase()
                )));
            }
        }

        let mut order = Vec::with_capacity(graph.len());
        for phase in [
            Phase::Foundation,
            Phase::Datastores,
            Phase::Compute,
            Phase::Cleanup,
        ] {
            let members: Vec<ComponentId> = graph
                .ids()
                .into_iter()
                .filter(|id| id.phase() == phase)
                .collect();
            order.extend(Self::order_within_phase(graph, &members)?);
        }
        Ok(order)
    }

    /// Kahn's algorithm restricted to one phase's members. Cross-phase
    /// edges are already satisfied by the phase sweep.
    fn order_within_phase(
        graph: &DependencyGraph,
        members: &[ComponentId],
    ) -> CoreResult<Vec<ComponentId>> {
        let member_set: BTreeSet<ComponentId> = members.iter().copied().collect();

        let mut indegree: BTreeMap<ComponentId, usize> = BTreeMap::new();
        for id in members {
            let count = graph.node(*id).map_or(0, |node| {
                node.depends_on
                    .iter()
                    .filter(|dep| member_set.contains(dep))
                    .count()
            });
            indegree.insert(*id, count);
        }

        // Ready set keyed by catalog position for the deterministic tie-break.
        let mut ready: BTreeSet<(usize, ComponentId)> = indegree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(id, _)| (id.catalog_index(), *id))
            .collect();

        let mut ordered = Vec::with_capacity(members.len());
        while let Some((_, id)) = ready.pop_first() {
            ordered.push(id);

            for other in members {
                let depends = graph
                    .node(*other)
                    .is_some_and(|node| node.depends_on.contains(&id));
                if !depends {
                    continue;
                }
                if let Some(degree) = indegree.get_mut(other) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert((other.catalog_index(), *other));
                    }
                }
            }
        }

        if ordered.len() != members.len() {
            let stuck: Vec<String> = members
                .iter()
                .filter(|id| !ordered.contains(id))
                .map(|id| id.to_string())
                .collect();
            return Err(CoreError::OrderConflict(format!(
                "unresolved cycle within phase: {}",
                stuck.join(", ")
            )));
        }
        Ok(ordered)
    }

    /// Execute the graph: construct every node in dependency order,
    /// propagating outputs and appending them to the manifest.
    ///
    /// On the first failure the remaining plan is aborted. Nothing is
    /// retried and nothing already constructed is rolled back here; a
    /// half-completed deployment is reported as failed to the caller.
    pub async fn run(
        &self,
        graph: &mut DependencyGraph,
        ctx: &mut RunContext,
    ) -> CoreResult<RunReport> {
        let order = Self::execution_order(graph)?;

        // Fail before any side effect if an active component has no builder.
        for id in &order {
            if !self.registry.contains(*id) {
                return Err(CoreError::BuilderNotFound(*id));
            }
        }

        info!(
            components = order.len(),
            prefix = %ctx.namespace.deployment_prefix,
            "Starting deployment run"
        );

        let mut manifest = OutputManifest::new();
        let mut records = Vec::with_capacity(order.len());

        for (index, id) in order.iter().enumerate() {
            let builder = self.registry.get_required(*id)?;
            let inputs = self.resolve_inputs(graph, ctx, *id)?;

            info!("Constructing component [{}/{}]: {}", index + 1, order.len(), id);
            let started_at = Utc::now();

            let build_ctx = BuildContext::new(&ctx.namespace, &ctx.config, inputs);
            let outputs = match builder.build(&build_ctx).await {
                Ok(outputs) => outputs,
                Err(e) => {
                    error!("Component {} construction failed: {}", id, e);
                    return Err(CoreError::BuildFailed {
                        component: *id,
                        message: e.to_string(),
                    });
                }
            };

            for output in outputs.iter() {
                manifest.append(&output.key, &output.value, &output.description);
            }

            let node = graph
                .node_mut(*id)
                .ok_or_else(|| CoreError::InvalidState(format!("{id} missing from graph")))?;
            node.outputs = Some(outputs.clone());
            ctx.record_outputs(*id, outputs)?;

            records.push(BuildRecord {
                id: *id,
                started_at,
                completed_at: Utc::now(),
            });
            info!("Component {} constructed", id);
        }

        info!(published = manifest.len(), "Deployment run completed");
        Ok(RunReport {
            order,
            records,
            manifest,
        })
    }

    /// Resolve a node's declared inputs to concrete string values.
    ///
    /// Configuration references are pass-through: a key absent from the
    /// effective configuration is simply omitted. Output references must
    /// resolve; the referenced component is guaranteed constructed by the
    /// execution order, but the key itself may be missing from what its
    /// builder published.
    fn resolve_inputs(
        &self,
        graph: &DependencyGraph,
        ctx: &RunContext,
        id: ComponentId,
    ) -> CoreResult<BTreeMap<String, String>> {
        let node = graph
            .node(id)
            .ok_or_else(|| CoreError::InvalidState(format!("{id} missing from graph")))?;

        let mut resolved = BTreeMap::new();
        for (name, reference) in &node.inputs {
            match reference {
                AttributeRef::Config(key) => {
                    if let Some(value) = ctx.config.get_display(key) {
                        resolved.insert(name.clone(), value);
                    }
                }
                AttributeRef::Namespace(field) => {
                    resolved.insert(name.clone(), ctx.namespace.field(*field).to_string());
                }
                AttributeRef::Output { source, key } => {
                    let value = ctx
                        .outputs_of(*source)
                        .and_then(|outputs| outputs.get(key))
                        .ok_or_else(|| CoreError::MissingOutput {
                            node: id,
                            source: *source,
                            key: key.clone(),
                        })?;
                    resolved.insert(name.clone(), value.to_string());
                }
            }
        }
        Ok(resolved)
    }
}
