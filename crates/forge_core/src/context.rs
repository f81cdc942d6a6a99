//! Run context owned by the resolver.
//!
//! All per-run state accumulated during graph execution lives here and is
//! passed by reference to component builders, never held in process-wide
//! globals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use forge_config::{EffectiveConfig, Namespace};

use crate::component::{ComponentId, ComponentOutputs};
use crate::error::{CoreError, CoreResult};

/// Mutable state for one deployment run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunContext {
    /// Deployment namespace, immutable for the run.
    pub namespace: Namespace,
    /// Merged configuration, immutable for the run.
    pub config: EffectiveConfig,
    /// Outputs of every constructed component, write-once per component.
    outputs: BTreeMap<ComponentId, ComponentOutputs>,
}

impl RunContext {
    pub fn new(namespace: Namespace, config: EffectiveConfig) -> Self {
        Self {
            namespace,
            config,
            outputs: BTreeMap::new(),
        }
    }

    /// Outputs of a constructed component, if it has been constructed.
    pub fn outputs_of(&self, id: ComponentId) -> Option<&ComponentOutputs> {
        self.outputs.get(&id)
    }

    /// Record a component's outputs. Outputs are write-once: recording a
    /// second set for the same component is an invalid state.
    pub fn record_outputs(
        &mut self,
        id: ComponentId,
        outputs: ComponentOutputs,
    ) -> CoreResult<()> {
        if self.outputs.contains_key(&id) {
            return Err(CoreError::InvalidState(format!(
                "outputs for {} recorded twice",
                id
            )));
        }
        self.outputs.insert(id, outputs);
        Ok(())
    }

    /// Number of constructed components.
    pub fn constructed_count(&self) -> usize {
        self.outputs.len()
    }
}

/// Read-only view handed to a component builder.
///
/// `inputs` holds the resolved values of the node's declared attribute
/// references: configuration literals, namespace fields and dependency
/// outputs, all rendered as strings.
#[derive(Debug)]
pub struct BuildContext<'a> {
    pub namespace: &'a Namespace,
    pub config: &'a EffectiveConfig,
    inputs: BTreeMap<String, String>,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        namespace: &'a Namespace,
        config: &'a EffectiveConfig,
        inputs: BTreeMap<String, String>,
    ) -> Self {
        Self {
            namespace,
            config,
            inputs,
        }
    }

    /// Resolved input value by declared input name.
    pub fn input(&self, name: &str) -> Option<&str> {
        self.inputs.get(name).map(|s| s.as_str())
    }

    /// All resolved inputs in name order.
    pub fn inputs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inputs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_config::EffectiveConfig;

    fn namespace() -> Namespace {
        Namespace::derive_with_uuid(&EffectiveConfig::default(), "a-b-c")
    }

    #[test]
    fn test_outputs_write_once() {
        let mut ctx = RunContext::new(namespace(), EffectiveConfig::default());

        let outputs = ComponentOutputs::new().with("vpc_id", "vpc-123", "VPC ID");
        ctx.record_outputs(ComponentId::Network, outputs).unwrap();

        assert_eq!(
            ctx.outputs_of(ComponentId::Network).unwrap().get("vpc_id"),
            Some("vpc-123")
        );

        let again = ComponentOutputs::new().with("vpc_id", "vpc-456", "VPC ID");
        let err = ctx.record_outputs(ComponentId::Network, again).unwrap_err();
        assert!(matches!(err, CoreError::InvalidState(_)));
    }

    #[test]
    fn test_build_context_inputs() {
        let ns = namespace();
        let config = EffectiveConfig::default();
        let mut inputs = BTreeMap::new();
        inputs.insert("isolation_group".to_string(), "vpc-123".to_string());

        let ctx = BuildContext::new(&ns, &config, inputs);
        assert_eq!(ctx.input("isolation_group"), Some("vpc-123"));
        assert_eq!(ctx.input("absent"), None);
    }
}
