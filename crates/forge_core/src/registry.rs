//! Builder registry mapping components to their provisioning collaborators.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::component::{ComponentBuilder, ComponentId};
use crate::error::{CoreError, CoreResult};

/// Registry of component builder implementations.
///
/// The resolver looks builders up by component id at execution time; an
/// active component without a registered builder fails the run before any
/// side effect for that component.
#[derive(Default)]
pub struct BuilderRegistry {
    builders: BTreeMap<ComponentId, Arc<dyn ComponentBuilder>>,
}

impl BuilderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// Register a builder under its own component id.
    ///
    /// An existing builder for the same component is replaced.
    pub fn register(&mut self, builder: Arc<dyn ComponentBuilder>) {
        let id = builder.id();
        debug!("Registering builder: {}", id);
        self.builders.insert(id, builder);
    }

    /// Get a builder by component id.
    pub fn get(&self, id: ComponentId) -> Option<Arc<dyn ComponentBuilder>> {
        self.builders.get(&id).cloned()
    }

    /// Get a builder by component id, returning an error if absent.
    pub fn get_required(&self, id: ComponentId) -> CoreResult<Arc<dyn ComponentBuilder>> {
        self.get(id).ok_or(CoreError::BuilderNotFound(id))
    }

    /// Check whether a builder is registered.
    pub fn contains(&self, id: ComponentId) -> bool {
        self.builders.contains_key(&id)
    }

    /// Ids with a registered builder, in catalog order.
    pub fn ids(&self) -> Vec<ComponentId> {
        let mut ids: Vec<ComponentId> = self.builders.keys().copied().collect();
        ids.sort_by_key(|id| id.catalog_index());
        ids
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

impl std::fmt::Debug for BuilderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuilderRegistry")
            .field("builders", &self.builders.keys().collect::<Vec<_>>())
            .finish()
    }
}
