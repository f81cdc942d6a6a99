//! # forge_core
//!
//! The provisioning dependency graph and output-propagation engine for
//! CloudForge deployments.
//!
//! # Architecture
//!
//! - **Components**: named infrastructure subsystems constructed by
//!   external collaborators behind the [`ComponentBuilder`] trait
//! - **Flags**: static per-release switches deciding which optional
//!   components participate, published to a persisted parameter store
//! - **Graph**: active component nodes plus data and ordering edges
//! - **Resolver**: deterministic, phase-constrained construction order and
//!   strictly sequential execution
//! - **Manifest**: ordered, append-only collection of every published
//!   output, handed to an external writer at the end of a run
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use forge_core::{BuilderRegistry, FeatureFlagRegistry, Orchestrator};
//! use forge_config::ConfigLoader;
//!
//! let mut registry = BuilderRegistry::new();
//! registry.register(Arc::new(MyNetworkBuilder));
//! // ... one builder per active component ...
//!
//! let orchestrator = Orchestrator::new(
//!     Arc::new(registry),
//!     FeatureFlagRegistry::release_defaults(),
//! );
//!
//! let loader = ConfigLoader::from_env()?;
//! let outcome = orchestrator.run(&loader, &param_store, &manifest_sink).await?;
//! ```

pub mod component;
pub mod context;
pub mod error;
pub mod flags;
pub mod graph;
pub mod manifest;
pub mod orchestrator;
pub mod registry;
pub mod resolver;

pub use component::{
    AttributeRef, ComponentBuilder, ComponentId, ComponentNode, ComponentOutputs, OutputValue,
    Phase,
};
pub use context::{BuildContext, RunContext};
pub use error::{CoreError, CoreResult};
pub use flags::{
    FeatureFlag, FeatureFlagRegistry, ParameterStore, FEATURE_PARAM_ROOT, FLAG_ANALYTICS,
    FLAG_DIRECTORY, FLAG_LOCATION, FLAG_TIMESERIES, RUN_CLEANUP_STEP,
};
pub use graph::{DependencyGraph, EdgeKind};
pub use manifest::{ManifestEntry, ManifestSink, OutputManifest};
pub use orchestrator::{DeploymentOutcome, DeploymentPlan, Orchestrator};
pub use registry::BuilderRegistry;
pub use resolver::{BuildRecord, Resolver, RunReport};
