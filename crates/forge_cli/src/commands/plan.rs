//! Plan command - compute and display the construction order.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::info;

use forge_config::ConfigLoader;
use forge_core::{BuilderRegistry, DependencyGraph, EdgeKind, FeatureFlagRegistry, Orchestrator};

#[derive(Args)]
pub struct PlanArgs {
    /// Path to the deployment profile document (defaults to
    /// $FORGE_PROFILE_DIR/bootstrap.json)
    #[arg(long)]
    bootstrap: Option<PathBuf>,

    /// Path to the release defaults document (defaults to
    /// $FORGE_DEFAULTS_FILE)
    #[arg(long)]
    defaults: Option<PathBuf>,

    /// Also list the dependency edges feeding the order
    #[arg(long)]
    edges: bool,
}

pub async fn execute(args: PlanArgs) -> Result<()> {
    let loader = match (args.bootstrap, args.defaults) {
        (Some(bootstrap), Some(defaults)) => ConfigLoader::new(bootstrap, defaults),
        (None, None) => ConfigLoader::from_env()?,
        _ => anyhow::bail!("--bootstrap and --defaults must be given together"),
    };

    let flags = FeatureFlagRegistry::release_defaults();
    let orchestrator = Orchestrator::new(Arc::new(BuilderRegistry::new()), flags);

    info!("Computing deployment plan");
    let plan = orchestrator.plan(&loader).await?;

    println!("Deployment namespace:");
    println!("  prefix : {}", plan.namespace.deployment_prefix);
    println!("  stage  : {}", plan.namespace.stage);
    println!("  suffix : {}", plan.namespace.unique_suffix);
    println!();

    println!("Active components ({}):", plan.active.len());
    for id in &plan.active {
        println!("  - {}", id);
    }
    println!();

    println!("Construction order:");
    for (index, id) in plan.order.iter().enumerate() {
        println!("  {:>2}. {}", index + 1, id);
    }

    if args.edges {
        let graph = DependencyGraph::build(&plan.active)?;
        println!();
        println!("Dependency edges:");
        for (from, to, kind) in graph.edges() {
            let tag = match kind {
                EdgeKind::Data => "data",
                EdgeKind::Ordering => "ordering",
            };
            println!("  {} -> {} [{}]", from, to, tag);
        }
    }

    Ok(())
}
