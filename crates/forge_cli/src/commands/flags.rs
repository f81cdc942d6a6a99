//! Flags command - publish the feature flag table.

use std::env;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use forge_config::PROFILE_DIR_ENV;
use forge_core::FeatureFlagRegistry;

use crate::sinks::JsonFileParameterStore;

/// Parameter document filename inside the profile directory.
const PARAMS_FILE: &str = "params.json";

#[derive(Args)]
pub struct FlagsArgs {
    /// Parameter store document (defaults to $FORGE_PROFILE_DIR/params.json)
    #[arg(long)]
    out: Option<PathBuf>,
}

pub async fn execute(args: FlagsArgs) -> Result<()> {
    let path = match args.out {
        Some(path) => path,
        None => {
            let dir = env::var(PROFILE_DIR_ENV).map_err(|_| {
                anyhow::anyhow!("--out not given and {} not set", PROFILE_DIR_ENV)
            })?;
            PathBuf::from(dir).join(PARAMS_FILE)
        }
    };

    let registry = FeatureFlagRegistry::release_defaults();
    let store = JsonFileParameterStore::new(&path);

    info!("Publishing {} feature flags", registry.flags().len());
    registry.publish_all(&store).await?;

    println!("Published feature flags to {}:", path.display());
    for flag in registry.flags() {
        println!("  {} = {}", flag.param_key(), flag.param_value());
    }

    Ok(())
}
