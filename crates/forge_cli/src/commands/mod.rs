//! CLI command definitions.

use clap::{Parser, Subcommand};

pub mod flags;
pub mod plan;

/// CloudForge - dependency-ordered cloud deployment provisioning
#[derive(Parser)]
#[command(name = "forge")]
#[command(version, about = "CloudForge - dependency-ordered cloud deployment provisioning")]
#[command(long_about = r#"
CloudForge resolves the order in which interdependent infrastructure
components must be created and propagates each component's outputs to the
components that consume them.

COMMANDS:
  plan   - Show the active component set and construction order
  flags  - Publish the feature flag table to the parameter store

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Configuration error
  4 - Graph or ordering error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the active component set and construction order
    Plan(plan::PlanArgs),

    /// Publish the feature flag table to the parameter store
    Flags(flags::FlagsArgs),
}
