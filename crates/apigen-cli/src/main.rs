//! apigen CLI
//!
//! - `apigen model`: descriptor set JSON (+ service config) → API model JSON
//!
//! Descriptor sets come from `buf build --as-file-descriptor-set`, run
//! outside of apigen.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod model;

#[derive(Parser)]
#[command(name = "apigen")]
#[command(author, version, about = "apigen: protobuf descriptor sets to a language-agnostic API model")]
struct Cli {
    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the API model of a descriptor set.
    Model(model::ModelArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Model(args) => model::cmd_model(&args),
    }
}
