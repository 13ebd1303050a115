//! WM CLI - Multi-website view resolution.
//!
//! Provides commands for:
//! - `resolve`: Show which view serves a template on a host
//! - `render`: Materialize a template for a host
//! - `check`: Validate every view of the site bundle

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, GlobalArgs, RenderArgs, ResolveArgs};
use output::Output;

/// WM - Multi-website view resolution.
#[derive(Parser)]
#[command(name = "wm", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a template to a view id.
    Resolve(ResolveArgs),
    /// Materialize a template.
    Render(RenderArgs),
    /// Validate every view of the site bundle.
    Check(CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Resolve(args) => args.execute(&cli.global),
        Commands::Render(args) => args.execute(&cli.global),
        Commands::Check(args) => args.execute(&cli.global),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
