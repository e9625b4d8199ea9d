//! Colonnade — compile-once markup templates.
//!
//! # Usage
//!
//! ```text
//! colonnade [--dir DIR] [--cache-dir DIR] render <template> [--data FILE.json]
//! colonnade [--dir DIR] [--cache-dir DIR] compile <template>
//! colonnade [--dir DIR] [--cache-dir DIR] warm [--dry-run]
//! colonnade [--dir DIR] [--cache-dir DIR] status [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    compile::CompileArgs, render::RenderArgs, status::StatusArgs, warm::WarmArgs, ProjectArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "colonnade",
    version,
    about = "Compile markup templates with colon bindings and render them from a cache",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    project: ProjectArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a template with JSON data, compiling it first if stale.
    Render(RenderArgs),

    /// Print a template's compiled program without touching the cache.
    Compile(CompileArgs),

    /// Compile every template whose cached artifact is missing or stale.
    Warm(WarmArgs),

    /// Show the cache state of every template.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Render(args) => args.run(&cli.project),
        Commands::Compile(args) => args.run(&cli.project),
        Commands::Warm(args) => args.run(&cli.project),
        Commands::Status(args) => args.run(&cli.project),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
