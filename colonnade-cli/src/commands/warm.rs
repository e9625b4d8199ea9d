//! `colonnade warm` — precompile every stale template.

use anyhow::{Context, Result};
use clap::Args;

use colonnade_engine::{warm, WarmResult};

use super::ProjectArgs;

/// Arguments for `colonnade warm`.
#[derive(Args, Debug)]
pub struct WarmArgs {
    /// List what would be compiled without writing any artifacts.
    #[arg(long)]
    pub dry_run: bool,
}

impl WarmArgs {
    pub fn run(self, project: &ProjectArgs) -> Result<()> {
        let engine = project.engine()?;
        let results = warm(&engine, self.dry_run).context("warm failed")?;
        if results.is_empty() {
            println!(
                "No templates found under {}.",
                engine.config().template_dir.display()
            );
            return Ok(());
        }
        print_results(&results, self.dry_run);
        Ok(())
    }
}

fn print_results(results: &[WarmResult], dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let compiled = results
        .iter()
        .filter(|r| !matches!(r, WarmResult::Fresh { .. }))
        .count();
    let fresh = results.len() - compiled;

    if compiled == 0 {
        println!("{prefix}✓ all {fresh} templates up to date");
        return;
    }

    let verb = if dry_run { "to compile" } else { "compiled" };
    println!("{prefix}✓ {compiled} {verb}, {fresh} fresh");
    for r in results {
        match r {
            WarmResult::Compiled { template } => println!("  ✎  {template}"),
            WarmResult::WouldCompile { template } => println!("  ~  {template}"),
            WarmResult::Fresh { template } => println!("  ·  {template}"),
        }
    }
}
