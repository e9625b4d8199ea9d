//! `colonnade compile` — show the program a template compiles to.

use anyhow::{Context, Result};
use clap::Args;

use super::ProjectArgs;

/// Arguments for `colonnade compile`.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Template path relative to the template directory.
    pub template: String,
}

impl CompileArgs {
    pub fn run(self, project: &ProjectArgs) -> Result<()> {
        let engine = project.engine()?;
        let program = engine
            .compile_source(&self.template)
            .with_context(|| format!("failed to compile '{}'", self.template))?;
        print!("{program}");
        Ok(())
    }
}
