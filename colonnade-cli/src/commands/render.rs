//! `colonnade render` — render a template to stdout.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use colonnade_core::Value;

use super::ProjectArgs;

/// Arguments for `colonnade render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Template path relative to the template directory.
    pub template: String,

    /// JSON file bound to the root data variable (`-` reads stdin).
    #[arg(long)]
    pub data: Option<PathBuf>,
}

impl RenderArgs {
    pub fn run(self, project: &ProjectArgs) -> Result<()> {
        let engine = project.engine()?;
        let data = match &self.data {
            Some(path) => load_data(path)?,
            None => Value::Null,
        };

        let output = engine
            .render(&self.template, &data)
            .with_context(|| format!("failed to render '{}'", self.template))?;

        let mut stdout = io::stdout().lock();
        stdout
            .write_all(output.as_bytes())
            .context("failed to write output")?;
        stdout.flush().context("failed to write output")?;
        Ok(())
    }
}

fn load_data(path: &Path) -> Result<Value> {
    let text = if path == Path::new("-") {
        io::read_to_string(io::stdin()).context("failed to read data from stdin")?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read data file {}", path.display()))?
    };
    let json: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    Ok(Value::from(json))
}
