pub mod compile;
pub mod render;
pub mod status;
pub mod warm;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use colonnade_core::HookRegistry;
use colonnade_engine::{Engine, EngineConfig};

/// Project location shared by every command.
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Project directory holding the templates and `colonnade.yaml`.
    #[arg(long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Artifact cache directory, overriding `cache_dir` from the config.
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,
}

impl ProjectArgs {
    /// Engine for this project with the built-in hooks.
    pub fn engine(&self) -> Result<Engine> {
        let mut config = EngineConfig::load_at(&self.dir)
            .with_context(|| format!("failed to load config in {}", self.dir.display()))?;
        if let Some(cache_dir) = &self.cache_dir {
            config = config.with_cache_dir(cache_dir);
        }
        tracing::debug!(
            templates = %config.template_dir.display(),
            cache = %config.cache_dir.display(),
            "opening project"
        );
        Ok(Engine::new(config, HookRegistry::with_builtins()))
    }
}
