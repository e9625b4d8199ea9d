//! Cache warming and status reporting over every template in a project.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::config::normalize;
use crate::engine::Engine;
use crate::error::{io_err, EngineError};
use crate::staleness::Freshness;

// ---------------------------------------------------------------------------
// 1. Template discovery
// ---------------------------------------------------------------------------

/// Relative names (`/`-separated, sorted) of every template under the
/// engine's template directory. The cache directory and hidden directories
/// are skipped.
pub fn templates(engine: &Engine) -> Result<Vec<String>, EngineError> {
    let root = &engine.config().template_dir;
    let mut files = Vec::new();
    collect_template_files(engine, root, &mut files)?;

    let mut names: Vec<String> = files
        .iter()
        .filter_map(|path| path.strip_prefix(root).ok())
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();
    names.sort();
    Ok(names)
}

fn collect_template_files(
    engine: &Engine,
    dir: &Path,
    out: &mut Vec<PathBuf>,
) -> Result<(), EngineError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            if normalize(&path) == engine.config().cache_dir || is_hidden(&path) {
                continue;
            }
            collect_template_files(engine, &path, out)?;
        } else if meta.is_file() && engine.config().is_template(&path) {
            out.push(path);
        }
    }
    Ok(())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

// ---------------------------------------------------------------------------
// 2. Warming
// ---------------------------------------------------------------------------

/// Outcome of warming one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarmResult {
    /// The artifact was missing or stale and has been rewritten.
    Compiled { template: String },
    /// The artifact was already current.
    Fresh { template: String },
    /// `--dry-run` mode: the template *would* have been compiled.
    WouldCompile { template: String },
}

impl WarmResult {
    pub fn template(&self) -> &str {
        match self {
            WarmResult::Compiled { template }
            | WarmResult::Fresh { template }
            | WarmResult::WouldCompile { template } => template,
        }
    }
}

/// Compile every template whose artifact is missing or stale.
pub fn warm(engine: &Engine, dry_run: bool) -> Result<Vec<WarmResult>, EngineError> {
    let mut results = Vec::new();
    for template in templates(engine)? {
        let freshness = engine.freshness(&template)?;
        let result = if !freshness.needs_compile() {
            WarmResult::Fresh { template }
        } else if dry_run {
            tracing::info!("[dry-run] would compile: {template}");
            WarmResult::WouldCompile { template }
        } else {
            engine.ensure_fresh(&template)?;
            WarmResult::Compiled { template }
        };
        results.push(result);
    }
    Ok(results)
}

// ---------------------------------------------------------------------------
// 3. Status
// ---------------------------------------------------------------------------

/// Cache state of one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateStatus {
    pub template: String,
    pub freshness: Freshness,
    pub artifact: PathBuf,
}

impl TemplateStatus {
    /// When the artifact was last written, if it exists.
    pub fn compiled_at(&self) -> Option<DateTime<Utc>> {
        self.freshness.artifact_modified().map(DateTime::<Utc>::from)
    }
}

/// Freshness of every template's artifact, without compiling anything.
pub fn status(engine: &Engine) -> Result<Vec<TemplateStatus>, EngineError> {
    templates(engine)?
        .into_iter()
        .map(|template| {
            let freshness = engine.freshness(&template)?;
            let artifact = engine.store().artifact_path(&template);
            Ok(TemplateStatus {
                template,
                freshness,
                artifact,
            })
        })
        .collect()
}
