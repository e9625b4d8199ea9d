//! Compile-once rendering.
//!
//! [`Engine::render`] makes sure the template's artifact is fresh (compiling
//! and storing it when it is missing or older than the source), then loads
//! and runs it. Includes go back through the engine, so every partial is
//! cached and staleness-checked on its own.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use colonnade_compiler::{Compiler, Includer, Interpreter, Program, RuntimeError};
use colonnade_core::{FormatterChain, HookRegistry, ScopeChain, Value};

use crate::config::EngineConfig;
use crate::error::{io_err, EngineError};
use crate::staleness::{self, Freshness};
use crate::store::ArtifactStore;

/// Template compiler, artifact cache and renderer for one project.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    hooks: HookRegistry,
    store: ArtifactStore,
    compilations: AtomicUsize,
}

impl Engine {
    pub fn new(config: EngineConfig, hooks: HookRegistry) -> Self {
        let store = ArtifactStore::new(config.cache_dir.clone());
        Self {
            config,
            hooks,
            store,
            compilations: AtomicUsize::new(0),
        }
    }

    /// Engine for the project in `dir` with the built-in hooks.
    pub fn open(dir: &Path) -> Result<Self, EngineError> {
        let config = EngineConfig::load_at(dir)?;
        Ok(Self::new(config, HookRegistry::with_builtins()))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Number of templates compiled by this engine so far.
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::Relaxed)
    }

    /// `<template_dir>/<template>`
    pub fn source_path(&self, template: &str) -> PathBuf {
        self.config.template_dir.join(template)
    }

    /// Freshness of `template`'s stored artifact.
    pub fn freshness(&self, template: &str) -> Result<Freshness, EngineError> {
        staleness::check(&self.source_path(template), &self.store, template)
    }

    // -----------------------------------------------------------------------
    // Compilation
    // -----------------------------------------------------------------------

    /// Read and compile `template` without touching the store.
    pub fn compile_source(&self, template: &str) -> Result<String, EngineError> {
        let path = self.source_path(template);
        let source = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let program = Compiler::new(&self.hooks)
            .compile(
                &source,
                &ScopeChain::root(self.config.root_var.as_str()),
                &FormatterChain::new(),
            )
            .map_err(|source| EngineError::Compile {
                template: template.to_owned(),
                source,
            })?;
        self.compilations.fetch_add(1, Ordering::Relaxed);
        tracing::info!("compiled: {template}");
        Ok(program)
    }

    /// Compile and store `template` if its artifact is missing or stale.
    ///
    /// Returns `true` when a compilation happened.
    pub fn ensure_fresh(&self, template: &str) -> Result<bool, EngineError> {
        let freshness = self.freshness(template)?;
        if !freshness.needs_compile() {
            tracing::debug!("artifact current: {template}");
            return Ok(false);
        }
        tracing::debug!("artifact {freshness:?}: {template}");
        let program = self.compile_source(template)?;
        self.store.save(template, &program)?;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Render `template` with `data` bound to the root scope variable.
    pub fn render(&self, template: &str, data: &Value) -> Result<String, EngineError> {
        self.render_at_depth(template, data, 0)
    }

    fn render_at_depth(
        &self,
        template: &str,
        data: &Value,
        depth: usize,
    ) -> Result<String, EngineError> {
        if depth > self.config.max_include_depth {
            return Err(EngineError::IncludeDepth {
                template: template.to_owned(),
                limit: self.config.max_include_depth,
            });
        }

        self.ensure_fresh(template)?;
        let text = self.store.load(template)?;
        let program = Program::parse(&text).map_err(|source| EngineError::Program {
            path: self.store.artifact_path(template),
            source,
        })?;

        let host = IncludeHost {
            engine: self,
            depth: depth + 1,
        };
        Interpreter::new(&self.hooks, &host)
            .run(&program, &self.config.root_var, data)
            .map_err(surface_include_error)
    }
}

/// Resolves `include` directives by rendering through the engine one level
/// deeper.
struct IncludeHost<'a> {
    engine: &'a Engine,
    depth: usize,
}

impl Includer for IncludeHost<'_> {
    fn include(&self, path: &str, data: &Value, out: &mut String) -> Result<(), RuntimeError> {
        let rendered = self
            .engine
            .render_at_depth(path, data, self.depth)
            .map_err(|e| RuntimeError::Include {
                path: path.to_owned(),
                source: Box::new(e),
            })?;
        out.push_str(&rendered);
        Ok(())
    }
}

/// Unwrap engine failures raised inside includes so callers see the
/// inner error (missing partial, depth limit) rather than a wrapper.
fn surface_include_error(err: RuntimeError) -> EngineError {
    match err {
        RuntimeError::Include { path, source } => match source.downcast::<EngineError>() {
            Ok(inner) => *inner,
            Err(source) => EngineError::Runtime(RuntimeError::Include { path, source }),
        },
        other => EngineError::Runtime(other),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
