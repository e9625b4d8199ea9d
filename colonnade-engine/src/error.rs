//! Error types for colonnade-engine.

use std::path::PathBuf;

use thiserror::Error;

use colonnade_compiler::{CompileError, ProgramError, RuntimeError};

/// All errors that can arise from engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template source failed to compile.
    #[error("failed to compile {template}: {source}")]
    Compile {
        template: String,
        #[source]
        source: CompileError,
    },

    /// A stored artifact is not a valid program.
    #[error("invalid artifact {path}: {source}")]
    Program {
        path: PathBuf,
        #[source]
        source: ProgramError,
    },

    /// A program failed while rendering.
    #[error("render error: {0}")]
    Runtime(#[from] RuntimeError),

    /// The config file exists but cannot be parsed.
    #[error("config parse error in {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config parsed but holds an unusable value.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Includes nested deeper than the configured limit.
    #[error("include depth limit ({limit}) exceeded while rendering {template}")]
    IncludeDepth { template: String, limit: usize },
}

/// Convenience constructor for [`EngineError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.into(),
        source,
    }
}
