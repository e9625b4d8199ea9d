//! Error types for colonnade-compiler.

use colonnade_core::MarkupError;
use thiserror::Error;

/// Errors raised while compiling template source into program text.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The source markup could not be read.
    #[error(transparent)]
    Markup(#[from] MarkupError),

    /// The source already contains the directive opener `<?tpl`, which is
    /// reserved for compiled program text.
    #[error("reserved sequence `<?tpl` at byte {offset}")]
    Reserved { offset: usize },
}

/// Errors raised while loading program text into an instruction tree.
#[derive(Debug, Error)]
pub enum ProgramError {
    /// A directive opener without its closing `?>`.
    #[error("directive at byte {offset} is not terminated")]
    Unterminated { offset: usize },

    /// A directive whose body does not parse.
    #[error("invalid directive at byte {offset}: `{directive}`")]
    Syntax { offset: usize, directive: String },

    /// A closing or `else` directive with no matching opener.
    #[error("unexpected `{directive}` at byte {offset}")]
    Unbalanced { offset: usize, directive: String },

    /// An `if`/`foreach` block still open at the end of the program.
    #[error("`{construct}` opened at byte {offset} is never closed")]
    Unclosed {
        offset: usize,
        construct: &'static str,
    },
}

/// Errors raised while executing a loaded program.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A call to a function that is neither built in nor a registered
    /// formatting hook.
    #[error("unknown function `{name}`")]
    UnknownFunction { name: String },

    /// A sub-template include failed.
    #[error("include of {path:?} failed")]
    Include {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
