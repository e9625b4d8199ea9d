//! # colonnade-compiler
//!
//! Turns annotated markup into program text and runs programs against data.
//!
//! ```text
//! source ──markup::parse──▶ Document ──MacroExpander──▶ Document ──emit──▶ program text
//! program text ──Program::parse──▶ Program ──Interpreter::run──▶ output
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use colonnade_compiler::{Compiler, Interpreter, NoIncludes, Program};
//! use colonnade_core::{FormatterChain, HookRegistry, ScopeChain, Value};
//!
//! let hooks = HookRegistry::with_builtins();
//! let text = Compiler::new(&hooks)
//!     .compile("<li :items:>:name:</li>", &ScopeChain::root("data"), &FormatterChain::new())
//!     .unwrap();
//! let program = Program::parse(&text).unwrap();
//! let data = Value::record([("items", Value::from(vec![Value::record([("name", "A")])]))]);
//! let out = Interpreter::new(&hooks, &NoIncludes).run(&program, "data", &data).unwrap();
//! assert_eq!(out, "<li>A</li>");
//! ```

pub mod compile;
pub mod emitter;
pub mod error;
pub mod expander;
pub mod program;
pub mod resolver;
pub mod runtime;
pub mod traversal;

pub use compile::Compiler;
pub use emitter::emit;
pub use error::{CompileError, ProgramError, RuntimeError};
pub use expander::MacroExpander;
pub use program::{Expr, Instr, Program};
pub use resolver::resolve;
pub use runtime::{Includer, Interpreter, NoIncludes};
pub use traversal::{default_format, normalize_traversable};
