//! Colonnade core library: the template tree, directives, data values, hooks.
//!
//! - [`tree`] — arena [`Document`] that expansion rewrites in place
//! - [`markup`] — lenient HTML reader producing a [`Document`]
//! - [`directive`] — control-flow markers written into program text
//! - [`types`] — [`ScopeChain`], [`FormatterChain`], [`HookName`]
//! - [`value`] — the data context [`Value`]
//! - [`registry`] — [`HookRegistry`] and the hook traits
//! - [`else_hook`] — the built-in `:else:` hook

pub mod directive;
pub mod else_hook;
pub mod error;
pub mod markup;
pub mod registry;
pub mod tree;
pub mod types;
pub mod value;

pub use directive::Directive;
pub use else_hook::ElseHook;
pub use error::MarkupError;
pub use registry::{FormatHook, Hook, HookRegistry, MacroHook};
pub use tree::{Document, Element, NodeId, NodeKind};
pub use types::{FormatterChain, HookName, ScopeChain};
pub use value::Value;
