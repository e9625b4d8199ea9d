//! Hook registry.
//!
//! A hook is the only extension point of the compiler. It is looked up by the
//! name derived from a binding identifier (`:else:` → `elsehook`) and may
//! expose either or both of:
//! - a **macro** operation, run at compile time to rewrite the tree around the
//!   bound node;
//! - a **format** operation, run at render time on every value emitted inside
//!   the bound subtree, after the default escaping formatter.
//!
//! The registry is built once by the embedding application and passed
//! explicitly to the compiler and to the interpreter.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::else_hook::ElseHook;
use crate::tree::{Document, NodeId};
use crate::types::{HookName, ScopeChain};
use crate::value::Value;

// ---------------------------------------------------------------------------
// 1. Hook operations
// ---------------------------------------------------------------------------

/// Compile-time tree rewrite run for a node carrying the hook's binding.
pub trait MacroHook: Send + Sync {
    fn expand(&self, doc: &mut Document, node: NodeId, scope: &ScopeChain);
}

impl<F> MacroHook for F
where
    F: Fn(&mut Document, NodeId, &ScopeChain) + Send + Sync,
{
    fn expand(&self, doc: &mut Document, node: NodeId, scope: &ScopeChain) {
        self(doc, node, scope)
    }
}

/// Render-time value transform wrapped around the default formatter.
pub trait FormatHook: Send + Sync {
    fn format(&self, value: Value) -> Value;
}

impl<F> FormatHook for F
where
    F: Fn(Value) -> Value + Send + Sync,
{
    fn format(&self, value: Value) -> Value {
        self(value)
    }
}

// ---------------------------------------------------------------------------
// 2. Hook
// ---------------------------------------------------------------------------

/// A registered capability. Both operations are optional; a hook with
/// neither only strips its binding attribute.
#[derive(Clone, Default)]
pub struct Hook {
    macro_op: Option<Arc<dyn MacroHook>>,
    format_op: Option<Arc<dyn FormatHook>>,
}

impl Hook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_macro(mut self, op: impl MacroHook + 'static) -> Self {
        self.macro_op = Some(Arc::new(op));
        self
    }

    pub fn with_format(mut self, op: impl FormatHook + 'static) -> Self {
        self.format_op = Some(Arc::new(op));
        self
    }

    pub fn macro_op(&self) -> Option<&dyn MacroHook> {
        self.macro_op.as_deref()
    }

    pub fn format_op(&self) -> Option<&dyn FormatHook> {
        self.format_op.as_deref()
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("macro", &self.macro_op.is_some())
            .field("format", &self.format_op.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// 3. Registry
// ---------------------------------------------------------------------------

/// Mapping from derived hook name to [`Hook`].
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    hooks: BTreeMap<HookName, Hook>,
}

impl HookRegistry {
    /// An empty registry: every binding falls back to default iteration.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in hooks (`else`) already registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("else", Hook::new().with_macro(ElseHook));
        registry
    }

    /// Register `hook` for a binding identifier, replacing any previous one.
    ///
    /// `identifier` goes through the same derivation as bindings found in
    /// markup, so `register("else", …)` serves `:else:`.
    pub fn register(&mut self, identifier: &str, hook: Hook) -> Option<Hook> {
        let name = HookName::derive(identifier);
        tracing::debug!(hook = %name, "registering hook");
        self.hooks.insert(name, hook)
    }

    /// Resolve a binding identifier to its hook.
    pub fn resolve(&self, identifier: &str) -> Option<(HookName, &Hook)> {
        let name = HookName::derive(identifier);
        let hook = self.hooks.get(&name)?;
        Some((name, hook))
    }

    /// Look up a hook by its derived name (as written into program text).
    pub fn by_name(&self, name: &str) -> Option<&Hook> {
        self.hooks.get(&HookName::from(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &HookName> {
        self.hooks.keys()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
