//! Naming and scoping types shared by the compiler and the runtime.
//!
//! Scope variables are bare identifiers (`data`, `data_items_val`); the `$`
//! sigil is only added when they are written into program text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Suffix appended to a stripped directive identifier to form a hook name.
pub const HOOK_SUFFIX: &str = "hook";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// The registry key of a hook, e.g. `elsehook` for the `:else:` directive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HookName(pub String);

impl HookName {
    /// Derive the hook name for a directive identifier.
    ///
    /// Everything outside `[a-z0-9_]` is dropped before the suffix is added,
    /// so `:My-List:` maps to `yisthook`.
    pub fn derive(identifier: &str) -> Self {
        Self(format!("{}{HOOK_SUFFIX}", word(identifier)))
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for HookName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for HookName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Strip a directive identifier down to the characters allowed in variable
/// and hook names.
pub fn word(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

/// `true` when `name` is usable as a scope variable.
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

// ---------------------------------------------------------------------------
// ScopeChain
// ---------------------------------------------------------------------------

/// Scope variables from outermost to innermost.
///
/// Extending a chain always produces a new value; the parent's chain is left
/// untouched so sibling nodes never observe each other's loop variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeChain(Vec<String>);

impl ScopeChain {
    /// A chain holding only the root data variable.
    pub fn root(var: impl Into<String>) -> Self {
        Self(vec![var.into()])
    }

    /// The innermost (current) data variable.
    pub fn innermost(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// A copy of this chain with `var` pushed as the new innermost scope.
    pub fn extended(&self, var: impl Into<String>) -> Self {
        let mut vars = self.0.clone();
        vars.push(var.into());
        Self(vars)
    }

    /// Variables from outermost to innermost.
    pub fn vars(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ScopeChain {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ScopeChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" > "))
    }
}

// ---------------------------------------------------------------------------
// FormatterChain
// ---------------------------------------------------------------------------

/// Hook formatters in registration order. The default escaping formatter is
/// implicit and always applied first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatterChain(Vec<HookName>);

impl FormatterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hook: HookName) {
        self.0.push(hook);
    }

    /// Formatters in application order (first applied first).
    pub fn iter(&self) -> impl Iterator<Item = &HookName> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<HookName> for FormatterChain {
    fn from_iter<I: IntoIterator<Item = HookName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
