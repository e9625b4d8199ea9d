//! Recursive tree rewrite.
//!
//! Expansion walks the tree depth-first. For every node it:
//! 1. turns binding attributes (`:items:`) into hook dispatch or into an
//!    `if`/`foreach` scaffold around the node;
//! 2. expands the children with the (possibly extended) scope chain;
//! 3. serializes the node and rewrites text placeholders (`:name:`,
//!    `:partial.html:`) into `echo`/`include` directives;
//! 4. replaces the node with a fragment holding that text.
//!
//! After expansion from the root, the document holds a single fragment with
//! the whole program.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use colonnade_core::types::word;
use colonnade_core::{
    Directive, Document, FormatterChain, HookRegistry, NodeId, NodeKind, ScopeChain,
};

use crate::emitter::emit;
use crate::resolver::resolve;

/// `:identifier:` as an attribute name or a text placeholder.
static BINDING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":([A-Za-z0-9_-]+):").expect("valid binding pattern"));

/// `:path/to/partial.ext:` as a text placeholder.
static INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":([A-Za-z0-9_./-]+\.[A-Za-z0-9_-]+):").expect("valid include pattern")
});

/// Tree rewriter bound to a hook registry.
#[derive(Debug, Clone, Copy)]
pub struct MacroExpander<'a> {
    hooks: &'a HookRegistry,
}

impl<'a> MacroExpander<'a> {
    pub fn new(hooks: &'a HookRegistry) -> Self {
        Self { hooks }
    }

    /// Expand `node` and its subtree in place.
    ///
    /// Directive and fragment nodes are already program text and are left
    /// alone.
    pub fn expand(
        &self,
        doc: &mut Document,
        node: NodeId,
        scope: &ScopeChain,
        formatters: &FormatterChain,
    ) {
        if matches!(doc.kind(node), NodeKind::Directive(_) | NodeKind::Fragment(_)) {
            return;
        }

        let datavar = scope.innermost().to_owned();
        let mut scope = scope.clone();
        let mut formatters = formatters.clone();

        // 1. Attributes
        let attributes = doc.attributes(node).to_vec();
        for (name, _) in attributes {
            let Some(identifier) = BINDING.captures(&name).map(|c| c[1].to_owned()) else {
                continue;
            };
            doc.remove_attribute(node, &name);

            if let Some((hook_name, hook)) = self.hooks.resolve(&identifier) {
                tracing::debug!(hook = %hook_name, node = node.index(), "dispatching hook");
                if let Some(op) = hook.macro_op() {
                    op.expand(doc, node, &scope);
                }
                if hook.format_op().is_some() {
                    formatters.push(hook_name);
                }
            } else {
                scope = self.iterate(doc, node, &scope, &datavar, &identifier);
            }
        }

        // 2. Children
        let children = doc.children(node).to_vec();
        for child in children {
            self.expand(doc, child, &scope, &formatters);
        }

        // 3. Text placeholders
        let html = emit(doc, node);
        let html = INCLUDE.replace_all(&html, |caps: &Captures<'_>| {
            Directive::Include {
                path: caps[1].to_owned(),
                data: datavar.clone(),
            }
            .to_string()
        });
        let html = BINDING.replace_all(&html, |caps: &Captures<'_>| {
            Directive::Echo {
                expr: echo_expr(&scope, &formatters, &caps[1]),
            }
            .to_string()
        });

        // 4. Replace
        let fragment = doc.create_fragment(html.into_owned());
        if doc.insert_before(node, fragment) {
            doc.detach(node);
        } else {
            doc.replace_children(node, fragment);
        }
    }

    /// Default handling of an unhooked binding: guard the node with an
    /// existence check and loop over its children.
    ///
    /// Returns `scope` extended with the loop's value variable.
    fn iterate(
        &self,
        doc: &mut Document,
        node: NodeId,
        scope: &ScopeChain,
        datavar: &str,
        identifier: &str,
    ) -> ScopeChain {
        let collection = format!("{datavar}_{}", word(identifier));
        let key = format!("{collection}_key");
        let value = format!("{collection}_val");
        tracing::trace!(%identifier, %collection, scope = %scope, "default iteration");

        let guard = doc.create_directive(Directive::If {
            binding: collection.clone(),
            source: resolve(scope, identifier),
        });
        let open = doc.create_directive(Directive::Foreach {
            collection,
            key,
            value: value.clone(),
        });
        let close = doc.create_directive(Directive::EndForeach);
        let end = doc.create_directive(Directive::EndIf);

        doc.insert_before(node, guard);
        doc.prepend_child(node, open);
        doc.append_child(node, close);
        doc.insert_after(node, end);

        scope.extended(value)
    }
}

/// `escape(lookup)` wrapped by each hook formatter, first registered
/// innermost.
fn echo_expr(scope: &ScopeChain, formatters: &FormatterChain, key: &str) -> String {
    let mut expr = format!("escape({})", resolve(scope, key));
    for hook in formatters.iter() {
        expr = format!("{hook}({expr})");
    }
    expr
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
