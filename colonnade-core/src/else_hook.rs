//! Built-in `:else:` hook.
//!
//! `<li :items:>…</li><li :else:>none</li>` turns the second element into the
//! alternative branch of the guard wrapped around the first: the nearest
//! preceding `endif` marker is moved after the node and an `else` marker is
//! inserted before it.

use crate::directive::Directive;
use crate::registry::MacroHook;
use crate::tree::{Document, NodeId};
use crate::types::ScopeChain;

/// Macro operation registered as `elsehook` by
/// [`HookRegistry::with_builtins`](crate::registry::HookRegistry::with_builtins).
#[derive(Debug, Clone, Copy, Default)]
pub struct ElseHook;

impl MacroHook for ElseHook {
    fn expand(&self, doc: &mut Document, node: NodeId, _scope: &ScopeChain) {
        let Some(end_if) = nearest_end_if(doc, node) else {
            tracing::debug!(node = node.index(), "else without preceding block, ignored");
            return;
        };
        if has_else_branch(doc, end_if) {
            tracing::debug!(node = node.index(), "block already has an else branch, ignored");
            return;
        }

        let else_marker = doc.create_directive(Directive::Else);
        if !doc.insert_before(node, else_marker) {
            return;
        }
        doc.insert_after(node, end_if);
    }
}

fn nearest_end_if(doc: &Document, node: NodeId) -> Option<NodeId> {
    doc.preceding_siblings(node)
        .into_iter()
        .find(|&id| doc.directive(id).is_some_and(Directive::is_end_if))
}

/// Walk back from `end_if` to its matching `if`, looking for an `else` that
/// belongs to the same block.
fn has_else_branch(doc: &Document, end_if: NodeId) -> bool {
    let mut depth = 0usize;
    for id in doc.preceding_siblings(end_if) {
        match doc.directive(id) {
            Some(Directive::EndIf) => depth += 1,
            Some(Directive::If { .. }) if depth == 0 => return false,
            Some(Directive::If { .. }) => depth -= 1,
            Some(Directive::Else) if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Element, NodeKind};

    fn guard() -> Directive {
        Directive::If {
            binding: "data_items".into(),
            source: "$data[\"items\"]".into(),
        }
    }

    fn element(doc: &mut Document, name: &str) -> NodeId {
        let id = doc.create(NodeKind::Element(Element::new(name)));
        let root = doc.root();
        doc.append_child(root, id);
        id
    }

    fn directive(doc: &mut Document, d: Directive) -> NodeId {
        let id = doc.create_directive(d);
        let root = doc.root();
        doc.append_child(root, id);
        id
    }

    fn shape(doc: &Document) -> Vec<String> {
        doc.children(doc.root())
            .iter()
            .map(|&id| match doc.kind(id) {
                NodeKind::Directive(Directive::If { .. }) => "if".to_string(),
                NodeKind::Directive(Directive::Else) => "else".to_string(),
                NodeKind::Directive(Directive::EndIf) => "endif".to_string(),
                NodeKind::Element(el) => el.name.clone(),
                other => format!("{other:?}"),
            })
            .collect()
    }

    #[test]
    fn moves_endif_after_node() {
        let mut doc = Document::new();
        directive(&mut doc, guard());
        element(&mut doc, "li");
        directive(&mut doc, Directive::EndIf);
        let alt = element(&mut doc, "p");

        ElseHook.expand(&mut doc, alt, &ScopeChain::root("data"));
        assert_eq!(shape(&doc), ["if", "li", "else", "p", "endif"]);
    }

    #[test]
    fn no_preceding_block_is_noop() {
        let mut doc = Document::new();
        element(&mut doc, "li");
        let alt = element(&mut doc, "p");

        ElseHook.expand(&mut doc, alt, &ScopeChain::root("data"));
        assert_eq!(shape(&doc), ["li", "p"]);
    }

    #[test]
    fn second_else_is_noop() {
        let mut doc = Document::new();
        directive(&mut doc, guard());
        element(&mut doc, "li");
        directive(&mut doc, Directive::EndIf);
        let first = element(&mut doc, "p");
        let second = element(&mut doc, "span");

        let scope = ScopeChain::root("data");
        ElseHook.expand(&mut doc, first, &scope);
        ElseHook.expand(&mut doc, second, &scope);
        assert_eq!(shape(&doc), ["if", "li", "else", "p", "endif", "span"]);
    }

    #[test]
    fn nested_blocks_before_the_guard_do_not_count() {
        let mut doc = Document::new();
        directive(&mut doc, guard());
        element(&mut doc, "a");
        directive(&mut doc, Directive::Else);
        element(&mut doc, "b");
        directive(&mut doc, Directive::EndIf);
        directive(&mut doc, guard());
        element(&mut doc, "li");
        directive(&mut doc, Directive::EndIf);
        let alt = element(&mut doc, "p");

        ElseHook.expand(&mut doc, alt, &ScopeChain::root("data"));
        assert_eq!(
            shape(&doc),
            ["if", "a", "else", "b", "endif", "if", "li", "else", "p", "endif"]
        );
    }
}
