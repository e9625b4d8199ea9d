//! Tree serialization.
//!
//! Writes a (sub)tree back out as markup, with directive nodes rendered as
//! `<?tpl … ?>` and fragments copied verbatim.

use colonnade_core::markup::is_void;
use colonnade_core::{Document, NodeId, NodeKind};

/// Serialize `node` and everything below it.
pub fn emit(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    match doc.kind(node) {
        NodeKind::Document => write_children(doc, node, out),
        NodeKind::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for (name, value) in &el.attributes {
                out.push(' ');
                out.push_str(name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    out.push_str(&value.replace('"', "&quot;"));
                    out.push('"');
                }
            }
            out.push('>');
            write_children(doc, node, out);
            if !is_void(&el.name) {
                out.push_str("</");
                out.push_str(&el.name);
                out.push('>');
            }
        }
        NodeKind::Text(text) | NodeKind::Fragment(text) => out.push_str(text),
        NodeKind::Directive(directive) => out.push_str(&directive.to_string()),
    }
}

fn write_children(doc: &Document, node: NodeId, out: &mut String) {
    for &child in doc.children(node) {
        write_node(doc, child, out);
    }
}
