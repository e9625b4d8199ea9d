//! Lenient HTML reader.
//!
//! Builds a [`Document`] from template source without synthesizing any
//! `<html>`/`<body>` wrappers. Entities and attribute values are kept exactly
//! as written so the emitted program reproduces the source byte for byte
//! outside of expanded bindings. Tag names are lowercased; attribute names
//! keep their case.
//!
//! Text that HTML tolerates but an XML reader rejects is escaped before
//! reading: a bare `&` becomes `&amp;` and a `<` that does not open a tag,
//! comment or declaration becomes `&lt;`. `script` and `style` bodies are
//! lifted out beforehand and re-attached verbatim.

use std::collections::VecDeque;
use std::sync::LazyLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use crate::error::MarkupError;
use crate::tree::{Document, Element, NodeId, NodeKind};

/// Elements that never have content or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is read verbatim up to the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Character or named reference at the start of the input.
static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);")
        .expect("valid reference pattern")
});

/// Parse template source into a tree rooted at [`Document::root`].
pub fn parse(source: &str) -> Result<Document, MarkupError> {
    let Prepared {
        text: source,
        mut raw_bodies,
    } = prepare(source);
    let mut reader = Reader::from_str(&source);
    let config = reader.config_mut();
    config.trim_text(false);
    config.enable_all_checks(false);
    config.allow_unmatched_ends = true;

    let mut builder = TreeBuilder::new();
    loop {
        let event = reader.read_event().map_err(|err| MarkupError::Parse {
            position: reader.error_position(),
            source: err,
        })?;
        match event {
            Event::Start(start) => {
                let element = element_from(&start);
                let name = element.name.clone();
                if is_void(&name) {
                    builder.leaf(NodeKind::Element(element));
                } else if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                    builder.open(element);
                    let body = raw_bodies.pop_front().unwrap_or_default();
                    if !body.is_empty() {
                        builder.raw_child(builder.current(), &body);
                    }
                } else {
                    builder.open(element);
                }
            }
            Event::Empty(start) => {
                builder.leaf(NodeKind::Element(element_from(&start)));
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).to_ascii_lowercase();
                builder.close(&name);
            }
            Event::Text(text) => builder.text(&String::from_utf8_lossy(&text)),
            Event::GeneralRef(entity) => {
                builder.text(&format!("&{};", String::from_utf8_lossy(&entity)));
            }
            Event::CData(data) => {
                builder.text(&format!("<![CDATA[{}]]>", String::from_utf8_lossy(&data)));
            }
            Event::Comment(comment) => {
                builder.text(&format!("<!--{}-->", String::from_utf8_lossy(&comment)));
            }
            Event::DocType(doctype) => {
                builder.text(&format!(
                    "<!DOCTYPE {}>",
                    String::from_utf8_lossy(&doctype).trim()
                ));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(builder.finish())
}

// ---------------------------------------------------------------------------
// HTML tolerance
// ---------------------------------------------------------------------------

/// Source ready for the XML reader, plus the raw-text element bodies taken
/// out of it in document order.
#[derive(Debug)]
struct Prepared {
    text: String,
    raw_bodies: VecDeque<String>,
}

fn prepare(source: &str) -> Prepared {
    let mut prepared = Prepared {
        text: String::with_capacity(source.len()),
        raw_bodies: VecDeque::new(),
    };
    let mut rest = source;
    while let Some(pos) = rest.find(['<', '&']) {
        prepared.text.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let consumed = if rest.starts_with('&') {
            match REFERENCE.find(rest) {
                Some(reference) => {
                    prepared.text.push_str(reference.as_str());
                    reference.end()
                }
                None => {
                    prepared.text.push_str("&amp;");
                    1
                }
            }
        } else {
            match markup_len(rest) {
                Some(len) => {
                    prepared.text.push_str(&rest[..len]);
                    len + prepared.take_raw_body(&rest[..len], &rest[len..])
                }
                None => {
                    prepared.text.push_str("&lt;");
                    1
                }
            }
        };
        rest = &rest[consumed..];
    }
    prepared.text.push_str(rest);
    prepared
}

impl Prepared {
    /// After a `script`/`style` start tag, move the body up to the matching
    /// end tag into `raw_bodies`. Returns the number of bytes taken.
    fn take_raw_body(&mut self, tag: &str, after: &str) -> usize {
        if tag.starts_with("</") || tag.ends_with("/>") {
            return 0;
        }
        let name = tag_name(tag);
        if !RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            return 0;
        }
        let len = after
            .to_ascii_lowercase()
            .find(&format!("</{name}"))
            .unwrap_or(after.len());
        self.raw_bodies.push_back(after[..len].to_owned());
        len
    }
}

/// Length of the tag, comment or declaration starting at `rest[0] == '<'`,
/// or `None` when the `<` is plain text.
fn markup_len(rest: &str) -> Option<usize> {
    let after = &rest[1..];
    if after.starts_with("!--") {
        return Some(through(rest, 4, "-->").unwrap_or(rest.len()));
    }
    if after.starts_with("![CDATA[") {
        return Some(through(rest, 9, "]]>").unwrap_or(rest.len()));
    }
    if after.starts_with('?') {
        return Some(through(rest, 2, "?>").unwrap_or(rest.len()));
    }
    if after.starts_with('!') {
        return through(rest, 2, ">");
    }
    if let Some(end) = after.strip_prefix('/') {
        return if end.starts_with(|c: char| c.is_ascii_alphabetic()) {
            through(rest, 2, ">")
        } else {
            None
        };
    }
    if !after.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut quote = None;
    for (i, b) in rest.bytes().enumerate().skip(1) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => return Some(i + 1),
            _ => {}
        }
    }
    None
}

/// End offset of the first `terminator` at or after `from`.
fn through(rest: &str, from: usize, terminator: &str) -> Option<usize> {
    rest.get(from..)?
        .find(terminator)
        .map(|pos| from + pos + terminator.len())
}

/// Lowercased element name of a start tag.
fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'))
        .collect::<String>()
        .to_ascii_lowercase()
}

fn element_from(start: &BytesStart<'_>) -> Element {
    let name = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
    let attributes = start
        .html_attributes()
        .flatten()
        .map(|attr| {
            (
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                String::from_utf8_lossy(&attr.value).into_owned(),
            )
        })
        .collect();
    Element { name, attributes }
}

// ---------------------------------------------------------------------------
// Tree builder
// ---------------------------------------------------------------------------

/// Open-element stack over a [`Document`], merging adjacent text runs.
struct TreeBuilder {
    doc: Document,
    stack: Vec<NodeId>,
    pending_text: String,
}

impl TreeBuilder {
    fn new() -> Self {
        let doc = Document::new();
        let root = doc.root();
        Self {
            doc,
            stack: vec![root],
            pending_text: String::new(),
        }
    }

    fn current(&self) -> NodeId {
        self.stack.last().copied().unwrap_or_else(|| self.doc.root())
    }

    fn flush_text(&mut self) {
        if self.pending_text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending_text);
        let id = self.doc.create(NodeKind::Text(text));
        let parent = self.current();
        self.doc.append_child(parent, id);
    }

    fn text(&mut self, text: &str) {
        self.pending_text.push_str(text);
    }

    fn raw_child(&mut self, parent: NodeId, text: &str) {
        let id = self.doc.create(NodeKind::Text(text.to_owned()));
        self.doc.append_child(parent, id);
    }

    fn leaf(&mut self, kind: NodeKind) -> NodeId {
        self.flush_text();
        let id = self.doc.create(kind);
        let parent = self.current();
        self.doc.append_child(parent, id);
        id
    }

    fn open(&mut self, element: Element) {
        let id = self.leaf(NodeKind::Element(element));
        self.stack.push(id);
    }

    /// Close the nearest open element named `name`, implicitly closing any
    /// elements opened after it. Unmatched end tags are dropped.
    fn close(&mut self, name: &str) {
        self.flush_text();
        let Some(depth) = self.stack.iter().rposition(|&id| {
            self.doc.element(id).is_some_and(|el| el.name == name)
        }) else {
            tracing::trace!(tag = name, "dropping unmatched end tag");
            return;
        };
        self.stack.truncate(depth);
    }

    fn finish(mut self) -> Document {
        self.flush_text();
        self.doc
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn root_children(doc: &Document) -> Vec<NodeKind> {
        doc.children(doc.root())
            .iter()
            .map(|&id| doc.kind(id).clone())
            .collect()
    }

    #[test]
    fn leading_text_is_not_wrapped() {
        let doc = parse("hello <b>world</b>").expect("parse");
        let kids = root_children(&doc);
        assert_eq!(kids[0], NodeKind::Text("hello ".into()));
        assert!(matches!(&kids[1], NodeKind::Element(el) if el.name == "b"));
    }

    #[test]
    fn binding_attributes_keep_order_and_case() {
        let doc = parse(r#"<LI class="row" :Items: id="x"></LI>"#).expect("parse");
        let li = doc.children(doc.root())[0];
        let el = doc.element(li).expect("element");
        assert_eq!(el.name, "li");
        let names: Vec<&str> = el.attributes.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["class", ":Items:", "id"]);
        assert_eq!(doc.attribute(li, ":Items:"), Some(""));
    }

    #[test]
    fn void_elements_take_no_children() {
        let doc = parse("<p>a<br>b</p>").expect("parse");
        let p = doc.children(doc.root())[0];
        assert_eq!(doc.children(p).len(), 3);
        let br = doc.children(p)[1];
        assert!(doc.children(br).is_empty());
    }

    #[test]
    fn entities_are_kept_verbatim() {
        let doc = parse("<p>a &amp; b &lt; c</p>").expect("parse");
        let p = doc.children(doc.root())[0];
        assert_eq!(doc.children(p).len(), 1);
        assert_eq!(
            doc.kind(doc.children(p)[0]),
            &NodeKind::Text("a &amp; b &lt; c".into())
        );
    }

    #[test]
    fn unmatched_end_tag_is_dropped() {
        let doc = parse("<div>x</span></div>").expect("parse");
        let div = doc.children(doc.root())[0];
        assert_eq!(doc.children(div).len(), 1);
    }

    #[test]
    fn unclosed_elements_are_closed_by_ancestor() {
        let doc = parse("<ul><li>a<li>b</ul>tail").expect("parse");
        let kids = doc.children(doc.root());
        assert_eq!(kids.len(), 2);
        assert_eq!(doc.kind(kids[1]), &NodeKind::Text("tail".into()));
    }

    #[test]
    fn bare_ampersand_is_text() {
        let doc = parse("<p>Tom & Jerry &amp; co &#38; &x</p>").expect("parse");
        let p = doc.children(doc.root())[0];
        assert_eq!(
            doc.kind(doc.children(p)[0]),
            &NodeKind::Text("Tom &amp; Jerry &amp; co &#38; &amp;x".into())
        );
    }

    #[test]
    fn stray_less_than_is_text() {
        let doc = parse("<p>1 < 2 <3 </ x</p><b>y</b>").expect("parse");
        let kids = doc.children(doc.root());
        assert_eq!(kids.len(), 2);
        assert_eq!(
            doc.kind(doc.children(kids[0])[0]),
            &NodeKind::Text("1 &lt; 2 &lt;3 &lt;/ x".into())
        );
        assert_eq!(doc.element(kids[1]).map(|el| el.name.as_str()), Some("b"));
    }

    #[test]
    fn unclosed_tag_at_end_is_text() {
        let doc = parse("a <b").expect("parse");
        assert_eq!(root_children(&doc), [NodeKind::Text("a &lt;b".into())]);
    }

    #[test]
    fn script_body_is_kept_verbatim() {
        let source = "<script>if (a < b && c) { x = '</p>'; }</script><p>after</p>";
        let doc = parse(source).expect("parse");
        let kids = doc.children(doc.root());
        assert_eq!(kids.len(), 2);
        assert_eq!(
            doc.kind(doc.children(kids[0])[0]),
            &NodeKind::Text("if (a < b && c) { x = '</p>'; }".into())
        );
        assert_eq!(doc.element(kids[1]).map(|el| el.name.as_str()), Some("p"));
    }

    #[test]
    fn quoted_gt_stays_inside_tag() {
        let doc = parse(r#"<a title="x > y" href="?a=1&b=2">z</a>"#).expect("parse");
        let a = doc.children(doc.root())[0];
        assert_eq!(doc.attribute(a, "title"), Some("x > y"));
        assert_eq!(doc.attribute(a, "href"), Some("?a=1&b=2"));
    }

    #[test]
    fn comments_survive() {
        let doc = parse("<!-- note --><p></p>").expect("parse");
        assert_eq!(
            root_children(&doc)[0],
            NodeKind::Text("<!-- note -->".into())
        );
    }
}
