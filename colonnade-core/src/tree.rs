//! Mutable document tree.
//!
//! Nodes live in an arena owned by [`Document`] and refer to each other by
//! [`NodeId`]. A parent owns the order of its children; the child's `parent`
//! field is a back-reference only. Detached nodes stay in the arena (ids are
//! never reused) but are unreachable from the root.

use crate::directive::Directive;

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An element's tag name and attributes, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

/// What a node holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The tree root; serializes as its children.
    Document,
    Element(Element),
    /// Raw source text (entities are kept as written).
    Text(String),
    Directive(Directive),
    /// Already-expanded output; emitted verbatim and never expanded again.
    Fragment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed markup tree.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only the root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Allocate a detached node.
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn create_directive(&mut self, directive: Directive) -> NodeId {
        self.create(NodeKind::Directive(directive))
    }

    pub fn create_fragment(&mut self, text: impl Into<String>) -> NodeId {
        self.create(NodeKind::Fragment(text.into()))
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn directive(&self, id: NodeId) -> Option<&Directive> {
        match &self.nodes[id.0].kind {
            NodeKind::Directive(d) => Some(d),
            _ => None,
        }
    }

    /// Attributes of an element; empty for every other kind.
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        self.element(id)
            .map(|el| el.attributes.as_slice())
            .unwrap_or_default()
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Siblings before `id`, nearest first.
    pub fn preceding_siblings(&self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(id) else {
            return Vec::new();
        };
        let siblings = self.children(parent);
        let Some(pos) = siblings.iter().position(|&c| c == id) else {
            return Vec::new();
        };
        siblings[..pos].iter().rev().copied().collect()
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Remove an attribute from an element, returning its value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let NodeKind::Element(el) = &mut self.nodes[id.0].kind else {
            return None;
        };
        let pos = el.attributes.iter().position(|(k, _)| k == name)?;
        Some(el.attributes.remove(pos).1)
    }

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `child` as the first child of `parent`, moving it if attached.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.insert(0, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Insert `node` immediately before `reference`.
    ///
    /// Returns `false` (and leaves `node` untouched) when `reference` has no
    /// parent.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> bool {
        self.insert_relative(reference, node, 0)
    }

    /// Insert `node` immediately after `reference`.
    ///
    /// Returns `false` (and leaves `node` untouched) when `reference` has no
    /// parent.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> bool {
        self.insert_relative(reference, node, 1)
    }

    fn insert_relative(&mut self, reference: NodeId, node: NodeId, offset: usize) -> bool {
        if reference == node || self.parent(reference).is_none() {
            return false;
        }
        self.detach(node);
        let Some(parent) = self.parent(reference) else {
            return false;
        };
        let siblings = &mut self.nodes[parent.0].children;
        let Some(pos) = siblings.iter().position(|&c| c == reference) else {
            return false;
        };
        siblings.insert(pos + offset, node);
        self.nodes[node.0].parent = Some(parent);
        true
    }

    /// Unlink `id` from its parent. No-op for detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return;
        };
        self.nodes[parent.0].children.retain(|&c| c != id);
    }

    /// Replace every child of `parent` with `child`.
    pub fn replace_children(&mut self, parent: NodeId, child: NodeId) {
        let old = std::mem::take(&mut self.nodes[parent.0].children);
        for id in old {
            self.nodes[id.0].parent = None;
        }
        self.append_child(parent, child);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
