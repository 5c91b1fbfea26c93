#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::dom::{Document, DocumentPosition, NodeId};
use crate::geometry::Rect;

/// Tags that are focusable without an explicit tab index.
const INTERACTIVE_TAGS: &[&str] = &["a", "button", "input", "select", "textarea"];

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, String>,
    class_name: String,
    text: String,
    tab_index: Option<i32>,
    rect: Option<Rect>,
}

/// Element tree rooted at `<html>` with a single `<body>`.
#[derive(Debug, Clone)]
pub struct FakeDocument {
    nodes: Vec<NodeData>,
    root: NodeId,
    body: NodeId,
    active: Option<NodeId>,
    focus_log: Vec<NodeId>,
}

impl Default for FakeDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDocument {
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            active: None,
            focus_log: Vec::new(),
        };
        doc.root = doc.alloc("html");
        doc.body = doc.alloc("body");
        let (root, body) = (doc.root, doc.body);
        doc.append_child(root, body);
        doc
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len() as u64);
        self.nodes.push(NodeData {
            tag: tag.to_owned(),
            ..NodeData::default()
        });
        id
    }

    fn node(&self, id: NodeId) -> Option<&NodeData> {
        usize::try_from(id.0).ok().and_then(|i| self.nodes.get(i))
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        usize::try_from(id.0).ok().and_then(|i| self.nodes.get_mut(i))
    }

    // --- builders ---

    /// Create an element and append it under `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.alloc(tag);
        self.append_child(parent, id);
        id
    }

    /// Set the element's own text (contributes to `inner_text`).
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(data) = self.node_mut(node) {
            data.text = text.to_owned();
        }
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if let Some(data) = self.node_mut(node) {
            data.rect = Some(rect);
        }
    }

    /// Remove `node` from its parent, leaving it disconnected.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.parent(node) {
            self.remove_child(parent, node);
        }
    }

    // --- inspection ---

    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).map(|n| n.children.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|n| n.tag.as_str())
    }

    #[must_use]
    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.node(node)
            .and_then(|n| n.style.get(property))
            .map(String::as_str)
    }

    #[must_use]
    pub fn class_name(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|n| n.class_name.as_str())
    }

    /// True if the element has an explicit tab index or is interactive.
    #[must_use]
    pub fn is_focusable(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| {
            n.tab_index.is_some() || INTERACTIVE_TAGS.contains(&n.tag.as_str())
        })
    }

    /// Every node that received focus, in order.
    #[must_use]
    pub fn focus_log(&self) -> &[NodeId] {
        &self.focus_log
    }

    /// Total nodes ever allocated (connected or not).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(node);
        while let Some(parent) = cursor {
            out.push(parent);
            cursor = self.parent(parent);
        }
        out
    }

    fn tree_root(&self, node: NodeId) -> NodeId {
        self.ancestors(node).last().copied().unwrap_or(node)
    }

    /// Child-index path from the tree root down to `node`.
    fn index_path(&self, node: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            let index = self
                .node(parent)
                .and_then(|p| p.children.iter().position(|&c| c == current))
                .unwrap_or(0);
            path.push(index);
            current = parent;
        }
        path.reverse();
        path
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.node(node) else {
            return;
        };
        out.push_str(&data.text);
        for &child in &data.children {
            self.collect_text(child, out);
        }
    }

    fn deep_clone(&mut self, node: NodeId) -> Option<NodeId> {
        let data = self.node(node)?.clone();
        let copy = self.alloc(&data.tag);
        if let Some(target) = self.node_mut(copy) {
            target.attributes = data.attributes;
            target.style = data.style;
            target.class_name = data.class_name;
            target.text = data.text;
            target.tab_index = data.tab_index;
            target.rect = data.rect;
        }
        for child in data.children {
            if let Some(child_copy) = self.deep_clone(child) {
                self.append_child(copy, child_copy);
            }
        }
        Some(copy)
    }
}

impl Document for FakeDocument {
    fn body(&self) -> NodeId {
        self.body
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    fn compare_document_position(&self, reference: NodeId, other: NodeId) -> DocumentPosition {
        if reference == other {
            return DocumentPosition::empty();
        }
        if self.node(reference).is_none()
            || self.node(other).is_none()
            || self.tree_root(reference) != self.tree_root(other)
        {
            let direction = if other.0 < reference.0 {
                DocumentPosition::PRECEDING
            } else {
                DocumentPosition::FOLLOWING
            };
            return DocumentPosition::DISCONNECTED
                | DocumentPosition::IMPLEMENTATION_SPECIFIC
                | direction;
        }
        if self.ancestors(reference).contains(&other) {
            return DocumentPosition::CONTAINS | DocumentPosition::PRECEDING;
        }
        if self.ancestors(other).contains(&reference) {
            return DocumentPosition::CONTAINED_BY | DocumentPosition::FOLLOWING;
        }
        match self.index_path(other).cmp(&self.index_path(reference)) {
            Ordering::Less => DocumentPosition::PRECEDING,
            _ => DocumentPosition::FOLLOWING,
        }
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.node(node).is_some() && self.tree_root(node) == self.root
    }

    fn contains(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        ancestor == descendant || self.ancestors(descendant).contains(&ancestor)
    }

    fn bounding_client_rect(&self, node: NodeId) -> Option<Rect> {
        self.node(node).and_then(|n| n.rect)
    }

    fn active_element(&self) -> Option<NodeId> {
        self.active.or(Some(self.body))
    }

    fn focus(&mut self, node: NodeId) {
        if self.is_connected(node) && self.is_focusable(node) {
            self.active = Some(node);
            self.focus_log.push(node);
        }
    }

    fn tab_index(&self, node: NodeId) -> i32 {
        self.node(node).map_or(-1, |n| {
            n.tab_index.unwrap_or(if INTERACTIVE_TAGS.contains(&n.tag.as_str()) {
                0
            } else {
                -1
            })
        })
    }

    fn set_tab_index(&mut self, node: NodeId, tab_index: i32) {
        if let Some(data) = self.node_mut(node) {
            data.tab_index = Some(tab_index);
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.node(node).and_then(|n| n.attributes.get(name).cloned())
    }

    fn inner_text(&self, node: NodeId) -> Option<String> {
        self.node(node)?;
        let mut text = String::new();
        self.collect_text(node, &mut text);
        Some(text)
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(tag)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if self.node(parent).is_none() || self.node(child).is_none() || self.contains(child, parent)
        {
            return;
        }
        self.detach(child);
        if let Some(data) = self.node_mut(child) {
            data.parent = Some(parent);
        }
        if let Some(data) = self.node_mut(parent) {
            data.children.push(child);
        }
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.parent(child) != Some(parent) {
            return;
        }
        if let Some(data) = self.node_mut(parent) {
            data.children.retain(|&c| c != child);
        }
        if let Some(data) = self.node_mut(child) {
            data.parent = None;
        }
        if self.active.is_some_and(|active| self.contains(child, active)) {
            self.active = None;
        }
    }

    fn clone_node(&mut self, node: NodeId) -> NodeId {
        self.deep_clone(node).unwrap_or_else(|| self.alloc("div"))
    }

    fn clear_children(&mut self, node: NodeId) {
        for child in self.children(node) {
            self.remove_child(node, child);
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(data) = self.node_mut(node) {
            data.attributes.insert(name.to_owned(), value.to_owned());
        }
    }

    fn set_class_name(&mut self, node: NodeId, class_name: &str) {
        if let Some(data) = self.node_mut(node) {
            data.class_name = class_name.to_owned();
        }
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        if let Some(data) = self.node_mut(node) {
            data.style.insert(property.to_owned(), value.to_owned());
        }
    }
}
