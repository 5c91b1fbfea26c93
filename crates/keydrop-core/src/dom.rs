#![forbid(unsafe_code)]

//! Document model consumed by the backend.
//!
//! The backend never reaches for ambient globals. Everything it needs from
//! the page (structure, focus, labels, and the handful of mutations the
//! previewer performs) goes through the [`Document`] trait, which a browser
//! binding implements over real DOM nodes and tests implement in memory.

use std::cell::RefCell;
use std::rc::Rc;

use bitflags::bitflags;

use crate::geometry::{Point, Rect};

/// Opaque handle to a node owned by the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Result of `compare_document_position(reference, other)`: where
    /// `other` sits relative to `reference`. Values match the DOM constants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DocumentPosition: u16 {
        const DISCONNECTED = 0x01;
        const PRECEDING = 0x02;
        const FOLLOWING = 0x04;
        const CONTAINS = 0x08;
        const CONTAINED_BY = 0x10;
        const IMPLEMENTATION_SPECIFIC = 0x20;
    }
}

impl DocumentPosition {
    /// `other` comes after the reference in tree order (descendants included).
    #[must_use]
    pub fn is_after(self) -> bool {
        self.intersects(Self::FOLLOWING | Self::CONTAINED_BY) && !self.contains(Self::DISCONNECTED)
    }

    /// `other` comes before the reference in tree order (ancestors included).
    #[must_use]
    pub fn is_before(self) -> bool {
        self.intersects(Self::PRECEDING | Self::CONTAINS) && !self.contains(Self::DISCONNECTED)
    }
}

/// Host document capabilities.
///
/// Query methods on unknown nodes return neutral values (`None`, `false`,
/// empty); mutating methods on unknown nodes do nothing.
pub trait Document {
    // --- structure ---

    /// Root element that hosts overlays (the `<body>`).
    fn body(&self) -> NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Position of `other` relative to `reference`.
    fn compare_document_position(&self, reference: NodeId, other: NodeId) -> DocumentPosition;

    /// True if the node is attached to this document.
    fn is_connected(&self, node: NodeId) -> bool;

    /// True if `descendant` is `ancestor` or inside it.
    fn contains(&self, ancestor: NodeId, descendant: NodeId) -> bool;

    // --- layout ---

    fn bounding_client_rect(&self, node: NodeId) -> Option<Rect>;

    // --- focus ---

    fn active_element(&self) -> Option<NodeId>;

    fn focus(&mut self, node: NodeId);

    fn tab_index(&self, node: NodeId) -> i32;

    fn set_tab_index(&mut self, node: NodeId, tab_index: i32);

    // --- labels ---

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Rendered text content of the node.
    fn inner_text(&self, node: NodeId) -> Option<String>;

    // --- element building ---

    fn create_element(&mut self, tag: &str) -> NodeId;

    fn append_child(&mut self, parent: NodeId, child: NodeId);

    fn remove_child(&mut self, parent: NodeId, child: NodeId);

    /// Deep clone of `node`, detached from the tree.
    fn clone_node(&mut self, node: NodeId) -> NodeId;

    /// Remove every child of `node`.
    fn clear_children(&mut self, node: NodeId);

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    fn set_class_name(&mut self, node: NodeId, class_name: &str);

    /// Set one inline style property.
    fn set_style(&mut self, node: NodeId, property: &str, value: &str);
}

impl<T: Document + ?Sized> Document for Rc<RefCell<T>> {
    fn body(&self) -> NodeId {
        self.borrow().body()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.borrow().parent(node)
    }

    fn compare_document_position(&self, reference: NodeId, other: NodeId) -> DocumentPosition {
        self.borrow().compare_document_position(reference, other)
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.borrow().is_connected(node)
    }

    fn contains(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        self.borrow().contains(ancestor, descendant)
    }

    fn bounding_client_rect(&self, node: NodeId) -> Option<Rect> {
        self.borrow().bounding_client_rect(node)
    }

    fn active_element(&self) -> Option<NodeId> {
        self.borrow().active_element()
    }

    fn focus(&mut self, node: NodeId) {
        self.borrow_mut().focus(node);
    }

    fn tab_index(&self, node: NodeId) -> i32 {
        self.borrow().tab_index(node)
    }

    fn set_tab_index(&mut self, node: NodeId, tab_index: i32) {
        self.borrow_mut().set_tab_index(node, tab_index);
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.borrow().attribute(node, name)
    }

    fn inner_text(&self, node: NodeId) -> Option<String> {
        self.borrow().inner_text(node)
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.borrow_mut().create_element(tag)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.borrow_mut().append_child(parent, child);
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.borrow_mut().remove_child(parent, child);
    }

    fn clone_node(&mut self, node: NodeId) -> NodeId {
        self.borrow_mut().clone_node(node)
    }

    fn clear_children(&mut self, node: NodeId) {
        self.borrow_mut().clear_children(node);
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.borrow_mut().set_attribute(node, name, value);
    }

    fn set_class_name(&mut self, node: NodeId, class_name: &str) {
        self.borrow_mut().set_class_name(node, class_name);
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        self.borrow_mut().set_style(node, property, value);
    }
}

/// Client offset of a node: the top-left of its bounding rect, or the
/// origin when it has no layout box.
#[must_use]
pub fn node_client_offset<D: Document + ?Sized>(
    document: &D,
    node: Option<NodeId>,
) -> Point {
    node.and_then(|node| document.bounding_client_rect(node))
        .map_or(Point::ORIGIN, |rect| rect.top_left())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn following_and_descendants_are_after() {
        assert!(DocumentPosition::FOLLOWING.is_after());
        assert!((DocumentPosition::FOLLOWING | DocumentPosition::CONTAINED_BY).is_after());
        assert!(!DocumentPosition::PRECEDING.is_after());
        assert!(!DocumentPosition::empty().is_after());
        assert!(!(DocumentPosition::DISCONNECTED | DocumentPosition::FOLLOWING).is_after());
    }

    #[test]
    fn preceding_and_ancestors_are_before() {
        assert!(DocumentPosition::PRECEDING.is_before());
        assert!((DocumentPosition::PRECEDING | DocumentPosition::CONTAINS).is_before());
        assert!(!DocumentPosition::FOLLOWING.is_before());
        assert!(
            !(DocumentPosition::DISCONNECTED
                | DocumentPosition::PRECEDING
                | DocumentPosition::IMPLEMENTATION_SPECIFIC)
                .is_before()
        );
    }

    #[test]
    fn dom_constant_values() {
        assert_eq!(DocumentPosition::FOLLOWING.bits(), 4);
        assert_eq!(DocumentPosition::CONTAINED_BY.bits(), 16);
    }
}
