#![forbid(unsafe_code)]

//! Drag-drop manager interface.
//!
//! The manager owns authoritative drag state: which source is dragged, which
//! targets accept it, and the global begin/hover/drop/end transitions. Input
//! backends drive it through actions and read it back through monitor
//! queries. This module only describes that contract.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geometry::Point;

/// Source, target, or handler identifier assigned by the manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for Identifier {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::borrow::Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Type tag of a dragged item, matched against target accept lists.
pub type ItemType = String;

/// Options passed with the begin-drag action.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BeginDragOptions {
    /// Pointer-equivalent position the drag starts from.
    pub client_offset: Option<Point>,
    /// Explicit source offset (what the offset getter yields for the source).
    pub source_client_offset: Option<Point>,
    /// Publish the source as part of begin-drag. Keyboard drags publish
    /// separately with [`DragDropManager::publish_drag_source`].
    pub publish_source: bool,
    pub item: Option<Value>,
    pub item_type: Option<ItemType>,
}

/// Options passed with the hover action.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HoverOptions {
    pub client_offset: Option<Point>,
}

/// Actions and monitor queries of the drag-drop manager.
pub trait DragDropManager {
    // --- actions ---

    fn begin_drag(&mut self, source_ids: &[Identifier], options: BeginDragOptions);

    fn publish_drag_source(&mut self);

    fn hover(&mut self, target_ids: &[Identifier], options: HoverOptions);

    /// Drop the dragged item on the hovered targets.
    fn perform_drop(&mut self);

    fn end_drag(&mut self);

    // --- monitor ---

    fn is_dragging(&self) -> bool;

    fn can_drag_source(&self, source_id: &Identifier) -> bool;

    fn can_drop_on_target(&self, target_id: &Identifier) -> bool;

    fn source_id(&self) -> Option<Identifier>;

    fn item(&self) -> Option<Value>;

    fn item_type(&self) -> Option<ItemType>;

    /// Current client offset of the dragged source, if a drag is active.
    fn source_client_offset(&self) -> Option<Point>;
}

impl<T: DragDropManager + ?Sized> DragDropManager for Rc<RefCell<T>> {
    fn begin_drag(&mut self, source_ids: &[Identifier], options: BeginDragOptions) {
        self.borrow_mut().begin_drag(source_ids, options);
    }

    fn publish_drag_source(&mut self) {
        self.borrow_mut().publish_drag_source();
    }

    fn hover(&mut self, target_ids: &[Identifier], options: HoverOptions) {
        self.borrow_mut().hover(target_ids, options);
    }

    fn perform_drop(&mut self) {
        self.borrow_mut().perform_drop();
    }

    fn end_drag(&mut self) {
        self.borrow_mut().end_drag();
    }

    fn is_dragging(&self) -> bool {
        self.borrow().is_dragging()
    }

    fn can_drag_source(&self, source_id: &Identifier) -> bool {
        self.borrow().can_drag_source(source_id)
    }

    fn can_drop_on_target(&self, target_id: &Identifier) -> bool {
        self.borrow().can_drop_on_target(target_id)
    }

    fn source_id(&self) -> Option<Identifier> {
        self.borrow().source_id()
    }

    fn item(&self) -> Option<Value> {
        self.borrow().item()
    }

    fn item_type(&self) -> Option<ItemType> {
        self.borrow().item_type()
    }

    fn source_client_offset(&self) -> Option<Point> {
        self.borrow().source_client_offset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_display_and_lookup() {
        let id = Identifier::from("42");
        assert_eq!(id.to_string(), "42");
        assert_eq!(id.as_str(), "42");

        let mut map = std::collections::HashMap::new();
        map.insert(id, 1);
        assert_eq!(map.get("42"), Some(&1));
    }

    #[test]
    fn identifier_serializes_as_string() {
        let json = serde_json::to_string(&Identifier::new("card-1")).expect("serialize");
        assert_eq!(json, "\"card-1\"");
    }
}
