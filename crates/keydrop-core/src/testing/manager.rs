#![forbid(unsafe_code)]

use std::collections::{HashMap, HashSet};

use serde_json::{Value, json};

use crate::geometry::Point;
use crate::manager::{BeginDragOptions, DragDropManager, HoverOptions, Identifier, ItemType};

/// One recorded manager action.
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerAction {
    BeginDrag {
        source_ids: Vec<Identifier>,
        client_offset: Option<Point>,
        publish_source: bool,
    },
    PublishDragSource,
    Hover {
        target_ids: Vec<Identifier>,
        client_offset: Option<Point>,
    },
    Drop,
    EndDrag,
}

/// Drag-drop manager double.
///
/// Sources and targets are declared up front with their item types. Monitor
/// answers follow dnd-core: a drag is only visible through `is_dragging`
/// once the source is published, and the source client offset is derived
/// from the begin offsets plus the latest hover offset.
#[derive(Debug, Default)]
pub struct RecordingManager {
    actions: Vec<ManagerAction>,
    source_types: HashMap<Identifier, Option<ItemType>>,
    undraggable: HashSet<Identifier>,
    target_accepts: HashMap<Identifier, Vec<ItemType>>,
    source_id: Option<Identifier>,
    item: Option<Value>,
    item_type: Option<ItemType>,
    published: bool,
    did_drop: bool,
    initial_client_offset: Option<Point>,
    initial_source_client_offset: Option<Point>,
    client_offset: Option<Point>,
    hovered: Vec<Identifier>,
}

impl RecordingManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a draggable source producing items of `item_type`.
    pub fn add_source(&mut self, id: impl Into<Identifier>, item_type: Option<&str>) {
        self.source_types
            .insert(id.into(), item_type.map(str::to_owned));
    }

    /// Declare a target accepting the given item types.
    pub fn add_target(&mut self, id: impl Into<Identifier>, accepts: &[&str]) {
        self.target_accepts.insert(
            id.into(),
            accepts.iter().map(|&s| s.to_owned()).collect(),
        );
    }

    pub fn set_can_drag(&mut self, id: impl Into<Identifier>, can_drag: bool) {
        let id = id.into();
        if can_drag {
            self.undraggable.remove(&id);
        } else {
            self.undraggable.insert(id);
        }
    }

    #[must_use]
    pub fn actions(&self) -> &[ManagerAction] {
        &self.actions
    }

    pub fn clear_actions(&mut self) {
        self.actions.clear();
    }

    /// Target ids from the latest hover.
    #[must_use]
    pub fn hovered(&self) -> &[Identifier] {
        &self.hovered
    }

    #[must_use]
    pub fn did_drop(&self) -> bool {
        self.did_drop
    }

    fn reset_drag(&mut self) {
        self.source_id = None;
        self.item = None;
        self.item_type = None;
        self.published = false;
        self.did_drop = false;
        self.initial_client_offset = None;
        self.initial_source_client_offset = None;
        self.client_offset = None;
        self.hovered.clear();
    }
}

impl DragDropManager for RecordingManager {
    fn begin_drag(&mut self, source_ids: &[Identifier], options: BeginDragOptions) {
        self.actions.push(ManagerAction::BeginDrag {
            source_ids: source_ids.to_vec(),
            client_offset: options.client_offset,
            publish_source: options.publish_source,
        });
        let Some(source) = source_ids.iter().rev().find(|id| self.can_drag_source(id)) else {
            return;
        };
        self.source_id = Some(source.clone());
        self.item_type = self.source_types.get(source).cloned().flatten();
        self.item = Some(json!({ "id": source.as_str() }));
        self.published = options.publish_source;
        self.did_drop = false;
        self.initial_client_offset = options.client_offset;
        self.initial_source_client_offset = options.source_client_offset;
        self.client_offset = options.client_offset;
    }

    fn publish_drag_source(&mut self) {
        self.actions.push(ManagerAction::PublishDragSource);
        if self.source_id.is_some() {
            self.published = true;
        }
    }

    fn hover(&mut self, target_ids: &[Identifier], options: HoverOptions) {
        self.actions.push(ManagerAction::Hover {
            target_ids: target_ids.to_vec(),
            client_offset: options.client_offset,
        });
        self.hovered = target_ids.to_vec();
        if options.client_offset.is_some() {
            self.client_offset = options.client_offset;
        }
    }

    fn perform_drop(&mut self) {
        self.actions.push(ManagerAction::Drop);
        self.did_drop = true;
    }

    fn end_drag(&mut self) {
        self.actions.push(ManagerAction::EndDrag);
        self.reset_drag();
    }

    fn is_dragging(&self) -> bool {
        self.source_id.is_some() && self.published
    }

    fn can_drag_source(&self, source_id: &Identifier) -> bool {
        self.source_types.contains_key(source_id) && !self.undraggable.contains(source_id)
    }

    fn can_drop_on_target(&self, target_id: &Identifier) -> bool {
        if self.did_drop || self.source_id.is_none() {
            return false;
        }
        let (Some(accepts), Some(item_type)) =
            (self.target_accepts.get(target_id), self.item_type.as_ref())
        else {
            return false;
        };
        accepts.iter().any(|accepted| accepted == item_type)
    }

    fn source_id(&self) -> Option<Identifier> {
        self.source_id.clone()
    }

    fn item(&self) -> Option<Value> {
        self.item.clone()
    }

    fn item_type(&self) -> Option<ItemType> {
        self.item_type.clone()
    }

    fn source_client_offset(&self) -> Option<Point> {
        let (Some(initial), Some(initial_source), Some(current)) = (
            self.initial_client_offset,
            self.initial_source_client_offset,
            self.client_offset,
        ) else {
            return None;
        };
        Some(initial_source.offset(current.x - initial.x, current.y - initial.y))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn begin(manager: &mut RecordingManager, id: &str, at: Point) {
        manager.begin_drag(
            &[Identifier::from(id)],
            BeginDragOptions {
                client_offset: Some(at),
                source_client_offset: Some(at),
                ..BeginDragOptions::default()
            },
        );
    }

    #[test]
    fn drag_is_hidden_until_published() {
        let mut manager = RecordingManager::new();
        manager.add_source("s", Some("card"));
        begin(&mut manager, "s", Point::new(10.0, 10.0));
        assert!(!manager.is_dragging());
        manager.publish_drag_source();
        assert!(manager.is_dragging());
        assert_eq!(manager.source_id(), Some(Identifier::from("s")));
    }

    #[test]
    fn source_offset_follows_hover() {
        let mut manager = RecordingManager::new();
        manager.add_source("s", Some("card"));
        begin(&mut manager, "s", Point::new(10.0, 10.0));
        manager.hover(
            &[Identifier::from("t")],
            HoverOptions {
                client_offset: Some(Point::new(50.0, 90.0)),
            },
        );
        assert_eq!(manager.source_client_offset(), Some(Point::new(50.0, 90.0)));
    }

    #[test]
    fn drop_eligibility_matches_item_type() {
        let mut manager = RecordingManager::new();
        manager.add_source("s", Some("card"));
        manager.add_target("cards", &["card"]);
        manager.add_target("files", &["file"]);
        begin(&mut manager, "s", Point::ORIGIN);
        assert!(manager.can_drop_on_target(&Identifier::from("cards")));
        assert!(!manager.can_drop_on_target(&Identifier::from("files")));
        assert!(!manager.can_drop_on_target(&Identifier::from("unknown")));
    }

    #[test]
    fn undraggable_source_does_not_begin() {
        let mut manager = RecordingManager::new();
        manager.add_source("s", Some("card"));
        manager.set_can_drag("s", false);
        begin(&mut manager, "s", Point::ORIGIN);
        manager.publish_drag_source();
        assert!(!manager.is_dragging());
    }

    #[test]
    fn end_drag_resets_state() {
        let mut manager = RecordingManager::new();
        manager.add_source("s", None);
        begin(&mut manager, "s", Point::ORIGIN);
        manager.publish_drag_source();
        manager.end_drag();
        assert!(!manager.is_dragging());
        assert_eq!(manager.source_id(), None);
        assert_eq!(manager.actions().last(), Some(&ManagerAction::EndDrag));
    }
}
