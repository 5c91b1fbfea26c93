#![forbid(unsafe_code)]

//! Drag preview: an offscreen clone of the dragged item that follows the
//! hovered target.
//!
//! The default [`DomDragPreviewer`] builds a small overlay in the host
//! document:
//!
//! ```text
//! <div class="drag-previewer">      (container, appended to <body> on attach)
//!   <svg viewBox="0 0 w h">         (sized to the source's bounding rect)
//!     <foreignObject>               (holds a deep clone of the preview node)
//! ```
//!
//! The overlay is created once and reused across gestures: `clear` empties
//! the foreign object but keeps the surface.

use keydrop_core::{Document, DragDropManager, NodeId, Point};

/// Class applied to the container when no custom class is configured.
pub const DEFAULT_PREVIEWER_CLASS: &str = "drag-previewer";

/// Monitor state the previewer reads when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonitorSnapshot {
    pub is_dragging: bool,
    pub source_client_offset: Option<Point>,
}

impl MonitorSnapshot {
    #[must_use]
    pub fn of<M: DragDropManager + ?Sized>(manager: &M) -> Self {
        Self {
            is_dragging: manager.is_dragging(),
            source_client_offset: manager.source_client_offset(),
        }
    }
}

/// Preview rendering surface.
pub trait DragPreview<D: Document + ?Sized> {
    /// Mount the rendering surface.
    fn attach(&mut self, document: &mut D);

    /// Unmount the rendering surface if it is mounted.
    fn detach(&mut self, document: &mut D);

    /// Build a duplicate of `source` sized to its bounding rect.
    fn create_drag_preview(&mut self, document: &mut D, source: NodeId);

    /// Reposition the duplicate. Does nothing unless a drag is active.
    fn render(&mut self, document: &mut D, monitor: MonitorSnapshot);

    /// Empty the duplicate, keeping the surface for the next gesture.
    fn clear(&mut self, document: &mut D);
}

/// Overlay-based previewer over the host document.
#[derive(Debug, Clone)]
pub struct DomDragPreviewer {
    container: NodeId,
    svg: NodeId,
    foreign_object: NodeId,
    offset: Point,
}

impl DomDragPreviewer {
    /// Default distance of the preview from the drag position, in px.
    pub const DEFAULT_OFFSET: Point = Point::new(30.0, 15.0);

    /// Build the (unmounted) overlay. A custom class name replaces both the
    /// default class and its inline stacking style.
    pub fn new<D: Document + ?Sized>(
        document: &mut D,
        class_name: Option<&str>,
        offset: Point,
    ) -> Self {
        let container = document.create_element("div");
        let svg = document.create_element("svg");
        let foreign_object = document.create_element("foreignObject");

        match class_name.filter(|name| !name.is_empty()) {
            Some(name) => document.set_class_name(container, name),
            None => {
                document.set_class_name(container, DEFAULT_PREVIEWER_CLASS);
                document.set_style(container, "z-index", "1000");
            }
        }

        document.append_child(svg, foreign_object);
        document.append_child(container, svg);

        Self {
            container,
            svg,
            foreign_object,
            offset,
        }
    }

    /// The overlay's root element.
    #[must_use]
    pub fn container(&self) -> NodeId {
        self.container
    }

    /// The element holding the cloned preview.
    #[must_use]
    pub fn content(&self) -> NodeId {
        self.foreign_object
    }
}

impl<D: Document + ?Sized> DragPreview<D> for DomDragPreviewer {
    fn attach(&mut self, document: &mut D) {
        let body = document.body();
        document.append_child(body, self.container);
    }

    fn detach(&mut self, document: &mut D) {
        let body = document.body();
        if document.contains(body, self.container)
            && let Some(parent) = document.parent(self.container)
        {
            document.remove_child(parent, self.container);
        }
    }

    fn create_drag_preview(&mut self, document: &mut D, source: NodeId) {
        let rect = document.bounding_client_rect(source).unwrap_or_default();
        let (width, height) = (rect.width.to_string(), rect.height.to_string());

        document.set_attribute(self.svg, "viewBox", &format!("0 0 {width} {height}"));
        document.set_attribute(self.svg, "width", &width);
        document.set_attribute(self.svg, "height", &height);
        document.set_attribute(self.foreign_object, "x", "0");
        document.set_attribute(self.foreign_object, "y", "0");
        document.set_attribute(self.foreign_object, "width", &width);
        document.set_attribute(self.foreign_object, "height", &height);

        let clone = document.clone_node(source);
        document.append_child(self.foreign_object, clone);
    }

    fn render(&mut self, document: &mut D, monitor: MonitorSnapshot) {
        let Some(offset) = monitor.source_client_offset else {
            return;
        };
        if !monitor.is_dragging {
            return;
        }
        let at = offset.offset(self.offset.x, self.offset.y);
        document.set_style(self.container, "position", "fixed");
        document.set_style(self.container, "left", &format!("{}px", at.x));
        document.set_style(self.container, "top", &format!("{}px", at.y));
    }

    fn clear(&mut self, document: &mut D) {
        document.clear_children(self.foreign_object);
    }
}

#[cfg(test)]
mod tests {
    use keydrop_core::Rect;
    use keydrop_core::testing::FakeDocument;

    use super::*;

    fn previewer(doc: &mut FakeDocument) -> DomDragPreviewer {
        DomDragPreviewer::new(doc, None, DomDragPreviewer::DEFAULT_OFFSET)
    }

    fn dragging_at(x: f64, y: f64) -> MonitorSnapshot {
        MonitorSnapshot {
            is_dragging: true,
            source_client_offset: Some(Point::new(x, y)),
        }
    }

    #[test]
    fn default_class_and_stacking() {
        let mut doc = FakeDocument::new();
        let p = previewer(&mut doc);
        assert_eq!(doc.class_name(p.container()), Some(DEFAULT_PREVIEWER_CLASS));
        assert_eq!(doc.style(p.container(), "z-index"), Some("1000"));
    }

    #[test]
    fn custom_class_replaces_default_style() {
        let mut doc = FakeDocument::new();
        let p = DomDragPreviewer::new(&mut doc, Some("my-preview"), Point::ORIGIN);
        assert_eq!(doc.class_name(p.container()), Some("my-preview"));
        assert_eq!(doc.style(p.container(), "z-index"), None);
    }

    #[test]
    fn attach_detach_round_trip() {
        let mut doc = FakeDocument::new();
        let mut p = previewer(&mut doc);
        let body = doc.body();
        p.attach(&mut doc);
        assert!(doc.children(body).contains(&p.container()));
        p.detach(&mut doc);
        assert!(!doc.children(body).contains(&p.container()));
        // Detaching twice is harmless.
        p.detach(&mut doc);
    }

    #[test]
    fn preview_is_sized_clone() {
        let mut doc = FakeDocument::new();
        let mut p = previewer(&mut doc);
        let source = doc.append_element(doc.body(), "div");
        doc.set_rect(source, Rect::new(5.0, 5.0, 120.0, 40.0));
        doc.set_text(source, "Card");

        p.create_drag_preview(&mut doc, source);
        let svg = doc.parent(p.content()).expect("svg");
        assert_eq!(doc.attribute(svg, "viewBox").as_deref(), Some("0 0 120 40"));
        assert_eq!(doc.attribute(p.content(), "width").as_deref(), Some("120"));

        let children = doc.children(p.content());
        assert_eq!(children.len(), 1);
        assert_ne!(children[0], source);
        assert_eq!(doc.inner_text(children[0]).as_deref(), Some("Card"));
    }

    #[test]
    fn render_only_while_dragging() {
        let mut doc = FakeDocument::new();
        let mut p = previewer(&mut doc);

        p.render(
            &mut doc,
            MonitorSnapshot {
                is_dragging: false,
                source_client_offset: Some(Point::new(1.0, 1.0)),
            },
        );
        assert_eq!(doc.style(p.container(), "position"), None);

        p.render(&mut doc, dragging_at(100.0, 200.0));
        assert_eq!(doc.style(p.container(), "position"), Some("fixed"));
        assert_eq!(doc.style(p.container(), "left"), Some("130px"));
        assert_eq!(doc.style(p.container(), "top"), Some("215px"));
    }

    #[test]
    fn clear_keeps_surface() {
        let mut doc = FakeDocument::new();
        let mut p = previewer(&mut doc);
        let source = doc.append_element(doc.body(), "div");
        p.attach(&mut doc);
        p.create_drag_preview(&mut doc, source);
        p.clear(&mut doc);
        assert!(doc.children(p.content()).is_empty());
        assert!(doc.is_connected(p.content()));
    }
}
