#![forbid(unsafe_code)]

//! Announcement text for the four drag events.
//!
//! Messages name items by a human-readable label taken from the node
//! (`data-dnd-name`, then `aria-label`, then visible text). When none exists
//! the raw identifier is used, so a message never contains an empty name.

use keydrop_core::{Document, Identifier, NodeId};

/// Attribute an integrator sets to name an item explicitly.
pub const NAME_ATTRIBUTE: &str = "data-dnd-name";
/// Accessible-name attribute consulted after [`NAME_ATTRIBUTE`].
pub const ARIA_LABEL_ATTRIBUTE: &str = "aria-label";

/// Human-readable description of a node, if it has one.
///
/// Empty or whitespace-only values count as absent.
#[must_use]
pub fn node_description<D: Document + ?Sized>(document: &D, node: Option<NodeId>) -> Option<String> {
    let node = node?;
    [
        document.attribute(node, NAME_ATTRIBUTE),
        document.attribute(node, ARIA_LABEL_ATTRIBUTE),
        document.inner_text(node),
    ]
    .into_iter()
    .flatten()
    .map(|text| text.trim().to_owned())
    .find(|text| !text.is_empty())
}

/// An item or target as seen by a message provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLabel {
    pub id: Identifier,
    /// Description derived from the node, if any.
    pub description: Option<String>,
}

impl ItemLabel {
    #[must_use]
    pub fn new(id: Identifier, description: Option<String>) -> Self {
        Self { id, description }
    }

    /// Describe `node` and pair it with `id`.
    #[must_use]
    pub fn describe<D: Document + ?Sized>(document: &D, id: &Identifier, node: Option<NodeId>) -> Self {
        Self::new(id.clone(), node_description(document, node))
    }

    /// The description, or the identifier when there is none.
    #[must_use]
    pub fn label(&self) -> &str {
        self.description.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Produces announcement text. Implement to localize or rephrase.
pub trait AnnouncementMessages {
    fn picked_up_item(&self, item: &ItemLabel) -> String;

    /// `target` is the hovered target at the time of the drop, if any.
    fn dropped_item(&self, item: &ItemLabel, target: Option<&ItemLabel>) -> String;

    fn hovered_target(&self, target: &ItemLabel) -> String;

    fn canceled_drag(&self, item: &ItemLabel) -> String;
}

/// English defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAnnouncementMessages;

impl AnnouncementMessages for DefaultAnnouncementMessages {
    fn picked_up_item(&self, item: &ItemLabel) -> String {
        format!("Picked up {}", item.label())
    }

    fn dropped_item(&self, item: &ItemLabel, target: Option<&ItemLabel>) -> String {
        match target {
            Some(target) if target.id != item.id => {
                format!("Dropped {} on {}", item.label(), target.label())
            }
            _ => format!("Dropped {}", item.label()),
        }
    }

    fn hovered_target(&self, target: &ItemLabel) -> String {
        format!("Over {}", target.label())
    }

    fn canceled_drag(&self, item: &ItemLabel) -> String {
        format!("Stopped dragging {}", item.label())
    }
}
