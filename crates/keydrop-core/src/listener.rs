#![forbid(unsafe_code)]

//! Keydown listener tables with DOM dispatch order.
//!
//! A [`ListenerRegistry`] records which listeners are attached to the window
//! and to individual nodes, keyed by a caller-defined handler tag `K`.
//! [`ListenerRegistry::dispatch_path`] snapshots the listeners an event on a
//! given node would reach, grouped by current target in propagation order:
//!
//! 1. window, capture phase
//! 2. ancestors root → parent, capture phase
//! 3. the target node itself (both phases, registration order)
//! 4. ancestors parent → root, bubble phase
//! 5. window, bubble phase
//!
//! # Invariants
//!
//! 1. A listener removed while an event is in flight is never invoked
//!    afterwards for that event; callers check [`ListenerRegistry::is_attached`]
//!    before each invocation.
//! 2. A listener added while an event is in flight is not part of that
//!    event's snapshot.
//! 3. `stop_propagation` takes effect between current targets;
//!    `stop_immediate_propagation` takes effect between listeners.

use crate::dom::{Document, NodeId};
use crate::event::KeyEvent;

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerTarget {
    Window,
    Node(NodeId),
}

/// Capture or bubble registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    Capture,
    #[default]
    Bubble,
}

/// Handle to one attached listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Debug, Clone)]
struct Entry<K> {
    id: ListenerId,
    target: ListenerTarget,
    phase: Phase,
    handler: K,
}

/// One current target's listeners in a dispatch snapshot.
#[derive(Debug, Clone)]
pub struct DispatchStep<K> {
    pub current_target: ListenerTarget,
    pub listeners: Vec<(ListenerId, K)>,
}

/// Attached keydown listeners.
#[derive(Debug, Clone)]
pub struct ListenerRegistry<K> {
    entries: Vec<Entry<K>>,
    next_id: u64,
}

impl<K> Default for ListenerRegistry<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl<K: Clone> ListenerRegistry<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener. Listeners on the same target run in attach order.
    pub fn add(&mut self, target: ListenerTarget, phase: Phase, handler: K) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            target,
            phase,
            handler,
        });
        id
    }

    /// Detach a listener. Returns false if it was not attached.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    #[must_use]
    pub fn is_attached(&self, id: ListenerId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of listeners attached to `target`.
    #[must_use]
    pub fn count_on(&self, target: ListenerTarget) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.target == target)
            .count()
    }

    /// Snapshot the listeners an event dispatched at `target` will reach.
    #[must_use]
    pub fn dispatch_path<D: Document + ?Sized>(
        &self,
        document: &D,
        target: NodeId,
    ) -> Vec<DispatchStep<K>> {
        let mut ancestors = Vec::new();
        let mut cursor = document.parent(target);
        while let Some(node) = cursor {
            ancestors.push(node);
            cursor = document.parent(node);
        }

        let mut path = Vec::with_capacity(ancestors.len() * 2 + 3);
        self.push_step(&mut path, ListenerTarget::Window, Some(Phase::Capture));
        for &node in ancestors.iter().rev() {
            self.push_step(&mut path, ListenerTarget::Node(node), Some(Phase::Capture));
        }
        self.push_step(&mut path, ListenerTarget::Node(target), None);
        for &node in &ancestors {
            self.push_step(&mut path, ListenerTarget::Node(node), Some(Phase::Bubble));
        }
        self.push_step(&mut path, ListenerTarget::Window, Some(Phase::Bubble));
        path
    }

    fn push_step(
        &self,
        path: &mut Vec<DispatchStep<K>>,
        current_target: ListenerTarget,
        phase: Option<Phase>,
    ) {
        let listeners: Vec<(ListenerId, K)> = self
            .entries
            .iter()
            .filter(|entry| entry.target == current_target)
            .filter(|entry| phase.is_none_or(|phase| entry.phase == phase))
            .map(|entry| (entry.id, entry.handler.clone()))
            .collect();
        if !listeners.is_empty() {
            path.push(DispatchStep {
                current_target,
                listeners,
            });
        }
    }
}

/// Walk a dispatch snapshot, invoking `invoke` for each listener that is
/// still attached, honouring the event's propagation flags.
///
/// `registry` is re-read before every invocation so handlers may attach or
/// detach listeners while the event is in flight.
pub fn run_dispatch<K, C>(
    path: Vec<DispatchStep<K>>,
    event: &mut KeyEvent,
    ctx: &mut C,
    registry: impl Fn(&C) -> &ListenerRegistry<K>,
    mut invoke: impl FnMut(&mut C, K, &mut KeyEvent),
) where
    K: Clone,
{
    for step in path {
        if event.propagation_stopped() {
            break;
        }
        for (id, handler) in step.listeners {
            if event.immediate_propagation_stopped() {
                return;
            }
            if !registry(ctx).is_attached(id) {
                continue;
            }
            invoke(ctx, handler, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Key;
    use crate::testing::FakeDocument;

    fn tree() -> (FakeDocument, NodeId, NodeId) {
        let mut doc = FakeDocument::new();
        let list = doc.append_element(doc.body(), "ul");
        let item = doc.append_element(list, "li");
        (doc, list, item)
    }

    fn order(path: &[DispatchStep<&'static str>]) -> Vec<&'static str> {
        path.iter()
            .flat_map(|step| step.listeners.iter().map(|(_, h)| *h))
            .collect()
    }

    #[test]
    fn dom_dispatch_order() {
        let (doc, list, item) = tree();
        let mut reg = ListenerRegistry::new();
        reg.add(ListenerTarget::Window, Phase::Bubble, "window-bubble");
        reg.add(ListenerTarget::Node(list), Phase::Bubble, "list-bubble");
        reg.add(ListenerTarget::Node(item), Phase::Bubble, "item");
        reg.add(ListenerTarget::Node(list), Phase::Capture, "list-capture");
        reg.add(ListenerTarget::Window, Phase::Capture, "window-capture");

        let path = reg.dispatch_path(&doc, item);
        assert_eq!(
            order(&path),
            vec![
                "window-capture",
                "list-capture",
                "item",
                "list-bubble",
                "window-bubble"
            ]
        );
    }

    #[test]
    fn removed_listener_is_gone() {
        let (doc, _list, item) = tree();
        let mut reg = ListenerRegistry::new();
        let id = reg.add(ListenerTarget::Node(item), Phase::Bubble, "item");
        assert!(reg.is_attached(id));
        assert!(reg.remove(id));
        assert!(!reg.remove(id));
        assert!(reg.dispatch_path(&doc, item).is_empty());
    }

    #[test]
    fn stop_propagation_finishes_current_target() {
        let (doc, list, item) = tree();
        let mut reg = ListenerRegistry::new();
        reg.add(ListenerTarget::Window, Phase::Capture, "a");
        reg.add(ListenerTarget::Window, Phase::Capture, "b");
        reg.add(ListenerTarget::Node(list), Phase::Bubble, "c");

        let path = reg.dispatch_path(&doc, item);
        let mut event = KeyEvent::new(Key::Escape);
        let mut seen: (ListenerRegistry<&'static str>, Vec<&'static str>) = (reg, Vec::new());
        run_dispatch(
            path,
            &mut event,
            &mut seen,
            |ctx| &ctx.0,
            |ctx, handler, event| {
                ctx.1.push(handler);
                if handler == "a" {
                    event.stop_propagation();
                }
            },
        );
        assert_eq!(seen.1, vec!["a", "b"]);
    }

    #[test]
    fn listener_removed_mid_dispatch_is_skipped() {
        let (doc, _list, item) = tree();
        let mut reg = ListenerRegistry::new();
        reg.add(ListenerTarget::Window, Phase::Capture, "first");
        let second = reg.add(ListenerTarget::Window, Phase::Capture, "second");

        let path = reg.dispatch_path(&doc, item);
        let mut event = KeyEvent::new(Key::Escape);
        let mut seen = (reg, Vec::new());
        run_dispatch(
            path,
            &mut event,
            &mut seen,
            |ctx| &ctx.0,
            |ctx, handler, _| {
                ctx.1.push(handler);
                ctx.0.remove(second);
            },
        );
        assert_eq!(seen.1, vec!["first"]);
    }

    #[test]
    fn count_on_target() {
        let (_doc, list, item) = tree();
        let mut reg = ListenerRegistry::new();
        reg.add(ListenerTarget::Node(item), Phase::Bubble, 1u8);
        reg.add(ListenerTarget::Node(item), Phase::Bubble, 2u8);
        reg.add(ListenerTarget::Node(list), Phase::Bubble, 3u8);
        assert_eq!(reg.count_on(ListenerTarget::Node(item)), 2);
        assert_eq!(reg.count_on(ListenerTarget::Window), 0);
        assert_eq!(reg.len(), 3);
    }
}
