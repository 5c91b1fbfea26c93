#![forbid(unsafe_code)]

//! Keyboard navigation between drop targets for one drag gesture.
//!
//! A [`DropTargetNavigator`] lives exactly as long as its gesture. It owns a
//! single capturing window listener for the directional keys; everything
//! else it touches (document, manager, previewer, announcer, the target
//! table) is lent to it per key event through a [`NavigatorEnv`].

use keydrop_core::{
    Document, DragDropManager, HoverOptions, Identifier, KeyEvent, ListenerId, ListenerRegistry,
    ListenerTarget, NodeId, Phase, node_client_offset,
};

use crate::announcer::DragAnnouncer;
use crate::focus_order::{FocusOptions, FocusOrder, sort_in_document_order};
use crate::preview::{DragPreview, MonitorSnapshot};
use crate::trigger::{NEXT_KEY, PREVIOUS_KEY};

/// Direction of one navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl Direction {
    /// Direction bound to the event's key, if any.
    #[must_use]
    pub fn of(event: &KeyEvent) -> Option<Self> {
        if event.key == PREVIOUS_KEY {
            Some(Self::Previous)
        } else if event.key == NEXT_KEY {
            Some(Self::Next)
        } else {
            None
        }
    }
}

/// Collaborators lent to the navigator for one key event.
pub struct NavigatorEnv<'a, D: ?Sized, M: ?Sized> {
    pub document: &'a mut D,
    /// Registered targets in identifier order.
    pub targets: &'a [(Identifier, NodeId)],
    pub manager: &'a mut M,
    pub preview: Option<&'a mut (dyn DragPreview<D> + 'static)>,
    pub announcer: &'a mut DragAnnouncer,
}

/// Eligible targets for the in-flight item, in document order.
///
/// When the manager cannot name the item type every registered target is
/// eligible.
pub fn viable_targets<D, M>(
    document: &D,
    targets: &[(Identifier, NodeId)],
    manager: &M,
) -> Vec<NodeId>
where
    D: Document + ?Sized,
    M: DragDropManager + ?Sized,
{
    let mut nodes: Vec<NodeId> = if manager.item_type().is_none() {
        targets.iter().map(|(_, node)| *node).collect()
    } else {
        targets
            .iter()
            .filter(|(id, _)| manager.can_drop_on_target(id))
            .map(|(_, node)| *node)
            .collect()
    };
    sort_in_document_order(document, &mut nodes);
    nodes.dedup();
    nodes
}

/// Directional navigation state of one gesture.
#[derive(Debug)]
pub struct DropTargetNavigator {
    current_hovered: Option<NodeId>,
    listener: Option<ListenerId>,
    wrap: bool,
}

impl DropTargetNavigator {
    /// Anchor at `source` and attach the window listener. Without a window
    /// nothing is attached and the navigator never receives keys.
    pub fn connect<K: Clone>(
        source: NodeId,
        listeners: &mut ListenerRegistry<K>,
        window: bool,
        wrap: bool,
        handler: K,
    ) -> Self {
        let listener =
            window.then(|| listeners.add(ListenerTarget::Window, Phase::Capture, handler));
        tracing::trace!(source = %source, attached = listener.is_some(), "navigator connected");
        Self {
            current_hovered: Some(source),
            listener,
            wrap,
        }
    }

    /// Detach the window listener. Later calls do nothing.
    pub fn disconnect<K: Clone>(&mut self, listeners: &mut ListenerRegistry<K>) {
        if let Some(id) = self.listener.take() {
            listeners.remove(id);
            tracing::trace!("navigator disconnected");
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.listener.is_some()
    }

    /// The hovered target, or the gesture's source before the first move.
    #[must_use]
    pub fn current_hovered(&self) -> Option<NodeId> {
        self.current_hovered
    }

    pub fn handle_key_down<D, M>(&mut self, event: &mut KeyEvent, env: NavigatorEnv<'_, D, M>)
    where
        D: Document + ?Sized,
        M: DragDropManager + ?Sized,
    {
        let Some(direction) = Direction::of(event) else {
            return;
        };
        event.stop();
        let candidate = self.candidate(direction, &*env.document, env.targets, &*env.manager);
        self.hover_node(candidate, env);
    }

    fn candidate<D, M>(
        &self,
        direction: Direction,
        document: &D,
        targets: &[(Identifier, NodeId)],
        manager: &M,
    ) -> Option<NodeId>
    where
        D: Document + ?Sized,
        M: DragDropManager + ?Sized,
    {
        // A detached anchor has no position; fall back to the active element.
        let from = self
            .current_hovered
            .filter(|&node| document.is_connected(node));
        let options = FocusOptions {
            wrap: self.wrap,
            from,
        };
        let mut order = FocusOrder::new(document, |doc: &D| viable_targets(doc, targets, manager));
        match direction {
            Direction::Previous => order.previous(options),
            Direction::Next => order.next(options),
        }
    }

    fn hover_node<D, M>(&mut self, node: Option<NodeId>, env: NavigatorEnv<'_, D, M>)
    where
        D: Document + ?Sized,
        M: DragDropManager + ?Sized,
    {
        let Some(node) = node else {
            tracing::trace!("no target in that direction");
            return;
        };
        let Some((target_id, _)) = env.targets.iter().find(|(_, n)| *n == node) else {
            return;
        };

        let client_offset = node_client_offset(&*env.document, Some(node));
        env.manager.hover(
            std::slice::from_ref(target_id),
            HoverOptions {
                client_offset: Some(client_offset),
            },
        );
        self.current_hovered = Some(node);
        if let Some(preview) = env.preview {
            preview.render(env.document, MonitorSnapshot::of(&*env.manager));
        }
        env.announcer
            .announce_hover(&*env.document, Some(node), target_id);
        env.document.focus(node);
        tracing::debug!(target = %target_id, node = %node, "hover");
    }
}

#[cfg(test)]
mod tests {
    use keydrop_core::testing::{FakeDocument, ManagerAction, RecordingManager};
    use keydrop_core::{BeginDragOptions, Key, Rect};

    use super::*;

    struct Fixture {
        doc: FakeDocument,
        manager: RecordingManager,
        announcer: DragAnnouncer,
        listeners: ListenerRegistry<()>,
        source: NodeId,
        targets: Vec<(Identifier, NodeId)>,
    }

    impl Fixture {
        fn new(names: &[&str]) -> Self {
            let mut doc = FakeDocument::new();
            let source = doc.append_element(doc.body(), "div");
            let mut manager = RecordingManager::new();
            manager.add_source("s", Some("card"));
            let mut targets = Vec::new();
            for (i, name) in names.iter().enumerate() {
                let node = doc.append_element(doc.body(), "div");
                doc.set_tab_index(node, 0);
                doc.set_rect(node, Rect::new(0.0, 10.0 * i as f64, 50.0, 10.0));
                manager.add_target(*name, &["card"]);
                targets.push((Identifier::from(*name), node));
            }
            manager.begin_drag(
                &[Identifier::from("s")],
                BeginDragOptions {
                    client_offset: Some(Default::default()),
                    source_client_offset: Some(Default::default()),
                    ..BeginDragOptions::default()
                },
            );
            manager.publish_drag_source();
            Self {
                doc,
                manager,
                announcer: DragAnnouncer::default(),
                listeners: ListenerRegistry::new(),
                source,
                targets,
            }
        }

        fn press(&mut self, navigator: &mut DropTargetNavigator, key: Key) -> KeyEvent {
            let mut event = KeyEvent::new(key);
            navigator.handle_key_down(
                &mut event,
                NavigatorEnv {
                    document: &mut self.doc,
                    targets: &self.targets,
                    manager: &mut self.manager,
                    preview: None,
                    announcer: &mut self.announcer,
                },
            );
            event
        }

        fn node(&self, i: usize) -> NodeId {
            self.targets[i].1
        }
    }

    // === connect / disconnect ===

    #[test]
    fn connect_attaches_one_capture_listener() {
        let mut fx = Fixture::new(&["a"]);
        let mut nav = DropTargetNavigator::connect(fx.source, &mut fx.listeners, true, false, ());
        assert_eq!(fx.listeners.count_on(ListenerTarget::Window), 1);
        assert_eq!(nav.current_hovered(), Some(fx.source));
        nav.disconnect(&mut fx.listeners);
        nav.disconnect(&mut fx.listeners);
        assert!(fx.listeners.is_empty());
        assert!(!nav.is_connected());
    }

    #[test]
    fn no_window_no_listener() {
        let mut fx = Fixture::new(&["a"]);
        let nav = DropTargetNavigator::connect(fx.source, &mut fx.listeners, false, false, ());
        assert!(fx.listeners.is_empty());
        assert!(!nav.is_connected());
    }

    // === navigation ===

    #[test]
    fn next_walks_targets_and_stops_at_end() {
        let mut fx = Fixture::new(&["a", "b"]);
        let mut nav = DropTargetNavigator::connect(fx.source, &mut fx.listeners, true, false, ());

        let event = fx.press(&mut nav, Key::ArrowDown);
        assert!(event.default_prevented());
        assert!(event.propagation_stopped());
        assert_eq!(nav.current_hovered(), Some(fx.node(0)));
        assert_eq!(fx.doc.active_element(), Some(fx.node(0)));

        fx.press(&mut nav, Key::ArrowDown);
        fx.press(&mut nav, Key::ArrowDown);
        assert_eq!(nav.current_hovered(), Some(fx.node(1)));
        assert_eq!(fx.manager.hovered(), &[Identifier::from("b")]);

        let texts: Vec<_> = fx.announcer.drain().into_iter().map(|a| a.text).collect();
        assert_eq!(texts, vec!["Over a", "Over b"]);
    }

    #[test]
    fn previous_before_first_target_is_noop() {
        let mut fx = Fixture::new(&["a"]);
        let mut nav = DropTargetNavigator::connect(fx.source, &mut fx.listeners, true, false, ());
        fx.manager.clear_actions();
        fx.press(&mut nav, Key::ArrowUp);
        assert_eq!(nav.current_hovered(), Some(fx.source));
        assert!(fx.manager.actions().is_empty());
    }

    #[test]
    fn wrap_returns_to_first() {
        let mut fx = Fixture::new(&["a", "b"]);
        let mut nav = DropTargetNavigator::connect(fx.source, &mut fx.listeners, true, true, ());
        fx.press(&mut nav, Key::ArrowDown);
        fx.press(&mut nav, Key::ArrowDown);
        fx.press(&mut nav, Key::ArrowDown);
        assert_eq!(nav.current_hovered(), Some(fx.node(0)));
    }

    #[test]
    fn other_keys_pass_through() {
        let mut fx = Fixture::new(&["a"]);
        let mut nav = DropTargetNavigator::connect(fx.source, &mut fx.listeners, true, false, ());
        let event = fx.press(&mut nav, Key::Enter);
        assert!(!event.default_prevented());
        assert!(!event.propagation_stopped());
    }

    #[test]
    fn hover_sends_target_offset() {
        let mut fx = Fixture::new(&["a", "b"]);
        let mut nav = DropTargetNavigator::connect(fx.source, &mut fx.listeners, true, false, ());
        fx.manager.clear_actions();
        fx.press(&mut nav, Key::ArrowDown);
        fx.press(&mut nav, Key::ArrowDown);
        assert_eq!(
            fx.manager.actions().last(),
            Some(&ManagerAction::Hover {
                target_ids: vec![Identifier::from("b")],
                client_offset: Some(keydrop_core::Point::new(0.0, 10.0)),
            })
        );
    }

    // === eligibility ===

    #[test]
    fn ineligible_targets_are_skipped() {
        let mut fx = Fixture::new(&["a", "b"]);
        fx.manager.add_target("a", &["other"]);
        let order = viable_targets(&fx.doc, &fx.targets, &fx.manager);
        assert_eq!(order, vec![fx.node(1)]);
    }

    #[test]
    fn unknown_item_type_keeps_every_target() {
        let mut fx = Fixture::new(&["a", "b"]);
        fx.manager.end_drag();
        fx.manager.add_target("a", &["other"]);
        let order = viable_targets(&fx.doc, &fx.targets, &fx.manager);
        assert_eq!(order, vec![fx.node(0), fx.node(1)]);
    }

    #[test]
    fn order_follows_document_not_registration() {
        let mut fx = Fixture::new(&["a", "b"]);
        fx.targets.reverse();
        let order = viable_targets(&fx.doc, &fx.targets, &fx.manager);
        let (a, b) = (fx.targets[1].1, fx.targets[0].1);
        assert_eq!(order, vec![a, b]);
    }
}
