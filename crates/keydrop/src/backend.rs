#![forbid(unsafe_code)]

//! The keyboard backend.
//!
//! [`KeyboardBackend`] implements the backend contract of the drag-drop
//! manager for keyboard input: it tracks connected sources, previews, and
//! targets, owns at most one active gesture, and drives the manager's
//! begin/hover/drop/end actions.
//!
//! # Event flow
//!
//! The host feeds every keydown to [`KeyboardBackend::dispatch_key_down`],
//! which runs the backend's listeners in DOM order:
//!
//! ```text
//! window capture   GlobalKeyDown   Escape cancels, Tab is locked
//! window capture   Navigator       ArrowUp / ArrowDown (during a gesture)
//! source element   DragStart(id)   trigger predicate starts a gesture
//! target element   Drop            Space / Enter drops on the hovered target
//! ```
//!
//! # Invariants
//!
//! 1. At most one gesture exists. A start trigger while one is active
//!    republishes the drag and leaves the gesture's anchor unchanged.
//! 2. Every gesture-ending path (drop, cancel, teardown) disconnects the
//!    navigator and clears the preview.
//! 3. `disconnect` undoes exactly what its `connect_*` call did; a stale
//!    token never removes a newer registration for the same id.
//! 4. Unknown identifiers and missing nodes are no-ops, never errors.

use std::collections::BTreeMap;
use std::fmt;

use keydrop_core::{
    BeginDragOptions, Document, DragDropManager, Identifier, KeyEvent, ListenerId,
    ListenerRegistry, ListenerTarget, NodeId, Phase, node_client_offset, run_dispatch,
};
use serde::{Deserialize, Serialize};

use crate::announcer::{Announcement, DragAnnouncer, LiveRegion};
use crate::config::KeyboardBackendOptions;
use crate::error::KeyboardBackendError;
use crate::messages::DefaultAnnouncementMessages;
use crate::navigator::{DropTargetNavigator, NavigatorEnv, viable_targets};
use crate::preview::{DomDragPreviewer, DragPreview, MonitorSnapshot};
use crate::registry::BackendRegistry;
use crate::trigger::{
    CANCEL_KEYS, DROP_KEYS, DragTrigger, KeyboardDragShortcut, TAB_KEYS, matches_any,
};

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Host window handle. Window-level listeners exist only when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window;

/// Document and window the backend operates on.
#[derive(Debug, Clone)]
pub struct BackendContext<D> {
    pub document: D,
    pub window: Option<Window>,
}

impl<D> BackendContext<D> {
    #[must_use]
    pub fn new(document: D) -> Self {
        Self {
            document,
            window: Some(Window),
        }
    }

    /// A context with no window: no cancel, tab-lock, or navigation keys.
    #[must_use]
    pub fn without_window(document: D) -> Self {
        Self {
            document,
            window: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Registrations
// ---------------------------------------------------------------------------

/// Options supplied with a drag preview connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DragPreviewOptions {
    pub anchor_x: Option<f64>,
    pub anchor_y: Option<f64>,
    pub offset_x: Option<f64>,
    pub offset_y: Option<f64>,
    pub capture_dragging_state: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Connection {
    Source,
    Preview,
    Target,
}

/// Token returned by the `connect_*` methods.
///
/// Hand it to [`KeyboardBackend::disconnect`] to undo the connection.
/// Disconnecting an already-disconnected or superseded token does nothing.
#[must_use = "dropping the token leaves the connection in place"]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Unsubscribe {
    connection: Connection,
    id: Identifier,
    serial: u64,
}

impl Unsubscribe {
    #[must_use]
    pub fn id(&self) -> &Identifier {
        &self.id
    }
}

#[derive(Debug, Clone, Copy)]
struct NodeEntry {
    node: NodeId,
    listener: ListenerId,
    serial: u64,
}

#[derive(Debug, Clone)]
struct PreviewEntry {
    node: NodeId,
    options: DragPreviewOptions,
    serial: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Listener {
    GlobalKeyDown,
    Navigator,
    DragStart(Identifier),
    Drop,
}

/// Registration counts, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendProfile {
    pub source_preview_nodes: usize,
    pub source_preview_node_options: usize,
    pub source_nodes: usize,
    pub target_nodes: usize,
    pub listeners: usize,
}

struct Gesture {
    source_id: Identifier,
    navigator: DropTargetNavigator,
}

// ---------------------------------------------------------------------------
// KeyboardBackend
// ---------------------------------------------------------------------------

/// Keyboard input backend for a drag-drop manager.
pub struct KeyboardBackend<M: DragDropManager, D: Document> {
    manager: M,
    context: BackendContext<D>,
    registry: BackendRegistry,
    is_set_up: bool,
    listeners: ListenerRegistry<Listener>,
    global_listener: Option<ListenerId>,
    sources: BTreeMap<Identifier, NodeEntry>,
    preview_nodes: BTreeMap<Identifier, PreviewEntry>,
    targets: BTreeMap<Identifier, NodeEntry>,
    next_serial: u64,
    gesture: Option<Gesture>,
    previewer: Option<Box<dyn DragPreview<D>>>,
    announcer: DragAnnouncer,
    drag_trigger: Box<dyn DragTrigger>,
    on_dnd_mode_changed: Option<Box<dyn FnMut(bool)>>,
    handling_first_event: bool,
    wrap_navigation: bool,
}

impl<M: DragDropManager, D: Document> fmt::Debug for KeyboardBackend<M, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyboardBackend")
            .field("is_set_up", &self.is_set_up)
            .field("dragging", &self.gesture.as_ref().map(|g| &g.source_id))
            .field("profile", &self.profile())
            .field("preview", &self.previewer.is_some())
            .field("announcer", &self.announcer)
            .finish_non_exhaustive()
    }
}

/// Build a keyboard backend for `manager` over `context`.
///
/// Every backend wired into the same page must share `registry`.
pub fn create_keyboard_backend<M, D>(
    manager: M,
    context: BackendContext<D>,
    options: KeyboardBackendOptions,
    registry: &BackendRegistry,
) -> KeyboardBackend<M, D>
where
    M: DragDropManager,
    D: Document,
{
    KeyboardBackend::new(manager, context, options, registry.clone())
}

impl<M: DragDropManager, D: Document> KeyboardBackend<M, D> {
    pub fn new(
        manager: M,
        mut context: BackendContext<D>,
        options: KeyboardBackendOptions,
        registry: BackendRegistry,
    ) -> Self {
        let KeyboardBackendOptions {
            config,
            on_dnd_mode_changed,
            drag_trigger,
            announcement_messages,
            announcer,
        } = options;

        if let Err(errors) = config.validate() {
            for error in &errors {
                tracing::warn!(%error, "invalid keyboard backend config");
            }
        }

        let messages =
            announcement_messages.unwrap_or_else(|| Box::new(DefaultAnnouncementMessages));
        let announcer = match announcer {
            Some(shared) => DragAnnouncer::external(shared, messages),
            None => DragAnnouncer::owned(LiveRegion::new(config.announcement_queue), messages),
        };

        let previewer = if config.preview {
            let previewer = DomDragPreviewer::new(
                &mut context.document,
                config.previewer_class_name.as_deref(),
                config.preview_offset,
            );
            Some(Box::new(previewer) as Box<dyn DragPreview<D>>)
        } else {
            None
        };

        Self {
            manager,
            context,
            registry,
            is_set_up: false,
            listeners: ListenerRegistry::new(),
            global_listener: None,
            sources: BTreeMap::new(),
            preview_nodes: BTreeMap::new(),
            targets: BTreeMap::new(),
            next_serial: 1,
            gesture: None,
            previewer,
            announcer,
            drag_trigger: drag_trigger.unwrap_or_else(|| Box::new(KeyboardDragShortcut)),
            on_dnd_mode_changed,
            handling_first_event: false,
            wrap_navigation: config.wrap_navigation,
        }
    }

    /// Replace the preview renderer. Call before [`setup`](Self::setup).
    #[must_use]
    pub fn with_previewer(mut self, previewer: impl DragPreview<D> + 'static) -> Self {
        self.previewer = Some(Box::new(previewer));
        self
    }

    // --- lifecycle ---

    /// Attach the global key listener and mount the preview surface.
    ///
    /// # Errors
    ///
    /// [`KeyboardBackendError::AlreadySetUp`] if a backend sharing this
    /// registry is already set up.
    pub fn setup(&mut self) -> Result<(), KeyboardBackendError> {
        self.registry.acquire()?;
        self.is_set_up = true;
        self.handling_first_event = true;

        if self.context.window.is_some() {
            self.global_listener = Some(self.listeners.add(
                ListenerTarget::Window,
                Phase::Capture,
                Listener::GlobalKeyDown,
            ));
        }
        if let Some(previewer) = self.previewer.as_mut() {
            previewer.attach(&mut self.context.document);
        }
        tracing::debug!(window = self.context.window.is_some(), "keyboard backend set up");
        Ok(())
    }

    /// Detach the global listener, end any gesture, unmount the preview,
    /// and release the owned announcer.
    pub fn teardown(&mut self) {
        if self.is_set_up {
            self.registry.release();
            self.is_set_up = false;
        }
        if let Some(id) = self.global_listener.take() {
            self.listeners.remove(id);
        }
        self.end_drag(None);
        if let Some(previewer) = self.previewer.as_mut() {
            previewer.detach(&mut self.context.document);
        }
        self.announcer.destroy();
        tracing::debug!("keyboard backend torn down");
    }

    #[must_use]
    pub fn is_set_up(&self) -> bool {
        self.is_set_up
    }

    // --- connections ---

    fn next_serial(&mut self) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        serial
    }

    /// Register a draggable element and listen for the start trigger on it.
    pub fn connect_drag_source(&mut self, id: impl Into<Identifier>, node: NodeId) -> Unsubscribe {
        let id = id.into();
        let serial = self.next_serial();
        let listener = self.listeners.add(
            ListenerTarget::Node(node),
            Phase::Bubble,
            Listener::DragStart(id.clone()),
        );
        let entry = NodeEntry {
            node,
            listener,
            serial,
        };
        if let Some(previous) = self.sources.insert(id.clone(), entry) {
            self.listeners.remove(previous.listener);
        }
        tracing::trace!(source = %id, node = %node, "drag source connected");
        Unsubscribe {
            connection: Connection::Source,
            id,
            serial,
        }
    }

    /// Register the element cloned for a source's drag preview.
    pub fn connect_drag_preview(
        &mut self,
        id: impl Into<Identifier>,
        node: NodeId,
        options: DragPreviewOptions,
    ) -> Unsubscribe {
        let id = id.into();
        let serial = self.next_serial();
        self.preview_nodes.insert(
            id.clone(),
            PreviewEntry {
                node,
                options,
                serial,
            },
        );
        tracing::trace!(source = %id, node = %node, "drag preview connected");
        Unsubscribe {
            connection: Connection::Preview,
            id,
            serial,
        }
    }

    /// Register a drop target, listen for the drop key on it, and make it
    /// focusable.
    pub fn connect_drop_target(&mut self, id: impl Into<Identifier>, node: NodeId) -> Unsubscribe {
        let id = id.into();
        let serial = self.next_serial();
        let listener = self
            .listeners
            .add(ListenerTarget::Node(node), Phase::Bubble, Listener::Drop);
        let entry = NodeEntry {
            node,
            listener,
            serial,
        };
        if let Some(previous) = self.targets.insert(id.clone(), entry) {
            self.listeners.remove(previous.listener);
        }

        let document = &mut self.context.document;
        let tab_index = document.tab_index(node).max(-1);
        document.set_tab_index(node, tab_index);

        tracing::trace!(target = %id, node = %node, "drop target connected");
        Unsubscribe {
            connection: Connection::Target,
            id,
            serial,
        }
    }

    /// Undo a connection. Returns false if the token was stale.
    pub fn disconnect(&mut self, token: Unsubscribe) -> bool {
        let removed = match token.connection {
            Connection::Source => take_current(&mut self.sources, &token)
                .map(|entry| self.listeners.remove(entry.listener))
                .is_some(),
            Connection::Target => take_current(&mut self.targets, &token)
                .map(|entry| self.listeners.remove(entry.listener))
                .is_some(),
            Connection::Preview => {
                let current = self
                    .preview_nodes
                    .get(&token.id)
                    .is_some_and(|entry| entry.serial == token.serial);
                current && self.preview_nodes.remove(&token.id).is_some()
            }
        };
        tracing::trace!(
            id = %token.id,
            kind = ?token.connection,
            removed,
            "disconnect"
        );
        removed
    }

    // --- dispatch ---

    /// Deliver a keydown whose target is `target` to the backend's listeners.
    pub fn dispatch_key_down(&mut self, target: NodeId, event: &mut KeyEvent) {
        let path = self.listeners.dispatch_path(&self.context.document, target);
        run_dispatch(
            path,
            event,
            self,
            |backend| &backend.listeners,
            |backend, listener, event| backend.handle_listener(listener, event),
        );
    }

    fn handle_listener(&mut self, listener: Listener, event: &mut KeyEvent) {
        match listener {
            Listener::GlobalKeyDown => self.handle_global_key_down(event),
            Listener::Navigator => self.handle_navigation(event),
            Listener::DragStart(id) => self.handle_drag_start(&id, event),
            Listener::Drop => self.handle_drop(event),
        }
    }

    fn handle_global_key_down(&mut self, event: &mut KeyEvent) {
        let Some(source_id) = self.gesture.as_ref().map(|g| g.source_id.clone()) else {
            return;
        };
        if matches_any(event, CANCEL_KEYS) {
            tracing::debug!(source = %source_id, "drag canceled");
            self.end_drag(Some(event));
            let node = self.source_node(&source_id);
            self.announcer
                .announce_cancel(&self.context.document, node, &source_id);
        } else if matches_any(event, TAB_KEYS) {
            // Focus stays on the hovered target while dragging.
            event.prevent_default();
        }
    }

    fn handle_navigation(&mut self, event: &mut KeyEvent) {
        if self.gesture.is_none() {
            return;
        }
        let targets = self.target_table();
        let Some(gesture) = self.gesture.as_mut() else {
            return;
        };
        gesture.navigator.handle_key_down(
            event,
            NavigatorEnv {
                document: &mut self.context.document,
                targets: &targets,
                manager: &mut self.manager,
                preview: self.previewer.as_deref_mut(),
                announcer: &mut self.announcer,
            },
        );
    }

    fn handle_drag_start(&mut self, id: &Identifier, event: &mut KeyEvent) {
        if !self
            .drag_trigger
            .is_drag_trigger(event, self.handling_first_event)
        {
            return;
        }
        self.handling_first_event = false;

        if !self.manager.can_drag_source(id) {
            tracing::trace!(source = %id, "source cannot be dragged");
            return;
        }
        if self.gesture.is_some() || self.manager.is_dragging() {
            tracing::debug!(source = %id, "republishing active drag");
            self.manager.publish_drag_source();
            return;
        }

        event.stop();

        let Some(source_node) = self.source_node(id) else {
            tracing::debug!(source = %id, "drag trigger for unregistered source");
            return;
        };
        let _span = tracing::debug_span!("keyboard_drag_start", source = %id).entered();

        let navigator = DropTargetNavigator::connect(
            source_node,
            &mut self.listeners,
            self.context.window.is_some(),
            self.wrap_navigation,
            Listener::Navigator,
        );

        let preview_node = self
            .preview_nodes
            .get(id)
            .map_or(source_node, |entry| entry.node);
        if let Some(previewer) = self.previewer.as_mut() {
            previewer.create_drag_preview(&mut self.context.document, preview_node);
        }

        let offset = node_client_offset(&self.context.document, Some(source_node));
        let item = self.manager.item();
        let item_type = self.manager.item_type();
        self.manager.begin_drag(
            std::slice::from_ref(id),
            BeginDragOptions {
                client_offset: Some(offset),
                source_client_offset: Some(offset),
                publish_source: false,
                item,
                item_type,
            },
        );
        self.manager.publish_drag_source();

        if let Some(previewer) = self.previewer.as_mut() {
            previewer.render(&mut self.context.document, MonitorSnapshot::of(&self.manager));
        }

        self.gesture = Some(Gesture {
            source_id: id.clone(),
            navigator,
        });
        self.set_dnd_mode(true);
        self.announcer
            .announce_drag(&self.context.document, Some(source_node), id);
        tracing::debug!(node = %source_node, x = offset.x, y = offset.y, "drag started");
    }

    fn handle_drop(&mut self, event: &mut KeyEvent) {
        if !matches_any(event, DROP_KEYS) {
            return;
        }
        let Some(gesture) = self.gesture.as_ref() else {
            tracing::trace!("drop key without an active drag");
            return;
        };
        let source_id = gesture.source_id.clone();
        let target = gesture.navigator.current_hovered().and_then(|node| {
            self.targets
                .iter()
                .find(|(_, entry)| entry.node == node)
                .map(|(id, _)| (id.clone(), node))
        });

        let source_node = self.source_node(&source_id);
        self.announcer.announce_drop(
            &self.context.document,
            source_node,
            &source_id,
            target.as_ref().map(|(id, node)| (id, *node)),
        );
        tracing::debug!(
            source = %source_id,
            target = ?target.as_ref().map(|(id, _)| id.as_str()),
            "drop"
        );

        self.manager.perform_drop();
        self.end_drag(Some(event));
    }

    fn end_drag(&mut self, event: Option<&mut KeyEvent>) {
        if let Some(event) = event {
            event.stop();
        }
        let gesture = self.gesture.take();
        if let Some(mut gesture) = gesture {
            gesture.navigator.disconnect(&mut self.listeners);
            if let Some(previewer) = self.previewer.as_mut() {
                previewer.clear(&mut self.context.document);
            }
            if self.manager.is_dragging() {
                self.manager.end_drag();
            }
            self.set_dnd_mode(false);
            tracing::trace!(source = %gesture.source_id, "gesture ended");
        }
    }

    fn set_dnd_mode(&mut self, enabled: bool) {
        if let Some(callback) = self.on_dnd_mode_changed.as_mut() {
            callback(enabled);
        }
    }

    // --- queries ---

    fn source_node(&self, id: &Identifier) -> Option<NodeId> {
        self.sources.get(id).map(|entry| entry.node)
    }

    fn target_table(&self) -> Vec<(Identifier, NodeId)> {
        self.targets
            .iter()
            .map(|(id, entry)| (id.clone(), entry.node))
            .collect()
    }

    /// Registration counts.
    #[must_use]
    pub fn profile(&self) -> BackendProfile {
        BackendProfile {
            source_preview_nodes: self.preview_nodes.len(),
            source_preview_node_options: self.preview_nodes.len(),
            source_nodes: self.sources.len(),
            target_nodes: self.targets.len(),
            listeners: self.listeners.len(),
        }
    }

    /// True while this backend owns a gesture.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    /// Node the active gesture is anchored at or hovering.
    #[must_use]
    pub fn hovered_node(&self) -> Option<NodeId> {
        self.gesture
            .as_ref()
            .and_then(|gesture| gesture.navigator.current_hovered())
    }

    /// Targets the navigator would visit right now, in order.
    #[must_use]
    pub fn navigation_order(&self) -> Vec<NodeId> {
        viable_targets(&self.context.document, &self.target_table(), &self.manager)
    }

    #[must_use]
    pub fn preview_options(&self, id: &Identifier) -> Option<&DragPreviewOptions> {
        self.preview_nodes.get(id).map(|entry| &entry.options)
    }

    /// Take pending announcements from the owned live region.
    pub fn drain_announcements(&mut self) -> Vec<Announcement> {
        self.announcer.drain()
    }

    #[must_use]
    pub fn announcer(&self) -> &DragAnnouncer {
        &self.announcer
    }

    #[must_use]
    pub fn document(&self) -> &D {
        &self.context.document
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.context.document
    }

    #[must_use]
    pub fn manager(&self) -> &M {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut M {
        &mut self.manager
    }
}

fn take_current(
    entries: &mut BTreeMap<Identifier, NodeEntry>,
    token: &Unsubscribe,
) -> Option<NodeEntry> {
    if entries.get(&token.id)?.serial != token.serial {
        return None;
    }
    entries.remove(&token.id)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use keydrop_core::testing::{FakeDocument, ManagerAction, RecordingManager};
    use keydrop_core::{Key, Modifiers};

    use super::*;

    type Backend = KeyboardBackend<RecordingManager, FakeDocument>;

    fn backend() -> Backend {
        let mut manager = RecordingManager::new();
        manager.add_source("s", Some("card"));
        manager.add_target("t", &["card"]);
        create_keyboard_backend(
            manager,
            BackendContext::new(FakeDocument::new()),
            KeyboardBackendOptions::default(),
            &BackendRegistry::new(),
        )
    }

    fn start_key() -> KeyEvent {
        KeyEvent::new(Key::Char('d')).with_modifiers(Modifiers::CTRL)
    }

    fn element(backend: &mut Backend) -> NodeId {
        let doc = backend.document_mut();
        let body = doc.body();
        doc.append_element(body, "div")
    }

    // === connections ===

    #[test]
    fn connect_and_disconnect_source() {
        let mut b = backend();
        let node = element(&mut b);
        let token = b.connect_drag_source("s", node);
        assert_eq!(b.profile().source_nodes, 1);
        assert_eq!(b.profile().listeners, 1);
        assert!(b.disconnect(token.clone()));
        assert!(!b.disconnect(token));
        assert_eq!(b.profile(), BackendProfile::default());
    }

    #[test]
    fn stale_token_leaves_newer_registration() {
        let mut b = backend();
        let first = element(&mut b);
        let second = element(&mut b);
        let old = b.connect_drop_target("t", first);
        let _new = b.connect_drop_target("t", second);
        assert_eq!(b.profile().listeners, 1);
        assert!(!b.disconnect(old));
        assert_eq!(b.profile().target_nodes, 1);
        assert_eq!(b.navigation_order(), vec![second]);
    }

    #[test]
    fn drop_target_becomes_focusable() {
        let mut b = backend();
        let node = element(&mut b);
        assert!(!b.document().is_focusable(node));
        let _token = b.connect_drop_target("t", node);
        assert!(b.document().is_focusable(node));
        assert_eq!(b.document().tab_index(node), -1);
    }

    #[test]
    fn drop_target_keeps_higher_tab_index() {
        let mut b = backend();
        let node = element(&mut b);
        b.document_mut().set_tab_index(node, 3);
        let _token = b.connect_drop_target("t", node);
        assert_eq!(b.document().tab_index(node), 3);
    }

    #[test]
    fn preview_connection_records_options() {
        let mut b = backend();
        let node = element(&mut b);
        let options = DragPreviewOptions {
            offset_x: Some(4.0),
            ..DragPreviewOptions::default()
        };
        let token = b.connect_drag_preview("s", node, options.clone());
        assert_eq!(b.preview_options(&Identifier::from("s")), Some(&options));
        assert_eq!(b.profile().source_preview_nodes, 1);
        assert!(b.disconnect(token));
        assert_eq!(b.profile().source_preview_node_options, 0);
    }

    // === lifecycle ===

    #[test]
    fn setup_twice_fails() {
        let mut b = backend();
        assert!(b.setup().is_ok());
        assert_eq!(b.setup(), Err(KeyboardBackendError::AlreadySetUp));
        b.teardown();
        assert!(b.setup().is_ok());
    }

    #[test]
    fn without_window_no_global_listener() {
        let mut b = create_keyboard_backend(
            RecordingManager::new(),
            BackendContext::without_window(FakeDocument::new()),
            KeyboardBackendOptions::default(),
            &BackendRegistry::new(),
        );
        assert!(b.setup().is_ok());
        assert_eq!(b.profile().listeners, 0);
    }

    #[test]
    fn disabled_preview_builds_nothing() {
        let doc = FakeDocument::new();
        let nodes = doc.node_count();
        let mut b = create_keyboard_backend(
            RecordingManager::new(),
            BackendContext::new(doc),
            KeyboardBackendOptions::new().with_preview(false),
            &BackendRegistry::new(),
        );
        assert!(b.setup().is_ok());
        assert_eq!(b.document().node_count(), nodes);
    }

    // === gestures ===

    #[test]
    fn start_trigger_begins_and_publishes() {
        let mut b = backend();
        let source = element(&mut b);
        let _s = b.connect_drag_source("s", source);
        assert!(b.setup().is_ok());

        let mut event = start_key();
        b.dispatch_key_down(source, &mut event);

        assert!(event.default_prevented());
        assert!(b.is_dragging());
        assert_eq!(b.hovered_node(), Some(source));
        let actions = b.manager().actions();
        assert!(matches!(
            actions[0],
            ManagerAction::BeginDrag {
                publish_source: false,
                ..
            }
        ));
        assert_eq!(actions[1], ManagerAction::PublishDragSource);
        assert_eq!(b.profile().listeners, 3);
    }

    #[test]
    fn plain_key_on_source_does_nothing() {
        let mut b = backend();
        let source = element(&mut b);
        let _s = b.connect_drag_source("s", source);
        assert!(b.setup().is_ok());
        let mut event = KeyEvent::new(Key::Char('d'));
        b.dispatch_key_down(source, &mut event);
        assert!(!b.is_dragging());
        assert!(b.manager().actions().is_empty());
    }

    #[test]
    fn undraggable_source_is_ignored() {
        let mut b = backend();
        b.manager_mut().set_can_drag("s", false);
        let source = element(&mut b);
        let _s = b.connect_drag_source("s", source);
        assert!(b.setup().is_ok());
        b.dispatch_key_down(source, &mut start_key());
        assert!(!b.is_dragging());
    }

    #[test]
    fn escape_cancels_and_restores() {
        let modes = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&modes);
        let mut manager = RecordingManager::new();
        manager.add_source("s", Some("card"));
        let mut b = create_keyboard_backend(
            manager,
            BackendContext::new(FakeDocument::new()),
            KeyboardBackendOptions::new().on_dnd_mode_changed(move |on| seen.borrow_mut().push(on)),
            &BackendRegistry::new(),
        );
        let source = element(&mut b);
        let _s = b.connect_drag_source("s", source);
        assert!(b.setup().is_ok());
        b.dispatch_key_down(source, &mut start_key());
        b.drain_announcements();

        let mut escape = KeyEvent::new(Key::Escape);
        b.dispatch_key_down(source, &mut escape);

        assert!(!b.is_dragging());
        assert!(escape.propagation_stopped());
        assert_eq!(b.manager().actions().last(), Some(&ManagerAction::EndDrag));
        assert_eq!(*modes.borrow(), vec![true, false]);
        let texts: Vec<_> = b.drain_announcements().into_iter().map(|a| a.text).collect();
        assert_eq!(texts, vec!["Stopped dragging s"]);
        assert_eq!(b.profile().listeners, 2);
    }

    #[test]
    fn tab_is_locked_only_while_dragging() {
        let mut b = backend();
        let source = element(&mut b);
        let _s = b.connect_drag_source("s", source);
        assert!(b.setup().is_ok());

        let mut tab = KeyEvent::new(Key::Tab);
        b.dispatch_key_down(source, &mut tab);
        assert!(!tab.default_prevented());

        b.dispatch_key_down(source, &mut start_key());
        let mut tab = KeyEvent::new(Key::Tab);
        b.dispatch_key_down(source, &mut tab);
        assert!(tab.default_prevented());
        assert!(!tab.propagation_stopped());
    }

    #[test]
    fn teardown_ends_gesture_and_detaches_preview() {
        let mut b = backend();
        let source = element(&mut b);
        let _s = b.connect_drag_source("s", source);
        assert!(b.setup().is_ok());
        b.dispatch_key_down(source, &mut start_key());

        b.teardown();
        assert!(!b.is_dragging());
        assert!(!b.is_set_up());
        assert_eq!(b.profile().listeners, 1);
        assert_eq!(b.manager().actions().last(), Some(&ManagerAction::EndDrag));
        assert!(b.announcer().live_region().is_some_and(LiveRegion::is_destroyed));
    }
}
