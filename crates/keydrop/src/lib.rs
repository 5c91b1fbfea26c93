#![forbid(unsafe_code)]

//! Keyboard drag and drop for a drag-drop manager, narrated to screen readers.
//!
//! This crate provides:
//! - [`KeyboardBackend`], the input backend: Ctrl/Cmd+D on a source picks it
//!   up, ArrowUp/ArrowDown move between eligible drop targets, Space/Enter
//!   drops, and Escape cancels
//! - [`FocusOrder`] for next/previous queries over a live candidate set
//! - [`DomDragPreviewer`], a cloned preview that follows the hovered target
//! - [`DragAnnouncer`] with pluggable [`Announcer`] transports and
//!   [`AnnouncementMessages`]
//!
//! # Example
//!
//! ```ignore
//! let registry = BackendRegistry::new();
//! let mut backend = create_keyboard_backend(
//!     manager,
//!     BackendContext::new(document),
//!     KeyboardBackendOptions::new().with_config(KeyboardBackendConfig::from_env()),
//!     &registry,
//! );
//! backend.setup()?;
//! let card = backend.connect_drag_source("card-1", card_node);
//! let lane = backend.connect_drop_target("lane-2", lane_node);
//! // for every host keydown:
//! backend.dispatch_key_down(event_target, &mut event);
//! ```

/// Screen-reader announcement transports and drag announcements.
pub mod announcer;
/// The keyboard backend and its factory.
pub mod backend;
/// Options bag and env-driven configuration.
pub mod config;
/// Backend errors.
pub mod error;
/// Next/previous focus queries over live candidates.
pub mod focus_order;
/// Announcement text and accessible labels.
pub mod messages;
/// Directional navigation for one gesture.
pub mod navigator;
/// Drag preview rendering.
pub mod preview;
/// Setup exclusivity handle.
pub mod registry;
/// Start, drop, and cancel key patterns.
pub mod trigger;

pub use announcer::{
    Announcement, Announcer, DragAnnouncer, LiveRegion, Politeness, SharedAnnouncer,
};
pub use backend::{
    BackendContext, BackendProfile, DragPreviewOptions, KeyboardBackend, Unsubscribe, Window,
    create_keyboard_backend,
};
pub use config::{
    ConfigError, KeyboardBackendConfig, KeyboardBackendConfigParse, KeyboardBackendOptions,
};
pub use error::KeyboardBackendError;
pub use focus_order::{FocusOptions, FocusOrder, document_order, sort_in_document_order};
pub use messages::{
    AnnouncementMessages, DefaultAnnouncementMessages, ItemLabel, node_description,
};
pub use navigator::{Direction, DropTargetNavigator, NavigatorEnv, viable_targets};
pub use preview::{DEFAULT_PREVIEWER_CLASS, DomDragPreviewer, DragPreview, MonitorSnapshot};
pub use registry::BackendRegistry;
pub use trigger::{DragTrigger, KeyboardDragShortcut, is_keyboard_drag_trigger};
