#![forbid(unsafe_code)]

//! Core: host interfaces for keyboard-driven drag and drop.
//!
//! # Role in keydrop
//! `keydrop-core` is the boundary layer. It describes everything the
//! keyboard backend consumes but does not own: the document it navigates,
//! the keydown events the host feeds it, and the drag-drop manager that
//! holds authoritative drag state.
//!
//! # Primary responsibilities
//! - **Document**: tree queries, focus, labels, and the element-building
//!   surface used by the drag previewer.
//! - **KeyEvent**: normalized keydown events with DOM-style propagation flags.
//! - **ListenerRegistry**: window/element listener tables with DOM dispatch order.
//! - **DragDropManager**: begin/hover/drop/end actions and monitor queries.
//!
//! # How it fits in the system
//! `keydrop` implements the backend against these traits only, so a browser
//! binding and the in-memory fakes in [`testing`] are interchangeable.

pub mod dom;
pub mod event;
pub mod geometry;
pub mod listener;
pub mod manager;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use dom::{Document, DocumentPosition, NodeId, node_client_offset};
pub use event::{Key, KeyEvent, KeyEventParseError, Modifiers};
pub use geometry::{Point, Rect};
pub use listener::{
    DispatchStep, ListenerId, ListenerRegistry, ListenerTarget, Phase, run_dispatch,
};
pub use manager::{BeginDragOptions, DragDropManager, HoverOptions, Identifier, ItemType};
