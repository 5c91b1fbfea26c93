#![forbid(unsafe_code)]

//! In-memory collaborators for tests.
//!
//! - [`FakeDocument`]: an arena-backed element tree with DOM-accurate
//!   document positions, focusability, and the element-building surface.
//! - [`RecordingManager`]: a drag-drop manager that logs every action and
//!   answers monitor queries the way the dnd-core monitor does.

mod document;
mod manager;

pub use document::FakeDocument;
pub use manager::{ManagerAction, RecordingManager};
