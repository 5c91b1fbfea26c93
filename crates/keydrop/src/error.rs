#![forbid(unsafe_code)]

//! Backend errors.

use std::fmt;

/// Fatal wiring errors surfaced to the integrator.
///
/// Drag-time inconsistencies (unknown identifiers, missing nodes, no
/// eligible targets) are never errors; they degrade to no-ops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardBackendError {
    /// `setup` was called while another keyboard backend is set up.
    AlreadySetUp,
}

impl fmt::Display for KeyboardBackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadySetUp => f.write_str("cannot have two keyboard backends at the same time"),
        }
    }
}

impl std::error::Error for KeyboardBackendError {}
