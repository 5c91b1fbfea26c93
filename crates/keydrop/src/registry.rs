#![forbid(unsafe_code)]

//! Setup exclusivity: at most one keyboard backend is set up per page.
//!
//! The guard is an explicit handle rather than a process global. Every
//! backend wired into the same page must be built from clones of the same
//! [`BackendRegistry`]; tests create a fresh one per case.

use std::cell::Cell;
use std::rc::Rc;

use crate::error::KeyboardBackendError;

/// Shared check-and-set flag for "a keyboard backend is active".
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    active: Rc<Cell<bool>>,
}

impl BackendRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot. Fails if another backend holds it.
    pub fn acquire(&self) -> Result<(), KeyboardBackendError> {
        if self.active.replace(true) {
            return Err(KeyboardBackendError::AlreadySetUp);
        }
        Ok(())
    }

    /// Free the slot.
    pub fn release(&self) {
        self.active.set(false);
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let registry = BackendRegistry::new();
        let other = registry.clone();
        assert!(registry.acquire().is_ok());
        assert_eq!(other.acquire(), Err(KeyboardBackendError::AlreadySetUp));
        assert!(other.is_active());
        registry.release();
        assert!(other.acquire().is_ok());
    }

    #[test]
    fn independent_registries_do_not_interfere() {
        let a = BackendRegistry::new();
        let b = BackendRegistry::new();
        assert!(a.acquire().is_ok());
        assert!(b.acquire().is_ok());
    }
}
