#![forbid(unsafe_code)]

//! Focus order over a live candidate set.
//!
//! [`FocusOrder`] answers "next", "previous", "first", and "last" relative to
//! a reference node. It holds no state of its own: every query calls the
//! candidate getter again, so nodes added, removed, or moved between calls
//! are reflected immediately.
//!
//! # Invariants
//!
//! 1. `next` returns the first candidate after the reference in tree order
//!    (descendants of the reference count as after).
//! 2. `previous` returns the last candidate before the reference in tree
//!    order (ancestors of the reference count as before).
//! 3. Without `wrap`, running off either end yields `None`; with `wrap`, the
//!    matching scroll hook runs and then `first`/`last` is recomputed.
//! 4. With an unchanged candidate set, `next` then `previous` (or the
//!    reverse) returns to the starting candidate.

use std::cmp::Ordering;

use keydrop_core::{Document, NodeId};

/// Options for a single next/previous query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FocusOptions {
    /// Continue from the opposite end instead of returning `None`.
    pub wrap: bool,
    /// Reference node; falls back to the document's active element.
    pub from: Option<NodeId>,
}

impl FocusOptions {
    #[must_use]
    pub fn from(node: NodeId) -> Self {
        Self {
            wrap: false,
            from: Some(node),
        }
    }

    #[must_use]
    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }
}

type ScrollHook<'a> = Box<dyn FnMut() + 'a>;

/// Next/previous/first/last queries over candidates supplied by `F`.
pub struct FocusOrder<'a, D: ?Sized, F> {
    document: &'a D,
    candidates: F,
    scroll_to_start: Option<ScrollHook<'a>>,
    scroll_to_end: Option<ScrollHook<'a>>,
}

impl<D: ?Sized, F> std::fmt::Debug for FocusOrder<'_, D, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusOrder")
            .field("scroll_to_start", &self.scroll_to_start.is_some())
            .field("scroll_to_end", &self.scroll_to_end.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a, D, F> FocusOrder<'a, D, F>
where
    D: Document + ?Sized,
    F: Fn(&D) -> Vec<NodeId>,
{
    /// Create a focus order over the candidates returned by `candidates`.
    ///
    /// The getter must return candidates already sorted in document order.
    #[must_use]
    pub fn new(document: &'a D, candidates: F) -> Self {
        Self {
            document,
            candidates,
            scroll_to_start: None,
            scroll_to_end: None,
        }
    }

    /// Hook run before wrapping from the end back to the first candidate.
    #[must_use]
    pub fn on_scroll_to_start(mut self, hook: impl FnMut() + 'a) -> Self {
        self.scroll_to_start = Some(Box::new(hook));
        self
    }

    /// Hook run before wrapping from the start back to the last candidate.
    #[must_use]
    pub fn on_scroll_to_end(mut self, hook: impl FnMut() + 'a) -> Self {
        self.scroll_to_end = Some(Box::new(hook));
        self
    }

    fn reference(&self, options: FocusOptions) -> Option<NodeId> {
        options.from.or_else(|| self.document.active_element())
    }

    #[must_use]
    pub fn next(&mut self, options: FocusOptions) -> Option<NodeId> {
        let reference = self.reference(options)?;
        let found = (self.candidates)(self.document).into_iter().find(|&candidate| {
            self.document
                .compare_document_position(reference, candidate)
                .is_after()
        });
        if found.is_none() && options.wrap {
            if let Some(hook) = self.scroll_to_start.as_mut() {
                hook();
            }
            return self.first();
        }
        found
    }

    #[must_use]
    pub fn previous(&mut self, options: FocusOptions) -> Option<NodeId> {
        let reference = self.reference(options)?;
        let found = (self.candidates)(self.document)
            .into_iter()
            .rev()
            .find(|&candidate| {
                self.document
                    .compare_document_position(reference, candidate)
                    .is_before()
            });
        if found.is_none() && options.wrap {
            if let Some(hook) = self.scroll_to_end.as_mut() {
                hook();
            }
            return self.last();
        }
        found
    }

    #[must_use]
    pub fn first(&self) -> Option<NodeId> {
        (self.candidates)(self.document).first().copied()
    }

    #[must_use]
    pub fn last(&self) -> Option<NodeId> {
        (self.candidates)(self.document).last().copied()
    }
}

/// Compare two nodes by structural document position.
///
/// Nodes that are equal, or whose relation the document cannot determine,
/// compare as equal.
#[must_use]
pub fn document_order<D: Document + ?Sized>(document: &D, a: NodeId, b: NodeId) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let position = document.compare_document_position(a, b);
    if position.is_after() {
        Ordering::Less
    } else if position.is_before() {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Sort connected nodes into document order. Disconnected nodes are dropped.
pub fn sort_in_document_order<D: Document + ?Sized>(document: &D, nodes: &mut Vec<NodeId>) {
    nodes.retain(|&node| document.is_connected(node));
    nodes.sort_by(|&a, &b| document_order(document, a, b));
}
