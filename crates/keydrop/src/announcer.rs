#![forbid(unsafe_code)]

//! Screen-reader announcements.
//!
//! [`Announcer`] is the transport: anything that can push a line of text to
//! an assistive-technology live region. The backend owns a [`LiveRegion`]
//! queue unless the integrator supplies a [`SharedAnnouncer`], in which case
//! the backend uses it but never destroys it.
//!
//! [`DragAnnouncer`] sits on top of the transport and turns drag events into
//! text through an [`AnnouncementMessages`] provider.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use keydrop_core::{Document, Identifier, NodeId};

use crate::messages::{AnnouncementMessages, DefaultAnnouncementMessages, ItemLabel};

// ---------------------------------------------------------------------------
// Announcement
// ---------------------------------------------------------------------------

/// Live-region politeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Politeness {
    /// Read when the user is idle.
    Polite,
    /// Read immediately, interrupting current speech.
    #[default]
    Assertive,
}

impl Politeness {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Polite => "polite",
            Self::Assertive => "assertive",
        }
    }
}

/// One line of text for assistive technology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub text: String,
    pub politeness: Politeness,
}

impl Announcement {
    #[must_use]
    pub fn new(text: impl Into<String>, politeness: Politeness) -> Self {
        Self {
            text: text.into(),
            politeness,
        }
    }
}

// ---------------------------------------------------------------------------
// Announcer
// ---------------------------------------------------------------------------

/// Announcement transport.
pub trait Announcer {
    fn announce(&mut self, message: &str, politeness: Politeness);

    /// Drop pending text.
    fn clear(&mut self);

    /// Release transport resources. Only called on announcers the backend owns.
    fn destroy(&mut self) {}
}

/// An announcer owned by the integrator and shared with the backend.
pub type SharedAnnouncer = Rc<RefCell<dyn Announcer>>;

/// Bounded announcement queue drained by the host.
///
/// When full, the oldest polite entry is evicted first, then the oldest
/// entry of any politeness.
#[derive(Debug, Clone)]
pub struct LiveRegion {
    queue: VecDeque<Announcement>,
    capacity: usize,
    destroyed: bool,
}

impl LiveRegion {
    /// Default queue capacity.
    pub const DEFAULT_CAPACITY: usize = 8;

    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            destroyed: false,
        }
    }

    /// Take every pending announcement, oldest first.
    pub fn drain(&mut self) -> Vec<Announcement> {
        self.queue.drain(..).collect()
    }

    #[must_use]
    pub fn pending(&self) -> impl Iterator<Item = &Announcement> {
        self.queue.iter()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl Default for LiveRegion {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl Announcer for LiveRegion {
    fn announce(&mut self, message: &str, politeness: Politeness) {
        if self.queue.len() >= self.capacity {
            let evict = self
                .queue
                .iter()
                .position(|a| a.politeness == Politeness::Polite)
                .unwrap_or(0);
            self.queue.remove(evict);
        }
        self.destroyed = false;
        self.queue.push_back(Announcement::new(message, politeness));
    }

    fn clear(&mut self) {
        self.queue.clear();
    }

    fn destroy(&mut self) {
        self.queue.clear();
        self.destroyed = true;
    }
}

// ---------------------------------------------------------------------------
// DragAnnouncer
// ---------------------------------------------------------------------------

enum Transport {
    Owned(LiveRegion),
    External(SharedAnnouncer),
}

/// Drag-event announcements over an owned or external transport.
pub struct DragAnnouncer {
    transport: Transport,
    messages: Box<dyn AnnouncementMessages>,
}

impl fmt::Debug for DragAnnouncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DragAnnouncer")
            .field("external", &self.is_external())
            .finish_non_exhaustive()
    }
}

impl Default for DragAnnouncer {
    fn default() -> Self {
        Self::owned(LiveRegion::default(), Box::new(DefaultAnnouncementMessages))
    }
}

impl DragAnnouncer {
    #[must_use]
    pub fn owned(region: LiveRegion, messages: Box<dyn AnnouncementMessages>) -> Self {
        Self {
            transport: Transport::Owned(region),
            messages,
        }
    }

    #[must_use]
    pub fn external(announcer: SharedAnnouncer, messages: Box<dyn AnnouncementMessages>) -> Self {
        Self {
            transport: Transport::External(announcer),
            messages,
        }
    }

    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self.transport, Transport::External(_))
    }

    /// Push raw text with assertive politeness.
    pub fn announce(&mut self, message: &str) {
        self.announce_with(message, Politeness::Assertive);
    }

    pub fn announce_with(&mut self, message: &str, politeness: Politeness) {
        tracing::trace!(message, politeness = politeness.as_str(), "announce");
        match &mut self.transport {
            Transport::Owned(region) => region.announce(message, politeness),
            Transport::External(shared) => shared.borrow_mut().announce(message, politeness),
        }
    }

    /// Pick-up notice. Skipped when the source node is unknown.
    pub fn announce_drag<D: Document + ?Sized>(
        &mut self,
        document: &D,
        node: Option<NodeId>,
        id: &Identifier,
    ) {
        if node.is_none() {
            return;
        }
        let text = self
            .messages
            .picked_up_item(&ItemLabel::describe(document, id, node));
        self.announce(&text);
    }

    /// Hover notice. Skipped when the target node is unknown.
    pub fn announce_hover<D: Document + ?Sized>(
        &mut self,
        document: &D,
        node: Option<NodeId>,
        id: &Identifier,
    ) {
        if node.is_none() {
            return;
        }
        let text = self
            .messages
            .hovered_target(&ItemLabel::describe(document, id, node));
        self.announce(&text);
    }

    /// Drop notice, naming the hovered target when there is one.
    pub fn announce_drop<D: Document + ?Sized>(
        &mut self,
        document: &D,
        node: Option<NodeId>,
        id: &Identifier,
        target: Option<(&Identifier, NodeId)>,
    ) {
        let item = ItemLabel::describe(document, id, node);
        let target = target.map(|(target_id, target_node)| {
            ItemLabel::describe(document, target_id, Some(target_node))
        });
        let text = self.messages.dropped_item(&item, target.as_ref());
        self.announce(&text);
    }

    pub fn announce_cancel<D: Document + ?Sized>(
        &mut self,
        document: &D,
        node: Option<NodeId>,
        id: &Identifier,
    ) {
        let text = self
            .messages
            .canceled_drag(&ItemLabel::describe(document, id, node));
        self.announce(&text);
    }

    pub fn clear(&mut self) {
        match &mut self.transport {
            Transport::Owned(region) => region.clear(),
            Transport::External(shared) => shared.borrow_mut().clear(),
        }
    }

    /// Release the owned transport. External announcers are left untouched.
    pub fn destroy(&mut self) {
        match &mut self.transport {
            Transport::Owned(region) => region.destroy(),
            Transport::External(_) => {
                tracing::trace!("external announcer left intact");
            }
        }
    }

    /// Pending announcements of the owned live region. Empty for external
    /// announcers, which deliver directly.
    pub fn drain(&mut self) -> Vec<Announcement> {
        match &mut self.transport {
            Transport::Owned(region) => region.drain(),
            Transport::External(_) => Vec::new(),
        }
    }

    /// The owned live region, if the backend owns its transport.
    #[must_use]
    pub fn live_region(&self) -> Option<&LiveRegion> {
        match &self.transport {
            Transport::Owned(region) => Some(region),
            Transport::External(_) => None,
        }
    }
}
