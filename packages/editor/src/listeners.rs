//! Host event listener registrations.
//!
//! Controllers never attach listeners themselves. They ask the
//! [`ListenerRegistry`] for a registration and hold the returned
//! [`ListenerGuard`]; the host reads [`ListenerRegistry::active`] to decide
//! which events to route. Dropping the guard releases the registration, so
//! every registration is released exactly once.

use crate::media::ViewId;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Where a listener is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerTarget {
    /// The element rendered for a node view
    View(ViewId),
    /// The resize handle of a node view
    ResizeHandle(ViewId),
    /// The whole document, for drags and click-outside
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PointerEnter,
    PointerLeave,
    PointerDown,
    PointerMove,
    PointerUp,
    KeyDown,
}

#[derive(Debug, Default)]
struct Registrations {
    next_id: u64,
    active: BTreeMap<ListenerId, (ListenerTarget, EventKind)>,
    released: u64,
}

/// Shared table of live listener registrations
#[derive(Debug, Clone, Default)]
pub struct ListenerRegistry {
    inner: Rc<RefCell<Registrations>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the guard is dropped.
    #[must_use = "dropping the guard releases the listener"]
    pub fn listen(&self, target: ListenerTarget, event: EventKind) -> ListenerGuard {
        let mut inner = self.inner.borrow_mut();
        let id = ListenerId(inner.next_id);
        inner.next_id += 1;
        inner.active.insert(id, (target, event));
        ListenerGuard {
            id,
            registry: Rc::downgrade(&self.inner),
        }
    }

    pub fn is_active(&self, id: ListenerId) -> bool {
        self.inner.borrow().active.contains_key(&id)
    }

    /// Live registrations, oldest first
    pub fn active(&self) -> Vec<(ListenerId, ListenerTarget, EventKind)> {
        self.inner
            .borrow()
            .active
            .iter()
            .map(|(id, (target, event))| (*id, *target, *event))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.inner.borrow().active.len()
    }

    /// Whether any live listener for `event` is attached to `target`
    pub fn listens(&self, target: ListenerTarget, event: EventKind) -> bool {
        self.inner
            .borrow()
            .active
            .values()
            .any(|entry| *entry == (target, event))
    }

    /// Number of registrations released so far
    pub fn released_count(&self) -> u64 {
        self.inner.borrow().released
    }
}

/// RAII registration handle
#[must_use = "dropping the guard releases the listener"]
#[derive(Debug)]
pub struct ListenerGuard {
    id: ListenerId,
    registry: Weak<RefCell<Registrations>>,
}

impl ListenerGuard {
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut inner = registry.borrow_mut();
        if inner.active.remove(&self.id).is_some() {
            inner.released += 1;
        } else {
            warn!(id = self.id.0, "listener was already released");
        }
    }
}
