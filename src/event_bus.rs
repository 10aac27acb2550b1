//! Per-dashboard publish/subscribe channel.
//!
//! Handlers run synchronously in registration order. The bus is
//! single-threaded and cheap to clone; every clone refers to the same set of
//! handlers. Binding returns a [`Subscription`] that unbinds when dropped, so
//! a component's handlers live exactly as long as the component does.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::events::{DashboardEvent, EventKind};

type Handler = Rc<dyn Fn(&DashboardEvent)>;

struct Registration {
    id: u64,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    handlers: HashMap<EventKind, Vec<Registration>>,
}

impl BusInner {
    fn remove(&mut self, kind: EventKind, id: u64) -> bool {
        let Some(list) = self.handlers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|r| r.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.handlers.remove(&kind);
        }
        removed
    }

    fn contains(&self, kind: EventKind, id: u64) -> bool {
        self.handlers
            .get(&kind)
            .is_some_and(|list| list.iter().any(|r| r.id == id))
    }
}

/// Event bus shared by all components of one mounted dashboard.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`.
    pub fn bind<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&DashboardEvent) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.handlers.entry(kind).or_default().push(Registration {
            id,
            handler: Rc::new(handler),
        });
        log::trace!("bus: bound {:?} #{}", kind, id);
        Subscription {
            bus: Rc::downgrade(&self.inner),
            kind,
            id,
        }
    }

    /// Dispatch `event` to every handler bound for its kind.
    ///
    /// Handlers may bind, unbind or trigger further events while running. A
    /// handler unbound by an earlier handler in the same dispatch is skipped.
    /// Returns the number of handlers that ran.
    pub fn trigger(&self, event: &DashboardEvent) -> usize {
        let kind = event.kind();
        let snapshot: Vec<(u64, Handler)> = match self.inner.borrow().handlers.get(&kind) {
            Some(list) => list.iter().map(|r| (r.id, Rc::clone(&r.handler))).collect(),
            None => return 0,
        };

        let mut ran = 0;
        for (id, handler) in snapshot {
            if !self.inner.borrow().contains(kind, id) {
                continue;
            }
            handler(event);
            ran += 1;
        }
        log::trace!("bus: {:?} reached {} handler(s)", kind, ran);
        ran
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.borrow().handlers.get(&kind).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let total: usize = inner.handlers.values().map(Vec::len).sum();
        f.debug_struct("EventBus").field("handlers", &total).finish()
    }
}

/// Disposer returned by [`EventBus::bind`].
#[must_use = "dropping a Subscription unbinds its handler"]
pub struct Subscription {
    bus: Weak<RefCell<BusInner>>,
    kind: EventKind,
    id: u64,
}

impl Subscription {
    /// Unbind now. Equivalent to dropping.
    pub fn unbind(self) {}

    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        if bus.borrow_mut().remove(self.kind, self.id) {
            log::trace!("bus: unbound {:?} #{}", self.kind, self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}
