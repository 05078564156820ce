//! # Listener Registry
//!
//! The dispatcher the simulation owns. All methods run on the simulation
//! thread; the registry is reached from other threads only through work
//! items on the execution bridge.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::listener::SubscriptionListener;
use crate::raw::RawEvent;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Registration handle of a listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocates a process-unique id.
    pub(crate) fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Simulations that own a [`ListenerRegistry`].
pub trait HasListeners {
    /// The simulation's dispatcher.
    fn listeners(&mut self) -> &mut ListenerRegistry;
}

/// Registered subscription listeners, in registration order.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    listeners: Vec<SubscriptionListener>,
    registrations: u64,
    deregistrations: u64,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener. Returns its handle.
    pub fn register(&mut self, listener: SubscriptionListener) -> ListenerId {
        let id = listener.id();
        debug!(%id, tag = listener.tag(), "listener registered");
        self.listeners.push(listener);
        self.registrations += 1;
        id
    }

    /// Removes the listener with `id`.
    ///
    /// Returns false if it was not registered (already removed, or its
    /// registration never ran).
    pub fn deregister_all(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|listener| listener.id() != id);
        let removed = self.listeners.len() != before;
        if removed {
            self.deregistrations += 1;
            debug!(%id, "listener deregistered");
        }
        removed
    }

    /// Hands `raw` to every listener. Returns how many enqueued a record.
    pub fn dispatch(&self, raw: &RawEvent, cancelled: bool) -> usize {
        self.listeners
            .iter()
            .filter(|listener| listener.handle(raw, cancelled))
            .count()
    }

    /// True if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: ListenerId) -> bool {
        self.listeners.iter().any(|listener| listener.id() == id)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// True if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Total successful registrations.
    #[must_use]
    pub fn registrations(&self) -> u64 {
        self.registrations
    }

    /// Total successful deregistrations.
    #[must_use]
    pub fn deregistrations(&self) -> u64 {
        self.deregistrations
    }
}
