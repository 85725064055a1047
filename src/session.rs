//! Shared session state owned by the host application.
//!
//! The store is the single source of truth for the agent-wide unread
//! counter. The host creates it at session bootstrap and hands clones to the
//! engine and to whatever renders the counter; every clone observes the same
//! value.

use std::sync::Arc;

use tokio::sync::watch;

/// Point-in-time view of the session state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Unread tickets across the agent's active queue.
    pub new_ticket_count: u32,
}

/// Injectable `get`/`set`/`subscribe` container.
#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Empty store: counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::with_snapshot(SessionSnapshot::default())
    }

    /// Store seeded with `snapshot`.
    #[must_use]
    pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        let (tx, _rx) = watch::channel(snapshot);
        Self { tx: Arc::new(tx) }
    }

    /// Current state.
    #[must_use]
    pub fn get(&self) -> SessionSnapshot {
        *self.tx.borrow()
    }

    /// Replace the state and notify subscribers.
    pub fn set(&self, snapshot: SessionSnapshot) {
        self.tx.send_replace(snapshot);
    }

    /// Apply `f` to the state as one atomic read-modify-write and return the
    /// result. Subscribers are notified only if the state changed.
    pub fn update<F>(&self, f: F) -> SessionSnapshot
    where
        F: FnOnce(&mut SessionSnapshot),
    {
        self.tx.send_if_modified(|state| {
            let before = *state;
            f(state);
            *state != before
        });
        self.get()
    }

    /// Receiver that wakes on every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Shorthand for `get().new_ticket_count`.
    #[must_use]
    pub fn new_ticket_count(&self) -> u32 {
        self.get().new_ticket_count
    }

    /// Shorthand for overwriting only the counter.
    pub fn set_new_ticket_count(&self, count: u32) {
        self.update(|state| state.new_ticket_count = count);
    }
}
