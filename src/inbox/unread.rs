//! Unread tracking: the per-ticket `is_new` transition ledger and the
//! agent-wide counter in the session store.
//!
//! The counter moves by +1 for every new unread ticket announced by the
//! server and by -1 exactly once per ticket that leaves the unread state
//! through this engine. The ledger remembers which tickets were already
//! counted so duplicate or concurrent `mark_read` calls never decrement
//! twice, even when a later server payload still carries `is_new = true`.

use std::collections::HashSet;

use tracing::debug;

use crate::models::ticket::Ticket;
use crate::session::SessionStore;

/// Unread ledger bound to a session store.
#[derive(Debug)]
pub struct UnreadTracker {
    session: SessionStore,
    acknowledged: HashSet<String>,
    in_flight: HashSet<String>,
}

impl UnreadTracker {
    /// Tracker writing its counter into `session`.
    #[must_use]
    pub fn new(session: SessionStore) -> Self {
        Self {
            session,
            acknowledged: HashSet::new(),
            in_flight: HashSet::new(),
        }
    }

    /// Current counter value.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.session.new_ticket_count()
    }

    /// Set the counter to the number of unread tickets in `queue`.
    ///
    /// Used once at session bootstrap.
    pub fn seed(&mut self, queue: &[Ticket]) -> u32 {
        let unread = queue.iter().filter(|ticket| ticket.is_new).count();
        let unread = u32::try_from(unread).unwrap_or(u32::MAX);
        self.session.set_new_ticket_count(unread);
        unread
    }

    /// Count a newly created ticket if it is unread and not resolved.
    ///
    /// Returns whether the counter moved.
    pub fn record_created(&mut self, ticket: &Ticket) -> bool {
        if !ticket.is_new || ticket.is_resolved() {
            return false;
        }
        self.session
            .update(|state| state.new_ticket_count = state.new_ticket_count.saturating_add(1));
        true
    }

    /// Reserve the read transition of `ticket` before the server call.
    ///
    /// Fails when the ticket is already read, already counted, or claimed by
    /// a concurrent call.
    pub fn try_claim(&mut self, ticket: &Ticket) -> bool {
        if !ticket.is_new
            || self.acknowledged.contains(&ticket.ticket_id)
            || self.in_flight.contains(&ticket.ticket_id)
        {
            return false;
        }
        self.in_flight.insert(ticket.ticket_id.clone())
    }

    /// Drop a claim whose server call failed.
    pub fn release(&mut self, ticket_id: &str) {
        self.in_flight.remove(ticket_id);
    }

    /// Record the `is_new -> false` transition of `ticket_id` and decrement
    /// the counter, once per ticket. The caller flips the flag in the same
    /// critical section.
    ///
    /// Returns whether the counter moved.
    pub fn acknowledge(&mut self, ticket_id: &str) -> bool {
        self.in_flight.remove(ticket_id);
        if !self.acknowledged.insert(ticket_id.to_owned()) {
            debug!(ticket_id, "read transition already counted");
            return false;
        }
        self.session
            .update(|state| state.new_ticket_count = state.new_ticket_count.saturating_sub(1));
        true
    }

    /// Whether the read transition of `ticket_id` was already counted.
    #[must_use]
    pub fn is_acknowledged(&self, ticket_id: &str) -> bool {
        self.acknowledged.contains(ticket_id)
    }
}
