//! Local per-agent inbox state and its synchronous transitions.
//!
//! Every method here runs inside one critical section of the engine's state
//! lock and never awaits, so each call is an indivisible last-write-wins
//! update.

use tracing::debug;

use crate::models::command::TicketUpdate;
use crate::models::ticket::{AgentId, ConversationEntry, Ticket};
use crate::session::SessionStore;

use super::unread::UnreadTracker;
use super::visibility::InboxView;

/// Local view of the shared ticket pool for one agent.
#[derive(Debug)]
pub struct InboxState {
    /// Active queue and per-customer history from the last repartition,
    /// patched in place by commands and events since.
    pub view: InboxView,
    /// Ticket the agent has open.
    pub selected: Option<Ticket>,
    /// Whether the open ticket was opened from history (no mutations).
    pub read_only: bool,
    /// Unread ledger and counter.
    pub unread: UnreadTracker,
}

impl InboxState {
    /// Empty state bound to `session`.
    #[must_use]
    pub fn new(session: SessionStore) -> Self {
        Self {
            view: InboxView::default(),
            selected: None,
            read_only: false,
            unread: UnreadTracker::new(session),
        }
    }

    /// Replace queue and history with a fresh repartition.
    ///
    /// The open ticket is left as it is, even when the new view moved it
    /// into history.
    pub fn apply_view(&mut self, view: InboxView) {
        self.view = view;
    }

    /// Put a just-created ticket at the head of the queue.
    ///
    /// A resolved placeholder standing in for the same customer is dropped,
    /// since the customer now has a qualifying ticket of their own. Returns
    /// whether the ticket was inserted; tickets already queued are skipped.
    pub fn insert_created(&mut self, created: &Ticket) -> bool {
        if self.queued(&created.ticket_id).is_some() {
            return false;
        }
        let email = created.customer_email();
        let before = self.view.active_queue.len();
        self.view
            .active_queue
            .retain(|ticket| !(ticket.is_resolved() && ticket.customer_email() == email));
        if self.view.active_queue.len() < before {
            debug!(customer = email, "placeholder replaced by created ticket");
        }
        self.view.active_queue.insert(0, created.clone());
        true
    }

    /// Ticket in the active queue.
    #[must_use]
    pub fn queued(&self, ticket_id: &str) -> Option<&Ticket> {
        self.view
            .active_queue
            .iter()
            .find(|ticket| ticket.ticket_id == ticket_id)
    }

    /// Ticket in any customer's history.
    #[must_use]
    pub fn historical(&self, ticket_id: &str) -> Option<&Ticket> {
        self.view
            .history_by_customer
            .values()
            .flatten()
            .find(|ticket| ticket.ticket_id == ticket_id)
    }

    /// Freshest local copy of a ticket: the open one first, then the queue,
    /// then history.
    #[must_use]
    pub fn find(&self, ticket_id: &str) -> Option<&Ticket> {
        self.selected
            .as_ref()
            .filter(|ticket| ticket.ticket_id == ticket_id)
            .or_else(|| self.queued(ticket_id))
            .or_else(|| self.historical(ticket_id))
    }

    /// Open a ticket from the queue or, failing that, from history.
    ///
    /// Returns the opened ticket, or `None` if it is unknown locally.
    pub fn select(&mut self, ticket_id: &str, read_only: bool) -> Option<Ticket> {
        let ticket = self
            .queued(ticket_id)
            .or_else(|| self.historical(ticket_id))
            .cloned()?;
        self.selected = Some(ticket.clone());
        self.read_only = read_only;
        Some(ticket)
    }

    /// Clear `is_new` on every local copy of `ticket_id`.
    pub fn flip_read(&mut self, ticket_id: &str) {
        self.for_each_copy(ticket_id, |ticket| ticket.is_new = false);
    }

    /// Server-authoritative overwrite from a `ticket:updated` push.
    ///
    /// Queue and history copies are replaced wholesale. The open ticket takes
    /// the new metadata but keeps its own conversation with `new_message`
    /// appended, since the pushed ticket does not yet carry that message.
    pub fn apply_server_update(
        &mut self,
        ticket_id: &str,
        updated: &Ticket,
        new_message: Option<ConversationEntry>,
    ) {
        for ticket in self
            .view
            .active_queue
            .iter_mut()
            .chain(self.view.history_by_customer.values_mut().flatten())
            .filter(|ticket| ticket.ticket_id == ticket_id)
        {
            *ticket = updated.clone();
        }

        if let Some(selected) = self.selected.as_mut().filter(|t| t.ticket_id == ticket_id) {
            let mut conversations = std::mem::take(&mut selected.conversations);
            conversations.extend(new_message);
            *selected = Ticket {
                conversations,
                ..updated.clone()
            };
        }
    }

    /// Append a message to the open ticket and the queued copy.
    pub fn append_message(&mut self, ticket_id: &str, entry: &ConversationEntry) {
        if let Some(selected) = self.selected.as_mut().filter(|t| t.ticket_id == ticket_id) {
            selected.conversations.push(entry.clone());
        }
        for ticket in self
            .view
            .active_queue
            .iter_mut()
            .filter(|ticket| ticket.ticket_id == ticket_id)
        {
            ticket.conversations.push(entry.clone());
        }
    }

    /// Apply a server-confirmed field change locally.
    ///
    /// Reassigning away from `agent_id` drops the ticket from the queue and
    /// opens the first remaining one. Returns the id of a ticket opened this
    /// way so the caller can mark it read.
    pub fn apply_local_update(
        &mut self,
        ticket_id: &str,
        update: &TicketUpdate,
        agent_id: AgentId,
    ) -> Option<String> {
        for ticket in self
            .view
            .active_queue
            .iter_mut()
            .filter(|ticket| ticket.ticket_id == ticket_id)
        {
            apply_field(ticket, update);
        }

        match update {
            TicketUpdate::Assignee(assignee) if *assignee != agent_id => {
                self.view
                    .active_queue
                    .retain(|ticket| ticket.ticket_id != ticket_id);
                self.selected = self.view.active_queue.first().cloned();
                self.selected
                    .as_ref()
                    .filter(|ticket| ticket.is_new && !self.read_only)
                    .map(|ticket| ticket.ticket_id.clone())
            }
            _ => {
                if let Some(selected) = self.selected.as_mut().filter(|t| t.ticket_id == ticket_id) {
                    apply_field(selected, update);
                }
                None
            }
        }
    }

    /// Count the read transition implied by resolving an unread ticket.
    ///
    /// Returns whether the counter moved.
    pub fn settle_unread_on_resolve(&mut self, ticket_id: &str) -> bool {
        let was_unread = self.find(ticket_id).is_some_and(|ticket| ticket.is_new);
        if !was_unread || self.unread.is_acknowledged(ticket_id) {
            return false;
        }
        self.flip_read(ticket_id);
        self.unread.acknowledge(ticket_id)
    }

    fn for_each_copy(&mut self, ticket_id: &str, mut f: impl FnMut(&mut Ticket)) {
        for ticket in self
            .view
            .active_queue
            .iter_mut()
            .chain(self.view.history_by_customer.values_mut().flatten())
            .chain(self.selected.iter_mut())
            .filter(|ticket| ticket.ticket_id == ticket_id)
        {
            f(ticket);
        }
    }
}

fn apply_field(ticket: &mut Ticket, update: &TicketUpdate) {
    match update {
        TicketUpdate::Status(status) => ticket.status = status.clone(),
        TicketUpdate::Priority(priority) => ticket.priority = priority.clone(),
        TicketUpdate::Assignee(agent) => ticket.assigned_user_id = Some(*agent),
    }
}
