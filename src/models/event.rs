//! Real-time events pushed by the ticket server.

use serde::{Deserialize, Serialize};

use super::ticket::{ConversationEntry, Ticket};

/// Authoritative update pushed to every connected agent session.
///
/// Wire form: `{"event": "ticket:updated", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// A ticket was created server-side.
    #[serde(rename = "ticket:created")]
    TicketCreated {
        /// The new ticket.
        ticket: Ticket,
    },
    /// A ticket changed or received a message.
    #[serde(rename = "ticket:updated")]
    TicketUpdated {
        /// Ticket that changed.
        #[serde(rename = "ticketId")]
        ticket_id: String,
        /// Message that triggered the update, not yet part of
        /// `updated_ticket.conversations`.
        #[serde(rename = "newMessage", default)]
        new_message: Option<ConversationEntry>,
        /// Full server-side state of the ticket.
        #[serde(rename = "updatedTicket")]
        updated_ticket: Ticket,
    },
}

impl ServerEvent {
    /// Wire name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TicketCreated { .. } => "ticket:created",
            Self::TicketUpdated { .. } => "ticket:updated",
        }
    }

    /// Ticket the event concerns.
    #[must_use]
    pub fn ticket_id(&self) -> &str {
        match self {
            Self::TicketCreated { ticket } => &ticket.ticket_id,
            Self::TicketUpdated { ticket_id, .. } => ticket_id,
        }
    }
}
