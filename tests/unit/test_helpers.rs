//! Ticket builders shared by the unit tests.

use chrono::{DateTime, TimeZone, Utc};

use ticket_inbox::models::ticket::{AgentId, Customer, Ticket, TicketStatus};

/// Agent whose view is being computed.
pub const AGENT: AgentId = 7;

/// Some other agent sharing the pool.
pub const OTHER_AGENT: AgentId = 9;

/// Timestamp `secs` seconds after the epoch.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
}

/// Read, unassigned ticket.
pub fn ticket(id: &str, email: &str, status: TicketStatus, updated_secs: i64) -> Ticket {
    Ticket {
        ticket_id: id.to_owned(),
        customer: Customer {
            email: email.to_owned(),
        },
        status,
        updated_at: at(updated_secs),
        ..Ticket::default()
    }
}

pub fn assigned(ticket: Ticket, agent: AgentId) -> Ticket {
    Ticket {
        assigned_user_id: Some(agent),
        ..ticket
    }
}

pub fn unread(ticket: Ticket) -> Ticket {
    Ticket {
        is_new: true,
        ..ticket
    }
}

/// Ids of `tickets`, in order.
pub fn ids(tickets: &[Ticket]) -> Vec<&str> {
    tickets.iter().map(|t| t.ticket_id.as_str()).collect()
}
