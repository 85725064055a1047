//! Pure grouping, ordering, and status partitioning over ticket collections.
//!
//! Every function borrows its input and returns a fresh collection. The
//! reconciliation layer re-runs these after every server push, and callers
//! still holding an earlier output must keep seeing it unchanged.

use std::collections::HashMap;

use crate::models::ticket::Ticket;

/// Tickets grouped by customer email, groups in first-appearance order.
pub type CustomerGroups = Vec<(String, Vec<Ticket>)>;

/// Result of [`partition_by_status`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusPartition {
    /// Tickets whose status is `Resolved`.
    pub resolved: Vec<Ticket>,
    /// Everything else.
    pub non_resolved: Vec<Ticket>,
}

/// Group tickets by customer email.
///
/// Groups keep the order in which each email is first seen, and tickets keep
/// their input order inside a group, so a later stable sort breaks ties by
/// input order.
#[must_use]
pub fn group_by_customer(tickets: &[Ticket]) -> CustomerGroups {
    let mut groups: CustomerGroups = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for ticket in tickets {
        let email = ticket.customer_email();
        match index.get(email) {
            Some(&slot) => groups[slot].1.push(ticket.clone()),
            None => {
                index.insert(email, groups.len());
                groups.push((email.to_owned(), vec![ticket.clone()]));
            }
        }
    }
    groups
}

/// Copy of `tickets` ordered most recently updated first.
///
/// Stable: tickets with equal `updated_at` keep their input order.
#[must_use]
pub fn sort_desc_by_updated_at(tickets: &[Ticket]) -> Vec<Ticket> {
    let mut sorted = tickets.to_vec();
    sorted.sort_by_key(|ticket| std::cmp::Reverse(ticket.recency()));
    sorted
}

/// Split `tickets` into resolved and non-resolved, preserving order.
#[must_use]
pub fn partition_by_status(tickets: &[Ticket]) -> StatusPartition {
    let (resolved, non_resolved) = tickets.iter().cloned().partition(Ticket::is_resolved);
    StatusPartition {
        resolved,
        non_resolved,
    }
}
