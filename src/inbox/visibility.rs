//! Per-agent visibility rules over the partitioned ticket collection.

use std::collections::BTreeMap;

use crate::models::ticket::{AgentId, Ticket};

use super::partition::{group_by_customer, partition_by_status, sort_desc_by_updated_at};

/// Resolved tickets per customer email, most recent first.
pub type HistoryByCustomer = BTreeMap<String, Vec<Ticket>>;

/// Output of one visibility pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboxView {
    /// The agent's work queue, most recently updated first.
    pub active_queue: Vec<Ticket>,
    /// Every resolved ticket, per customer, regardless of visibility.
    pub history_by_customer: HistoryByCustomer,
}

/// Compute the active queue and history map for `agent_id`.
///
/// Per customer: every non-resolved ticket that is unassigned or assigned to
/// `agent_id` goes into the queue. When none qualifies, the most recently
/// updated resolved ticket stands in for the customer instead. All resolved
/// tickets land in the history map either way.
#[must_use]
pub fn select_visible(tickets: &[Ticket], agent_id: AgentId) -> InboxView {
    let mut active_queue = Vec::new();
    let mut history_by_customer = HistoryByCustomer::new();

    for (email, customer_tickets) in group_by_customer(tickets) {
        let sorted = sort_desc_by_updated_at(&customer_tickets);
        let split = partition_by_status(&sorted);

        let visible: Vec<Ticket> = split
            .non_resolved
            .into_iter()
            .filter(|ticket| ticket.is_visible_to(agent_id))
            .collect();

        if !visible.is_empty() {
            active_queue.extend(visible);
        } else if let Some(latest) = split.resolved.first() {
            active_queue.push(latest.clone());
        }

        if !split.resolved.is_empty() {
            history_by_customer.insert(email, split.resolved);
        }
    }

    InboxView {
        active_queue: sort_desc_by_updated_at(&active_queue),
        history_by_customer,
    }
}
