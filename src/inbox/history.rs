//! Resolved-ticket history lookup for one customer.

use crate::models::ticket::Ticket;

use super::partition::sort_desc_by_updated_at;
use super::visibility::HistoryByCustomer;

/// Every resolved ticket recorded for `customer_email`, most recent first.
///
/// Re-filters to `Resolved` so an entry patched in place after the last
/// repartition never leaks into the history view. Unknown customers yield an
/// empty list.
#[must_use]
pub fn open_history(history: &HistoryByCustomer, customer_email: &str) -> Vec<Ticket> {
    let confirmed: Vec<Ticket> = history
        .get(customer_email)
        .map(|tickets| {
            tickets
                .iter()
                .filter(|ticket| ticket.is_resolved())
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    sort_desc_by_updated_at(&confirmed)
}

/// Number of resolved tickets [`open_history`] would return.
#[must_use]
pub fn resolved_count(history: &HistoryByCustomer, customer_email: &str) -> usize {
    history
        .get(customer_email)
        .map_or(0, |tickets| tickets.iter().filter(|t| t.is_resolved()).count())
}
