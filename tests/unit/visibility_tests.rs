//! Unit tests for the visibility selector.
//!
//! Covers the per-customer representative rule, exhaustive history, the
//! global recency order of the active queue, and the worked scenarios from
//! the inbox design.

use std::collections::BTreeMap;

use ticket_inbox::inbox::visibility::select_visible;
use ticket_inbox::models::ticket::{Ticket, TicketStatus};

use super::test_helpers::{assigned, ids, ticket, AGENT, OTHER_AGENT};

#[test]
fn open_ticket_hides_resolved_sibling() {
    let tickets = vec![
        ticket("T1", "a@x.com", TicketStatus::Open, 20),
        ticket("T2", "a@x.com", TicketStatus::Resolved, 10),
    ];

    let view = select_visible(&tickets, AGENT);

    assert_eq!(ids(&view.active_queue), ["T1"]);
    assert_eq!(ids(&view.history_by_customer["a@x.com"]), ["T2"]);
}

#[test]
fn only_resolved_shows_most_recent_placeholder() {
    let tickets = vec![
        ticket("T4", "b@x.com", TicketStatus::Resolved, 10),
        ticket("T3", "b@x.com", TicketStatus::Resolved, 20),
    ];

    let view = select_visible(&tickets, AGENT);

    assert_eq!(ids(&view.active_queue), ["T3"]);
    assert_eq!(ids(&view.history_by_customer["b@x.com"]), ["T3", "T4"]);
}

#[test]
fn every_qualifying_non_resolved_ticket_is_shown() {
    let tickets = vec![
        ticket("open", "a@x.com", TicketStatus::Open, 10),
        assigned(ticket("mine", "a@x.com", TicketStatus::InProgress, 30), AGENT),
        assigned(ticket("theirs", "a@x.com", TicketStatus::Open, 40), OTHER_AGENT),
        ticket("done", "a@x.com", TicketStatus::Resolved, 50),
    ];

    let view = select_visible(&tickets, AGENT);

    assert_eq!(ids(&view.active_queue), ["mine", "open"]);
    assert_eq!(ids(&view.history_by_customer["a@x.com"]), ["done"]);
}

#[test]
fn tickets_owned_by_others_fall_back_to_resolved_placeholder() {
    let tickets = vec![
        assigned(ticket("theirs", "a@x.com", TicketStatus::Open, 40), OTHER_AGENT),
        ticket("old-done", "a@x.com", TicketStatus::Resolved, 5),
        ticket("done", "a@x.com", TicketStatus::Resolved, 30),
    ];

    let view = select_visible(&tickets, AGENT);

    assert_eq!(ids(&view.active_queue), ["done"]);
}

#[test]
fn customer_without_visible_or_resolved_tickets_is_absent() {
    let tickets = vec![assigned(
        ticket("theirs", "a@x.com", TicketStatus::Open, 40),
        OTHER_AGENT,
    )];

    let view = select_visible(&tickets, AGENT);

    assert!(view.active_queue.is_empty());
    assert!(view.history_by_customer.is_empty());
}

#[test]
fn history_keeps_resolved_tickets_of_other_agents() {
    let tickets = vec![
        ticket("open", "a@x.com", TicketStatus::Open, 50),
        assigned(ticket("theirs-done", "a@x.com", TicketStatus::Resolved, 20), OTHER_AGENT),
        assigned(ticket("mine-done", "a@x.com", TicketStatus::Resolved, 30), AGENT),
    ];

    let view = select_visible(&tickets, AGENT);

    assert_eq!(
        ids(&view.history_by_customer["a@x.com"]),
        ["mine-done", "theirs-done"]
    );
}

#[test]
fn queue_is_sorted_globally_by_recency() {
    let tickets = vec![
        ticket("a-old", "a@x.com", TicketStatus::Open, 10),
        ticket("b-mid", "b@x.com", TicketStatus::Open, 20),
        ticket("a-new", "a@x.com", TicketStatus::Open, 30),
        ticket("c-done", "c@x.com", TicketStatus::Resolved, 25),
    ];

    let view = select_visible(&tickets, AGENT);

    assert_eq!(ids(&view.active_queue), ["a-new", "c-done", "b-mid", "a-old"]);
}

#[test]
fn status_labels_compare_loosely() {
    let tickets = vec![
        ticket("t1", "a@x.com", TicketStatus::parse(" resolved "), 30),
        ticket("t2", "a@x.com", TicketStatus::parse("CLOSED"), 20),
        ticket("t3", "a@x.com", TicketStatus::parse("In  Progress"), 10),
    ];

    let view = select_visible(&tickets, AGENT);

    assert_eq!(ids(&view.active_queue), ["t3"]);
    assert_eq!(ids(&view.history_by_customer["a@x.com"]), ["t1", "t2"]);
}

#[test]
fn empty_collection_yields_empty_view() {
    let view = select_visible(&[], AGENT);

    assert!(view.active_queue.is_empty());
    assert!(view.history_by_customer.is_empty());
}

#[test]
fn input_is_left_untouched() {
    let tickets = vec![
        ticket("old", "a@x.com", TicketStatus::Open, 10),
        ticket("new", "a@x.com", TicketStatus::Open, 20),
    ];
    let before = tickets.clone();

    let _ = select_visible(&tickets, AGENT);

    assert_eq!(tickets, before);
}

/// Mixed pool: several customers, every combination of status and owner.
fn mixed_pool() -> Vec<Ticket> {
    let owners = [None, Some(AGENT), Some(OTHER_AGENT)];
    let statuses = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
    ];
    let mut pool = Vec::new();
    let mut clock = 0;
    for customer in 0..6 {
        let email = format!("c{customer}@x.com");
        for (i, owner) in owners.iter().enumerate() {
            for (j, status) in statuses.iter().enumerate() {
                if (customer + i + j) % 3 == 0 {
                    continue;
                }
                clock += 7;
                let mut t = ticket(&format!("{email}-{i}{j}"), &email, status.clone(), clock % 40);
                t.assigned_user_id = *owner;
                pool.push(t);
            }
        }
    }
    pool
}

#[test]
fn each_customer_has_qualifying_tickets_or_one_placeholder() {
    let pool = mixed_pool();
    let view = select_visible(&pool, AGENT);

    let mut per_customer: BTreeMap<&str, Vec<&Ticket>> = BTreeMap::new();
    for t in &view.active_queue {
        per_customer.entry(t.customer_email()).or_default().push(t);
    }

    for (email, shown) in per_customer {
        let qualifying = pool
            .iter()
            .filter(|t| t.customer_email() == email && !t.is_resolved() && t.is_visible_to(AGENT))
            .count();
        if qualifying > 0 {
            assert_eq!(shown.len(), qualifying, "{email}: all qualifying tickets shown");
            assert!(shown.iter().all(|t| !t.is_resolved() && t.is_visible_to(AGENT)));
        } else {
            assert_eq!(shown.len(), 1, "{email}: exactly one placeholder");
            assert!(shown[0].is_resolved());
        }
    }
}

#[test]
fn history_holds_every_resolved_ticket_once() {
    let pool = mixed_pool();
    let view = select_visible(&pool, AGENT);

    let resolved_in_pool = pool.iter().filter(|t| t.is_resolved()).count();
    let in_history: usize = view.history_by_customer.values().map(Vec::len).sum();
    assert_eq!(in_history, resolved_in_pool);

    for (email, history) in &view.history_by_customer {
        assert!(history.iter().all(|t| t.customer_email() == email && t.is_resolved()));
        assert!(
            history.windows(2).all(|w| w[0].updated_at >= w[1].updated_at),
            "{email}: history is most recent first"
        );
    }
}
