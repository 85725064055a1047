//! Unit tests for the status filter and email search.

use ticket_inbox::inbox::filter::{filter_by_status, search_by_email, StatusFilter};
use ticket_inbox::models::ticket::TicketStatus;

use super::test_helpers::{ids, ticket};

fn queue() -> Vec<ticket_inbox::models::ticket::Ticket> {
    vec![
        ticket("t1", "Alice@Example.com", TicketStatus::Open, 40),
        ticket("t2", "bob@example.com", TicketStatus::InProgress, 30),
        ticket("t3", "carol@other.org", TicketStatus::Resolved, 20),
        ticket("t4", "dave@example.com", TicketStatus::parse("Pending"), 10),
    ]
}

#[test]
fn all_keeps_everything() {
    assert_eq!(ids(&filter_by_status(&queue(), StatusFilter::All)), ["t1", "t2", "t3", "t4"]);
}

#[test]
fn filters_by_each_status() {
    let queue = queue();

    assert_eq!(ids(&filter_by_status(&queue, StatusFilter::Open)), ["t1"]);
    assert_eq!(ids(&filter_by_status(&queue, StatusFilter::InProgress)), ["t2"]);
    assert_eq!(ids(&filter_by_status(&queue, StatusFilter::Resolved)), ["t3"]);
}

#[test]
fn filter_keys_round_trip_through_display() {
    for filter in [
        StatusFilter::All,
        StatusFilter::Open,
        StatusFilter::InProgress,
        StatusFilter::Resolved,
    ] {
        assert_eq!(filter.to_string().parse::<StatusFilter>().ok(), Some(filter));
    }
}

#[test]
fn unknown_filter_key_is_rejected() {
    let err = "archived".parse::<StatusFilter>().expect_err("unknown key");
    assert!(err.to_string().contains("archived"));
}

#[test]
fn search_is_case_insensitive_substring() {
    let queue = queue();

    assert_eq!(ids(&search_by_email(&queue, "ALICE")), ["t1"]);
    assert_eq!(ids(&search_by_email(&queue, "example.com")), ["t1", "t2", "t4"]);
    assert!(search_by_email(&queue, "zed").is_empty());
}

#[test]
fn blank_search_returns_everything() {
    assert_eq!(search_by_email(&queue(), "  ").len(), 4);
}
