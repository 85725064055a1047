//! List filters applied on top of the active queue.

use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;
use crate::models::ticket::{Ticket, TicketStatus};

/// Status filter offered by the inbox list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// No filtering.
    #[default]
    All,
    /// `Open` tickets only.
    Open,
    /// `In Progress` tickets only.
    InProgress,
    /// `Resolved` tickets only.
    Resolved,
}

impl StatusFilter {
    /// Canonical key (`all`, `open`, `in_progress`, `resolved`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
        }
    }

    /// Whether `ticket` passes the filter.
    #[must_use]
    pub fn matches(self, ticket: &Ticket) -> bool {
        match self {
            Self::All => true,
            Self::Open => ticket.status == TicketStatus::Open,
            Self::InProgress => ticket.status == TicketStatus::InProgress,
            Self::Resolved => ticket.is_resolved(),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(' ', "_");
        match key.as_str() {
            "all" | "" => Ok(Self::All),
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            other => Err(AppError::Config(format!("unknown status filter: {other}"))),
        }
    }
}

/// Tickets from `tickets` passing `filter`, order preserved.
#[must_use]
pub fn filter_by_status(tickets: &[Ticket], filter: StatusFilter) -> Vec<Ticket> {
    tickets
        .iter()
        .filter(|ticket| filter.matches(ticket))
        .cloned()
        .collect()
}

/// Tickets whose customer email contains `query`, case-insensitively.
///
/// An empty or blank query returns every ticket.
#[must_use]
pub fn search_by_email(tickets: &[Ticket], query: &str) -> Vec<Ticket> {
    let needle = query.trim().to_lowercase();
    tickets
        .iter()
        .filter(|ticket| {
            needle.is_empty() || ticket.customer_email().to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}
