//! Ticket model as pushed by the ticket server.
//!
//! Labels (status, priority, role) are compared case- and
//! whitespace-insensitively. Unknown labels survive a round trip verbatim so
//! a server-side vocabulary change never drops data; they are treated as
//! non-resolved.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server identifier of a human support agent.
pub type AgentId = i64;

/// Normalize a label for comparison: trimmed, lowercase, inner runs of
/// whitespace collapsed to one space.
fn normalize(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Ticket lifecycle status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TicketStatus {
    /// Waiting for an agent.
    #[default]
    Open,
    /// An agent is working on it.
    InProgress,
    /// Closed conversation; moves to customer history.
    Resolved,
    /// Label not known to this engine, kept verbatim.
    Other(String),
}

impl TicketStatus {
    /// Parse a status label case- and whitespace-insensitively.
    ///
    /// `closed` is accepted as a synonym of `Resolved`.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match normalize(label).as_str() {
            "open" => Self::Open,
            "in progress" | "in_progress" => Self::InProgress,
            "resolved" | "closed" => Self::Resolved,
            _ => Self::Other(label.to_owned()),
        }
    }

    /// Whether this status removes the ticket from the active work set.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved)
    }

    /// Display label as used on the wire.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for TicketStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<TicketStatus> for String {
    fn from(status: TicketStatus) -> Self {
        status.label().to_owned()
    }
}

impl Display for TicketStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Ticket priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    /// Low urgency.
    Low,
    /// Default urgency.
    #[default]
    Medium,
    /// High urgency.
    High,
    /// Needs immediate attention.
    Critical,
    /// Label not known to this engine, kept verbatim.
    Other(String),
}

impl Priority {
    /// Parse a priority label case- and whitespace-insensitively.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match normalize(label).as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Other(label.to_owned()),
        }
    }

    /// Display label as used on the wire.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for Priority {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<Priority> for String {
    fn from(priority: Priority) -> Self {
        priority.label().to_owned()
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Author role of a conversation entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Inbound customer message.
    #[default]
    Customer,
    /// Outbound agent reply.
    Support,
    /// Internal note, never sent to the customer.
    Note,
    /// Role not known to this engine, kept verbatim.
    Other(String),
}

impl Role {
    /// Wire label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Customer => "customer",
            Self::Support => "support",
            Self::Note => "note",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match normalize(&raw).as_str() {
            "customer" => Self::Customer,
            "support" => Self::Support,
            "note" => Self::Note,
            _ => Self::Other(raw),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.label().to_owned()
    }
}

/// File attached to a conversation entry. Display-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Download location.
    #[serde(default)]
    pub url: String,
    /// Original file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// MIME type reported by the uploader.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// One message in a ticket's conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    /// Who wrote it.
    #[serde(default)]
    pub role: Role,
    /// HTML body.
    #[serde(default)]
    pub text: String,
    /// Files attached to the message.
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
    /// When the message was written.
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
}

impl ConversationEntry {
    /// Build an outbound agent reply stamped with the current time.
    #[must_use]
    pub fn support_reply(text: impl Into<String>) -> Self {
        Self {
            role: Role::Support,
            text: text.into(),
            attachments: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

/// Customer a ticket belongs to; `email` is the grouping key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer email address.
    #[serde(default)]
    pub email: String,
}

/// A customer support ticket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    /// Numeric row identifier.
    #[serde(default)]
    pub id: i64,
    /// Stable server-assigned identifier.
    pub ticket_id: String,
    /// Owning customer.
    #[serde(default)]
    pub customer: Customer,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Lifecycle status.
    #[serde(default)]
    pub status: TicketStatus,
    /// Urgency.
    #[serde(default)]
    pub priority: Priority,
    /// Exclusive owner, if any.
    #[serde(default)]
    pub assigned_user_id: Option<AgentId>,
    /// Unread until the first agent views it.
    #[serde(default)]
    pub is_new: bool,
    /// Append-only message history.
    #[serde(default, deserialize_with = "null_as_default")]
    pub conversations: Vec<ConversationEntry>,
    /// Free-form labels.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Creation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Bumped by every mutation or new message.
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    /// Display-only key/value data.
    #[serde(default, deserialize_with = "null_as_default")]
    pub custom_data: serde_json::Map<String, serde_json::Value>,
}

impl Ticket {
    /// Grouping key.
    #[must_use]
    pub fn customer_email(&self) -> &str {
        &self.customer.email
    }

    /// Whether the status is `Resolved`.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status.is_resolved()
    }

    /// Whether `agent_id` may see this ticket in its work queue: unassigned
    /// or assigned to that agent.
    #[must_use]
    pub fn is_visible_to(&self, agent_id: AgentId) -> bool {
        match self.assigned_user_id {
            None => true,
            Some(owner) => owner == agent_id,
        }
    }

    /// `updated_at` as epoch milliseconds, the sort key for recency.
    #[must_use]
    pub fn recency(&self) -> i64 {
        self.updated_at.timestamp_millis()
    }
}

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
