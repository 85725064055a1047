//! Agent-initiated mutations and their request payloads.

use serde::{Deserialize, Serialize};

use super::ticket::{AgentId, Priority, Role, TicketStatus};

/// Mutable ticket field addressed by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TicketField {
    /// Lifecycle status.
    Status,
    /// Urgency.
    Priority,
    /// Exclusive owner.
    AssigneeId,
}

impl TicketField {
    /// Name the command surface uses for the field.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Priority => "priority",
            Self::AssigneeId => "assignee_id",
        }
    }

    /// Field the change lands on in the local ticket model.
    #[must_use]
    pub fn model_field(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Priority => "priority",
            Self::AssigneeId => "assigned_user_id",
        }
    }
}

/// A single-field ticket mutation.
///
/// Serializes to the `PATCH /tickets/{id}` body, e.g. `{"status":"Resolved"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TicketUpdate {
    /// Change the lifecycle status.
    #[serde(rename = "status")]
    Status(TicketStatus),
    /// Change the urgency.
    #[serde(rename = "priority")]
    Priority(Priority),
    /// Hand the ticket to an agent.
    #[serde(rename = "assigned_user_id")]
    Assignee(AgentId),
}

impl TicketUpdate {
    /// Field this update touches.
    #[must_use]
    pub fn field(&self) -> TicketField {
        match self {
            Self::Status(_) => TicketField::Status,
            Self::Priority(_) => TicketField::Priority,
            Self::Assignee(_) => TicketField::AssigneeId,
        }
    }

    /// Whether this update resolves the ticket.
    #[must_use]
    pub fn resolves(&self) -> bool {
        matches!(self, Self::Status(status) if status.is_resolved())
    }
}

/// First message of a ticket opened on a customer's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConversation {
    /// Always the customer for a new ticket.
    pub role: Role,
    /// Message body.
    pub text: String,
}

/// `POST /tickets` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTicket {
    /// Chatbot the ticket is routed through.
    pub chatbot_id: Option<String>,
    /// Owning organization.
    pub organization_id: Option<i64>,
    /// Customer the ticket is for.
    pub customer_email: String,
    /// Subject line.
    pub subject: String,
    /// Opening message(s).
    pub conversations: Vec<NewConversation>,
    /// Initial status.
    pub status: TicketStatus,
    /// Initial priority.
    pub priority: Priority,
    /// Initial owner.
    pub assigned_user_id: Option<AgentId>,
    /// Display-only key/value data (customer name, reference number, ...).
    #[serde(default)]
    pub custom_data: serde_json::Map<String, serde_json::Value>,
}

impl NewTicket {
    /// Ticket for `customer_email` opened with a single customer message,
    /// `Open` and `Medium` unless changed.
    #[must_use]
    pub fn new(
        customer_email: impl Into<String>,
        subject: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            chatbot_id: None,
            organization_id: None,
            customer_email: customer_email.into(),
            subject: subject.into(),
            conversations: vec![NewConversation {
                role: Role::Customer,
                text: text.into(),
            }],
            status: TicketStatus::Open,
            priority: Priority::Medium,
            assigned_user_id: None,
            custom_data: serde_json::Map::new(),
        }
    }
}

/// Outbound agent reply as composed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Delivery provider (e.g. `gmail`, `smtp`).
    pub provider: String,
    /// HTML body.
    pub message: String,
    /// Already-uploaded attachment reference.
    pub attachment: Option<String>,
}

impl OutboundMessage {
    /// Plain reply without attachment.
    #[must_use]
    pub fn new(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            message: message.into(),
            attachment: None,
        }
    }
}

/// `POST /tickets/{id}/email` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRequest {
    /// Delivery provider.
    pub provider: String,
    /// HTML body.
    pub message: String,
    /// Subject of the ticket being replied to.
    pub subject: String,
    /// Attachment reference, if any.
    pub attachment: Option<String>,
}
