//! Agent-initiated mutations.
//!
//! Every command calls the server first and touches local state only after
//! it succeeds. A failed call is logged and returned; nothing is rolled back
//! because nothing was applied.

use std::sync::Arc;

use tracing::{info, info_span, warn, Instrument};

use crate::models::command::{EmailRequest, NewTicket, OutboundMessage, TicketUpdate};
use crate::models::ticket::{ConversationEntry, Ticket};
use crate::{AppError, Result};

use super::InboxEngine;

impl InboxEngine {
    /// Change the status, priority or assignee of a ticket.
    ///
    /// After server confirmation:
    /// * reassigning away from this agent drops the ticket from the queue
    ///   and opens the first remaining ticket (marking it read if unread);
    /// * resolving counts the ticket's read transition if it was still
    ///   unread and schedules a repartition.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ReadOnly` while a history ticket is open, or the
    /// API error.
    pub async fn handle_ticket_update(
        self: &Arc<Self>,
        ticket_id: &str,
        update: TicketUpdate,
    ) -> Result<()> {
        let field = update.field().name();
        async move {
            self.ensure_writable(ticket_id).await?;

            self.api
                .update_ticket(ticket_id, &update)
                .await
                .inspect_err(|err| warn!(%err, "ticket update rejected"))?;

            let (next, settled) = {
                let mut state = self.state.lock().await;
                let next = state.apply_local_update(ticket_id, &update, self.agent_id);
                let settled = update.resolves() && state.settle_unread_on_resolve(ticket_id);
                (next, settled)
            };
            info!(settled, unread = self.unread_count(), "ticket update applied");

            if let Some(next) = next {
                if let Err(err) = self.mark_read(&next).await {
                    warn!(%err, ticket_id = %next, "failed to mark auto-selected ticket read");
                }
            }

            if update.resolves() {
                self.schedule_repartition();
            }
            Ok(())
        }
        .instrument(info_span!("handle_ticket_update", ticket_id, field))
        .await
    }

    /// Send an agent reply, then append it to the local conversation.
    ///
    /// The first reply on an unassigned ticket claims it for this agent.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ReadOnly` while a history ticket is open,
    /// `AppError::NotFound` for unknown tickets, or the API error of either
    /// the send or the follow-up claim.
    pub async fn handle_submit(
        self: &Arc<Self>,
        ticket_id: &str,
        message: OutboundMessage,
    ) -> Result<()> {
        async move {
            self.ensure_writable(ticket_id).await?;
            let subject = self
                .state
                .lock()
                .await
                .find(ticket_id)
                .map(|ticket| ticket.subject.clone())
                .ok_or_else(|| AppError::NotFound(format!("ticket {ticket_id} not found")))?;

            let request = EmailRequest {
                provider: message.provider,
                message: message.message,
                subject,
                attachment: message.attachment,
            };
            self.api
                .send_email(ticket_id, &request)
                .await
                .inspect_err(|err| warn!(%err, "reply not sent"))?;

            let unassigned = {
                let mut state = self.state.lock().await;
                state.append_message(ticket_id, &ConversationEntry::support_reply(request.message));
                state
                    .find(ticket_id)
                    .is_some_and(|ticket| ticket.assigned_user_id.is_none())
            };
            info!(unassigned, "reply sent");

            if unassigned {
                self.handle_ticket_update(ticket_id, TicketUpdate::Assignee(self.agent_id))
                    .await?;
            }
            Ok(())
        }
        .instrument(info_span!("handle_submit", ticket_id))
        .await
    }

    /// Create a ticket on a customer's behalf.
    ///
    /// Missing chatbot and organization ids are filled from configuration.
    /// The returned ticket goes to the head of the queue when this agent may
    /// see it, replacing the customer's resolved placeholder if one was
    /// shown.
    ///
    /// # Errors
    ///
    /// Returns the API error; nothing is inserted locally in that case.
    pub async fn create_ticket(&self, mut ticket: NewTicket) -> Result<Ticket> {
        if ticket.chatbot_id.is_none() {
            ticket.chatbot_id.clone_from(&self.defaults.chatbot_id);
        }
        if ticket.organization_id.is_none() {
            ticket.organization_id = self.defaults.organization_id;
        }

        let created = self
            .api
            .create_ticket(&ticket)
            .await
            .inspect_err(|err| warn!(%err, customer = %ticket.customer_email, "ticket creation failed"))?;

        let queued = !created.is_resolved()
            && created.is_visible_to(self.agent_id)
            && self.state.lock().await.insert_created(&created);
        info!(ticket_id = %created.ticket_id, queued, "ticket created locally");
        Ok(created)
    }

    async fn ensure_writable(&self, ticket_id: &str) -> Result<()> {
        if self.state.lock().await.read_only {
            warn!(ticket_id, "command rejected in read-only mode");
            return Err(AppError::ReadOnly(format!(
                "ticket {ticket_id} cannot be changed while viewing history"
            )));
        }
        Ok(())
    }
}
