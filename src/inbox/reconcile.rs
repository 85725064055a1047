//! Server event reconciliation.
//!
//! Pushed events are applied last-write-wins with no ordering or duplicate
//! checks. `ticket:created` only moves the unread counter and schedules a
//! refresh; the refresh carries the actual insertion.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::models::event::ServerEvent;

use super::InboxEngine;

impl InboxEngine {
    /// Merge one server event into local state.
    pub async fn apply_event(self: &Arc<Self>, event: ServerEvent) {
        match event {
            ServerEvent::TicketCreated { ticket } => {
                let counted = self.state.lock().await.unread.record_created(&ticket);
                info!(
                    ticket_id = %ticket.ticket_id,
                    counted,
                    unread = self.unread_count(),
                    "ticket created"
                );
                self.schedule_repartition();
            }
            ServerEvent::TicketUpdated {
                ticket_id,
                new_message,
                updated_ticket,
            } => {
                let has_message = new_message.is_some();
                self.state
                    .lock()
                    .await
                    .apply_server_update(&ticket_id, &updated_ticket, new_message);
                debug!(
                    ticket_id,
                    has_message,
                    status = %updated_ticket.status,
                    "ticket updated"
                );
                if updated_ticket.is_resolved() {
                    self.schedule_repartition();
                }
            }
        }
    }
}

/// Spawn the single consumer that applies events from `rx` in order.
///
/// The task runs until the `CancellationToken` fires or every sender is
/// dropped. Returns a `JoinHandle` so the caller can await clean shutdown.
#[must_use]
pub fn spawn_event_consumer(
    engine: Arc<InboxEngine>,
    mut rx: mpsc::Receiver<ServerEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let agent_id = engine.agent_id();
    tokio::spawn(
        async move {
            loop {
                let event = tokio::select! {
                    () = cancel.cancelled() => {
                        info!("event consumer shutting down");
                        break;
                    }
                    maybe_event = rx.recv() => {
                        if let Some(event) = maybe_event { event } else {
                            info!("event channel closed");
                            break;
                        }
                    }
                };

                debug!(event = event.name(), ticket_id = event.ticket_id(), "event received");
                engine.apply_event(event).await;
            }
        }
        .instrument(info_span!("event_consumer", agent_id)),
    )
}
