//! Per-agent inbox synchronization engine.
//!
//! [`InboxEngine`] owns the agent's local view of the shared ticket pool.
//! It is fed by three sources:
//!
//! * full fetches from the [`TicketApi`] ([`bootstrap`](InboxEngine::bootstrap),
//!   [`refresh`](InboxEngine::refresh)), which repartition the collection
//!   through the pure functions in [`partition`] and [`visibility`];
//! * server-pushed [`ServerEvent`](crate::models::event::ServerEvent)s
//!   merged by the reconciliation loop in [`reconcile`];
//! * agent commands in [`commands`], applied only after the server confirms.
//!
//! All local state sits behind one async mutex. The lock is never held
//! across a server call.

pub mod commands;
pub mod filter;
pub mod history;
pub mod partition;
pub mod reconcile;
pub mod scheduler;
pub mod state;
pub mod unread;
pub mod visibility;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::api::TicketApi;
use crate::config::GlobalConfig;
use crate::models::ticket::{AgentId, Ticket};
use crate::session::SessionStore;
use crate::{AppError, Result};

use self::filter::StatusFilter;
use self::scheduler::RepartitionScheduler;
use self::state::InboxState;
use self::visibility::{HistoryByCustomer, InboxView};

/// Organization-level defaults stamped onto tickets created by this agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationDefaults {
    /// Chatbot new tickets are routed through.
    pub chatbot_id: Option<String>,
    /// Organization new tickets belong to.
    pub organization_id: Option<i64>,
}

/// Local, eventually consistent inbox for one agent session.
pub struct InboxEngine {
    agent_id: AgentId,
    api: Arc<dyn TicketApi>,
    session: SessionStore,
    state: Mutex<InboxState>,
    scheduler: RepartitionScheduler,
    defaults: CreationDefaults,
}

impl std::fmt::Debug for InboxEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboxEngine")
            .field("agent_id", &self.agent_id)
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl InboxEngine {
    /// Engine for `agent_id` writing its unread counter into `session`.
    #[must_use]
    pub fn new(
        api: Arc<dyn TicketApi>,
        session: SessionStore,
        agent_id: AgentId,
        repartition_delay: Duration,
    ) -> Arc<Self> {
        Self::with_defaults(
            api,
            session,
            agent_id,
            repartition_delay,
            CreationDefaults::default(),
        )
    }

    /// Engine configured from [`GlobalConfig`].
    #[must_use]
    pub fn from_config(
        api: Arc<dyn TicketApi>,
        session: SessionStore,
        config: &GlobalConfig,
    ) -> Arc<Self> {
        Self::with_defaults(
            api,
            session,
            config.agent_id,
            config.repartition_delay(),
            CreationDefaults {
                chatbot_id: config.chatbot_id.clone(),
                organization_id: config.organization_id,
            },
        )
    }

    /// Engine with explicit ticket-creation defaults.
    #[must_use]
    pub fn with_defaults(
        api: Arc<dyn TicketApi>,
        session: SessionStore,
        agent_id: AgentId,
        repartition_delay: Duration,
        defaults: CreationDefaults,
    ) -> Arc<Self> {
        Arc::new(Self {
            agent_id,
            api,
            state: Mutex::new(InboxState::new(session.clone())),
            session,
            scheduler: RepartitionScheduler::new(repartition_delay),
            defaults,
        })
    }

    /// Agent this engine acts for.
    #[must_use]
    pub fn agent_id(&self) -> AgentId {
        self.agent_id
    }

    /// Session store holding the unread counter.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Repartition scheduler, exposed for inspection.
    #[must_use]
    pub fn scheduler(&self) -> &RepartitionScheduler {
        &self.scheduler
    }

    /// Current unread counter.
    #[must_use]
    pub fn unread_count(&self) -> u32 {
        self.session.new_ticket_count()
    }

    /// Fetch the full ticket set, repartition, seed the unread counter and
    /// open the deep-linked ticket (or the first one) in writable mode.
    ///
    /// Returns the ticket that ended up selected, if any.
    ///
    /// # Errors
    ///
    /// Returns the API error if the initial fetch fails; local state is left
    /// empty in that case.
    pub async fn bootstrap(&self, deep_link: Option<&str>) -> Result<Option<Ticket>> {
        let agent_id = self.agent_id;
        async move {
            let tickets = self.api.fetch_tickets().await.inspect_err(|err| {
                warn!(%err, "initial ticket fetch failed");
            })?;
            let view = visibility::select_visible(&tickets, agent_id);

            let target = {
                let mut state = self.state.lock().await;
                let unread = state.unread.seed(&view.active_queue);
                info!(
                    fetched = tickets.len(),
                    queued = view.active_queue.len(),
                    unread,
                    "inbox bootstrapped"
                );
                state.apply_view(view);

                deep_link
                    .filter(|id| state.find(id).is_some())
                    .map(str::to_owned)
                    .or_else(|| {
                        if let Some(id) = deep_link {
                            debug!(ticket_id = id, "deep-linked ticket not found locally");
                        }
                        state
                            .view
                            .active_queue
                            .first()
                            .map(|ticket| ticket.ticket_id.clone())
                    })
            };

            match target {
                Some(ticket_id) => self.select_ticket(&ticket_id, false).await.map(Some),
                None => Ok(None),
            }
        }
        .instrument(info_span!("bootstrap", agent_id))
        .await
    }

    /// Refetch the full ticket set and repartition.
    ///
    /// A pass overtaken by a newer pass before its fetch returns discards its
    /// result. The output fully replaces the previous queue and history, even
    /// when the fetch returns no tickets.
    ///
    /// # Errors
    ///
    /// Returns the API error if the fetch fails; local state is unchanged.
    pub async fn refresh(&self) -> Result<()> {
        let pass = self.scheduler.begin_pass();
        let tickets = self.api.fetch_tickets().await.inspect_err(|err| {
            warn!(%err, pass, "repartition fetch failed");
        })?;

        if !self.scheduler.is_latest_pass(pass) {
            debug!(pass, "repartition superseded, discarding result");
            return Ok(());
        }

        let view = visibility::select_visible(&tickets, self.agent_id);
        let mut state = self.state.lock().await;
        debug!(
            pass,
            queued = view.active_queue.len(),
            customers_with_history = view.history_by_customer.len(),
            "repartition applied"
        );
        state.apply_view(view);
        Ok(())
    }

    /// Schedule a debounced [`refresh`](Self::refresh), superseding any
    /// pending one. Returns the schedule generation.
    ///
    /// The scheduled task only holds a weak reference, so dropping the
    /// engine abandons it.
    pub fn schedule_repartition(self: &Arc<Self>) -> u64 {
        let weak = Arc::downgrade(self);
        self.scheduler.schedule(async move {
            let Some(engine) = weak.upgrade() else {
                return;
            };
            if let Err(err) = engine.refresh().await {
                warn!(%err, "scheduled repartition failed");
            }
        })
    }

    /// Open a ticket from the queue or, with `read_only`, from history.
    ///
    /// Opening an unread ticket in writable mode marks it read. A failure of
    /// that call is logged and leaves the ticket unread; the selection
    /// itself still succeeds.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the ticket is not known locally.
    pub async fn select_ticket(&self, ticket_id: &str, read_only: bool) -> Result<Ticket> {
        let selected = {
            let mut state = self.state.lock().await;
            state
                .select(ticket_id, read_only)
                .ok_or_else(|| AppError::NotFound(format!("ticket {ticket_id} not found")))?
        };
        debug!(ticket_id, read_only, "ticket selected");

        if selected.is_new && !read_only {
            if let Err(err) = self.mark_read(ticket_id).await {
                warn!(%err, ticket_id, "failed to mark selected ticket read");
            }
        }

        let state = self.state.lock().await;
        Ok(state.selected.clone().unwrap_or(selected))
    }

    /// Mark a ticket read on the server, then flip `is_new` locally and
    /// decrement the unread counter.
    ///
    /// Each ticket's read transition is counted at most once: calls for a
    /// ticket that is already read, already counted, or claimed by a
    /// concurrent call return `Ok(false)` without contacting the server.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for unknown tickets, or the API error;
    /// on API failure nothing changes locally.
    pub async fn mark_read(&self, ticket_id: &str) -> Result<bool> {
        {
            let mut state = self.state.lock().await;
            let ticket = state
                .find(ticket_id)
                .cloned()
                .ok_or_else(|| AppError::NotFound(format!("ticket {ticket_id} not found")))?;
            if !state.unread.try_claim(&ticket) {
                debug!(ticket_id, "mark read skipped");
                return Ok(false);
            }
        }

        if let Err(err) = self.api.mark_read(ticket_id).await {
            warn!(%err, ticket_id, "mark read failed");
            self.state.lock().await.unread.release(ticket_id);
            return Err(err);
        }

        let mut state = self.state.lock().await;
        state.flip_read(ticket_id);
        let moved = state.unread.acknowledge(ticket_id);
        info!(ticket_id, unread = state.unread.count(), "ticket marked read");
        Ok(moved)
    }

    /// Snapshot of the active queue.
    pub async fn active_queue(&self) -> Vec<Ticket> {
        self.state.lock().await.view.active_queue.clone()
    }

    /// Snapshot of the per-customer history map.
    pub async fn history_by_customer(&self) -> HistoryByCustomer {
        self.state.lock().await.view.history_by_customer.clone()
    }

    /// Snapshot of queue and history together.
    pub async fn view(&self) -> InboxView {
        self.state.lock().await.view.clone()
    }

    /// Currently open ticket.
    pub async fn selected(&self) -> Option<Ticket> {
        self.state.lock().await.selected.clone()
    }

    /// Whether the open ticket was opened from history.
    pub async fn is_read_only(&self) -> bool {
        self.state.lock().await.read_only
    }

    /// Local copy of a ticket from the open ticket, the queue or history.
    pub async fn ticket(&self, ticket_id: &str) -> Option<Ticket> {
        self.state.lock().await.find(ticket_id).cloned()
    }

    /// Resolved history of `customer_email`, most recent first.
    pub async fn open_history(&self, customer_email: &str) -> Vec<Ticket> {
        let state = self.state.lock().await;
        history::open_history(&state.view.history_by_customer, customer_email)
    }

    /// Resolved history of the open ticket's customer.
    pub async fn open_selected_history(&self) -> Vec<Ticket> {
        let state = self.state.lock().await;
        state.selected.as_ref().map_or_else(Vec::new, |ticket| {
            history::open_history(&state.view.history_by_customer, ticket.customer_email())
        })
    }

    /// Number of resolved tickets of the open ticket's customer.
    pub async fn selected_history_count(&self) -> usize {
        let state = self.state.lock().await;
        state.selected.as_ref().map_or(0, |ticket| {
            history::resolved_count(&state.view.history_by_customer, ticket.customer_email())
        })
    }

    /// Active queue entries whose customer email contains `query`.
    pub async fn search(&self, query: &str) -> Vec<Ticket> {
        let state = self.state.lock().await;
        filter::search_by_email(&state.view.active_queue, query)
    }

    /// Active queue entries passing `status`.
    pub async fn filter_by_status(&self, status: StatusFilter) -> Vec<Ticket> {
        let state = self.state.lock().await;
        filter::filter_by_status(&state.view.active_queue, status)
    }
}
