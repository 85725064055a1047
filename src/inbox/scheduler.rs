//! Debounced, cancellable repartition scheduling.
//!
//! A resolution usually arrives as a burst: the local command, the server
//! echo, and trailing message events for the same ticket. Each
//! [`schedule`](RepartitionScheduler::schedule) call cancels the timer still
//! pending from the previous one, so the burst collapses into one pass that
//! runs `delay` after the last event.
//!
//! Passes themselves are numbered. A pass that finishes after a newer one
//! has started must discard its output ([`is_latest_pass`]); this is the
//! only form of cancellation an in-flight pass gets.
//!
//! [`is_latest_pass`]: RepartitionScheduler::is_latest_pass

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};

/// Timer handle plus generation counters for repartition passes.
#[derive(Debug)]
pub struct RepartitionScheduler {
    delay: Duration,
    scheduled: AtomicU64,
    passes: AtomicU64,
    pending: Arc<Mutex<Option<PendingTimer>>>,
}

/// Timer waiting to fire, tagged with its schedule generation.
#[derive(Debug)]
struct PendingTimer {
    generation: u64,
    token: CancellationToken,
}

impl RepartitionScheduler {
    /// Scheduler that waits `delay` before running a pass.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            scheduled: AtomicU64::new(0),
            passes: AtomicU64::new(0),
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Configured debounce delay.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `pass` after the debounce delay, superseding any pass still
    /// waiting on its timer. Returns the schedule generation.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, pass: F) -> u64
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.scheduled.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();

        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(PendingTimer {
                generation,
                token: token.clone(),
            });
        if let Some(previous) = previous {
            previous.token.cancel();
        }

        let delay = self.delay;
        let pending = Arc::clone(&self.pending);
        tokio::spawn(
            async move {
                tokio::select! {
                    () = token.cancelled() => {
                        debug!(generation, "repartition superseded before it ran");
                    }
                    () = tokio::time::sleep(delay) => {
                        debug!(generation, "repartition timer fired");
                        {
                            let mut slot = pending.lock().unwrap_or_else(PoisonError::into_inner);
                            if slot.as_ref().is_some_and(|timer| timer.generation == generation) {
                                *slot = None;
                            }
                        }
                        pass.await;
                    }
                }
            }
            .instrument(info_span!("repartition_timer")),
        );

        generation
    }

    /// Cancel the pending timer, if any.
    pub fn cancel(&self) {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(timer) = pending {
            timer.token.cancel();
        }
    }

    /// Whether a timer is waiting to fire. Cleared once it fires or is
    /// cancelled.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|timer| !timer.token.is_cancelled())
    }

    /// Number of times [`schedule`](Self::schedule) has been called.
    #[must_use]
    pub fn scheduled_count(&self) -> u64 {
        self.scheduled.load(Ordering::SeqCst)
    }

    /// Start a repartition pass and return its generation.
    pub fn begin_pass(&self) -> u64 {
        self.passes.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `pass` is still the most recently started pass.
    #[must_use]
    pub fn is_latest_pass(&self, pass: u64) -> bool {
        self.passes.load(Ordering::SeqCst) == pass
    }
}

impl Drop for RepartitionScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
