//! Event feed reader task.
//!
//! Reads NDJSON lines from any async byte stream, parses each into a
//! [`ServerEvent`], and forwards the events through a tokio [`mpsc`]
//! channel to the reconciliation loop.
//!
//! | Event            | Maps to                          |
//! |------------------|----------------------------------|
//! | `ticket:created` | [`ServerEvent::TicketCreated`]   |
//! | `ticket:updated` | [`ServerEvent::TicketUpdated`]   |
//! | *(any other)*    | Skipped; logged at `DEBUG`       |

use futures_util::StreamExt;
use serde::Deserialize;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::models::event::ServerEvent;
use crate::{AppError, Result};

use super::codec::EventCodec;

/// Only the event name is inspected before dispatch.
#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
}

/// Counters reported when the reader stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    /// Events forwarded to the channel.
    pub forwarded: u64,
    /// Lines dropped as malformed or oversized.
    pub rejected: u64,
    /// Blank lines and unknown events.
    pub skipped: u64,
}

/// Parse one feed line.
///
/// Returns `Ok(None)` for blank lines and unknown event names.
///
/// # Errors
///
/// Returns [`AppError::Feed`] when the line is not JSON, has no `event`
/// name, or a known event's payload is structurally invalid (for example a
/// ticket without `ticket_id`). Missing optional ticket fields are not
/// errors.
pub fn parse_event_line(line: &str) -> Result<Option<ServerEvent>> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let envelope: Envelope =
        serde_json::from_str(line).map_err(|err| AppError::Feed(format!("malformed json: {err}")))?;

    match envelope.event.as_str() {
        "ticket:created" | "ticket:updated" => serde_json::from_str(line)
            .map(Some)
            .map_err(|err| AppError::Feed(format!("invalid {} payload: {err}", envelope.event))),
        other => {
            debug!(event = other, "skipping unknown event");
            Ok(None)
        }
    }
}

/// Read events from `source` until EOF, cancellation, or the receiving side
/// closing.
///
/// Malformed lines are logged and skipped. An I/O error on the
/// stream stops the reader.
///
/// # Errors
///
/// Returns [`AppError::Io`] if the underlying stream fails.
pub async fn run_feed_reader<R>(
    source: R,
    codec: EventCodec,
    event_tx: mpsc::Sender<ServerEvent>,
    cancel: CancellationToken,
) -> Result<FeedStats>
where
    R: AsyncRead + Unpin + Send,
{
    let mut framed = FramedRead::new(source, codec);
    let mut stats = FeedStats::default();

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("feed reader cancelled");
                break;
            }

            item = framed.next() => {
                match item {
                    None => {
                        info!(forwarded = stats.forwarded, rejected = stats.rejected, "event feed closed");
                        break;
                    }
                    Some(Err(AppError::Feed(msg))) => {
                        stats.rejected += 1;
                        warn!(error = msg.as_str(), "feed framing error, skipping line");
                    }
                    Some(Err(err)) => {
                        warn!(%err, "feed stream failed, stopping");
                        return Err(err);
                    }
                    Some(Ok(line)) => match parse_event_line(&line) {
                        Ok(Some(event)) => {
                            if event_tx.send(event).await.is_err() {
                                debug!("event channel closed, stopping feed reader");
                                break;
                            }
                            stats.forwarded += 1;
                        }
                        Ok(None) => stats.skipped += 1,
                        Err(err) => {
                            stats.rejected += 1;
                            warn!(%err, raw_line = %line, "unparseable event, skipping line");
                        }
                    },
                }
            }
        }
    }

    Ok(stats)
}
