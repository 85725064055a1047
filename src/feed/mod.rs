//! Real-time event feed.
//!
//! The server pushes one JSON object per line:
//! `{"event": "ticket:updated", "data": {...}}`. [`codec`] frames the byte
//! stream into lines and [`reader`] parses them into
//! [`ServerEvent`](crate::models::event::ServerEvent)s for the
//! reconciliation channel.

pub mod codec;
pub mod reader;
