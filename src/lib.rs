#![forbid(unsafe_code)]

//! Per-agent synchronization engine for a shared support-ticket inbox.
//!
//! The [`inbox::InboxEngine`] keeps one agent's view of the ticket pool
//! consistent with the server: it repartitions fetched tickets into an
//! active queue and per-customer history, merges pushed events, executes
//! agent commands after server confirmation and keeps the unread counter in
//! a shared [`session::SessionStore`].

pub mod api;
pub mod config;
pub mod errors;
pub mod feed;
pub mod inbox;
pub mod models;
pub mod session;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
