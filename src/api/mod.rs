//! Ticket REST API abstraction.
//!
//! The [`TicketApi`] trait decouples the inbox engine from the transport.
//! [`http::HttpTicketApi`] talks to the real server; tests substitute an
//! in-memory fake.

pub mod http;

use std::future::Future;
use std::pin::Pin;

use crate::models::command::{EmailRequest, NewTicket, TicketUpdate};
use crate::models::ticket::Ticket;
use crate::Result;

/// Boxed future returned by every [`TicketApi`] call.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Server-side ticket operations the engine depends on.
///
/// Every call is a single request with no retry; the server is
/// authoritative and the engine applies changes only after success.
pub trait TicketApi: Send + Sync {
    /// Fetch every ticket visible to the organization.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Api`](crate::AppError::Api) on transport failure
    /// or a non-success status, [`AppError::Decode`](crate::AppError::Decode)
    /// if the body is not a ticket list.
    fn fetch_tickets(&self) -> ApiFuture<'_, Vec<Ticket>>;

    /// Change one field of a ticket.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Api`](crate::AppError::Api) if the server rejects
    /// the change or cannot be reached.
    fn update_ticket<'a>(&'a self, ticket_id: &'a str, update: &'a TicketUpdate)
        -> ApiFuture<'a, ()>;

    /// Create a ticket and return the server's copy.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Api`](crate::AppError::Api) or
    /// [`AppError::Decode`](crate::AppError::Decode).
    fn create_ticket<'a>(&'a self, ticket: &'a NewTicket) -> ApiFuture<'a, Ticket>;

    /// Record that the ticket has been read.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Api`](crate::AppError::Api) on failure.
    fn mark_read<'a>(&'a self, ticket_id: &'a str) -> ApiFuture<'a, ()>;

    /// Deliver an agent reply to the customer.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Api`](crate::AppError::Api) on failure.
    fn send_email<'a>(&'a self, ticket_id: &'a str, email: &'a EmailRequest)
        -> ApiFuture<'a, ()>;
}
