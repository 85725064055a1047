//! `reqwest`-backed [`TicketApi`] implementation.

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::GlobalConfig;
use crate::models::command::{EmailRequest, NewTicket, TicketUpdate};
use crate::models::ticket::Ticket;
use crate::{AppError, Result};

use super::{ApiFuture, TicketApi};

/// Response body, either bare or wrapped in the server's `{"data": ...}`
/// envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// HTTP client for the ticket REST API.
#[derive(Debug, Clone)]
pub struct HttpTicketApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpTicketApi {
    /// Build a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the HTTP client cannot be constructed.
    pub fn from_config(config: &GlobalConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| AppError::Config(format!("failed to build http client: {err}")))?;
        Ok(Self::with_client(
            client,
            config.api_base_url.clone(),
            config.api_token.clone(),
        ))
    }

    /// Wrap an existing client.
    #[must_use]
    pub fn with_client(client: Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token,
        }
    }

    /// Base URL requests are issued against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Api(format!("{what} failed with {status}: {body}")));
        }
        debug!(%status, what, "ticket api call succeeded");
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let bytes = response.bytes().await?;
        let payload: Payload<T> = serde_json::from_slice(&bytes)?;
        Ok(payload.into_inner())
    }
}

impl TicketApi for HttpTicketApi {
    fn fetch_tickets(&self) -> ApiFuture<'_, Vec<Ticket>> {
        Box::pin(async move {
            let response = self
                .send(self.client.get(self.url("/tickets")), "fetch tickets")
                .await?;
            Self::decode(response).await
        })
    }

    fn update_ticket<'a>(
        &'a self,
        ticket_id: &'a str,
        update: &'a TicketUpdate,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            let request = self
                .client
                .patch(self.url(&format!("/tickets/{ticket_id}")))
                .json(update);
            self.send(request, "update ticket").await?;
            Ok(())
        })
    }

    fn create_ticket<'a>(&'a self, ticket: &'a NewTicket) -> ApiFuture<'a, Ticket> {
        Box::pin(async move {
            let request = self.client.post(self.url("/tickets")).json(ticket);
            let response = self.send(request, "create ticket").await?;
            Self::decode(response).await
        })
    }

    fn mark_read<'a>(&'a self, ticket_id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            let request = self
                .client
                .post(self.url(&format!("/tickets/{ticket_id}/mark-read")));
            self.send(request, "mark read").await?;
            Ok(())
        })
    }

    fn send_email<'a>(
        &'a self,
        ticket_id: &'a str,
        email: &'a EmailRequest,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            let request = self
                .client
                .post(self.url(&format!("/tickets/{ticket_id}/email")))
                .json(email);
            self.send(request, "send email").await?;
            Ok(())
        })
    }
}
