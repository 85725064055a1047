//! Integration tests for the HTTP ticket client.
//!
//! Runs [`HttpTicketApi`] against a stub ticket server bound to an ephemeral
//! port and checks routes, request bodies, bearer authentication, envelope
//! decoding and error mapping.

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use ticket_inbox::api::http::HttpTicketApi;
use ticket_inbox::api::TicketApi;
use ticket_inbox::inbox::InboxEngine;
use ticket_inbox::models::command::{EmailRequest, NewTicket, TicketUpdate};
use ticket_inbox::models::ticket::TicketStatus;
use ticket_inbox::session::SessionStore;
use ticket_inbox::AppError;

use super::test_helpers::{AGENT, DELAY};

/// Request as seen by the stub server.
#[derive(Debug, Clone, PartialEq)]
struct Recorded {
    method: Method,
    path: String,
    authorization: Option<String>,
    body: Option<Value>,
}

#[derive(Clone)]
struct Stub {
    listing: &'static str,
    log: Arc<Mutex<Vec<Recorded>>>,
}

impl Stub {
    fn record(&self, method: Method, uri: &Uri, headers: &HeaderMap, body: &Bytes) {
        self.log.lock().unwrap().push(Recorded {
            method,
            path: uri.path().to_owned(),
            authorization: headers
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
            body: serde_json::from_slice(body).ok(),
        });
    }
}

const LISTING: &str = r#"{"data":[
    {"ticket_id":"T1","customer":{"email":"a@x.com"},"status":"Open","is_new":true,
     "updated_at":"2024-01-01T00:00:30Z","conversations":null},
    {"ticket_id":"T2","customer":{"email":"a@x.com"},"status":"resolved",
     "updated_at":"2024-01-01T00:00:20Z"},
    {"ticket_id":"T3","customer":{"email":"b@x.com"},"status":"Open",
     "assigned_user_id":9,"updated_at":"2024-01-01T00:00:40Z"}
]}"#;

async fn list(
    State(stub): State<Stub>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    stub.record(method, &uri, &headers, &body);
    ([(header::CONTENT_TYPE, "application/json")], stub.listing)
}

async fn create(
    State(stub): State<Stub>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    stub.record(method, &uri, &headers, &body);
    let sent: Value = serde_json::from_slice(&body).unwrap_or_default();
    axum::Json(json!({
        "ticket_id": "created-1",
        "customer": { "email": sent["customer_email"] },
        "subject": sent["subject"],
        "status": sent["status"],
        "is_new": true,
        "updated_at": "2024-01-01T00:01:00Z",
    }))
}

async fn accept(
    State(stub): State<Stub>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    stub.record(method, &uri, &headers, &body);
    StatusCode::NO_CONTENT
}

async fn email(
    State(stub): State<Stub>,
    Path(ticket_id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    stub.record(method, &uri, &headers, &body);
    if ticket_id == "broken" {
        (StatusCode::INTERNAL_SERVER_ERROR, "smtp down")
    } else {
        (StatusCode::OK, "{}")
    }
}

/// Serve the stub on an ephemeral port, returning its base URL and request
/// log. The server task ends with the test runtime.
async fn spawn_stub(listing: &'static str) -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/tickets", get(list).post(create))
        .route("/tickets/{id}", patch(accept))
        .route("/tickets/{id}/mark-read", post(accept))
        .route("/tickets/{id}/email", post(email))
        .with_state(Stub {
            listing,
            log: Arc::clone(&log),
        });

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (format!("http://{addr}"), log)
}

fn client(base_url: &str, token: Option<&str>) -> HttpTicketApi {
    HttpTicketApi::with_client(
        reqwest::Client::new(),
        base_url,
        token.map(str::to_owned),
    )
}

fn recorded(log: &Arc<Mutex<Vec<Recorded>>>) -> Vec<Recorded> {
    log.lock().unwrap().clone()
}

// ── Fetch ─────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_unwraps_envelope_and_sends_bearer_token() {
    let (base_url, log) = spawn_stub(LISTING).await;
    let api = client(&base_url, Some("secret"));

    let tickets = api.fetch_tickets().await.expect("fetch");

    let ids: Vec<_> = tickets.iter().map(|t| t.ticket_id.as_str()).collect();
    assert_eq!(ids, ["T1", "T2", "T3"]);
    assert!(tickets[0].is_new);
    assert!(tickets[0].conversations.is_empty(), "null conversations decode empty");
    assert_eq!(tickets[1].status, TicketStatus::Resolved);
    assert_eq!(tickets[2].assigned_user_id, Some(9));

    let requests = recorded(&log);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::GET);
    assert_eq!(requests[0].path, "/tickets");
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer secret"));
}

#[tokio::test]
async fn fetch_accepts_bare_array_without_token() {
    let (base_url, log) = spawn_stub(r#"[{"ticket_id":"T9"}]"#).await;
    let api = client(&base_url, None);

    let tickets = api.fetch_tickets().await.expect("fetch");

    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].ticket_id, "T9");
    assert_eq!(recorded(&log)[0].authorization, None);
}

#[tokio::test]
async fn undecodable_listing_is_a_decode_error() {
    let (base_url, _log) = spawn_stub("not json").await;
    let api = client(&base_url, None);

    let err = api.fetch_tickets().await.expect_err("garbage body");

    assert!(matches!(err, AppError::Decode(_)), "got {err}");
}

#[tokio::test]
async fn unreachable_server_is_an_api_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let api = client(&format!("http://{addr}"), None);

    let err = api.fetch_tickets().await.expect_err("connection refused");

    assert!(matches!(err, AppError::Api(_)), "got {err}");
}

// ── Mutations ─────────────────────────────────────────────────

#[tokio::test]
async fn update_patches_single_field() {
    let (base_url, log) = spawn_stub(LISTING).await;
    let api = client(&base_url, None);

    api.update_ticket("T1", &TicketUpdate::Status(TicketStatus::Resolved))
        .await
        .expect("update status");
    api.update_ticket("T1", &TicketUpdate::Assignee(AGENT))
        .await
        .expect("update assignee");

    let requests = recorded(&log);
    assert_eq!(requests[0].method, Method::PATCH);
    assert_eq!(requests[0].path, "/tickets/T1");
    assert_eq!(requests[0].body, Some(json!({ "status": "Resolved" })));
    assert_eq!(requests[1].body, Some(json!({ "assigned_user_id": AGENT })));
}

#[tokio::test]
async fn create_posts_payload_and_decodes_bare_ticket() {
    let (base_url, log) = spawn_stub(LISTING).await;
    let api = client(&base_url, None);
    let new_ticket = NewTicket::new("new@x.com", "Refund", "please help");

    let created = api.create_ticket(&new_ticket).await.expect("create");

    assert_eq!(created.ticket_id, "created-1");
    assert_eq!(created.customer_email(), "new@x.com");
    assert_eq!(created.subject, "Refund");
    assert!(created.is_new);

    let requests = recorded(&log);
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].path, "/tickets");
    let body = requests[0].body.clone().expect("json body");
    assert_eq!(body["customer_email"], "new@x.com");
    assert_eq!(body["status"], "Open");
    assert_eq!(body["priority"], "Medium");
    assert_eq!(body["conversations"][0]["role"], "customer");
}

#[tokio::test]
async fn mark_read_posts_to_ticket_route() {
    let (base_url, log) = spawn_stub(LISTING).await;
    let api = client(&base_url, Some("secret"));

    api.mark_read("T1").await.expect("mark read");

    let requests = recorded(&log);
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].path, "/tickets/T1/mark-read");
    assert_eq!(requests[0].body, None);
}

#[tokio::test]
async fn send_email_posts_reply() {
    let (base_url, log) = spawn_stub(LISTING).await;
    let api = client(&base_url, None);
    let email = EmailRequest {
        provider: "gmail".into(),
        message: "<p>hi</p>".into(),
        subject: "Refund".into(),
        attachment: None,
    };

    api.send_email("T1", &email).await.expect("send");

    let requests = recorded(&log);
    assert_eq!(requests[0].path, "/tickets/T1/email");
    assert_eq!(
        requests[0].body,
        Some(json!({
            "provider": "gmail",
            "message": "<p>hi</p>",
            "subject": "Refund",
            "attachment": null,
        }))
    );
}

#[tokio::test]
async fn error_status_maps_to_api_error_with_body() {
    let (base_url, _log) = spawn_stub(LISTING).await;
    let api = client(&base_url, None);
    let email = EmailRequest {
        provider: "smtp".into(),
        message: "hello".into(),
        subject: "s".into(),
        attachment: None,
    };

    let err = api.send_email("broken", &email).await.expect_err("500");

    let AppError::Api(message) = err else {
        panic!("expected an api error");
    };
    assert!(message.contains("500"), "{message}");
    assert!(message.contains("smtp down"), "{message}");
}

#[test]
fn trailing_slash_is_trimmed_from_base_url() {
    let api = client("http://tickets.local/api/", None);
    assert_eq!(api.base_url(), "http://tickets.local/api");
}

// ── Engine over HTTP ──────────────────────────────────────────

#[tokio::test]
async fn engine_bootstraps_over_http() {
    let (base_url, log) = spawn_stub(LISTING).await;
    let api: Arc<dyn TicketApi> = Arc::new(client(&base_url, Some("secret")));
    let engine = InboxEngine::new(api, SessionStore::new(), AGENT, DELAY);

    let opened = engine.bootstrap(None).await.expect("bootstrap");

    assert_eq!(opened.map(|t| t.ticket_id), Some("T1".to_owned()));
    let queue: Vec<_> = engine
        .active_queue()
        .await
        .into_iter()
        .map(|t| t.ticket_id)
        .collect();
    assert_eq!(queue, ["T1"], "T3 belongs to another agent");
    assert_eq!(engine.open_history("a@x.com").await.len(), 1);
    assert_eq!(engine.unread_count(), 0);

    let paths: Vec<_> = recorded(&log).into_iter().map(|r| r.path).collect();
    assert_eq!(paths, ["/tickets", "/tickets/T1/mark-read"]);
}
