//! Middleware writing one `access_logs` row per request.
//!
//! JSON request bodies of `POST`/`PUT`/`PATCH` requests are buffered, logged
//! with credentials redacted, and replayed to the inner service. A failed
//! log write is reported through `tracing` and never alters the response.

use std::time::Instant;

use axum::{
  body::Body,
  extract::{ConnectInfo, Request, State},
  http::{HeaderMap, Method, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use nyaya_core::{records::NewAccessLog, store::LogStore};
use serde_json::Value;
use std::net::SocketAddr;

use crate::{AppState, error::Error, header_user_id};

/// Paths that are served but never logged.
pub const SKIPPED_PATHS: [&str; 5] = ["/health", "/", "/docs", "/openapi.json", "/favicon.ico"];

pub const USER_UUID_HEADER: &str = "x-user-uuid";
pub const SESSION_ID_HEADER: &str = "x-session-id";

const MAX_LOGGED_BODY: usize = 1024 * 1024;
const SENSITIVE_FIELDS: [&str; 2] = ["password", "password_hash"];
const REDACTED: &str = "[REDACTED]";

pub(crate) fn header_str(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
  headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(str::to_owned)
}

/// First `X-Forwarded-For` entry, else the peer address when the server was
/// started with connect info.
pub fn client_ip(req: &Request) -> Option<String> {
  req
    .headers()
    .get("x-forwarded-for")
    .and_then(|v| v.to_str().ok())
    .and_then(|s| s.split(',').next())
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
    .or_else(|| {
      req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
    })
}

/// Replace top-level credential fields with a placeholder.
pub fn redact(body: &mut Value) {
  if let Value::Object(map) = body {
    for field in SENSITIVE_FIELDS {
      if let Some(v) = map.get_mut(field) {
        *v = Value::String(REDACTED.to_owned());
      }
    }
  }
}

fn is_json(headers: &HeaderMap) -> bool {
  headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|ct| ct.starts_with("application/json"))
}

pub async fn record<S>(State(state): State<AppState<S>>, req: Request, next: Next) -> Response
where
  S: LogStore + 'static,
{
  let endpoint = req.uri().path().to_owned();
  if SKIPPED_PATHS.contains(&endpoint.as_str()) {
    return next.run(req).await;
  }

  let started = Instant::now();
  let method = req.method().clone();
  let ip_address = client_ip(&req);
  let user_agent = header_str(req.headers(), header::USER_AGENT);
  let user_uuid = header_str(req.headers(), USER_UUID_HEADER);
  let session_id = header_str(req.headers(), SESSION_ID_HEADER);
  let user_id = header_user_id(&state, req.headers()).await;

  let buffer = matches!(method, Method::POST | Method::PUT | Method::PATCH)
    && is_json(req.headers());
  let (req, request_body) = if buffer {
    let (parts, body) = req.into_parts();
    let Ok(bytes) = axum::body::to_bytes(body, MAX_LOGGED_BODY).await else {
      return Error::PayloadTooLarge.into_response();
    };
    let logged = serde_json::from_slice::<Value>(&bytes).ok().map(|mut v| {
      redact(&mut v);
      v
    });
    (Request::from_parts(parts, Body::from(bytes)), logged)
  } else {
    (req, None)
  };

  let response = next.run(req).await;
  let status = response.status();

  let entry = NewAccessLog {
    user_id,
    user_uuid,
    session_id,
    ip_address,
    user_agent,
    endpoint: endpoint.clone(),
    http_method: method.to_string(),
    request_body,
    response_status_code: Some(status.as_u16()),
    response_time_ms: Some(i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)),
    error_message: status
      .is_server_error()
      .then(|| status.canonical_reason().unwrap_or("server error").to_owned()),
  };

  if let Err(e) = state.api.store.log_access(entry).await {
    tracing::warn!(error = %e, %endpoint, "failed to write access log");
  }

  response
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn redacts_credentials_only() {
    let mut body = json!({ "email": "a@example.in", "password": "hunter2", "password_hash": "x" });
    redact(&mut body);
    assert_eq!(body["password"], REDACTED);
    assert_eq!(body["password_hash"], REDACTED);
    assert_eq!(body["email"], "a@example.in");
  }

  #[test]
  fn non_object_bodies_are_untouched() {
    let mut body = json!(["password"]);
    redact(&mut body);
    assert_eq!(body, json!(["password"]));
  }

  #[test]
  fn forwarded_for_wins_over_peer() {
    let mut req = Request::builder()
      .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
      .body(Body::empty())
      .unwrap();
    req
      .extensions_mut()
      .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 9000))));
    assert_eq!(client_ip(&req).as_deref(), Some("203.0.113.7"));

    req.headers_mut().remove("x-forwarded-for");
    assert_eq!(client_ip(&req).as_deref(), Some("127.0.0.1"));
  }
}
