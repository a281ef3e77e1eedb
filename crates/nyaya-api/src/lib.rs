//! JSON REST API for NyayAssist.
//!
//! Exposes an axum [`Router`] backed by any [`nyaya_core::store::LogStore`]
//! and a loaded [`LawMapping`]. Access logging, rate limiting, admin auth and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", nyaya_api::api_router(state.clone()))
//! ```

pub mod codes;
pub mod error;
pub mod feedback;
pub mod law;
pub mod sessions;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use nyaya_core::{mapping::LawMapping, store::LogStore};
use uuid::Uuid;

pub use codes::CodeBook;
pub use error::ApiError;

/// Shared state threaded through the API handlers.
pub struct ApiState<S> {
  pub store:   Arc<S>,
  pub mapping: Arc<LawMapping>,
  pub codes:   Arc<CodeBook>,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, mapping: Arc<LawMapping>) -> Self {
    Self { store, mapping, codes: Arc::new(CodeBook::new()) }
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      mapping: Arc::clone(&self.mapping),
      codes:   Arc::clone(&self.codes),
    }
  }
}

/// Map an optional client-supplied user UUID to a row id. Unknown or
/// malformed UUIDs resolve to `None`.
pub(crate) async fn resolve_user_id<S>(
  state: &ApiState<S>,
  user_uuid: Option<&str>,
) -> Result<Option<i64>, ApiError>
where
  S: LogStore,
{
  let Some(uuid) = user_uuid.and_then(|s| Uuid::parse_str(s).ok()) else {
    return Ok(None);
  };
  let user = state
    .store
    .get_user_by_uuid(uuid)
    .await
    .map_err(ApiError::store)?;
  Ok(user.map(|u| u.id))
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: LogStore + 'static,
{
  Router::new()
    // Accounts
    .route("/users/send-otp", post(users::send_code::<S>))
    .route("/users/register", post(users::register::<S>))
    .route("/users/login", post(users::login::<S>))
    // Chat sessions
    .route("/sessions/create", post(sessions::create::<S>))
    // Law comparison
    .route("/law/compare", post(law::compare::<S>))
    .route("/law/compare/bulk", post(law::compare_bulk::<S>))
    .route("/law/sections/{law_type}", get(law::sections::<S>))
    // Feedback
    .route("/feedback", post(feedback::submit::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use nyaya_core::store::LogStore as _;
  use nyaya_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  use super::*;

  const MAPPING: &str = r#"{
    "IPC_TO_BNS": {
      "302":  { "old_section": "302",  "old_title": "Punishment for murder",
                "new_section": "103",  "new_title": "Punishment for murder",
                "changes": "Mob lynching added." },
      "120B": { "old_section": "120B", "old_title": "Criminal conspiracy",
                "new_section": "61",   "new_title": "Criminal conspiracy",
                "changes": "Renumbered." },
      "34":   { "old_section": "34",   "old_title": "Common intention",
                "new_section": "3(5)", "new_title": "Common intention",
                "changes": "Merged into general explanations." }
    },
    "CRPC_TO_BNSS": {
      "154":  { "old_section": "154",  "old_title": "Information in cognizable cases",
                "new_section": "173",  "new_title": "Information in cognizable cases",
                "changes": "e-FIR permitted." }
    }
  }"#;

  async fn make_state() -> ApiState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    ApiState::new(
      Arc::new(store),
      Arc::new(LawMapping::from_json(MAPPING).unwrap()),
    )
  }

  async fn call(
    state: ApiState<SqliteStore>,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = api_router(state)
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
  }

  // ── Law comparison ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn compare_finds_section() {
    let state = make_state().await;
    let (status, body) = call(
      state,
      "POST",
      "/law/compare",
      Some(json!({ "law_type": "ipc", "section": "302" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["comparison"]["new_law"], "BNS");
    assert_eq!(body["comparison"]["new_section"], "103");
    assert!(body.get("error").is_none());
  }

  #[tokio::test]
  async fn compare_reports_invalid_code_in_band() {
    let state = make_state().await;
    let (status, body) = call(
      state,
      "POST",
      "/law/compare",
      Some(json!({ "law_type": "MVA", "section": "185" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], law::INVALID_LAW_TYPE);
  }

  #[tokio::test]
  async fn compare_reports_missing_section() {
    let state = make_state().await;
    let (_, body) = call(
      state,
      "POST",
      "/law/compare",
      Some(json!({ "law_type": "IPC", "section": "999" })),
    )
    .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No comparison data found for IPC Section 999");
  }

  #[tokio::test]
  async fn bulk_compare_collects_misses() {
    let state = make_state().await;
    let (_, body) = call(
      state,
      "POST",
      "/law/compare/bulk",
      Some(json!({ "sections": [
        { "law_type": "IPC",  "section": "120-B" },
        { "law_type": "CRPC", "section": "154" },
        { "law_type": "IPC",  "section": "1" },
        { "law_type": "XYZ",  "section": "2" }
      ]})),
    )
    .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["comparisons"].as_array().unwrap().len(), 2);
    let misses = body["not_found"].as_array().unwrap();
    assert_eq!(misses.len(), 2);
    assert_eq!(misses[0]["reason"], "Not found in database");
    assert_eq!(misses[1]["reason"], "Invalid law_type");
    assert_eq!(misses[1]["law_type"], "XYZ");
  }

  #[tokio::test]
  async fn bulk_compare_omits_empty_not_found() {
    let state = make_state().await;
    let (_, body) = call(
      state,
      "POST",
      "/law/compare/bulk",
      Some(json!({ "sections": [{ "law_type": "IPC", "section": "302" }] })),
    )
    .await;
    assert!(body.get("not_found").is_none());
  }

  #[tokio::test]
  async fn sections_are_sorted_numerically() {
    let state = make_state().await;
    let (status, body) = call(state, "GET", "/law/sections/ipc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["law_type"], "IPC");
    assert_eq!(body["total_sections"], 3);
    let order: Vec<_> = body["sections"]
      .as_array()
      .unwrap()
      .iter()
      .map(|s| s["section"].as_str().unwrap().to_owned())
      .collect();
    assert_eq!(order, ["34", "120B", "302"]);
  }

  #[tokio::test]
  async fn sections_rejects_unknown_code() {
    let state = make_state().await;
    let (status, body) = call(state, "GET", "/law/sections/MVA", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid law_type. Must be IPC, CRPC, or IEA");
  }

  // ── Accounts ──────────────────────────────────────────────────────────────

  fn register_body(otp: &str) -> Value {
    json!({
      "full_name": "Meera Iyer",
      "email": "meera@example.in",
      "password": "s3cret",
      "otp": otp,
    })
  }

  #[tokio::test]
  async fn send_code_then_register_and_login() {
    let state = make_state().await;
    let (status, body) = call(
      state.clone(),
      "POST",
      "/users/send-otp",
      Some(json!({ "email": "meera@example.in" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // Re-issue so the test knows the code; the newer code replaces the old.
    let code = state.codes.issue("meera@example.in").await;
    let (status, body) =
      call(state.clone(), "POST", "/users/register", Some(register_body(&code))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "meera@example.in");
    let user_uuid = body["user_uuid"].as_str().unwrap().to_owned();

    let (status, body) = call(
      state.clone(),
      "POST",
      "/users/login",
      Some(json!({ "email": "meera@example.in", "password": "s3cret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_uuid"], user_uuid.as_str());

    let user = state
      .store
      .get_user_by_email("meera@example.in".into())
      .await
      .unwrap()
      .unwrap();
    assert!(user.last_login_at.is_some());
    assert_ne!(user.password_hash, "s3cret");

    let (status, body) = call(
      state,
      "POST",
      "/users/send-otp",
      Some(json!({ "email": "meera@example.in" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Email already registered");
  }

  #[tokio::test]
  async fn register_with_wrong_code_is_rejected() {
    let state = make_state().await;
    state.codes.issue("meera@example.in").await;
    let (status, body) =
      call(state, "POST", "/users/register", Some(register_body("not-a-code"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid or expired verification code");
  }

  #[tokio::test]
  async fn login_with_wrong_password_is_unauthorized() {
    let state = make_state().await;
    let code = state.codes.issue("meera@example.in").await;
    call(state.clone(), "POST", "/users/register", Some(register_body(&code))).await;

    let (status, body) = call(
      state,
      "POST",
      "/users/login",
      Some(json!({ "email": "meera@example.in", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Invalid email or password");
  }

  // ── Sessions & feedback ───────────────────────────────────────────────────

  #[tokio::test]
  async fn create_session_defaults_title() {
    let state = make_state().await;
    let (status, body) = call(
      state,
      "POST",
      "/sessions/create",
      Some(json!({ "chat_mode": "KANOON_SEARCH" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "New Chat");
    assert!(Uuid::parse_str(body["session_uuid"].as_str().unwrap()).is_ok());
  }

  #[tokio::test]
  async fn feedback_is_stored() {
    let state = make_state().await;
    let (status, body) = call(
      state.clone(),
      "POST",
      "/feedback",
      Some(json!({ "feedback_type": "helpful", "rating": 5, "message_id": "not-a-uuid" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(Uuid::parse_str(body["feedback_id"].as_str().unwrap()).is_ok());
  }

  #[tokio::test]
  async fn feedback_rating_is_validated() {
    let state = make_state().await;
    let (status, body) = call(
      state,
      "POST",
      "/feedback",
      Some(json!({ "feedback_type": "incorrect", "rating": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "rating must be between 1 and 5, got 9");
  }
}
