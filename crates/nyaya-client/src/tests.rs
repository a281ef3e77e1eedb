//! End-to-end tests of the HTTP client and orchestrator against a live
//! in-process server.

use std::{net::SocketAddr, sync::Arc};

use nyaya_api::ApiState;
use nyaya_core::{
  law::LawCode,
  mapping::LawMapping,
  mode::ChatMode,
  records::{AccessLogQuery, FeedbackType, SessionMode},
  store::LogStore as _,
  wire::{
    BulkCompareRequest, CompareRequest, FeedbackRequest, LoginRequest, RegisterRequest,
    SessionCreateRequest,
  },
};
use nyaya_server::{AppState, ServerConfig};
use nyaya_store_sqlite::SqliteStore;
use tokio::net::TcpListener;

use crate::{
  ApiClient, ApiConfig, ClientError,
  chat::{Chat, execute},
};

const MAPPING_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/law_mapping.json");

async fn spawn_server() -> (String, AppState<SqliteStore>) {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let mapping = LawMapping::load(MAPPING_PATH).unwrap();
  let config = ServerConfig {
    host:                  "127.0.0.1".into(),
    port:                  0,
    store_path:            ":memory:".into(),
    mapping_path:          MAPPING_PATH.into(),
    admin_username:        "admin".into(),
    admin_password_hash:   nyaya_api::users::hash_password("secret").unwrap(),
    rate_limit_per_minute: 0,
  };
  let state = AppState::new(ApiState::new(Arc::new(store), Arc::new(mapping)), config);

  let app = nyaya_server::router(state.clone());
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
      .await
      .unwrap();
  });
  (format!("http://{addr}"), state)
}

fn client(base_url: &str, user_uuid: Option<String>) -> ApiClient {
  ApiClient::new(ApiConfig { base_url: base_url.to_owned(), user_uuid }).unwrap()
}

#[tokio::test]
async fn health_maps_to_bool() {
  let (url, _state) = spawn_server().await;
  assert!(client(&url, None).health().await);
  assert!(!client("http://127.0.0.1:1", None).health().await);
}

#[tokio::test]
async fn law_comparison_end_to_end() {
  let (url, _state) = spawn_server().await;
  let backend = Arc::new(client(&url, None));
  let mut chat = Chat::new(ChatMode::LawComparison);

  let ticket = chat.submit("IPC 302, 377 and 999").unwrap();
  assert!(chat.complete(execute(backend, ticket).await));

  let replies = &chat.transcript()[1..];
  assert_eq!(replies.len(), 2);
  assert_eq!(replies[0].content(), "Found 2 comparisons for IPC sections:");
  let comparisons = replies[0].body.comparisons();
  assert_eq!(comparisons[0].new_section, "103");
  assert!(comparisons[1].is_omitted());
  assert!(replies[1].content().ends_with("sections: 999"));
}

#[tokio::test]
async fn listing_and_bulk_compare() {
  let (url, _state) = spawn_server().await;
  let api = client(&url, None);

  let listing = api.sections(LawCode::Iea).await.unwrap();
  assert_eq!(listing.law_type, "IEA");
  assert_eq!(listing.total_sections, listing.sections.len());
  assert_eq!(listing.sections[0].section, "3");

  let bulk = api
    .compare_bulk(&BulkCompareRequest {
      sections: vec![
        CompareRequest { law_type: "crpc".into(), section: "438".into() },
        CompareRequest { law_type: "MVA".into(), section: "185".into() },
      ],
    })
    .await
    .unwrap();
  assert_eq!(bulk.comparisons.len(), 1);
  assert_eq!(bulk.comparisons[0].new_law, "BNSS");
  assert_eq!(bulk.not_found.unwrap()[0].reason, "Invalid law_type");
}

#[tokio::test]
async fn register_login_and_attribution() {
  let (url, state) = spawn_server().await;
  let api = client(&url, None);

  api.send_code("arjun@example.in").await.unwrap();
  let otp = state.api.codes.issue("arjun@example.in").await;
  let registered = api
    .register(&RegisterRequest {
      full_name: "Arjun Rao".into(),
      email:     "arjun@example.in".into(),
      phone:     None,
      password:  "correct horse".into(),
      otp,
    })
    .await
    .unwrap();

  let err = api
    .login(&LoginRequest { email: "arjun@example.in".into(), password: "wrong".into() })
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    ClientError::Server { status: 401, ref detail } if detail == "Invalid email or password"
  ));

  let user = api
    .login(&LoginRequest { email: "arjun@example.in".into(), password: "correct horse".into() })
    .await
    .unwrap();
  assert_eq!(user.user_uuid, registered.user_uuid);

  // Requests from a signed-in client are attributed in the access log.
  let signed_in = client(&url, Some(user.user_uuid.clone()));
  signed_in.sections(LawCode::Ipc).await.unwrap();
  let logs = state
    .api
    .store
    .access_logs(AccessLogQuery {
      endpoint: Some("/api/law/sections/IPC".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(logs.len(), 1);
  assert!(logs[0].user_id.is_some());
  assert_eq!(logs[0].user_uuid.as_deref(), Some(user.user_uuid.as_str()));
  assert!(logs[0].session_id.is_some());
}

#[tokio::test]
async fn unserved_calls_fall_back_to_fixed_detail() {
  let (url, _state) = spawn_server().await;
  let api = client(&url, None);

  let err = api.ask("what is bail?").await.unwrap_err();
  assert!(matches!(
    err,
    ClientError::Server { status: 404, ref detail } if detail == "Failed to get answer"
  ));

  let dir = tempfile::tempdir().unwrap();
  let pdf = dir.path().join("order.pdf");
  std::fs::write(&pdf, b"%PDF-1.4\n%%EOF\n").unwrap();
  let err = api.upload_pdfs(&[pdf]).await.unwrap_err();
  assert_eq!(err.to_string(), "Upload failed");

  let err = api
    .upload_pdfs(&[dir.path().join("missing.pdf")])
    .await
    .unwrap_err();
  assert!(matches!(err, ClientError::File { .. }));
}

#[tokio::test]
async fn sessions_feedback_and_stats() {
  let (url, _state) = spawn_server().await;
  let api = client(&url, None);

  let session = api
    .create_session(&SessionCreateRequest {
      chat_mode: SessionMode::PdfChat,
      user_uuid: None,
      title:     None,
    })
    .await
    .unwrap();
  assert_eq!(session.title, "New Chat");

  let feedback = api
    .feedback(&FeedbackRequest {
      feedback_type: FeedbackType::Helpful,
      message_id:    None,
      rating:        Some(4),
      feedback_text: Some("Clear comparison".into()),
      user_uuid:     None,
    })
    .await
    .unwrap();
  assert!(feedback.success);

  let err = api.stats("admin", "nope").await.unwrap_err();
  assert!(matches!(err, ClientError::Server { status: 401, .. }));

  let stats = api.stats("admin", "secret").await.unwrap();
  assert!(stats.success);
  assert!(stats.daily_stats[0].total_requests >= 3);
}
