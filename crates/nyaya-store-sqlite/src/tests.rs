//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, TimeZone, Utc};
use nyaya_core::{
  message::{MessageType, Role},
  records::{
    AccessLogQuery, FeedbackType, LlmOutputQuery, MetricType, NewAccessLog, NewCaseResult,
    NewChatSession, NewFeedback, NewKanoonQuery, NewLlmOutput, NewMessage, NewPdfUpload,
    NewUser, NewUserSession, PdfStatusUpdate, ProcessingStatus, RateLimitKey, SessionMode,
    UserRole,
  },
  store::LogStore,
};
use uuid::Uuid;

use crate::{Error, SqliteStore, sha256_hex};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_user(email: &str) -> NewUser {
  NewUser {
    full_name:     "Asha Rao".into(),
    email:         email.into(),
    phone:         None,
    password_hash: "$argon2id$stub".into(),
    role:          UserRole::User,
  }
}

fn new_session(user_id: Option<i64>) -> NewChatSession {
  NewChatSession {
    user_id,
    chat_mode: SessionMode::PdfChat,
    title: None,
    folder: None,
  }
}

fn message(session_id: i64, role: Role, content: &str) -> NewMessage {
  NewMessage {
    session_id,
    role,
    content: content.into(),
    message_type: MessageType::Text,
  }
}

fn today() -> chrono::NaiveDate { Utc::now().date_naive() }

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_fetch_user() {
  let s = store().await;
  let user = s.create_user(new_user("asha@example.in")).await.unwrap();
  assert!(user.is_active);
  assert!(!user.is_verified);

  let by_email = s
    .get_user_by_email("asha@example.in".into())
    .await
    .unwrap()
    .expect("user by email");
  assert_eq!(by_email.id, user.id);
  assert_eq!(by_email.user_uuid, user.user_uuid);
  assert_eq!(by_email.role, UserRole::User);

  let by_uuid = s.get_user_by_uuid(user.user_uuid).await.unwrap();
  assert_eq!(by_uuid.map(|u| u.email).as_deref(), Some("asha@example.in"));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  s.create_user(new_user("dup@example.in")).await.unwrap();
  let err = s.create_user(new_user("dup@example.in")).await.unwrap_err();
  assert!(matches!(err, Error::EmailTaken(ref e) if e == "dup@example.in"));
}

#[tokio::test]
async fn missing_user_lookups_return_none() {
  let s = store().await;
  assert!(s.get_user_by_uuid(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.get_user_by_email("nobody@example.in".into()).await.unwrap().is_none());
  assert!(matches!(
    s.update_last_login(42).await.unwrap_err(),
    Error::UserNotFound(42)
  ));
}

#[tokio::test]
async fn login_counts_each_user_once_per_day() {
  let s = store().await;
  let a = s.create_user(new_user("a@example.in")).await.unwrap();
  let b = s.create_user(new_user("b@example.in")).await.unwrap();

  s.update_last_login(a.id).await.unwrap();
  s.update_last_login(a.id).await.unwrap();
  s.update_last_login(b.id).await.unwrap();

  assert_eq!(s.metric(today(), MetricType::DailyUsers).await.unwrap(), 2);
  let a = s.get_user_by_uuid(a.user_uuid).await.unwrap().unwrap();
  assert!(a.last_login_at.is_some());
}

#[tokio::test]
async fn user_session_round_trip() {
  let s = store().await;
  let user = s.create_user(new_user("tok@example.in")).await.unwrap();
  let expires = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

  s.create_user_session(NewUserSession {
    session_token: "tok-1".into(),
    user_id:       user.id,
    ip_address:    Some("10.0.0.1".into()),
    user_agent:    None,
    expires_at:    expires,
  })
  .await
  .unwrap();

  let fetched = s.get_user_session("tok-1".into()).await.unwrap().unwrap();
  assert_eq!(fetched.user_id, user.id);
  assert_eq!(fetched.expires_at, expires);
  assert!(fetched.is_active);
}

// ─── Cascades ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn deleting_user_cascades_and_nulls_logs() {
  let s = store().await;
  let user = s.create_user(new_user("gone@example.in")).await.unwrap();
  let session = s.create_chat_session(new_session(Some(user.id))).await.unwrap();
  s.add_message(message(session.id, Role::User, "hello")).await.unwrap();
  s.log_access(NewAccessLog {
    user_id: Some(user.id),
    endpoint: "/api/pdf/chat".into(),
    http_method: "POST".into(),
    ..Default::default()
  })
  .await
  .unwrap();

  s.delete_user(user.id).await.unwrap();

  assert!(s.get_chat_session(session.session_uuid).await.unwrap().is_none());
  assert!(s.session_messages(session.id).await.unwrap().is_empty());

  let logs = s.access_logs(AccessLogQuery::default()).await.unwrap();
  assert_eq!(logs.len(), 1);
  assert_eq!(logs[0].user_id, None);
  assert_eq!(logs[0].endpoint, "/api/pdf/chat");
}

// ─── Chat ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_session_defaults_and_updates() {
  let s = store().await;
  let session = s.create_chat_session(new_session(None)).await.unwrap();
  assert_eq!(session.title, "New Chat");
  assert!(!session.is_archived);

  s.update_session_title(session.id, "Bail under 438".into()).await.unwrap();
  s.set_session_archived(session.id, true).await.unwrap();

  let fetched = s.get_chat_session(session.session_uuid).await.unwrap().unwrap();
  assert_eq!(fetched.title, "Bail under 438");
  assert!(fetched.is_archived);
  assert_eq!(fetched.chat_mode, SessionMode::PdfChat);

  assert!(matches!(
    s.update_session_title(9_999, "x".into()).await.unwrap_err(),
    Error::SessionNotFound(9_999)
  ));
}

#[tokio::test]
async fn messages_keep_insertion_order() {
  let s = store().await;
  let session = s.create_chat_session(new_session(None)).await.unwrap();
  for (role, text) in [(Role::User, "q1"), (Role::Assistant, "a1"), (Role::User, "q2")] {
    s.add_message(message(session.id, role, text)).await.unwrap();
  }
  let contents: Vec<_> = s
    .session_messages(session.id)
    .await
    .unwrap()
    .into_iter()
    .map(|m| m.content)
    .collect();
  assert_eq!(contents, ["q1", "a1", "q2"]);
}

#[tokio::test]
async fn message_into_missing_session_fails() {
  let s = store().await;
  let err = s.add_message(message(77, Role::User, "orphan")).await.unwrap_err();
  assert!(matches!(err, Error::SessionNotFound(77)));
}

#[tokio::test]
async fn user_messages_count_as_daily_queries() {
  let s = store().await;
  let session = s.create_chat_session(new_session(None)).await.unwrap();
  s.add_message(message(session.id, Role::User, "q1")).await.unwrap();
  s.add_message(message(session.id, Role::Assistant, "a1")).await.unwrap();
  s.add_message(message(session.id, Role::User, "q2")).await.unwrap();

  assert_eq!(s.metric(today(), MetricType::DailyQueries).await.unwrap(), 2);
}

#[tokio::test]
async fn user_chat_sessions_most_recent_first() {
  let s = store().await;
  let user = s.create_user(new_user("list@example.in")).await.unwrap();
  let first = s.create_chat_session(new_session(Some(user.id))).await.unwrap();
  let second = s.create_chat_session(new_session(Some(user.id))).await.unwrap();
  s.add_message(message(first.id, Role::User, "bump")).await.unwrap();

  let sessions = s.user_chat_sessions(user.id, 10).await.unwrap();
  assert_eq!(sessions.len(), 2);
  assert_eq!(sessions[0].id, first.id);
  assert_eq!(sessions[1].id, second.id);
}

// ─── Analytics counters ──────────────────────────────────────────────────────

#[tokio::test]
async fn llm_outputs_increment_a_single_daily_row() {
  let s = store().await;
  for i in 0..5 {
    s.log_llm_output(NewLlmOutput::new(format!("q{i}"), "answer"))
      .await
      .unwrap();
  }

  assert_eq!(s.metric(today(), MetricType::LlmCalls).await.unwrap(), 5);
  let rows: Vec<_> = s
    .analytics(today())
    .await
    .unwrap()
    .into_iter()
    .filter(|r| r.metric_type == MetricType::LlmCalls)
    .collect();
  assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn missing_metric_reads_as_zero() {
  let s = store().await;
  assert_eq!(s.metric(today(), MetricType::PdfUploads).await.unwrap(), 0);
}

#[tokio::test]
async fn llm_outputs_filter_by_session() {
  let s = store().await;
  let session = s.create_chat_session(new_session(None)).await.unwrap();
  s.log_llm_output(NewLlmOutput { session_id: Some(session.id), ..NewLlmOutput::new("a", "b") })
    .await
    .unwrap();
  s.log_llm_output(NewLlmOutput::failed("c", "upstream timeout")).await.unwrap();

  let scoped = s
    .llm_outputs(LlmOutputQuery { session_id: Some(session.id), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(scoped.len(), 1);
  assert_eq!(scoped[0].user_question, "a");

  let all = s.llm_outputs(LlmOutputQuery::default()).await.unwrap();
  assert_eq!(all.len(), 2);
  assert!(!all[0].success);
  assert_eq!(all[0].error_message.as_deref(), Some("upstream timeout"));
}

// ─── Case search ─────────────────────────────────────────────────────────────

fn case_search(query: &str, success: bool, docs: &[&str]) -> NewKanoonQuery {
  NewKanoonQuery {
    search_query: query.into(),
    success,
    results_returned: docs.len() as i64,
    total_results_found: docs.len() as i64,
    case_results: docs
      .iter()
      .map(|d| NewCaseResult { doc_id: (*d).into(), ..Default::default() })
      .collect(),
    raw_api_response: Some(serde_json::json!({ "found": docs.len() })),
    ..Default::default()
  }
}

#[tokio::test]
async fn case_results_are_ranked_in_order() {
  let s = store().await;
  let q = s
    .log_kanoon_query(case_search("anticipatory bail", true, &["d1", "d2", "d3"]))
    .await
    .unwrap();

  let results = s.case_results(q.id).await.unwrap();
  let ranked: Vec<_> = results.iter().map(|r| (r.result_rank, r.doc_id.as_str())).collect();
  assert_eq!(ranked, [(1, "d1"), (2, "d2"), (3, "d3")]);

  let stored = s.kanoon_queries(Some("bail".into()), 10).await.unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].raw_api_response, Some(serde_json::json!({ "found": 3 })));
  assert_eq!(s.metric(today(), MetricType::KanoonSearches).await.unwrap(), 1);
}

#[tokio::test]
async fn popular_searches_count_successes_only() {
  let s = store().await;
  for _ in 0..3 {
    s.log_kanoon_query(case_search("dowry death", true, &[])).await.unwrap();
  }
  s.log_kanoon_query(case_search("cheque bounce", true, &[])).await.unwrap();
  for _ in 0..5 {
    s.log_kanoon_query(case_search("broken", false, &[])).await.unwrap();
  }

  let popular = s.popular_searches(10).await.unwrap();
  assert_eq!(popular.len(), 2);
  assert_eq!(popular[0].query, "dowry death");
  assert_eq!(popular[0].count, 3);
  assert_eq!(popular[1].query, "cheque bounce");
}

// ─── PDF uploads ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_records_size_and_hash() {
  let s = store().await;
  let bytes = b"%PDF-1.7 judgment".to_vec();
  let upload = s
    .log_pdf_upload(NewPdfUpload {
      original_filename: "judgment.pdf".into(),
      content: Some(bytes.clone()),
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(upload.file_size_bytes, Some(bytes.len() as i64));
  assert_eq!(upload.file_hash.as_deref(), Some(sha256_hex(&bytes).as_str()));
  assert_eq!(upload.processing_status, ProcessingStatus::Pending);
  assert_eq!(upload.mime_type, "application/pdf");
  assert!(upload.processed_at.is_none());
  assert_eq!(s.metric(today(), MetricType::PdfUploads).await.unwrap(), 1);
}

#[tokio::test]
async fn status_transitions_stamp_processed_at_when_terminal() {
  let s = store().await;
  let upload = s
    .log_pdf_upload(NewPdfUpload { original_filename: "a.pdf".into(), ..Default::default() })
    .await
    .unwrap();

  let processing = s
    .update_pdf_status(PdfStatusUpdate {
      upload_id:        upload.id,
      status:           ProcessingStatus::Processing,
      chunks_processed: None,
      error_message:    None,
    })
    .await
    .unwrap();
  assert_eq!(processing.processing_status, ProcessingStatus::Processing);
  assert!(processing.processed_at.is_none());

  let done = s
    .update_pdf_status(PdfStatusUpdate {
      upload_id:        upload.id,
      status:           ProcessingStatus::Completed,
      chunks_processed: Some(12),
      error_message:    None,
    })
    .await
    .unwrap();
  assert_eq!(done.chunks_processed, 12);
  assert!(done.processed_at.is_some());

  assert!(matches!(
    s.update_pdf_status(PdfStatusUpdate {
      upload_id:        upload.id,
      status:           ProcessingStatus::Pending,
      chunks_processed: None,
      error_message:    None,
    })
    .await
    .unwrap_err(),
    Error::UploadFinished(id) if id == upload.id
  ));
  let unchanged = s.pdf_upload_by_id(upload.id).await.unwrap().unwrap();
  assert_eq!(unchanged.processing_status, ProcessingStatus::Completed);

  assert!(matches!(
    s.update_pdf_status(PdfStatusUpdate {
      upload_id:        404,
      status:           ProcessingStatus::Failed,
      chunks_processed: None,
      error_message:    Some("gone".into()),
    })
    .await
    .unwrap_err(),
    Error::UploadNotFound(404)
  ));
}

#[tokio::test]
async fn chunks_append_with_unique_indexes() {
  let s = store().await;
  let upload = s
    .log_pdf_upload(NewPdfUpload { original_filename: "b.pdf".into(), ..Default::default() })
    .await
    .unwrap();

  assert_eq!(s.add_pdf_chunks(upload.id, vec!["one".into(), "two".into()]).await.unwrap(), 2);
  assert_eq!(s.add_pdf_chunks(upload.id, vec!["three".into()]).await.unwrap(), 1);

  let chunks = s.pdf_chunks(upload.id).await.unwrap();
  let indexed: Vec<_> = chunks.iter().map(|c| (c.chunk_index, c.chunk_text.as_str())).collect();
  assert_eq!(indexed, [(0, "one"), (1, "two"), (2, "three")]);
  assert_eq!(chunks[0].chunk_hash, sha256_hex(b"one"));

  assert!(matches!(
    s.add_pdf_chunks(999, vec!["x".into()]).await.unwrap_err(),
    Error::UploadNotFound(999)
  ));
}

// ─── Feedback ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn feedback_links_whichever_record_owns_the_uuid() {
  let s = store().await;
  let output = s.log_llm_output(NewLlmOutput::new("q", "a")).await.unwrap();

  let fb = s
    .add_feedback(NewFeedback {
      user_id:       None,
      target_uuid:   Some(output.output_uuid),
      rating:        Some(4),
      feedback_type: FeedbackType::Helpful,
      feedback_text: Some("clear".into()),
    })
    .await
    .unwrap();
  assert_eq!(fb.llm_output_id, Some(output.id));
  assert_eq!(fb.message_id, None);
  assert_eq!(fb.kanoon_query_id, None);

  let unlinked = s
    .add_feedback(NewFeedback {
      user_id:       None,
      target_uuid:   Some(Uuid::new_v4()),
      rating:        None,
      feedback_type: FeedbackType::Other,
      feedback_text: None,
    })
    .await
    .unwrap();
  assert_eq!(unlinked.llm_output_id, None);

  let stored = s.feedback(10).await.unwrap();
  assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn feedback_rating_out_of_range_is_rejected() {
  let s = store().await;
  let err = s
    .add_feedback(NewFeedback {
      user_id:       None,
      target_uuid:   None,
      rating:        Some(6),
      feedback_type: FeedbackType::Incorrect,
      feedback_text: None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidRating(6)));
}

// ─── Rate limits & access stats ──────────────────────────────────────────────

#[tokio::test]
async fn rate_limit_counts_within_window_and_resets_after() {
  let s = store().await;
  let key = RateLimitKey {
    user_id:    None,
    ip_address: Some("203.0.113.9".into()),
    endpoint:   "/api/pdf/chat".into(),
  };
  let t0 = Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap();
  let minute = Duration::minutes(1);

  for expected in 1..=3 {
    let w = s
      .hit_rate_limit(key.clone(), minute, t0 + Duration::seconds(expected))
      .await
      .unwrap();
    assert_eq!(w.request_count, expected as u32);
    assert_eq!(w.window_start, t0 + Duration::seconds(1));
  }

  let other_ip = RateLimitKey { ip_address: Some("198.51.100.1".into()), ..key.clone() };
  assert_eq!(
    s.hit_rate_limit(other_ip, minute, t0).await.unwrap().request_count,
    1
  );

  let later = s
    .hit_rate_limit(key, minute, t0 + Duration::minutes(2))
    .await
    .unwrap();
  assert_eq!(later.request_count, 1);
  assert_eq!(later.window_end, t0 + Duration::minutes(3));
}

#[tokio::test]
async fn daily_stats_group_access_logs_by_day() {
  let s = store().await;
  let user = s.create_user(new_user("stats@example.in")).await.unwrap();
  for user_id in [Some(user.id), Some(user.id), None] {
    s.log_access(NewAccessLog {
      user_id,
      endpoint: "/api/kanoon/search".into(),
      http_method: "POST".into(),
      request_body: Some(serde_json::json!({ "query": "bail" })),
      response_status_code: Some(200),
      ..Default::default()
    })
    .await
    .unwrap();
  }

  let stats = s.daily_stats(Utc::now() - Duration::days(1)).await.unwrap();
  assert_eq!(stats.len(), 1);
  assert_eq!(stats[0].date, today());
  assert_eq!(stats[0].total_requests, 3);
  assert_eq!(stats[0].unique_users, 1);

  let logs = s
    .access_logs(AccessLogQuery {
      endpoint: Some("/api/kanoon/search".into()),
      limit: Some(2),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(logs.len(), 2);
  assert_eq!(logs[0].request_body, Some(serde_json::json!({ "query": "bail" })));
}
