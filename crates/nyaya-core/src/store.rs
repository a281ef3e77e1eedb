//! The `LogStore` trait.
//!
//! Implemented by storage backends (e.g. `nyaya-store-sqlite`). The API and
//! server crates depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::records::{
  AccessLog, AccessLogQuery, AnalyticsRow, ChatSession, DailyStat, Feedback,
  KanoonCaseResult, KanoonQuery, LlmOutput, LlmOutputQuery, MetricType,
  NewAccessLog, NewChatSession, NewFeedback, NewKanoonQuery, NewLlmOutput,
  NewMessage, NewPdfUpload, NewUser, NewUserSession, PdfStatusUpdate,
  PdfTextChunk, PdfUpload, PopularSearch, RateLimitKey, RateLimitWindow,
  StoredMessage, User, UserSession,
};

/// Abstraction over the logging and analytics database.
///
/// Ownership chains cascade on delete (user → chat sessions → messages,
/// user → login sessions, upload → chunks, case search → case results).
/// Logging rows survive deletion of what they point at with the link nulled.
///
/// Daily counters in `analytics` are maintained by the backend itself when
/// LLM outputs, case searches, PDF uploads and user messages are recorded;
/// callers never write them directly.
pub trait LogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create a user. Fails if the e-mail is already registered.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_user_by_uuid(
    &self,
    user_uuid: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn update_last_login(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete a user and everything the user owns.
  fn delete_user(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn create_user_session(
    &self,
    input: NewUserSession,
  ) -> impl Future<Output = Result<UserSession, Self::Error>> + Send + '_;

  fn get_user_session(
    &self,
    session_token: String,
  ) -> impl Future<Output = Result<Option<UserSession>, Self::Error>> + Send + '_;

  // ── Chat sessions & messages ──────────────────────────────────────────

  fn create_chat_session(
    &self,
    input: NewChatSession,
  ) -> impl Future<Output = Result<ChatSession, Self::Error>> + Send + '_;

  fn get_chat_session(
    &self,
    session_uuid: Uuid,
  ) -> impl Future<Output = Result<Option<ChatSession>, Self::Error>> + Send + '_;

  /// A user's sessions, most recently updated first.
  fn user_chat_sessions(
    &self,
    user_id: i64,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<ChatSession>, Self::Error>> + Send + '_;

  fn update_session_title(
    &self,
    session_id: i64,
    title: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn set_session_archived(
    &self,
    session_id: i64,
    archived: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn add_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<StoredMessage, Self::Error>> + Send + '_;

  /// Messages of a session in insertion order.
  fn session_messages(
    &self,
    session_id: i64,
  ) -> impl Future<Output = Result<Vec<StoredMessage>, Self::Error>> + Send + '_;

  // ── Backend call logs ─────────────────────────────────────────────────

  fn log_llm_output(
    &self,
    input: NewLlmOutput,
  ) -> impl Future<Output = Result<LlmOutput, Self::Error>> + Send + '_;

  /// Most recent first.
  fn llm_outputs(
    &self,
    query: LlmOutputQuery,
  ) -> impl Future<Output = Result<Vec<LlmOutput>, Self::Error>> + Send + '_;

  /// Record a case search and its ranked results in one transaction.
  fn log_kanoon_query(
    &self,
    input: NewKanoonQuery,
  ) -> impl Future<Output = Result<KanoonQuery, Self::Error>> + Send + '_;

  /// Most recent first, optionally filtered by a substring of the query.
  fn kanoon_queries(
    &self,
    search_term: Option<String>,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<KanoonQuery>, Self::Error>> + Send + '_;

  fn case_results(
    &self,
    query_id: i64,
  ) -> impl Future<Output = Result<Vec<KanoonCaseResult>, Self::Error>> + Send + '_;

  // ── PDF uploads ───────────────────────────────────────────────────────

  fn log_pdf_upload(
    &self,
    input: NewPdfUpload,
  ) -> impl Future<Output = Result<PdfUpload, Self::Error>> + Send + '_;

  /// Apply a status transition. Terminal states (`completed`, `failed`)
  /// stamp `processed_at` and are final; later updates are rejected.
  fn update_pdf_status(
    &self,
    update: PdfStatusUpdate,
  ) -> impl Future<Output = Result<PdfUpload, Self::Error>> + Send + '_;

  /// Append chunks, indexed from the current chunk count.
  fn add_pdf_chunks(
    &self,
    upload_id: i64,
    chunks: Vec<String>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn pdf_chunks(
    &self,
    upload_id: i64,
  ) -> impl Future<Output = Result<Vec<PdfTextChunk>, Self::Error>> + Send + '_;

  // ── Access logs, feedback, rate limits ────────────────────────────────

  fn log_access(
    &self,
    input: NewAccessLog,
  ) -> impl Future<Output = Result<AccessLog, Self::Error>> + Send + '_;

  /// Most recent first.
  fn access_logs(
    &self,
    query: AccessLogQuery,
  ) -> impl Future<Output = Result<Vec<AccessLog>, Self::Error>> + Send + '_;

  fn add_feedback(
    &self,
    input: NewFeedback,
  ) -> impl Future<Output = Result<Feedback, Self::Error>> + Send + '_;

  /// Count one request against `key`'s window, opening a fresh window of
  /// length `window` at `now` when none is live.
  fn hit_rate_limit(
    &self,
    key: RateLimitKey,
    window: Duration,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<RateLimitWindow, Self::Error>> + Send + '_;

  // ── Analytics ─────────────────────────────────────────────────────────

  /// Counter value for one day, `0` when no row exists.
  fn metric(
    &self,
    date: NaiveDate,
    metric: MetricType,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// All counter rows on or after `since`, newest first.
  fn analytics(
    &self,
    since: NaiveDate,
  ) -> impl Future<Output = Result<Vec<AnalyticsRow>, Self::Error>> + Send + '_;

  /// Requests and distinct users per day from the access log, newest first.
  fn daily_stats(
    &self,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<DailyStat>, Self::Error>> + Send + '_;

  /// Most frequent successful case-search queries.
  fn popular_searches(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<PopularSearch>, Self::Error>> + Send + '_;
}
