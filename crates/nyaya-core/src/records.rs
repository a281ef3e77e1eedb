//! Persisted entities of the logging and analytics schema.
//!
//! Integer `id`s are store-assigned row keys used for foreign keys; the
//! `*_uuid` fields are the identifiers exposed over HTTP.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error,
  message::{MessageType, Role},
  mode::ChatMode,
};

// ─── Enum domains ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
  #[default]
  User,
  Admin,
  Moderator,
}

impl UserRole {
  pub fn as_str(self) -> &'static str {
    match self {
      UserRole::User => "user",
      UserRole::Admin => "admin",
      UserRole::Moderator => "moderator",
    }
  }
}

impl FromStr for UserRole {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "user" => Ok(UserRole::User),
      "admin" => Ok(UserRole::Admin),
      "moderator" => Ok(UserRole::Moderator),
      other => Err(unknown("user role", other)),
    }
  }
}

/// The subset of [`ChatMode`]s a chat session can be persisted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionMode {
  PdfChat,
  KanoonSearch,
}

impl SessionMode {
  pub fn as_str(self) -> &'static str {
    match self {
      SessionMode::PdfChat => "PDF_CHAT",
      SessionMode::KanoonSearch => "KANOON_SEARCH",
    }
  }
}

impl FromStr for SessionMode {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "PDF_CHAT" => Ok(SessionMode::PdfChat),
      "KANOON_SEARCH" => Ok(SessionMode::KanoonSearch),
      other => Err(unknown("chat mode", other)),
    }
  }
}

impl TryFrom<ChatMode> for SessionMode {
  type Error = Error;

  fn try_from(mode: ChatMode) -> Result<Self, Self::Error> {
    match mode {
      ChatMode::PdfChat => Ok(SessionMode::PdfChat),
      ChatMode::KanoonSearch => Ok(SessionMode::KanoonSearch),
      ChatMode::LawComparison => Err(Error::UnpersistableMode(mode)),
    }
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "user" => Ok(Role::User),
      "assistant" => Ok(Role::Assistant),
      "system" => Ok(Role::System),
      other => Err(unknown("message role", other)),
    }
  }
}

impl FromStr for MessageType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "text" => Ok(MessageType::Text),
      "cases" => Ok(MessageType::Cases),
      "error" => Ok(MessageType::Error),
      "system" => Ok(MessageType::System),
      other => Err(unknown("message type", other)),
    }
  }
}

/// PDF processing lifecycle: `pending → processing → completed | failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
  #[default]
  Pending,
  Processing,
  Completed,
  Failed,
}

impl ProcessingStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      ProcessingStatus::Pending => "pending",
      ProcessingStatus::Processing => "processing",
      ProcessingStatus::Completed => "completed",
      ProcessingStatus::Failed => "failed",
    }
  }

  /// `completed` and `failed` are terminal.
  pub fn is_terminal(self) -> bool {
    matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
  }
}

impl FromStr for ProcessingStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(ProcessingStatus::Pending),
      "processing" => Ok(ProcessingStatus::Processing),
      "completed" => Ok(ProcessingStatus::Completed),
      "failed" => Ok(ProcessingStatus::Failed),
      other => Err(unknown("processing status", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
  Helpful,
  NotHelpful,
  Incorrect,
  Offensive,
  Other,
}

impl FeedbackType {
  pub fn as_str(self) -> &'static str {
    match self {
      FeedbackType::Helpful => "helpful",
      FeedbackType::NotHelpful => "not_helpful",
      FeedbackType::Incorrect => "incorrect",
      FeedbackType::Offensive => "offensive",
      FeedbackType::Other => "other",
    }
  }
}

impl FromStr for FeedbackType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "helpful" => Ok(FeedbackType::Helpful),
      "not_helpful" => Ok(FeedbackType::NotHelpful),
      "incorrect" => Ok(FeedbackType::Incorrect),
      "offensive" => Ok(FeedbackType::Offensive),
      "other" => Ok(FeedbackType::Other),
      other => Err(unknown("feedback type", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
  DailyUsers,
  DailyQueries,
  PdfUploads,
  KanoonSearches,
  LlmCalls,
}

impl MetricType {
  pub fn as_str(self) -> &'static str {
    match self {
      MetricType::DailyUsers => "daily_users",
      MetricType::DailyQueries => "daily_queries",
      MetricType::PdfUploads => "pdf_uploads",
      MetricType::KanoonSearches => "kanoon_searches",
      MetricType::LlmCalls => "llm_calls",
    }
  }
}

impl FromStr for MetricType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "daily_users" => Ok(MetricType::DailyUsers),
      "daily_queries" => Ok(MetricType::DailyQueries),
      "pdf_uploads" => Ok(MetricType::PdfUploads),
      "kanoon_searches" => Ok(MetricType::KanoonSearches),
      "llm_calls" => Ok(MetricType::LlmCalls),
      other => Err(unknown("metric type", other)),
    }
  }
}

impl fmt::Display for MetricType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

fn unknown(domain: &'static str, value: &str) -> Error {
  Error::UnknownEnumValue { domain, value: value.to_owned() }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:            i64,
  pub user_uuid:     Uuid,
  pub full_name:     String,
  pub email:         String,
  pub phone:         Option<String>,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub is_active:     bool,
  pub is_verified:   bool,
  pub role:          UserRole,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
  pub last_login_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub full_name:     String,
  pub email:         String,
  pub phone:         Option<String>,
  pub password_hash: String,
  pub role:          UserRole,
}

/// A login token row; deleted together with its user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
  pub id:               i64,
  pub session_token:    String,
  pub user_id:          i64,
  pub ip_address:       Option<String>,
  pub user_agent:       Option<String>,
  pub is_active:        bool,
  pub created_at:       DateTime<Utc>,
  pub expires_at:       DateTime<Utc>,
  pub last_activity_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUserSession {
  pub session_token: String,
  pub user_id:       i64,
  pub ip_address:    Option<String>,
  pub user_agent:    Option<String>,
  pub expires_at:    DateTime<Utc>,
}

// ─── Chat ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
  pub id:           i64,
  pub session_uuid: Uuid,
  pub user_id:      Option<i64>,
  pub title:        String,
  pub chat_mode:    SessionMode,
  pub folder:       Option<String>,
  pub is_archived:  bool,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChatSession {
  pub user_id:   Option<i64>,
  pub chat_mode: SessionMode,
  /// Defaults to `"New Chat"`.
  pub title:     Option<String>,
  pub folder:    Option<String>,
}

/// Persisted mirror of a transcript message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
  pub id:           i64,
  pub message_uuid: Uuid,
  pub session_id:   i64,
  pub role:         Role,
  pub content:      String,
  pub message_type: MessageType,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
  pub session_id:   i64,
  pub role:         Role,
  pub content:      String,
  pub message_type: MessageType,
}

impl NewMessage {
  /// Mirror a client transcript message into `session_id`.
  pub fn from_transcript(session_id: i64, message: &crate::message::Message) -> Self {
    Self {
      session_id,
      role:         message.role,
      content:      message.content().to_owned(),
      message_type: message.body.message_type(),
    }
  }
}

// ─── LLM outputs ─────────────────────────────────────────────────────────────

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmOutput {
  pub id:               i64,
  pub output_uuid:      Uuid,
  pub user_id:          Option<i64>,
  pub session_id:       Option<i64>,
  pub message_id:       Option<i64>,
  pub model_name:       String,
  pub prompt_template:  Option<String>,
  pub context_provided: Option<String>,
  pub user_question:    String,
  pub llm_response:     String,
  pub tokens_used:      Option<i64>,
  pub response_time_ms: Option<i64>,
  pub temperature:      f64,
  pub success:          bool,
  pub error_message:    Option<String>,
  pub created_at:       DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewLlmOutput {
  pub user_id:          Option<i64>,
  pub session_id:       Option<i64>,
  pub message_id:       Option<i64>,
  pub model_name:       String,
  pub prompt_template:  Option<String>,
  pub context_provided: Option<String>,
  pub user_question:    String,
  pub llm_response:     String,
  pub tokens_used:      Option<i64>,
  pub response_time_ms: Option<i64>,
  pub temperature:      f64,
  pub success:          bool,
  pub error_message:    Option<String>,
}

impl NewLlmOutput {
  /// A successful call with the default model and temperature.
  pub fn new(question: impl Into<String>, response: impl Into<String>) -> Self {
    Self {
      user_id:          None,
      session_id:       None,
      message_id:       None,
      model_name:       DEFAULT_MODEL.to_owned(),
      prompt_template:  None,
      context_provided: None,
      user_question:    question.into(),
      llm_response:     response.into(),
      tokens_used:      None,
      response_time_ms: None,
      temperature:      0.3,
      success:          true,
      error_message:    None,
    }
  }

  /// A failed call; the response text is empty.
  pub fn failed(question: impl Into<String>, error: impl Into<String>) -> Self {
    Self {
      success: false,
      error_message: Some(error.into()),
      ..Self::new(question, "")
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct LlmOutputQuery {
  pub user_id:    Option<i64>,
  pub session_id: Option<i64>,
  pub limit:      Option<usize>,
}

// ─── Case search ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KanoonQuery {
  pub id:                  i64,
  pub query_uuid:          Uuid,
  pub user_id:             Option<i64>,
  pub session_id:          Option<i64>,
  pub message_id:          Option<i64>,
  pub search_query:        String,
  pub page_number:         i64,
  pub total_results_found: i64,
  pub results_returned:    i64,
  pub response_time_ms:    Option<i64>,
  pub success:             bool,
  pub error_message:       Option<String>,
  pub raw_api_response:    Option<serde_json::Value>,
  pub created_at:          DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewKanoonQuery {
  pub user_id:             Option<i64>,
  pub session_id:          Option<i64>,
  pub message_id:          Option<i64>,
  pub search_query:        String,
  pub page_number:         i64,
  pub total_results_found: i64,
  pub results_returned:    i64,
  pub response_time_ms:    Option<i64>,
  pub success:             bool,
  pub error_message:       Option<String>,
  pub raw_api_response:    Option<serde_json::Value>,
  /// Stored as child rows ranked by position.
  pub case_results:        Vec<NewCaseResult>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCaseResult {
  pub doc_id:    String,
  pub title:     Option<String>,
  pub snippet:   Option<String>,
  pub case_link: Option<String>,
  pub headline:  Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KanoonCaseResult {
  pub id:          i64,
  pub query_id:    i64,
  pub doc_id:      String,
  pub title:       Option<String>,
  pub snippet:     Option<String>,
  pub case_link:   Option<String>,
  pub headline:    Option<String>,
  pub result_rank: i64,
  pub created_at:  DateTime<Utc>,
}

// ─── PDF uploads ─────────────────────────────────────────────────────────────

pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfUpload {
  pub id:                i64,
  pub upload_uuid:       Uuid,
  pub user_id:           Option<i64>,
  pub session_id:        Option<i64>,
  pub original_filename: String,
  pub file_size_bytes:   Option<i64>,
  pub file_hash:         Option<String>,
  pub mime_type:         String,
  pub pages_count:       Option<i64>,
  pub chunks_processed:  i64,
  pub chunk_size:        i64,
  pub chunk_overlap:     i64,
  pub index_path:        Option<String>,
  pub embedding_model:   String,
  pub processing_status: ProcessingStatus,
  pub error_message:     Option<String>,
  pub created_at:        DateTime<Utc>,
  pub processed_at:      Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPdfUpload {
  pub user_id:           Option<i64>,
  pub session_id:        Option<i64>,
  pub original_filename: String,
  /// Raw file bytes; the store records their size and SHA-256 hash.
  pub content:           Option<Vec<u8>>,
  pub pages_count:       Option<i64>,
  pub processing_status: ProcessingStatus,
}

/// A transition applied by [`crate::store::LogStore::update_pdf_status`].
#[derive(Debug, Clone)]
pub struct PdfStatusUpdate {
  pub upload_id:        i64,
  pub status:           ProcessingStatus,
  pub chunks_processed: Option<i64>,
  pub error_message:    Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfTextChunk {
  pub id:          i64,
  pub upload_id:   i64,
  pub chunk_index: i64,
  pub chunk_text:  String,
  pub chunk_hash:  String,
  pub created_at:  DateTime<Utc>,
}

// ─── Access logs ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessLog {
  pub id:                   i64,
  pub user_id:              Option<i64>,
  pub user_uuid:            Option<String>,
  pub session_id:           Option<String>,
  pub ip_address:           Option<String>,
  pub user_agent:           Option<String>,
  pub endpoint:             String,
  pub http_method:          String,
  pub request_body:         Option<serde_json::Value>,
  pub response_status_code: Option<u16>,
  pub response_time_ms:     Option<i64>,
  pub error_message:        Option<String>,
  pub created_at:           DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewAccessLog {
  pub user_id:              Option<i64>,
  pub user_uuid:            Option<String>,
  pub session_id:           Option<String>,
  pub ip_address:           Option<String>,
  pub user_agent:           Option<String>,
  pub endpoint:             String,
  pub http_method:          String,
  pub request_body:         Option<serde_json::Value>,
  pub response_status_code: Option<u16>,
  pub response_time_ms:     Option<i64>,
  pub error_message:        Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AccessLogQuery {
  pub user_id:  Option<i64>,
  pub endpoint: Option<String>,
  pub limit:    Option<usize>,
}

// ─── Feedback ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
  pub id:              i64,
  pub feedback_uuid:   Uuid,
  pub user_id:         Option<i64>,
  pub message_id:      Option<i64>,
  pub llm_output_id:   Option<i64>,
  pub kanoon_query_id: Option<i64>,
  pub rating:          Option<u8>,
  pub feedback_type:   FeedbackType,
  pub feedback_text:   Option<String>,
  pub created_at:      DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
  pub user_id:       Option<i64>,
  /// UUID of a message, LLM output, or case-search query. Whichever table
  /// holds it is linked; an unknown UUID links nothing.
  pub target_uuid:   Option<Uuid>,
  pub rating:        Option<u8>,
  pub feedback_type: FeedbackType,
  pub feedback_text: Option<String>,
}

// ─── Rate limits ─────────────────────────────────────────────────────────────

/// Identifies one rate-limit counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitKey {
  pub user_id:    Option<i64>,
  pub ip_address: Option<String>,
  pub endpoint:   String,
}

/// The state of a counter after recording one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitWindow {
  pub request_count: u32,
  pub window_start:  DateTime<Utc>,
  pub window_end:    DateTime<Utc>,
}

// ─── Analytics ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsRow {
  pub date:         NaiveDate,
  pub metric_type:  MetricType,
  pub metric_value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
  pub date:           NaiveDate,
  pub total_requests: i64,
  pub unique_users:   i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularSearch {
  pub query: String,
  pub count: i64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn law_comparison_mode_is_not_persistable() {
    assert!(SessionMode::try_from(ChatMode::LawComparison).is_err());
    assert_eq!(
      SessionMode::try_from(ChatMode::KanoonSearch).unwrap(),
      SessionMode::KanoonSearch
    );
  }

  #[test]
  fn enum_domains_round_trip_through_strings() {
    for t in [
      FeedbackType::Helpful,
      FeedbackType::NotHelpful,
      FeedbackType::Incorrect,
      FeedbackType::Offensive,
      FeedbackType::Other,
    ] {
      assert_eq!(t.as_str().parse::<FeedbackType>().unwrap(), t);
    }
    assert!("sometimes".parse::<ProcessingStatus>().is_err());
  }

  #[test]
  fn failed_llm_output_defaults() {
    let out = NewLlmOutput::failed("q", "timeout");
    assert!(!out.success);
    assert_eq!(out.llm_response, "");
    assert_eq!(out.model_name, DEFAULT_MODEL);
  }
}
