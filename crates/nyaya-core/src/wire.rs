//! JSON request and response bodies shared by the server and the client.
//!
//! Field names match the HTTP contract exactly; optional fields are omitted
//! when absent.

use serde::{Deserialize, Serialize};

use crate::{
  law::LawComparison,
  records::{DailyStat, FeedbackType, PopularSearch, SessionMode},
  search::CaseResult,
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Body of every non-success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
  pub detail: String,
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
  pub full_name: String,
  pub email:     String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone:     Option<String>,
  pub password:  String,
  pub otp:       String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
  pub user_uuid: String,
  pub full_name: String,
  pub email:     String,
  pub success:   bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendCodeRequest {
  pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendCodeResponse {
  pub success: bool,
  pub message: String,
}

// ─── Chat sessions ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreateRequest {
  pub chat_mode: SessionMode,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_uuid: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title:     Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreateResponse {
  pub session_uuid: String,
  pub title:        String,
  pub success:      bool,
}

// ─── PDF ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
  pub message:          String,
  pub chunks_processed: u32,
  pub success:          bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub upload_id:        Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
  pub question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
  pub answer:          String,
  pub success:         bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message_id:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub law_comparisons: Option<Vec<LawComparison>>,
}

// ─── Case search ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
  pub query: String,
  #[serde(default)]
  pub page:  u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
  pub cases:           Vec<CaseResult>,
  pub total_found:     u32,
  pub success:         bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub query_id:        Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub law_comparisons: Option<Vec<LawComparison>>,
}

// ─── Law comparison ──────────────────────────────────────────────────────────

/// `law_type` is kept as free text so the server can report invalid codes
/// in-band rather than rejecting the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareRequest {
  pub law_type: String,
  pub section:  String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareResponse {
  pub success:    bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub comparison: Option<LawComparison>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error:      Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCompareRequest {
  pub sections: Vec<CompareRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotFoundSection {
  pub law_type: String,
  pub section:  String,
  pub reason:   String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCompareResponse {
  pub success:     bool,
  pub comparisons: Vec<LawComparison>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub not_found:   Option<Vec<NotFoundSection>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
  pub section:     String,
  pub title:       String,
  pub new_section: String,
  pub new_law:     String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionsResponse {
  pub success:        bool,
  pub law_type:       String,
  pub total_sections: usize,
  pub sections:       Vec<SectionSummary>,
}

// ─── Feedback ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
  pub feedback_type: FeedbackType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message_id:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rating:        Option<u8>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub feedback_text: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user_uuid:     Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
  pub success:     bool,
  pub feedback_id: String,
}

// ─── Service ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
  pub status:   String,
  pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
  pub success:          bool,
  pub daily_stats:      Vec<DailyStat>,
  pub popular_searches: Vec<PopularSearch>,
}
