//! Async HTTP client wrapping the NyayAssist JSON API.
//!
//! One round trip per call. No retries, and no client-side timeout: PDF
//! processing and LLM answers can legitimately take minutes.

use std::path::PathBuf;

use nyaya_core::{
  law::LawCode,
  wire::{
    BulkCompareRequest, BulkCompareResponse, ChatRequest, ChatResponse, CompareRequest,
    CompareResponse, FeedbackRequest, FeedbackResponse, LoginRequest, RegisterRequest,
    SearchRequest, SearchResponse, SectionsResponse, SendCodeRequest, SendCodeResponse,
    SessionCreateRequest, SessionCreateResponse, StatsResponse, UploadResponse, UserResponse,
  },
};
use reqwest::{
  Client, RequestBuilder, Response,
  multipart::{Form, Part},
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ClientError;

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

const PDF_MIME: &str = "application/pdf";

/// Connection settings for the NyayAssist API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url:  String,
  /// Sent as `X-User-UUID` so the server can attribute requests.
  pub user_uuid: Option<String>,
}

/// Async HTTP client for the NyayAssist JSON API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:     Client,
  config:     ApiConfig,
  session_id: String,
}

/// The `detail` string of an error body, or `fallback` when the body is
/// empty, not JSON, or carries no string `detail`.
pub fn detail_from_body(body: &[u8], fallback: &str) -> String {
  serde_json::from_slice::<serde_json::Value>(body)
    .ok()
    .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_owned))
    .unwrap_or_else(|| fallback.to_owned())
}

async fn decode<T: DeserializeOwned>(resp: Response, fallback: &str) -> Result<T> {
  let status = resp.status();
  if !status.is_success() {
    let body = resp.bytes().await.unwrap_or_default();
    return Err(ClientError::Server {
      status: status.as_u16(),
      detail: detail_from_body(&body, fallback),
    });
  }
  Ok(resp.json().await?)
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder().build()?;
    Ok(Self { client, config, session_id: Uuid::new_v4().to_string() })
  }

  pub fn base_url(&self) -> &str { self.config.base_url.trim_end_matches('/') }

  fn url(&self, path: &str) -> String { format!("{}/api{}", self.base_url(), path) }

  fn tag(&self, req: RequestBuilder) -> RequestBuilder {
    let req = req.header("X-Session-ID", &self.session_id);
    match &self.config.user_uuid {
      Some(uuid) => req.header("X-User-UUID", uuid),
      None => req,
    }
  }

  async fn post<B, T>(&self, path: &str, body: &B, fallback: &str) -> Result<T>
  where
    B: serde::Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let resp = self
      .tag(self.client.post(self.url(path)))
      .json(body)
      .send()
      .await?;
    decode(resp, fallback).await
  }

  // ── Accounts ──────────────────────────────────────────────────────────────

  /// `POST /api/users/register`
  pub async fn register(&self, request: &RegisterRequest) -> Result<UserResponse> {
    self.post("/users/register", request, "Registration failed").await
  }

  /// `POST /api/users/login`
  pub async fn login(&self, request: &LoginRequest) -> Result<UserResponse> {
    self.post("/users/login", request, "Login failed").await
  }

  /// `POST /api/users/send-otp`
  pub async fn send_code(&self, email: &str) -> Result<SendCodeResponse> {
    let body = SendCodeRequest { email: email.to_owned() };
    self.post("/users/send-otp", &body, "Failed to send verification code").await
  }

  /// `POST /api/sessions/create`
  pub async fn create_session(
    &self,
    request: &SessionCreateRequest,
  ) -> Result<SessionCreateResponse> {
    self.post("/sessions/create", request, "Failed to create session").await
  }

  // ── PDF ───────────────────────────────────────────────────────────────────

  /// `POST /api/pdf/upload`, every file in one multipart `files` field list.
  pub async fn upload_pdfs(&self, paths: &[PathBuf]) -> Result<UploadResponse> {
    let mut form = Form::new();
    for path in paths {
      let data = tokio::fs::read(path)
        .await
        .map_err(|source| ClientError::File { path: path.clone(), source })?;
      let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.pdf".to_owned());
      form = form.part("files", Part::bytes(data).file_name(name).mime_str(PDF_MIME)?);
    }

    let resp = self
      .tag(self.client.post(self.url("/pdf/upload")))
      .multipart(form)
      .send()
      .await?;
    decode(resp, "Upload failed").await
  }

  /// `POST /api/pdf/chat`
  pub async fn ask(&self, question: &str) -> Result<ChatResponse> {
    let body = ChatRequest { question: question.to_owned() };
    self.post("/pdf/chat", &body, "Failed to get answer").await
  }

  // ── Case search ───────────────────────────────────────────────────────────

  /// `POST /api/kanoon/search`
  pub async fn search(&self, query: &str, page: u32) -> Result<SearchResponse> {
    let body = SearchRequest { query: query.to_owned(), page };
    self.post("/kanoon/search", &body, "Search failed").await
  }

  // ── Law comparison ────────────────────────────────────────────────────────

  /// `POST /api/law/compare`
  pub async fn compare(&self, code: LawCode, section: &str) -> Result<CompareResponse> {
    let body = CompareRequest {
      law_type: code.as_str().to_owned(),
      section:  section.to_owned(),
    };
    self.post("/law/compare", &body, "Comparison failed").await
  }

  /// `POST /api/law/compare/bulk`
  pub async fn compare_bulk(&self, request: &BulkCompareRequest) -> Result<BulkCompareResponse> {
    self.post("/law/compare/bulk", request, "Bulk comparison failed").await
  }

  /// `GET /api/law/sections/{law_type}`
  pub async fn sections(&self, code: LawCode) -> Result<SectionsResponse> {
    let resp = self
      .tag(self.client.get(self.url(&format!("/law/sections/{}", code.as_str()))))
      .send()
      .await?;
    decode(resp, "Failed to list sections").await
  }

  // ── Feedback & analytics ──────────────────────────────────────────────────

  /// `POST /api/feedback`
  pub async fn feedback(&self, request: &FeedbackRequest) -> Result<FeedbackResponse> {
    self.post("/feedback", request, "Failed to submit feedback").await
  }

  /// `GET /api/analytics/stats` with admin basic-auth.
  pub async fn stats(&self, username: &str, password: &str) -> Result<StatsResponse> {
    let resp = self
      .tag(self.client.get(self.url("/analytics/stats")))
      .basic_auth(username, Some(password))
      .send()
      .await?;
    decode(resp, "Failed to load statistics").await
  }

  // ── Health ────────────────────────────────────────────────────────────────

  /// `GET /health`. Any failure, including transport errors, is `false`.
  pub async fn health(&self) -> bool {
    match self.client.get(format!("{}/health", self.base_url())).send().await {
      Ok(resp) => resp.status().is_success(),
      Err(e) => {
        tracing::debug!(error = %e, "health check failed");
        false
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detail_is_taken_from_json_body() {
    let body = br#"{"detail":"Invalid email or password"}"#;
    assert_eq!(detail_from_body(body, "Login failed"), "Invalid email or password");
  }

  #[test]
  fn fallback_when_detail_is_missing_or_not_a_string() {
    assert_eq!(detail_from_body(b"", "Login failed"), "Login failed");
    assert_eq!(detail_from_body(b"<html>502</html>", "Login failed"), "Login failed");
    assert_eq!(detail_from_body(br#"{"detail":[{"msg":"x"}]}"#, "Login failed"), "Login failed");
    assert_eq!(detail_from_body(br#"{"error":"nope"}"#, "Login failed"), "Login failed");
  }

  #[test]
  fn url_joins_without_double_slash() {
    let client = ApiClient::new(ApiConfig {
      base_url:  "http://localhost:8000/".into(),
      user_uuid: None,
    })
    .unwrap();
    assert_eq!(client.url("/law/compare"), "http://localhost:8000/api/law/compare");
  }
}
