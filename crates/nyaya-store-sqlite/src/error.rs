//! Error type for `nyaya-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] nyaya_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("email already registered: {0}")]
  EmailTaken(String),

  #[error("user not found: {0}")]
  UserNotFound(i64),

  #[error("chat session not found: {0}")]
  SessionNotFound(i64),

  #[error("pdf upload not found: {0}")]
  UploadNotFound(i64),

  #[error("pdf upload {0} has already finished processing")]
  UploadFinished(i64),

  #[error("rating must be between 1 and 5, got {0}")]
  InvalidRating(u8),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
