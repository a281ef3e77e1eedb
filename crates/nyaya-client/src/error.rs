//! Error types for the NyayAssist client.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
  /// The server answered with a non-success status. `detail` is the server's
  /// own message when it sent one, else a fixed per-call fallback.
  #[error("{detail}")]
  Server { status: u16, detail: String },

  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("cannot read {path}: {source}")]
  File {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },
}

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("session file {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed session file: {0}")]
  Json(#[from] serde_json::Error),
}
