//! Error types for `nyaya-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown law code: {0:?}")]
  UnknownLawCode(String),

  #[error("unknown {domain} value: {value:?}")]
  UnknownEnumValue { domain: &'static str, value: String },

  #[error("chat mode {0} cannot be persisted")]
  UnpersistableMode(crate::mode::ChatMode),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
