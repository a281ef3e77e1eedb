//! Transcript messages.
//!
//! A message body is a closed sum type: each kind carries exactly the payload
//! it needs, so a `cases` message can never reach the renderer without its
//! case list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{law::LawComparison, search::CaseResult};

pub const WARNING_GLYPH: &str = "⚠️";
pub const FAILURE_GLYPH: &str = "❌";

// ─── Role ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Assistant,
  System,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::User => "user",
      Role::Assistant => "assistant",
      Role::System => "system",
    }
  }
}

// ─── Body ────────────────────────────────────────────────────────────────────

/// Content of a message, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageBody {
  /// Plain text, optionally with comparisons the backend chose to surface.
  Text {
    content:     String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    comparisons: Vec<LawComparison>,
  },
  /// A non-empty page of case-law search results.
  Cases {
    content:     String,
    cases:       Vec<CaseResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    comparisons: Vec<LawComparison>,
  },
  /// Section comparisons produced by a law-comparison query.
  Comparisons {
    content:     String,
    comparisons: Vec<LawComparison>,
  },
  /// A validation problem or partial failure.
  Warning { content: String },
  /// A failed call.
  Error { content: String },
  /// A status note, e.g. an upload summary.
  System { content: String },
}

/// The persisted `message_type` domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
  Text,
  Cases,
  Error,
  System,
}

impl MessageType {
  pub fn as_str(self) -> &'static str {
    match self {
      MessageType::Text => "text",
      MessageType::Cases => "cases",
      MessageType::Error => "error",
      MessageType::System => "system",
    }
  }
}

impl MessageBody {
  pub fn text(content: impl Into<String>) -> Self {
    MessageBody::Text { content: content.into(), comparisons: Vec::new() }
  }

  /// A warning; the content is prefixed with [`WARNING_GLYPH`].
  pub fn warning(content: impl AsRef<str>) -> Self {
    MessageBody::Warning {
      content: format!("{WARNING_GLYPH} {}", content.as_ref()),
    }
  }

  /// A failure; the content is prefixed with [`FAILURE_GLYPH`].
  pub fn error(content: impl AsRef<str>) -> Self {
    MessageBody::Error {
      content: format!("{FAILURE_GLYPH} {}", content.as_ref()),
    }
  }

  pub fn system(content: impl Into<String>) -> Self {
    MessageBody::System { content: content.into() }
  }

  pub fn content(&self) -> &str {
    match self {
      MessageBody::Text { content, .. }
      | MessageBody::Cases { content, .. }
      | MessageBody::Comparisons { content, .. }
      | MessageBody::Warning { content }
      | MessageBody::Error { content }
      | MessageBody::System { content } => content,
    }
  }

  /// Client-side kind tag.
  pub fn kind(&self) -> &'static str {
    match self {
      MessageBody::Text { .. } => "text",
      MessageBody::Cases { .. } => "cases",
      MessageBody::Comparisons { .. } => "comparisons",
      MessageBody::Warning { .. } => "warning",
      MessageBody::Error { .. } => "error",
      MessageBody::System { .. } => "system",
    }
  }

  /// The kind under which this body is persisted.
  pub fn message_type(&self) -> MessageType {
    match self {
      MessageBody::Text { .. } | MessageBody::Comparisons { .. } => MessageType::Text,
      MessageBody::Cases { .. } => MessageType::Cases,
      MessageBody::Warning { .. } | MessageBody::Error { .. } => MessageType::Error,
      MessageBody::System { .. } => MessageType::System,
    }
  }

  pub fn comparisons(&self) -> &[LawComparison] {
    match self {
      MessageBody::Text { comparisons, .. }
      | MessageBody::Cases { comparisons, .. }
      | MessageBody::Comparisons { comparisons, .. } => comparisons,
      _ => &[],
    }
  }
}

// ─── Message ─────────────────────────────────────────────────────────────────

/// One immutable transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub id:         Uuid,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
  pub body:       MessageBody,
}

impl Message {
  pub fn new(role: Role, body: MessageBody) -> Self {
    Self { id: Uuid::new_v4(), role, created_at: Utc::now(), body }
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self::new(Role::User, MessageBody::text(content))
  }

  pub fn assistant(body: MessageBody) -> Self { Self::new(Role::Assistant, body) }

  pub fn content(&self) -> &str { self.body.content() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn warning_and_error_carry_glyphs() {
    assert!(MessageBody::warning("no PDF").content().starts_with(WARNING_GLYPH));
    assert!(MessageBody::error("boom").content().starts_with(FAILURE_GLYPH));
  }

  #[test]
  fn comparisons_persist_as_text() {
    let body = MessageBody::Comparisons {
      content:     "Comparison for IPC Section 302:".into(),
      comparisons: Vec::new(),
    };
    assert_eq!(body.kind(), "comparisons");
    assert_eq!(body.message_type(), MessageType::Text);
    assert_eq!(MessageBody::warning("x").message_type(), MessageType::Error);
  }

  #[test]
  fn body_serialises_with_kind_tag() {
    let json = serde_json::to_value(MessageBody::system("ok")).unwrap();
    assert_eq!(json["kind"], "system");
    assert_eq!(json["content"], "ok");
  }
}
