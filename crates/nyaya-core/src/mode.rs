//! The active interaction contract of a chat session.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which backend contract a submission is routed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatMode {
  /// Question-answering over the PDFs uploaded in this session.
  #[default]
  PdfChat,
  /// Free-text case-law search.
  KanoonSearch,
  /// Old-code → new-code section lookup.
  LawComparison,
}

impl ChatMode {
  pub const ALL: [ChatMode; 3] =
    [ChatMode::PdfChat, ChatMode::KanoonSearch, ChatMode::LawComparison];

  pub fn as_str(self) -> &'static str {
    match self {
      ChatMode::PdfChat => "PDF_CHAT",
      ChatMode::KanoonSearch => "KANOON_SEARCH",
      ChatMode::LawComparison => "LAW_COMPARISON",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      ChatMode::PdfChat => "PDF Chat",
      ChatMode::KanoonSearch => "Case Search",
      ChatMode::LawComparison => "Law Comparison",
    }
  }

  /// The next mode in display order, wrapping around.
  pub fn next(self) -> Self {
    match self {
      ChatMode::PdfChat => ChatMode::KanoonSearch,
      ChatMode::KanoonSearch => ChatMode::LawComparison,
      ChatMode::LawComparison => ChatMode::PdfChat,
    }
  }
}

impl fmt::Display for ChatMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
