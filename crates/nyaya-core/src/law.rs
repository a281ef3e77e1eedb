//! Law codes, section comparisons, and free-text section parsing.
//!
//! The three colonial-era criminal codes were replaced on 1 July 2024:
//!
//! | Old  | New  |
//! |------|------|
//! | IPC  | BNS  |
//! | CRPC | BNSS |
//! | IEA  | BEA  |
//!
//! A [`LawComparison`] maps one old section to its successor, or records that
//! the section was dropped (`new_section == "OMITTED"`).

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Sentinel `new_section` value for a repealed provision with no successor.
pub const OMITTED: &str = "OMITTED";

// ─── LawCode ─────────────────────────────────────────────────────────────────

/// One of the superseded codes that can be looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LawCode {
  Ipc,
  Crpc,
  Iea,
}

impl LawCode {
  /// All codes, in the order free-text detection checks them.
  pub const ALL: [LawCode; 3] = [LawCode::Crpc, LawCode::Iea, LawCode::Ipc];

  pub fn as_str(self) -> &'static str {
    match self {
      LawCode::Ipc => "IPC",
      LawCode::Crpc => "CRPC",
      LawCode::Iea => "IEA",
    }
  }

  pub fn full_name(self) -> &'static str {
    match self {
      LawCode::Ipc => "Indian Penal Code",
      LawCode::Crpc => "Code of Criminal Procedure",
      LawCode::Iea => "Indian Evidence Act",
    }
  }

  /// Short code of the law that replaced this one.
  pub fn successor(self) -> &'static str {
    match self {
      LawCode::Ipc => "BNS",
      LawCode::Crpc => "BNSS",
      LawCode::Iea => "BEA",
    }
  }

  pub fn successor_full_name(self) -> &'static str {
    match self {
      LawCode::Ipc => "Bharatiya Nyaya Sanhita",
      LawCode::Crpc => "Bharatiya Nagarik Suraksha Sanhita",
      LawCode::Iea => "Bharatiya Sakshya Adhiniyam",
    }
  }

  /// Top-level key of this code's table in the mapping document.
  pub fn mapping_key(self) -> &'static str {
    match self {
      LawCode::Ipc => "IPC_TO_BNS",
      LawCode::Crpc => "CRPC_TO_BNSS",
      LawCode::Iea => "IEA_TO_BEA",
    }
  }
}

impl fmt::Display for LawCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for LawCode {
  type Err = Error;

  /// Case-insensitive; surrounding whitespace is ignored.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "IPC" => Ok(LawCode::Ipc),
      "CRPC" => Ok(LawCode::Crpc),
      "IEA" => Ok(LawCode::Iea),
      _ => Err(Error::UnknownLawCode(s.to_owned())),
    }
  }
}

// ─── LawComparison ───────────────────────────────────────────────────────────

/// A mapping between a section of a superseded code and its successor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawComparison {
  pub old_law:       String,
  pub old_section:   String,
  pub old_title:     String,
  pub new_law:       String,
  pub new_section:   String,
  pub new_title:     String,
  /// A diff summary, or an explanation when the section was omitted.
  pub changes:       String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub original_text: Option<String>,
}

impl LawComparison {
  /// `true` when the old section has no successor in the new code.
  pub fn is_omitted(&self) -> bool { self.new_section == OMITTED }
}

// ─── Free-text parsing ───────────────────────────────────────────────────────

static CODE_PATTERNS: LazyLock<Vec<(LawCode, Regex)>> = LazyLock::new(|| {
  LawCode::ALL
    .iter()
    .map(|code| {
      let re = Regex::new(&format!(r"(?i)\b{}\b", code.as_str()))
        .expect("law code pattern is a valid regex");
      (*code, re)
    })
    .collect()
});

// Digits, an optional letter, an optional hyphen-letter suffix: 302, 304A, 120-B.
static SECTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\d+[A-Za-z]?(?:-[A-Za-z])?").expect("section pattern is a valid regex")
});

/// A law code plus the section tokens requested in one comparison query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonQuery {
  pub code:     LawCode,
  /// Normalised, de-duplicated, in first-seen order.
  pub sections: Vec<String>,
}

impl ComparisonQuery {
  /// Parse free text such as `"crpc 154, 156"` or `"IPC 120-B"`.
  ///
  /// The code defaults to [`LawCode::Ipc`] when none is named. The section
  /// list may be empty.
  pub fn parse(input: &str) -> Self {
    Self {
      code:     detect_code(input),
      sections: extract_sections(input),
    }
  }
}

/// First of `CRPC`, `IEA`, `IPC` named in `input` as a whole word; `IPC` if none.
pub fn detect_code(input: &str) -> LawCode {
  CODE_PATTERNS
    .iter()
    .find(|(_, re)| re.is_match(input))
    .map(|(code, _)| *code)
    .unwrap_or(LawCode::Ipc)
}

/// Every section token in `input`, uppercased with hyphens removed.
pub fn extract_sections(input: &str) -> Vec<String> {
  let mut sections: Vec<String> = Vec::new();
  for m in SECTION_PATTERN.find_iter(input) {
    let token = normalize_section(m.as_str());
    if !sections.contains(&token) {
      sections.push(token);
    }
  }
  sections
}

pub fn normalize_section(raw: &str) -> String {
  raw.trim().replace('-', "").to_ascii_uppercase()
}

/// Sort key used for section listings: numeric prefix, then the full token.
pub fn section_sort_key(section: &str) -> (u64, String) {
  let digits: String = section.chars().filter(char::is_ascii_digit).collect();
  (digits.parse().unwrap_or(0), section.to_owned())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_to_ipc() {
    let q = ComparisonQuery::parse("302 376");
    assert_eq!(q.code, LawCode::Ipc);
  }

  #[test]
  fn ipc_two_sections_in_order() {
    let q = ComparisonQuery::parse("IPC 302 376");
    assert_eq!(q.code, LawCode::Ipc);
    assert_eq!(q.sections, vec!["302", "376"]);
  }

  #[test]
  fn duplicate_sections_are_dropped() {
    let q = ComparisonQuery::parse("IPC 302 302");
    assert_eq!(q.sections, vec!["302"]);
  }

  #[test]
  fn crpc_is_case_insensitive() {
    assert_eq!(ComparisonQuery::parse("CRPC 154 156").code, LawCode::Crpc);
    assert_eq!(ComparisonQuery::parse("crpc 154 156").code, LawCode::Crpc);
    assert_eq!(ComparisonQuery::parse("CrPC 154").sections, vec!["154"]);
  }

  #[test]
  fn code_must_be_a_whole_word() {
    // "IPCX" is not IPC, and "crpcs" is not CRPC.
    assert_eq!(detect_code("crpcs 154"), LawCode::Ipc);
    assert_eq!(detect_code("IEA 65B"), LawCode::Iea);
  }

  #[test]
  fn hyphenated_section_is_normalised() {
    assert_eq!(extract_sections("120-B"), vec!["120B"]);
    assert_eq!(extract_sections("section 304a"), vec!["304A"]);
  }

  #[test]
  fn hyphenated_and_plain_forms_collapse() {
    assert_eq!(extract_sections("120B and 120-b"), vec!["120B"]);
  }

  #[test]
  fn no_digits_yields_no_sections() {
    assert!(extract_sections("murder and theft under IPC").is_empty());
  }

  #[test]
  fn law_code_from_str() {
    assert_eq!("iea".parse::<LawCode>().unwrap(), LawCode::Iea);
    assert!("BNS".parse::<LawCode>().is_err());
  }

  #[test]
  fn sort_key_orders_numerically() {
    let mut sections = vec!["376", "120B", "34", "120A"];
    sections.sort_by_key(|s| section_sort_key(s));
    assert_eq!(sections, vec!["34", "120A", "120B", "376"]);
  }
}
