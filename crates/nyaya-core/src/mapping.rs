//! The static old-code → new-code section table.
//!
//! Loaded from a JSON document shaped like:
//!
//! ```json
//! {
//!   "IPC_TO_BNS":   { "302": { "old_section": "302", "old_title": "...",
//!                              "new_section": "103", "new_title": "...",
//!                              "changes": "..." } },
//!   "CRPC_TO_BNSS": { },
//!   "IEA_TO_BEA":   { }
//! }
//! ```
//!
//! A missing table is treated as empty.

use std::{collections::HashMap, path::Path};

use serde::Deserialize;

use crate::{
  Result,
  law::{LawCode, LawComparison, normalize_section, section_sort_key},
  wire::SectionSummary,
};

/// One row of a code's table, before it is enriched with law codes.
#[derive(Debug, Clone, Deserialize)]
pub struct MappingEntry {
  pub old_section: String,
  #[serde(default)]
  pub old_title:   String,
  pub new_section: String,
  #[serde(default)]
  pub new_title:   String,
  #[serde(default)]
  pub changes:     String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LawMapping {
  #[serde(rename = "IPC_TO_BNS", default)]
  ipc:  HashMap<String, MappingEntry>,
  #[serde(rename = "CRPC_TO_BNSS", default)]
  crpc: HashMap<String, MappingEntry>,
  #[serde(rename = "IEA_TO_BEA", default)]
  iea:  HashMap<String, MappingEntry>,
}

impl LawMapping {
  pub fn from_json(raw: &str) -> Result<Self> { Ok(serde_json::from_str(raw)?) }

  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let raw = std::fs::read_to_string(path)?;
    Self::from_json(&raw)
  }

  fn table(&self, code: LawCode) -> &HashMap<String, MappingEntry> {
    match code {
      LawCode::Ipc => &self.ipc,
      LawCode::Crpc => &self.crpc,
      LawCode::Iea => &self.iea,
    }
  }

  /// Look up one section. The section token is normalised first, so `120-b`
  /// finds the `120B` entry.
  pub fn lookup(&self, code: LawCode, section: &str) -> Option<LawComparison> {
    let entry = self.table(code).get(&normalize_section(section))?;
    Some(LawComparison {
      old_law:       code.as_str().to_owned(),
      old_section:   entry.old_section.clone(),
      old_title:     entry.old_title.clone(),
      new_law:       code.successor().to_owned(),
      new_section:   entry.new_section.clone(),
      new_title:     entry.new_title.clone(),
      changes:       entry.changes.clone(),
      original_text: None,
    })
  }

  /// Every known section of `code`, sorted by numeric part then token.
  pub fn sections(&self, code: LawCode) -> Vec<SectionSummary> {
    let mut sections: Vec<SectionSummary> = self
      .table(code)
      .iter()
      .map(|(section, entry)| SectionSummary {
        section:     section.clone(),
        title:       entry.old_title.clone(),
        new_section: entry.new_section.clone(),
        new_law:     code.successor().to_owned(),
      })
      .collect();
    sections.sort_by_cached_key(|s| section_sort_key(&s.section));
    sections
  }

  pub fn len(&self) -> usize { self.ipc.len() + self.crpc.len() + self.iea.len() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = r#"{
    "IPC_TO_BNS": {
      "302":  { "old_section": "302",  "old_title": "Punishment for murder",
                "new_section": "103",  "new_title": "Punishment for murder",
                "changes": "Mob lynching added as a separate clause." },
      "120B": { "old_section": "120B", "old_title": "Criminal conspiracy",
                "new_section": "61",   "new_title": "Criminal conspiracy",
                "changes": "Renumbered." },
      "124A": { "old_section": "124A", "old_title": "Sedition",
                "new_section": "OMITTED", "new_title": "",
                "changes": "Sedition removed." }
    }
  }"#;

  #[test]
  fn lookup_enriches_codes() {
    let mapping = LawMapping::from_json(SAMPLE).unwrap();
    let c = mapping.lookup(LawCode::Ipc, "302").unwrap();
    assert_eq!(c.old_law, "IPC");
    assert_eq!(c.new_law, "BNS");
    assert_eq!(c.new_section, "103");
    assert!(!c.is_omitted());
  }

  #[test]
  fn lookup_normalises_section() {
    let mapping = LawMapping::from_json(SAMPLE).unwrap();
    assert!(mapping.lookup(LawCode::Ipc, "120-b").is_some());
  }

  #[test]
  fn omitted_section() {
    let mapping = LawMapping::from_json(SAMPLE).unwrap();
    assert!(mapping.lookup(LawCode::Ipc, "124A").unwrap().is_omitted());
  }

  #[test]
  fn missing_tables_are_empty() {
    let mapping = LawMapping::from_json(SAMPLE).unwrap();
    assert!(mapping.lookup(LawCode::Crpc, "154").is_none());
    assert!(mapping.sections(LawCode::Iea).is_empty());
    assert_eq!(mapping.len(), 3);
  }

  #[test]
  fn sections_are_sorted() {
    let mapping = LawMapping::from_json(SAMPLE).unwrap();
    let order: Vec<_> = mapping
      .sections(LawCode::Ipc)
      .into_iter()
      .map(|s| s.section)
      .collect();
    assert_eq!(order, vec!["120B", "124A", "302"]);
  }
}
