//! Case-law search results.

use serde::{Deserialize, Serialize};

/// One case returned by the search backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
  pub title:     String,
  /// Identifier of the judgment in the external search service.
  pub doc_id:    String,
  pub snippet:   String,
  pub case_link: String,
}
