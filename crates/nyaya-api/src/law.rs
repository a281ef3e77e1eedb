//! Handlers for the `/law` comparison service.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/law/compare` | Invalid codes and misses are reported in-band |
//! | `POST` | `/law/compare/bulk` | Misses collected in `not_found` |
//! | `GET`  | `/law/sections/{law_type}` | 400 for an invalid code |

use axum::{
  Json,
  extract::{Path, State},
};
use nyaya_core::{
  law::LawCode,
  store::LogStore,
  wire::{
    BulkCompareRequest, BulkCompareResponse, CompareRequest, CompareResponse,
    NotFoundSection, SectionsResponse,
  },
};

use crate::{ApiState, error::ApiError};

pub const INVALID_LAW_TYPE: &str = "Invalid law_type. Must be one of: IPC, CRPC, IEA";

// ─── Single ──────────────────────────────────────────────────────────────────

/// `POST /law/compare` — body: `{"law_type":"IPC","section":"302"}`
pub async fn compare<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<CompareRequest>,
) -> Json<CompareResponse>
where
  S: LogStore,
{
  let Ok(code) = body.law_type.parse::<LawCode>() else {
    return Json(CompareResponse {
      success:    false,
      comparison: None,
      error:      Some(INVALID_LAW_TYPE.into()),
    });
  };

  match state.mapping.lookup(code, &body.section) {
    Some(comparison) => Json(CompareResponse {
      success:    true,
      comparison: Some(comparison),
      error:      None,
    }),
    None => Json(CompareResponse {
      success:    false,
      comparison: None,
      error:      Some(format!(
        "No comparison data found for {code} Section {}",
        body.section
      )),
    }),
  }
}

// ─── Bulk ────────────────────────────────────────────────────────────────────

/// `POST /law/compare/bulk` — body: `{"sections":[{"law_type":..,"section":..}]}`
pub async fn compare_bulk<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<BulkCompareRequest>,
) -> Json<BulkCompareResponse>
where
  S: LogStore,
{
  let mut comparisons = Vec::new();
  let mut not_found = Vec::new();

  for item in body.sections {
    let miss = |reason: &str| NotFoundSection {
      law_type: item.law_type.clone(),
      section:  item.section.clone(),
      reason:   reason.to_owned(),
    };
    match item.law_type.parse::<LawCode>() {
      Err(_) => not_found.push(miss("Invalid law_type")),
      Ok(code) => match state.mapping.lookup(code, &item.section) {
        Some(c) => comparisons.push(c),
        None => not_found.push(miss("Not found in database")),
      },
    }
  }

  Json(BulkCompareResponse {
    success: true,
    comparisons,
    not_found: (!not_found.is_empty()).then_some(not_found),
  })
}

// ─── Listing ─────────────────────────────────────────────────────────────────

/// `GET /law/sections/{law_type}`
pub async fn sections<S>(
  State(state): State<ApiState<S>>,
  Path(law_type): Path<String>,
) -> Result<Json<SectionsResponse>, ApiError>
where
  S: LogStore,
{
  let code = law_type
    .parse::<LawCode>()
    .map_err(|_| ApiError::BadRequest("Invalid law_type. Must be IPC, CRPC, or IEA".into()))?;

  let sections = state.mapping.sections(code);
  Ok(Json(SectionsResponse {
    success: true,
    law_type: code.as_str().to_owned(),
    total_sections: sections.len(),
    sections,
  }))
}
