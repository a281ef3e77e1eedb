//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are fixed-width RFC 3339 strings with microsecond precision and
//! a `Z` suffix. Dates are `YYYY-MM-DD`. UUIDs are hyphenated lowercase
//! strings. JSON payloads are compact JSON text.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enum domains ────────────────────────────────────────────────────────────

/// Decode any core enum stored by its `as_str` spelling.
pub fn decode_enum<T>(s: &str) -> Result<T>
where
  T: FromStr<Err = nyaya_core::Error>,
{
  Ok(s.parse::<T>()?)
}

// ─── JSON ────────────────────────────────────────────────────────────────────

pub fn encode_json(value: Option<&serde_json::Value>) -> Result<Option<String>> {
  value.map(serde_json::to_string).transpose().map_err(Error::from)
}

pub fn decode_json(s: Option<String>) -> Result<Option<serde_json::Value>> {
  s.as_deref()
    .map(serde_json::from_str)
    .transpose()
    .map_err(Error::from)
}

// ─── Hashing ─────────────────────────────────────────────────────────────────

/// Lowercase hex SHA-256 of `bytes`; used for file and chunk hashes.
pub fn sha256_hex(bytes: &[u8]) -> String { hex::encode(Sha256::digest(bytes)) }
