//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, attribute maps compact JSON, UUIDs
//! hyphenated lowercase strings, booleans 0/1 integers.

use athanor_core::graph::{AttrMap, NodeRef, RelKind, Relationship};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

pub fn encode_uuid(id: Uuid) -> String {
  id.hyphenated().to_string()
}

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Ok(Uuid::parse_str(s)?)
}

// ─── Attribute maps ──────────────────────────────────────────────────────────

pub fn encode_attrs(attrs: &AttrMap) -> Result<String> {
  Ok(serde_json::to_string(attrs)?)
}

pub fn decode_attrs(s: &str) -> Result<AttrMap> {
  Ok(serde_json::from_str(s)?)
}

// ─── Relationships ───────────────────────────────────────────────────────────

/// Raw strings read directly from a `relationships` row.
pub struct RawRelationship {
  pub source_kind: String,
  pub source_id:   String,
  pub target_kind: String,
  pub target_id:   String,
  pub rel_type:    String,
  pub weight:      Option<f64>,
}

impl RawRelationship {
  pub fn into_relationship(self) -> Result<Relationship> {
    let source = NodeRef::from_parts(&self.source_kind, &self.source_id)
      .map_err(Error::Core)?;
    let target = NodeRef::from_parts(&self.target_kind, &self.target_id)
      .map_err(Error::Core)?;
    let kind = RelKind::parse(&self.rel_type).map_err(Error::Core)?;
    Ok(Relationship { source, target, kind, weight: self.weight })
  }
}
