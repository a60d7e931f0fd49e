//! Documents and extracted images — the catalog side of the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A cataloged document. `id` is derived deterministically so that
/// re-scanning a byte-identical file never creates a duplicate row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
  /// Content hash when the scanner supplied one, otherwise
  /// [`Document::fallback_id`] over filename + size.
  pub id:         String,
  pub filename:   String,
  pub path:       String,
  pub topic:      String,
  pub author:     String,
  pub period:     String,
  pub century:    Option<String>,
  pub language:   Option<String>,
  pub size:       u64,
  pub created_at: Option<DateTime<Utc>>,
  pub summary:    Option<String>,
}

impl Document {
  /// Deterministic id for scanners that could not hash file content:
  /// sha256 over `filename` and `size`.
  pub fn fallback_id(filename: &str, size: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(filename.as_bytes());
    hasher.update(size.to_le_bytes());
    format!("{:x}", hasher.finalize())
  }
}

/// An image lifted out of a document by the (external) PDF extractor.
/// `id` is the leading 16 hex chars of the image sha256, matching the
/// vault filename convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
  pub id:          String,
  pub doc_id:      String,
  pub page_number: u32,
  /// Path relative to the export vault, never absolute.
  pub path:        String,
  pub sha256:      String,
  pub domain:      String,
}
