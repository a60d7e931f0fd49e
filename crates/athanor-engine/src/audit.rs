//! Metadata audit — richness grading and the mend queue.
//!
//! Each document and entity is scored bucket by bucket for metadata
//! completeness. Sentinel defaults assigned at ingest ("Unsorted",
//! "Unknown", "Undetermined") count as missing; the audit exists to
//! find exactly those rows. Anything grading below the mend threshold
//! lands in the queue for manual enrichment.

use athanor_core::{corpus::Document, graph::Entity, store::GraphStore};
use serde::Serialize;
use tracing::info;

use crate::{Error, Result};

/// Score below which an item is queued for mending.
pub const MEND_THRESHOLD: u32 = 60;

/// One graded catalog item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Graded {
  pub id:       String,
  pub label:    String,
  /// "Document" | "Entity".
  pub category: &'static str,
  pub score:    u32,
  pub grade:    &'static str,
  pub missing:  Vec<&'static str>,
}

fn letter(score: u32) -> &'static str {
  if score >= 90 {
    "A (Rich)"
  } else if score >= 80 {
    "B (Good)"
  } else if score >= 60 {
    "C (Passable)"
  } else if score >= 40 {
    "D (Thin)"
  } else {
    "F (Skeleton)"
  }
}

pub fn grade_document(doc: &Document) -> Graded {
  let mut score = 0;
  let mut missing = Vec::new();

  if doc.filename.is_empty() {
    missing.push("Name/Title");
  } else {
    score += 10;
  }
  if doc.topic.is_empty() || doc.topic == "Unsorted" {
    missing.push("Type/Topic");
  } else {
    score += 10;
  }
  if doc.period.is_empty() || doc.period == "Undetermined" {
    missing.push("Period");
  } else {
    score += 20;
  }
  match doc.summary.as_deref() {
    Some(s) if s.len() > 50 => score += 20,
    Some(_) => score += 10,
    None => missing.push("Summary"),
  }
  // Documents carry no free-form attribute map.
  missing.push("Attributes");
  if doc.author.is_empty() || doc.author == "Unknown" {
    missing.push("Author");
  } else {
    score += 20;
  }

  Graded {
    id: doc.id.clone(),
    label: doc.filename.clone(),
    category: "Document",
    score,
    grade: letter(score),
    missing,
  }
}

pub fn grade_entity(entity: &Entity) -> Graded {
  let mut score = 0;
  let mut missing = Vec::new();
  let attrs = &entity.attributes;

  if entity.name.is_empty() {
    missing.push("Name/Title");
  } else {
    score += 10;
  }
  if entity.kind.is_empty() {
    missing.push("Type/Topic");
  } else {
    score += 10;
  }
  if attrs.contains_key("period") {
    score += 20;
  } else {
    missing.push("Period");
  }
  match attrs.get("description").and_then(|v| v.as_str()) {
    Some(s) if s.len() > 50 => score += 20,
    Some(_) => score += 10,
    None => missing.push("Summary"),
  }
  if attrs.len() > 1 {
    score += 20;
  } else if !attrs.is_empty() {
    score += 5;
  } else {
    missing.push("Attributes");
  }
  if attrs.contains_key("domain") || attrs.contains_key("category") {
    score += 20;
  } else {
    missing.push("Domain");
  }

  Graded {
    id: entity.id.to_string(),
    label: entity.name.clone(),
    category: "Entity",
    score,
    grade: letter(score),
    missing,
  }
}

/// The full grading pass over documents and entities.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
  pub graded: Vec<Graded>,
}

impl AuditReport {
  /// Items grading below `threshold`, worst first.
  pub fn mend_queue(&self, threshold: u32) -> Vec<&Graded> {
    let mut queue: Vec<&Graded> =
      self.graded.iter().filter(|g| g.score < threshold).collect();
    queue.sort_by_key(|g| g.score);
    queue
  }
}

/// Grade every document and entity in the store.
pub fn audit_store<S: GraphStore>(store: &S) -> Result<AuditReport> {
  let mut graded = Vec::new();
  for doc in store.list_documents().map_err(Error::store)? {
    graded.push(grade_document(&doc));
  }
  for entity in store.list_entities(None).map_err(Error::store)? {
    graded.push(grade_entity(&entity));
  }
  info!(
    items = graded.len(),
    queued = graded.iter().filter(|g| g.score < MEND_THRESHOLD).count(),
    "metadata audit complete"
  );
  Ok(AuditReport { graded })
}
