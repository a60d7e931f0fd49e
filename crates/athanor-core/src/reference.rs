//! Scholarly reference layer: sources, claim notes, evidence spans.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Citation metadata for a scholarly source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSource {
  /// Stable slug, e.g. `src_obrist_2012`.
  pub id:          String,
  pub short_name:  String,
  pub citation:    String,
  /// "Primary" | "Secondary".
  pub source_type: String,
  pub domain:      String,
  pub year:        Option<i32>,
}

/// The authorial intent of a source's text block. Determines the fixed
/// stance/confidence written onto every note derived from that block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceIntent {
  /// Analytical commentary on the corpus.
  Analytical,
  /// Glossary-style term definitions.
  Glossary,
}

impl SourceIntent {
  pub fn stance(&self) -> &'static str {
    match self {
      Self::Analytical => "Analyzes",
      Self::Glossary => "Defines",
    }
  }

  pub fn confidence(&self) -> f64 {
    match self {
      Self::Analytical => 0.85,
      Self::Glossary => 1.0,
    }
  }
}

/// One claim a source makes about an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceNote {
  pub id:           Uuid,
  pub source_id:    String,
  /// Currently always "entity"; kept as a column for future subjects.
  pub subject_type: String,
  pub subject_id:   i64,
  pub claim_text:   String,
  pub stance:       String,
  pub confidence:   f64,
}

impl ReferenceNote {
  /// Build a note about an entity with intent-derived stance/confidence.
  pub fn about_entity(
    source_id: &str,
    entity_id: i64,
    claim_text: &str,
    intent: SourceIntent,
  ) -> Self {
    Self {
      id:           Uuid::new_v4(),
      source_id:    source_id.to_owned(),
      subject_type: "entity".to_owned(),
      subject_id:   entity_id,
      claim_text:   claim_text.to_owned(),
      stance:       intent.stance().to_owned(),
      confidence:   intent.confidence(),
    }
  }

  pub fn validate(&self) -> Result<()> {
    if !(0.0..=1.0).contains(&self.confidence) {
      return Err(Error::ConfidenceOutOfRange(self.confidence));
    }
    Ok(())
  }
}

/// A pointer from a note into the document that backs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSpan {
  pub id:      Uuid,
  pub note_id: Uuid,
  pub doc_id:  String,
  pub page:    u32,
  pub excerpt: String,
}
