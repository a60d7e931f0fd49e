//! Dictionary entries — the derived lexicon view.
//!
//! The dictionary is synthesized wholesale from the entity catalog on
//! each run; it is never authoritative state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A lexicon headword with its dual physical/spiritual reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
  pub id:               Uuid,
  /// Unique across the dictionary.
  pub headword:         String,
  pub short_definition: String,
  pub physical_meaning: String,
  pub spiritual_meaning: String,
  /// Opus-stage label from the classifier, when one scored.
  pub opus_stage:       Option<String>,
  /// "Alchemy" | "Hermeticism", from entity kind membership.
  pub domain:           String,
  /// Always `true`: every alchemical headword is assumed to carry dual
  /// physical/spiritual readings. A domain assumption, not computed.
  pub ambiguity_flag:   bool,
  pub confidence_score: f64,
  pub created_by:       String,
  pub synonyms:         Vec<String>,
  pub sources:          Vec<EntrySource>,
  pub images:           Vec<EntryImage>,
  pub relations:        Vec<EntryRelation>,
}

/// A citation backing an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrySource {
  pub source_id: String,
  pub note:      Option<String>,
}

/// An image illustrating an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryImage {
  pub image_id: String,
  pub caption:  Option<String>,
}

/// A cross-reference to another entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRelation {
  pub other_headword: String,
  /// Free-text relation label, e.g. "sibling-term", "stage-of".
  pub relation:       String,
}

impl DictionaryEntry {
  /// URL-safe slug used by the export layer.
  pub fn slug(&self) -> String {
    self.headword.to_lowercase().replace(' ', "-")
  }
}
