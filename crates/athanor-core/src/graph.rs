//! Entities and relationships — the normalized knowledge graph.
//!
//! An entity is the deduplicated record of a named thing mined from the
//! corpus (a material, a symbol, a scholar, a text). Everything else in
//! the graph hangs off entities via typed relationships.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Attributes ──────────────────────────────────────────────────────────────

/// Free-form attribute payload accumulated across mining runs. Stored as
/// one JSON object per entity; a `BTreeMap` keeps serialization stable.
pub type AttrMap = BTreeMap<String, serde_json::Value>;

/// Merge `incoming` into `existing`: new keys are added, colliding keys
/// are overwritten by the incoming value. Keys are never dropped.
pub fn merge_attributes(existing: &mut AttrMap, incoming: &AttrMap) {
  for (key, value) in incoming {
    existing.insert(key.clone(), value.clone());
  }
}

// ─── Entity ──────────────────────────────────────────────────────────────────

/// A deduplicated named entity. `(name, kind)` is unique store-wide with
/// case-insensitive name matching; the stored `name` keeps the casing of
/// the first occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
  pub id:         i64,
  pub name:       String,
  /// Open classification string, e.g. "Alchemy Material", "Hermetic Figure".
  pub kind:       String,
  pub attributes: AttrMap,
}

/// Well-known entity kind strings used by the miners and the dictionary
/// synthesizer. The set is open; these are just the ones the engine
/// treats specially.
pub mod entity_kind {
  pub const MATERIAL:  &str = "Alchemy Material";
  pub const SYMBOL:    &str = "Alchemy Symbol";
  pub const EQUIPMENT: &str = "Alchemy Equipment";
  pub const FIGURE:    &str = "Hermetic Figure";
  pub const SCHOLAR:   &str = "Scholar";
  pub const TEXT:      &str = "Source Text";
}

// ─── NodeRef ─────────────────────────────────────────────────────────────────

/// A typed reference to either endpoint of a relationship.
///
/// Documents and chats carry string ids (content hash / transcript hash);
/// entities carry their rowid. Tagging the kind here keeps the
/// relationship table honest — an edge cannot silently point a chat id
/// at the document table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum NodeRef {
  Document(String),
  Chat(String),
  Entity(i64),
}

impl NodeRef {
  /// The discriminant string stored in the `*_kind` columns.
  pub fn kind_str(&self) -> &'static str {
    match self {
      Self::Document(_) => "document",
      Self::Chat(_) => "chat",
      Self::Entity(_) => "entity",
    }
  }

  /// The id as stored in the `*_id` columns.
  pub fn id_string(&self) -> String {
    match self {
      Self::Document(id) | Self::Chat(id) => id.clone(),
      Self::Entity(id) => id.to_string(),
    }
  }

  /// Rebuild from the two stored columns.
  pub fn from_parts(kind: &str, id: &str) -> Result<Self> {
    match kind {
      "document" => Ok(Self::Document(id.to_owned())),
      "chat" => Ok(Self::Chat(id.to_owned())),
      "entity" => id
        .parse()
        .map(Self::Entity)
        .map_err(|_| Error::UnknownNodeKind(format!("entity:{id}"))),
      other => Err(Error::UnknownNodeKind(other.to_owned())),
    }
  }

  /// Prefixed form used by the graph/search exports, e.g. `doc:ab12…`,
  /// `entity:42`.
  pub fn prefixed(&self) -> String {
    match self {
      Self::Document(id) => format!("doc:{id}"),
      Self::Chat(id) => format!("chat:{id}"),
      Self::Entity(id) => format!("entity:{id}"),
    }
  }
}

// ─── Relationships ───────────────────────────────────────────────────────────

/// The typed edge vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelKind {
  /// A document's extracted text contains the entity name.
  Mentions,
  /// A chat transcript contains the entity name.
  Discussed,
  /// A scholarly source treats the entity as its subject.
  Analyzes,
}

impl RelKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Mentions => "MENTIONS",
      Self::Discussed => "DISCUSSED",
      Self::Analyzes => "ANALYZES",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "MENTIONS" => Ok(Self::Mentions),
      "DISCUSSED" => Ok(Self::Discussed),
      "ANALYZES" => Ok(Self::Analyzes),
      other => Err(Error::UnknownRelKind(other.to_owned())),
    }
  }
}

/// A typed edge. Duplicate `(source, target, kind)` triples are suppressed
/// at insertion; `weight` is optional and unused by the core miners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
  pub source: NodeRef,
  pub target: NodeRef,
  pub kind:   RelKind,
  pub weight: Option<f64>,
}

impl Relationship {
  pub fn new(source: NodeRef, target: NodeRef, kind: RelKind) -> Self {
    Self { source, target, kind, weight: None }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn merge_is_last_writer_wins_without_dropping_keys() {
    let mut existing: AttrMap = [
      ("source".to_owned(), serde_json::json!("fileA")),
      ("category".to_owned(), serde_json::json!("material")),
    ]
    .into_iter()
    .collect();

    let incoming: AttrMap = [
      ("source".to_owned(), serde_json::json!("fileB")),
      ("color".to_owned(), serde_json::json!("silver")),
    ]
    .into_iter()
    .collect();

    merge_attributes(&mut existing, &incoming);

    assert_eq!(existing["source"], serde_json::json!("fileB"));
    assert_eq!(existing["color"], serde_json::json!("silver"));
    assert_eq!(existing["category"], serde_json::json!("material"));
  }

  #[test]
  fn node_ref_round_trips_through_parts() {
    for node in [
      NodeRef::Document("abc123".into()),
      NodeRef::Chat("ffee00".into()),
      NodeRef::Entity(42),
    ] {
      let rebuilt =
        NodeRef::from_parts(node.kind_str(), &node.id_string()).unwrap();
      assert_eq!(rebuilt, node);
    }
  }

  #[test]
  fn node_ref_rejects_unknown_kind() {
    assert!(NodeRef::from_parts("page", "1").is_err());
    assert!(NodeRef::from_parts("entity", "not-a-number").is_err());
  }
}
