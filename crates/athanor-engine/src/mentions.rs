//! Mention scanning — one compiled alternation over the entity catalog.
//!
//! The whole catalog is compiled into a single case-insensitive
//! whole-word alternation, so scanning is O(text length) rather than
//! O(entities × text length). Matches are resolved back to canonical
//! entity ids through a lowercase lookup table.
//!
//! Matching is single-pass and non-overlapping; there is deliberately
//! no longest-match-wins resolution between overlapping catalog names
//! (e.g. "Red King" vs "King") — the alternation order decides.

use std::collections::HashMap;

use athanor_core::{
  graph::{Entity, NodeRef, RelKind, Relationship},
  store::GraphStore,
};
use regex::RegexBuilder;
use tracing::warn;

use crate::{Error, Result};

/// A compiled scanner over a fixed entity catalog.
pub struct MentionScanner {
  pattern:  regex::Regex,
  by_lower: HashMap<String, Vec<i64>>,
}

impl MentionScanner {
  /// Compile the catalog into one alternation. Returns `None` for an
  /// empty catalog (nothing to scan for).
  pub fn compile(catalog: &[Entity]) -> Result<Option<Self>> {
    if catalog.is_empty() {
      return Ok(None);
    }

    let mut by_lower: HashMap<String, Vec<i64>> = HashMap::new();
    for entity in catalog {
      by_lower.entry(entity.name.to_lowercase()).or_default().push(entity.id);
    }

    let alternation = catalog
      .iter()
      .map(|e| regex::escape(&e.name))
      .collect::<Vec<_>>()
      .join("|");
    let pattern = RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
      .case_insensitive(true)
      .build()
      .map_err(Error::Pattern)?;

    Ok(Some(Self { pattern, by_lower }))
  }

  /// All entity ids mentioned in `text`, deduplicated, in first-match
  /// order. A name shared by entities of different types yields all of
  /// them.
  pub fn scan(&self, text: &str) -> Vec<i64> {
    let mut seen = Vec::new();
    for m in self.pattern.find_iter(text) {
      if let Some(ids) = self.by_lower.get(&m.as_str().to_lowercase()) {
        for id in ids {
          if !seen.contains(id) {
            seen.push(*id);
          }
        }
      }
    }
    seen
  }
}

/// Emit one deduplicated relationship per mentioned entity. Returns the
/// number of edges actually created (duplicates are suppressed by the
/// store).
pub fn link_mentions<S: GraphStore>(
  store: &S,
  scanner: &MentionScanner,
  source: &NodeRef,
  text: &str,
  kind: RelKind,
) -> Result<usize> {
  let mut created = 0;
  for entity_id in scanner.scan(text) {
    let rel =
      Relationship::new(source.clone(), NodeRef::Entity(entity_id), kind);
    match store.insert_relationship(&rel) {
      Ok(true) => created += 1,
      Ok(false) => {}
      Err(e) => {
        warn!(source = %source.prefixed(), entity_id, error = %e,
              "skipping mention edge");
      }
    }
  }
  Ok(created)
}

#[cfg(test)]
mod tests {
  use athanor_core::graph::AttrMap;
  use athanor_store_sqlite::SqliteStore;

  use super::*;

  fn catalog(names: &[(&str, &str)]) -> Vec<Entity> {
    names
      .iter()
      .enumerate()
      .map(|(i, (name, kind))| Entity {
        id:         i as i64 + 1,
        name:       (*name).to_owned(),
        kind:       (*kind).to_owned(),
        attributes: AttrMap::new(),
      })
      .collect()
  }

  #[test]
  fn empty_catalog_compiles_to_none() {
    assert!(MentionScanner::compile(&[]).unwrap().is_none());
  }

  #[test]
  fn finds_each_distinct_entity_once() {
    let cat = catalog(&[
      ("Green Lion", "Alchemy Symbol"),
      ("Red King", "Alchemy Symbol"),
    ]);
    let scanner = MentionScanner::compile(&cat).unwrap().unwrap();

    let ids = scanner.scan("The Green Lion devours the Red King");
    assert_eq!(ids, vec![1, 2]);

    // Repeated mentions do not duplicate.
    let ids = scanner.scan("the green lion, again the GREEN LION");
    assert_eq!(ids, vec![1]);
  }

  #[test]
  fn matching_is_whole_word_only() {
    let cat = catalog(&[("Lead", "Alchemy Material")]);
    let scanner = MentionScanner::compile(&cat).unwrap().unwrap();

    assert!(scanner.scan("the leaden sky misleads").is_empty());
    assert_eq!(scanner.scan("turn lead into gold"), vec![1]);
  }

  #[test]
  fn shared_name_across_types_yields_all_ids() {
    let cat = catalog(&[
      ("Mercury", "Alchemy Material"),
      ("Mercury", "Hermetic Figure"),
    ]);
    let scanner = MentionScanner::compile(&cat).unwrap().unwrap();
    assert_eq!(scanner.scan("swift Mercury"), vec![1, 2]);
  }

  #[test]
  fn two_mentions_become_two_edges() {
    let store = SqliteStore::open_in_memory().unwrap();
    let lion = store
      .upsert_entity("Green Lion", "Alchemy Symbol", &AttrMap::new())
      .unwrap();
    let king = store
      .upsert_entity("Red King", "Alchemy Symbol", &AttrMap::new())
      .unwrap();
    store
      .upsert_document(&athanor_core::corpus::Document {
        id:         "d1".into(),
        filename:   "ripley.pdf".into(),
        path:       "/x/ripley.pdf".into(),
        topic:      "Alchemy".into(),
        author:     "Unknown".into(),
        period:     "Renaissance".into(),
        century:    None,
        language:   None,
        size:       1,
        created_at: None,
        summary:    None,
      })
      .unwrap();

    let scanner = MentionScanner::compile(&store.list_entities(None).unwrap())
      .unwrap()
      .unwrap();
    let source = NodeRef::Document("d1".into());
    let created = link_mentions(
      &store,
      &scanner,
      &source,
      "The Green Lion devours the Red King",
      RelKind::Mentions,
    )
    .unwrap();
    assert_eq!(created, 2);

    let rels = store.list_relationships().unwrap();
    assert_eq!(rels.len(), 2);
    assert!(rels.iter().any(|r| r.target == NodeRef::Entity(lion)));
    assert!(rels.iter().any(|r| r.target == NodeRef::Entity(king)));

    // Re-linking the same text creates nothing new.
    let created = link_mentions(
      &store,
      &scanner,
      &source,
      "The Green Lion devours the Red King",
      RelKind::Mentions,
    )
    .unwrap();
    assert_eq!(created, 0);
  }
}
