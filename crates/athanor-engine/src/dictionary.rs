//! Dictionary synthesis — a derived lexicon over the entity catalog.
//!
//! Synthesis is a pure function of the catalog: every run regenerates
//! the full entry set and the store swaps it wholesale. Definitions are
//! templated from the entity type; the stage label comes from the
//! keyword classifier over the headword itself.

use athanor_core::{
  classify::Lexicon,
  dictionary::DictionaryEntry,
  graph::{Entity, entity_kind},
  store::GraphStore,
};
use tracing::info;
use uuid::Uuid;

use crate::{Error, Result, pipeline::StageReport};

/// Entity types eligible for a dictionary headword.
const CANDIDATE_KINDS: [&str; 4] = [
  entity_kind::MATERIAL,
  entity_kind::SYMBOL,
  entity_kind::EQUIPMENT,
  entity_kind::FIGURE,
];

/// Synthesize dictionary entries from candidate entities. Candidates
/// sharing a name (across types) collapse to one headword; the
/// first-listed occurrence decides the type-derived fields.
pub fn synthesize(
  candidates: &[Entity],
  stages: &Lexicon,
) -> Vec<DictionaryEntry> {
  let mut seen: Vec<String> = Vec::new();
  let mut entries = Vec::new();

  for entity in candidates {
    if !CANDIDATE_KINDS.contains(&entity.kind.as_str()) {
      continue;
    }
    let key = entity.name.to_lowercase();
    if seen.contains(&key) {
      continue;
    }
    seen.push(key);
    entries.push(entry_for(entity, stages));
  }

  entries
}

fn entry_for(entity: &Entity, stages: &Lexicon) -> DictionaryEntry {
  let name = &entity.name;
  let kind = &entity.kind;

  let domain = if kind.contains("Alchemy") { "Alchemy" } else { "Hermeticism" };
  let short_definition = format!(
    "A {} frequently cited in the corpus.",
    kind.to_lowercase().replace("alchemy ", "")
  );

  let (physical_meaning, spiritual_meaning) = if kind.contains("Material") {
    (
      format!("The substance {name}, used in laboratory operations."),
      format!("Symbolizes the {name}'s corresponding planetary virtue."),
    )
  } else if kind.contains("Symbol") {
    (
      "An allegorical cover-name (Deckname) for a chemical agent.".to_owned(),
      "Represents a stage of transformation in the adept's soul.".to_owned(),
    )
  } else {
    (String::new(), String::new())
  };

  let opus_stage = stages.classify(name).map(str::to_owned);
  // A headword the stage lexicon recognises is better attested.
  let confidence_score = if opus_stage.is_some() { 0.75 } else { 0.5 };

  DictionaryEntry {
    id: Uuid::new_v4(),
    headword: name.clone(),
    short_definition,
    physical_meaning,
    spiritual_meaning,
    opus_stage,
    domain: domain.to_owned(),
    ambiguity_flag: true,
    confidence_score,
    created_by: "athanor-synthesizer".to_owned(),
    synonyms: Vec::new(),
    sources: Vec::new(),
    images: Vec::new(),
    relations: Vec::new(),
  }
}

/// Regenerate the dictionary from the stored catalog and swap it in.
pub fn rebuild_dictionary<S: GraphStore>(
  store: &S,
  stages: &Lexicon,
) -> Result<StageReport> {
  let catalog = store.list_entities(None).map_err(Error::store)?;
  let entries = synthesize(&catalog, stages);
  if entries.is_empty() {
    info!("no dictionary candidates in catalog, leaving dictionary as-is");
    return Ok(StageReport::default());
  }

  let processed = entries.len();
  store.replace_dictionary(&entries).map_err(Error::store)?;
  info!(entries = processed, "dictionary rebuilt");
  Ok(StageReport { processed, skipped: 0 })
}

#[cfg(test)]
mod tests {
  use athanor_core::{classify::default_opus_stages, graph::AttrMap};
  use athanor_store_sqlite::SqliteStore;

  use super::*;

  fn entity(id: i64, name: &str, kind: &str) -> Entity {
    Entity {
      id,
      name: name.to_owned(),
      kind: kind.to_owned(),
      attributes: AttrMap::new(),
    }
  }

  #[test]
  fn material_and_symbol_templates_differ() {
    let catalog = vec![
      entity(1, "Antimony", entity_kind::MATERIAL),
      entity(2, "Green Lion", entity_kind::SYMBOL),
    ];
    let entries = synthesize(&catalog, &default_opus_stages());
    assert_eq!(entries.len(), 2);

    let material = &entries[0];
    assert_eq!(
      material.short_definition,
      "A material frequently cited in the corpus."
    );
    assert_eq!(
      material.physical_meaning,
      "The substance Antimony, used in laboratory operations."
    );
    assert!(material.spiritual_meaning.contains("planetary virtue"));

    let symbol = &entries[1];
    assert!(symbol.physical_meaning.contains("cover-name"));
    assert!(symbol.spiritual_meaning.contains("adept's soul"));
    assert!(entries.iter().all(|e| e.ambiguity_flag));
  }

  #[test]
  fn stage_label_raises_confidence() {
    let catalog = vec![
      entity(1, "White Swan", entity_kind::SYMBOL),
      entity(2, "Athanor", entity_kind::EQUIPMENT),
    ];
    let entries = synthesize(&catalog, &default_opus_stages());

    assert_eq!(entries[0].opus_stage.as_deref(), Some("Albedo"));
    assert_eq!(entries[0].confidence_score, 0.75);
    assert_eq!(entries[1].opus_stage, None);
    assert_eq!(entries[1].confidence_score, 0.5);
  }

  #[test]
  fn non_candidate_kinds_and_duplicate_names_are_skipped() {
    let catalog = vec![
      entity(1, "Carl Jung", entity_kind::SCHOLAR),
      entity(2, "Mercury", entity_kind::MATERIAL),
      entity(3, "Mercury", entity_kind::FIGURE),
    ];
    let entries = synthesize(&catalog, &default_opus_stages());
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].headword, "Mercury");
    // First occurrence decides the domain.
    assert_eq!(entries[0].domain, "Alchemy");
  }

  #[test]
  fn rebuild_swaps_the_stored_view() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .upsert_entity("Green Lion", entity_kind::SYMBOL, &AttrMap::new())
      .unwrap();

    let stages = default_opus_stages();
    let first = rebuild_dictionary(&store, &stages).unwrap();
    assert_eq!(first.processed, 1);

    store
      .upsert_entity("Antimony", entity_kind::MATERIAL, &AttrMap::new())
      .unwrap();
    let second = rebuild_dictionary(&store, &stages).unwrap();
    assert_eq!(second.processed, 2);
    assert_eq!(store.list_dictionary().unwrap().len(), 2);
  }

  #[test]
  fn empty_catalog_is_a_noop() {
    let store = SqliteStore::open_in_memory().unwrap();
    let report = rebuild_dictionary(&store, &default_opus_stages()).unwrap();
    assert_eq!(report.processed, 0);
  }
}
