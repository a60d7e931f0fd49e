//! Reference/evidence linking — claim notes from scholarly sources.
//!
//! Analytical blocks are split into sentence-ish units and every unit
//! that names a catalog entity yields one note per (unit, entity).
//! Glossary blocks are `term: definition` lines; a note is created only
//! when the term resolves to a catalog entity, with the definition as
//! the claim text.
//!
//! Note insertion is append-only; re-running a reference ingest against
//! the same blocks duplicates the notes rather than converging.

use std::collections::BTreeMap;

use athanor_core::{
  graph::Entity,
  record::ReferenceBatch,
  reference::{EvidenceSpan, ReferenceNote, SourceIntent},
  store::GraphStore,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{Error, Result, pipeline::StageReport};

/// Minimum unit length; shorter fragments are citation debris.
const MIN_UNIT_LEN: usize = 20;

/// Resolves entity mentions in reference prose. Lookup is by lowercase
/// name; a name shared across entity types maps to all of its ids.
pub struct ClaimLinker {
  by_lower: BTreeMap<String, Vec<i64>>,
}

impl ClaimLinker {
  pub fn new(catalog: &[Entity]) -> Self {
    let mut by_lower: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for entity in catalog {
      by_lower.entry(entity.name.to_lowercase()).or_default().push(entity.id);
    }
    Self { by_lower }
  }

  /// Derive notes from one text block and append them to the store.
  /// Returns the number of notes created.
  pub fn link_claims<S: GraphStore>(
    &self,
    store: &S,
    source_id: &str,
    block: &str,
    intent: SourceIntent,
  ) -> Result<usize> {
    let mut created = 0;
    match intent {
      SourceIntent::Analytical => {
        for unit in block.split(". ") {
          let unit = unit.trim();
          if unit.len() <= MIN_UNIT_LEN {
            continue;
          }
          let lower = unit.to_lowercase();
          for (name, ids) in &self.by_lower {
            if !lower.contains(name.as_str()) {
              continue;
            }
            for id in ids {
              let note =
                ReferenceNote::about_entity(source_id, *id, unit, intent);
              store.insert_reference_note(&note).map_err(Error::store)?;
              created += 1;
            }
          }
        }
      }
      SourceIntent::Glossary => {
        for line in block.lines() {
          let Some((term, definition)) = parse_glossary_line(line) else {
            continue;
          };
          let Some(ids) = self.by_lower.get(&term.to_lowercase()) else {
            continue;
          };
          for id in ids {
            let note =
              ReferenceNote::about_entity(source_id, *id, definition, intent);
            store.insert_reference_note(&note).map_err(Error::store)?;
            created += 1;
          }
        }
      }
    }
    Ok(created)
  }
}

/// `- **Term**: definition` or bare `Term: definition`. Returns trimmed
/// (term, definition).
fn parse_glossary_line(line: &str) -> Option<(&str, &str)> {
  let line = line.trim().trim_start_matches('-').trim();
  let (term, definition) = line.split_once(':')?;
  let term = term.trim_matches('*').trim();
  let definition = definition.trim();
  if term.is_empty() || definition.is_empty() {
    return None;
  }
  Some((term, definition))
}

/// Ingest a reference batch: upsert every source, then link every text
/// block against the current entity catalog. A block naming an unknown
/// source is logged and skipped.
pub fn ingest_reference<S: GraphStore>(
  store: &S,
  batch: &ReferenceBatch,
  catalog: &[Entity],
) -> Result<StageReport> {
  for source in &batch.sources {
    store.upsert_reference_source(source).map_err(Error::store)?;
  }

  let known: std::collections::BTreeSet<String> = store
    .list_reference_sources()
    .map_err(Error::store)?
    .into_iter()
    .map(|s| s.id)
    .collect();

  let linker = ClaimLinker::new(catalog);
  let mut report = StageReport::default();

  for block in &batch.blocks {
    if !known.contains(&block.source_id) {
      warn!(source = %block.source_id, "skipping block for unknown source");
      report.skipped += 1;
      continue;
    }
    let created =
      linker.link_claims(store, &block.source_id, &block.text, block.intent)?;
    debug!(source = %block.source_id, created, "linked reference block");
    report.processed += created;
  }

  Ok(report)
}

/// Record a pointer from a note into the document page that backs it.
pub fn attach_evidence<S: GraphStore>(
  store: &S,
  note_id: Uuid,
  doc_id: &str,
  page: u32,
  excerpt: &str,
) -> Result<()> {
  let span = EvidenceSpan {
    id: Uuid::new_v4(),
    note_id,
    doc_id: doc_id.to_owned(),
    page,
    excerpt: excerpt.to_owned(),
  };
  store.insert_evidence_span(&span).map_err(Error::store)
}

#[cfg(test)]
mod tests {
  use athanor_core::{graph::AttrMap, record::ClaimBlock};
  use athanor_store_sqlite::SqliteStore;

  use super::*;

  fn source(id: &str) -> athanor_core::reference::ReferenceSource {
    athanor_core::reference::ReferenceSource {
      id:          id.to_owned(),
      short_name:  "Obrist 2012".to_owned(),
      citation:    "Obrist, Barbara. 'Visualization in Medieval Alchemy'."
        .to_owned(),
      source_type: "Secondary".to_owned(),
      domain:      "Alchemy".to_owned(),
      year:        Some(2012),
    }
  }

  fn store_with_entities(names: &[(&str, &str)]) -> (SqliteStore, Vec<Entity>) {
    let store = SqliteStore::open_in_memory().unwrap();
    for (name, kind) in names {
      store.upsert_entity(name, kind, &AttrMap::new()).unwrap();
    }
    let catalog = store.list_entities(None).unwrap();
    (store, catalog)
  }

  #[test]
  fn analytical_block_yields_one_note_per_unit_entity_pair() {
    let (store, catalog) = store_with_entities(&[
      ("Green Lion", "Alchemy Symbol"),
      ("Mercury", "Alchemy Material"),
    ]);
    store.upsert_reference_source(&source("src_obrist_2012")).unwrap();
    let linker = ClaimLinker::new(&catalog);

    let block = "The Green Lion devouring the sun depicts mercury \
                 dissolving gold. Short frag. The imagery tradition is \
                 unrelated to either figure here.";
    let created = linker
      .link_claims(&store, "src_obrist_2012", block, SourceIntent::Analytical)
      .unwrap();
    // First unit names both entities, the rest name none.
    assert_eq!(created, 2);

    let notes = store.list_reference_notes().unwrap();
    assert_eq!(notes.len(), 2);
    assert!(notes.iter().all(|n| n.stance == "Analyzes"));
    assert!(notes.iter().all(|n| n.confidence == 0.85));
  }

  #[test]
  fn short_units_are_dropped() {
    let (store, catalog) =
      store_with_entities(&[("Mercury", "Alchemy Material")]);
    let linker = ClaimLinker::new(&catalog);
    let created = linker
      .link_claims(&store, "src_x", "Mercury rises. ", SourceIntent::Analytical)
      .unwrap();
    assert_eq!(created, 0);
  }

  #[test]
  fn glossary_notes_only_for_resolvable_terms() {
    let (store, catalog) =
      store_with_entities(&[("Azoth", "Alchemy Material")]);
    store.upsert_reference_source(&source("src_abraham_1998")).unwrap();
    let linker = ClaimLinker::new(&catalog);

    let block = "- **Azoth**: the universal solvent sought by adepts.\n\
                 - **Quintessence**: the fifth element.\n\
                 not a glossary line";
    let created = linker
      .link_claims(&store, "src_abraham_1998", block, SourceIntent::Glossary)
      .unwrap();
    assert_eq!(created, 1);

    let notes = store.list_reference_notes().unwrap();
    assert_eq!(notes[0].claim_text, "the universal solvent sought by adepts.");
    assert_eq!(notes[0].stance, "Defines");
    assert_eq!(notes[0].confidence, 1.0);
  }

  #[test]
  fn relinking_appends_rather_than_converging() {
    let (store, catalog) =
      store_with_entities(&[("Mercury", "Alchemy Material")]);
    store.upsert_reference_source(&source("src_x")).unwrap();
    let linker = ClaimLinker::new(&catalog);
    let block = "Mercury is the agent of every transmutation described.";

    for _ in 0..2 {
      linker
        .link_claims(&store, "src_x", block, SourceIntent::Analytical)
        .unwrap();
    }
    assert_eq!(store.list_reference_notes().unwrap().len(), 2);
  }

  #[test]
  fn batch_skips_blocks_with_unknown_source() {
    let (store, catalog) =
      store_with_entities(&[("Mercury", "Alchemy Material")]);
    let batch = ReferenceBatch {
      sources: vec![source("src_obrist_2012")],
      blocks:  vec![
        ClaimBlock {
          source_id: "src_obrist_2012".to_owned(),
          intent:    SourceIntent::Analytical,
          text:      "Mercury is central to the visual tradition shown."
            .to_owned(),
        },
        ClaimBlock {
          source_id: "src_missing".to_owned(),
          intent:    SourceIntent::Analytical,
          text:      "Mercury again, but the source is not registered."
            .to_owned(),
        },
      ],
    };

    let report = ingest_reference(&store, &batch, &catalog).unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.skipped, 1);
  }

  #[test]
  fn evidence_span_attaches_to_note() {
    let (store, catalog) =
      store_with_entities(&[("Mercury", "Alchemy Material")]);
    store.upsert_reference_source(&source("src_x")).unwrap();
    store
      .upsert_document(&athanor_core::corpus::Document {
        id:         "d1".into(),
        filename:   "obrist.pdf".into(),
        path:       "/x/obrist.pdf".into(),
        topic:      "Alchemy".into(),
        author:     "Obrist".into(),
        period:     "Modern".into(),
        century:    None,
        language:   None,
        size:       1,
        created_at: None,
        summary:    None,
      })
      .unwrap();

    let linker = ClaimLinker::new(&catalog);
    linker
      .link_claims(
        &store,
        "src_x",
        "Mercury is the agent of every transmutation described.",
        SourceIntent::Analytical,
      )
      .unwrap();
    let note = store.list_reference_notes().unwrap().remove(0);

    attach_evidence(&store, note.id, "d1", 14, "…mercury dissolving…")
      .unwrap();
  }
}
