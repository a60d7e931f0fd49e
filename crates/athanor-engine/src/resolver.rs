//! Entity resolution — batch upserts with partial-failure isolation.

use athanor_core::{record::EntitySeed, store::GraphStore};
use tracing::{debug, warn};

use crate::{Result, pipeline::StageReport};

/// Upsert a batch of candidate entities. A storage failure on one seed
/// is logged and that seed skipped; the rest of the batch proceeds.
pub fn ingest_seeds<S: GraphStore>(
  store: &S,
  seeds: &[EntitySeed],
) -> Result<StageReport> {
  let mut report = StageReport::default();

  for seed in seeds {
    match store.upsert_entity(&seed.name, &seed.kind, &seed.attributes) {
      Ok(id) => {
        debug!(name = %seed.name, kind = %seed.kind, id, "upserted entity");
        report.processed += 1;
      }
      Err(e) => {
        warn!(name = %seed.name, error = %e, "skipping entity seed");
        report.skipped += 1;
      }
    }
  }

  Ok(report)
}

#[cfg(test)]
mod tests {
  use athanor_core::{graph::AttrMap, store::GraphStore};
  use athanor_store_sqlite::SqliteStore;

  use super::*;

  fn seed(name: &str, kind: &str) -> EntitySeed {
    EntitySeed {
      name:       name.to_owned(),
      kind:       kind.to_owned(),
      attributes: AttrMap::new(),
    }
  }

  #[test]
  fn repeated_ingestion_converges() {
    let store = SqliteStore::open_in_memory().unwrap();
    let seeds = vec![
      seed("Mercury", "Alchemy Material"),
      seed("mercury", "Alchemy Material"),
      seed("Green Lion", "Alchemy Symbol"),
    ];

    let first = ingest_seeds(&store, &seeds).unwrap();
    let second = ingest_seeds(&store, &seeds).unwrap();
    assert_eq!(first.processed, 3);
    assert_eq!(second.processed, 3);

    // Case-insensitive key: "Mercury"/"mercury" collapse to one row.
    assert_eq!(store.list_entities(None).unwrap().len(), 2);
  }
}
