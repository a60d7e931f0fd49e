//! Pipeline orchestration — stage wiring and batch commit cadence.
//!
//! One `Pipeline` owns one store handle for the life of a run. Writes
//! go through explicit batches committed every `commit_every` records,
//! so a killed run loses at most one batch; upserts make the following
//! re-run convergent.

use athanor_core::{
  classify::{Lexicon, default_opus_stages},
  graph::{NodeRef, RelKind},
  record::{ChatRecord, DocumentRecord, EntitySeed, ImageRecord, ReferenceBatch},
  store::GraphStore,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
  Error, Result, dictionary,
  mentions::{self, MentionScanner},
  metrics, prompts, reference, resolver, tables,
};

/// Per-stage outcome counts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageReport {
  pub processed: usize,
  pub skipped:   usize,
}

/// Everything one ingest run consumes, as produced by the (external)
/// scanners and miners.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CorpusInput {
  pub documents: Vec<DocumentRecord>,
  pub entities:  Vec<EntitySeed>,
  pub chats:     Vec<ChatRecord>,
  pub images:    Vec<ImageRecord>,
  pub reference: Option<ReferenceBatch>,
}

/// Stage outcomes for a full run, in execution order.
#[derive(Debug, Default)]
pub struct RunSummary {
  pub stages: Vec<(&'static str, StageReport)>,
}

pub struct Pipeline<S: GraphStore> {
  store:        S,
  commit_every: usize,
  stages:       Lexicon,
}

impl<S: GraphStore> Pipeline<S> {
  pub fn new(store: S) -> Self {
    Self { store, commit_every: 50, stages: default_opus_stages() }
  }

  pub fn with_commit_every(mut self, commit_every: usize) -> Self {
    self.commit_every = commit_every.max(1);
    self
  }

  /// Override the opus-stage lexicon used by the dictionary synthesizer.
  pub fn with_stages(mut self, stages: Lexicon) -> Self {
    self.stages = stages;
    self
  }

  pub fn store(&self) -> &S {
    &self.store
  }

  fn maybe_commit(&self, processed: usize) -> Result<()> {
    if processed > 0 && processed % self.commit_every == 0 {
      self.store.commit_batch().map_err(Error::store)?;
      self.store.begin_batch().map_err(Error::store)?;
    }
    Ok(())
  }

  /// Run a stage body inside an explicit batch.
  fn batched<T>(&self, body: impl FnOnce() -> Result<T>) -> Result<T> {
    self.store.begin_batch().map_err(Error::store)?;
    let out = body()?;
    self.store.commit_batch().map_err(Error::store)?;
    Ok(out)
  }

  // ── Stages ────────────────────────────────────────────────────────────

  pub fn ingest_documents(
    &self,
    records: &[DocumentRecord],
  ) -> Result<StageReport> {
    self.batched(|| {
      let mut report = StageReport::default();
      for record in records {
        let doc = record.clone().into_document();
        match self.store.upsert_document(&doc) {
          Ok(()) => report.processed += 1,
          Err(e) => {
            warn!(filename = %doc.filename, error = %e, "skipping document");
            report.skipped += 1;
          }
        }
        self.maybe_commit(report.processed)?;
      }
      info!(processed = report.processed, skipped = report.skipped,
            "documents ingested");
      Ok(report)
    })
  }

  pub fn ingest_entities(&self, seeds: &[EntitySeed]) -> Result<StageReport> {
    self.batched(|| resolver::ingest_seeds(&self.store, seeds))
  }

  pub fn ingest_images(&self, records: &[ImageRecord]) -> Result<StageReport> {
    self.batched(|| {
      let mut report = StageReport::default();
      for record in records {
        let image = record.clone().into_image();
        match self.store.upsert_image(&image) {
          Ok(()) => report.processed += 1,
          Err(e) => {
            warn!(image = %image.id, error = %e, "skipping image");
            report.skipped += 1;
          }
        }
        self.maybe_commit(report.processed)?;
      }
      Ok(report)
    })
  }

  /// Upsert chats, replace their messages, and derive prompts and
  /// mined tables per chat.
  pub fn ingest_chats(&self, records: &[ChatRecord]) -> Result<StageReport> {
    let catalog = self.store.list_entities(None).map_err(Error::store)?;
    self.batched(|| {
      let mut report = StageReport::default();
      for record in records {
        let chat = record.to_chat();
        let messages = record.to_messages();
        let derived = prompts::extract_prompts(&chat, &messages, &catalog);
        let mined = tables::mine_tables(&chat, &messages);

        let stored = self
          .store
          .upsert_chat(&chat)
          .and_then(|()| self.store.replace_messages(&chat.id, &messages))
          .and_then(|()| self.store.replace_prompts(&chat.id, &derived))
          .and_then(|()| self.store.replace_tables(&chat.id, &mined));
        match stored {
          Ok(()) => report.processed += 1,
          Err(e) => {
            warn!(chat = %chat.id, error = %e, "skipping chat");
            report.skipped += 1;
          }
        }
        self.maybe_commit(report.processed)?;
      }
      info!(processed = report.processed, skipped = report.skipped,
            "chats ingested");
      Ok(report)
    })
  }

  /// Scan document text and chat transcripts for entity mentions and
  /// emit graph edges. A no-op (with a log line) when the entity
  /// catalog is still empty.
  pub fn link(&self, documents: &[DocumentRecord]) -> Result<StageReport> {
    let catalog = self.store.list_entities(None).map_err(Error::store)?;
    let Some(scanner) = MentionScanner::compile(&catalog)? else {
      info!("entity catalog empty, skipping mention linking");
      return Ok(StageReport::default());
    };

    self.batched(|| {
      let mut report = StageReport::default();

      for record in documents {
        let Some(text) = record.text.as_deref() else { continue };
        let source = NodeRef::Document(record.resolved_id());
        report.processed += mentions::link_mentions(
          &self.store,
          &scanner,
          &source,
          text,
          RelKind::Mentions,
        )?;
        self.maybe_commit(report.processed)?;
      }

      for chat in self.store.list_chats().map_err(Error::store)? {
        let transcript: String = self
          .store
          .list_messages(&chat.id)
          .map_err(Error::store)?
          .iter()
          .map(|m| m.content.as_str())
          .collect::<Vec<_>>()
          .join("\n");
        let source = NodeRef::Chat(chat.id.clone());
        report.processed += mentions::link_mentions(
          &self.store,
          &scanner,
          &source,
          &transcript,
          RelKind::Discussed,
        )?;
        self.maybe_commit(report.processed)?;
      }

      info!(edges = report.processed, "mention linking complete");
      Ok(report)
    })
  }

  pub fn ingest_reference(
    &self,
    batch: &ReferenceBatch,
  ) -> Result<StageReport> {
    let catalog = self.store.list_entities(None).map_err(Error::store)?;
    self.batched(|| reference::ingest_reference(&self.store, batch, &catalog))
  }

  pub fn synthesize_dictionary(&self) -> Result<StageReport> {
    self.batched(|| dictionary::rebuild_dictionary(&self.store, &self.stages))
  }

  pub fn compute_metrics(&self) -> Result<StageReport> {
    self.batched(|| metrics::rebuild_metrics(&self.store))
  }

  /// The full stage sequence over one corpus input.
  pub fn run(&self, input: &CorpusInput) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    summary
      .stages
      .push(("ingest-docs", self.ingest_documents(&input.documents)?));
    summary
      .stages
      .push(("ingest-entities", self.ingest_entities(&input.entities)?));
    summary
      .stages
      .push(("ingest-images", self.ingest_images(&input.images)?));
    summary.stages.push(("ingest-chats", self.ingest_chats(&input.chats)?));
    summary.stages.push(("link", self.link(&input.documents)?));
    if let Some(batch) = &input.reference {
      summary
        .stages
        .push(("ingest-reference", self.ingest_reference(batch)?));
    }
    summary.stages.push(("synthesize", self.synthesize_dictionary()?));
    summary.stages.push(("metrics", self.compute_metrics()?));
    Ok(summary)
  }
}

#[cfg(test)]
mod tests {
  use athanor_core::{
    graph::AttrMap,
    record::{EntitySeed, MessageRecord},
  };
  use athanor_store_sqlite::SqliteStore;
  use serde_json::json;

  use super::*;

  fn input() -> CorpusInput {
    let mut attrs = AttrMap::new();
    attrs.insert("source_file".to_owned(), json!("ripley.pdf"));

    CorpusInput {
      documents: vec![DocumentRecord {
        id:         Some("d1".to_owned()),
        filename:   "ripley.pdf".to_owned(),
        path:       "/corpus/ripley.pdf".to_owned(),
        topic:      Some("Alchemy".to_owned()),
        author:     Some("George Ripley".to_owned()),
        period:     Some("Renaissance".to_owned()),
        century:    None,
        language:   None,
        size:       4096,
        created_at: None,
        summary:    None,
        text:       Some(
          "The Green Lion devours the sun while Mercury rises.".to_owned(),
        ),
      }],
      entities:  vec![
        EntitySeed {
          name:       "Green Lion".to_owned(),
          kind:       "Alchemy Symbol".to_owned(),
          attributes: attrs,
        },
        EntitySeed {
          name:       "Mercury".to_owned(),
          kind:       "Alchemy Material".to_owned(),
          attributes: AttrMap::new(),
        },
      ],
      chats:     vec![ChatRecord {
        id:         Some("c1".to_owned()),
        title:      "On the Green Lion".to_owned(),
        created_at: None,
        topic:      Some("Alchemy".to_owned()),
        path:       "/chats/c1".to_owned(),
        messages:   vec![
          MessageRecord {
            role:    "user".to_owned(),
            content: "What does the green lion devouring the sun mean?"
              .to_owned(),
          },
          MessageRecord {
            role:    "assistant".to_owned(),
            content: "It depicts vitriol dissolving gold.".to_owned(),
          },
        ],
      }],
      images:    Vec::new(),
      reference: None,
    }
  }

  #[test]
  fn full_run_populates_every_view() {
    let pipeline =
      Pipeline::new(SqliteStore::open_in_memory().unwrap()).with_commit_every(2);
    let summary = pipeline.run(&input()).unwrap();

    let names: Vec<&str> = summary.stages.iter().map(|(n, _)| *n).collect();
    assert_eq!(names, vec![
      "ingest-docs",
      "ingest-entities",
      "ingest-images",
      "ingest-chats",
      "link",
      "synthesize",
      "metrics",
    ]);

    let store = pipeline.store();
    assert_eq!(store.list_documents().unwrap().len(), 1);
    assert_eq!(store.list_entities(None).unwrap().len(), 2);
    assert_eq!(store.list_prompts().unwrap().len(), 1);
    // Doc mentions both entities, chat discusses the Green Lion.
    assert_eq!(store.list_relationships().unwrap().len(), 3);
    assert_eq!(store.list_dictionary().unwrap().len(), 2);
    // Only the Green Lion has a nonzero raw score (one prompt mention).
    assert_eq!(store.list_metrics().unwrap().len(), 1);
  }

  #[test]
  fn rerun_converges_to_the_same_graph() {
    let pipeline = Pipeline::new(SqliteStore::open_in_memory().unwrap());
    let input = input();
    pipeline.run(&input).unwrap();
    let rels_before = pipeline.store().list_relationships().unwrap();
    let prompts_before = pipeline.store().list_prompts().unwrap();

    pipeline.run(&input).unwrap();
    assert_eq!(pipeline.store().list_relationships().unwrap(), rels_before);
    assert_eq!(pipeline.store().list_prompts().unwrap(), prompts_before);
    assert_eq!(pipeline.store().list_entities(None).unwrap().len(), 2);
  }

  #[test]
  fn linking_without_entities_is_a_noop() {
    let pipeline = Pipeline::new(SqliteStore::open_in_memory().unwrap());
    let report = pipeline.link(&input().documents).unwrap();
    assert_eq!(report, StageReport::default());
  }
}
