//! The `GraphStore` trait.
//!
//! Implemented by storage backends (`athanor-store-sqlite`); the engine
//! and exporter depend on this abstraction, not on any concrete
//! backend. The pipeline is a single-threaded batch process, so every
//! operation is synchronous and blocking.

use std::collections::HashMap;

use crate::{
  chat::{Chat, ChatMessage, MinedTable, Prompt},
  corpus::{Document, Image},
  dictionary::DictionaryEntry,
  graph::{AttrMap, Entity, Relationship},
  metric::Metric,
  reference::{EvidenceSpan, ReferenceNote, ReferenceSource},
};

/// Abstraction over the persistent entity/relationship graph.
///
/// Authoritative tables (entities, relationships, documents, chats,
/// reference data, images) are upsert-only; derived views (dictionary,
/// metrics) are replaced wholesale. Uniqueness constraints are resolved
/// inside the store — a key collision is never surfaced as an error.
pub trait GraphStore {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Batching ──────────────────────────────────────────────────────────

  /// Open an explicit transaction. Writes issued before
  /// [`GraphStore::commit_batch`] become durable together; the pipeline
  /// calls this every N processed records so a crash loses at most one
  /// batch.
  fn begin_batch(&self) -> Result<(), Self::Error>;

  fn commit_batch(&self) -> Result<(), Self::Error>;

  // ── Entities ──────────────────────────────────────────────────────────

  /// Insert or merge an entity keyed by case-insensitive `(name, kind)`.
  ///
  /// On conflict the stored name (first-seen casing) is kept and the
  /// attribute maps are merged last-writer-wins. Returns the entity id.
  fn upsert_entity(
    &self,
    name: &str,
    kind: &str,
    attributes: &AttrMap,
  ) -> Result<i64, Self::Error>;

  fn get_entity(&self, id: i64) -> Result<Option<Entity>, Self::Error>;

  /// Case-insensitive lookup by `(name, kind)`.
  fn find_entity(
    &self,
    name: &str,
    kind: &str,
  ) -> Result<Option<Entity>, Self::Error>;

  fn list_entities(
    &self,
    kind: Option<&str>,
  ) -> Result<Vec<Entity>, Self::Error>;

  // ── Relationships ─────────────────────────────────────────────────────

  /// Insert-if-absent on the `(source, target, kind)` triple. Returns
  /// `true` when a new edge was stored.
  fn insert_relationship(
    &self,
    rel: &Relationship,
  ) -> Result<bool, Self::Error>;

  fn list_relationships(&self) -> Result<Vec<Relationship>, Self::Error>;

  // ── Documents ─────────────────────────────────────────────────────────

  /// Upsert keyed on the deterministic document id; path/topic/metadata
  /// are refreshed on conflict, never duplicated.
  fn upsert_document(&self, doc: &Document) -> Result<(), Self::Error>;

  fn get_document(&self, id: &str) -> Result<Option<Document>, Self::Error>;

  fn list_documents(&self) -> Result<Vec<Document>, Self::Error>;

  // ── Chats ─────────────────────────────────────────────────────────────

  fn upsert_chat(&self, chat: &Chat) -> Result<(), Self::Error>;

  fn list_chats(&self) -> Result<Vec<Chat>, Self::Error>;

  /// Replace all messages of a chat (re-ingest is idempotent).
  fn replace_messages(
    &self,
    chat_id: &str,
    messages: &[ChatMessage],
  ) -> Result<(), Self::Error>;

  fn list_messages(
    &self,
    chat_id: &str,
  ) -> Result<Vec<ChatMessage>, Self::Error>;

  fn replace_prompts(
    &self,
    chat_id: &str,
    prompts: &[Prompt],
  ) -> Result<(), Self::Error>;

  fn list_prompts(&self) -> Result<Vec<Prompt>, Self::Error>;

  fn replace_tables(
    &self,
    chat_id: &str,
    tables: &[MinedTable],
  ) -> Result<(), Self::Error>;

  fn list_tables(&self) -> Result<Vec<MinedTable>, Self::Error>;

  // ── Reference layer ───────────────────────────────────────────────────

  fn upsert_reference_source(
    &self,
    source: &ReferenceSource,
  ) -> Result<(), Self::Error>;

  fn list_reference_sources(
    &self,
  ) -> Result<Vec<ReferenceSource>, Self::Error>;

  /// Append-only; claim notes are deliberately not deduplicated.
  fn insert_reference_note(
    &self,
    note: &ReferenceNote,
  ) -> Result<(), Self::Error>;

  fn list_reference_notes(&self) -> Result<Vec<ReferenceNote>, Self::Error>;

  fn insert_evidence_span(
    &self,
    span: &EvidenceSpan,
  ) -> Result<(), Self::Error>;

  /// Raw scholar-interest counts: notes per subject entity.
  fn note_counts_by_entity(&self)
  -> Result<HashMap<i64, u64>, Self::Error>;

  // ── Images ────────────────────────────────────────────────────────────

  fn upsert_image(&self, image: &Image) -> Result<(), Self::Error>;

  fn list_images(&self) -> Result<Vec<Image>, Self::Error>;

  /// Insert-if-absent image/entity link. Returns `true` when new.
  fn link_image_entity(
    &self,
    image_id: &str,
    entity_id: i64,
  ) -> Result<bool, Self::Error>;

  // ── Derived views ─────────────────────────────────────────────────────

  /// Swap the dictionary wholesale: delete-all-then-reinsert, with child
  /// rows, inside one transaction.
  fn replace_dictionary(
    &self,
    entries: &[DictionaryEntry],
  ) -> Result<(), Self::Error>;

  fn list_dictionary(&self) -> Result<Vec<DictionaryEntry>, Self::Error>;

  /// Swap the metrics table wholesale.
  fn replace_metrics(&self, metrics: &[Metric]) -> Result<(), Self::Error>;

  fn list_metrics(&self) -> Result<Vec<Metric>, Self::Error>;
}
