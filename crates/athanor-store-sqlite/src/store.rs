//! [`SqliteStore`] — the SQLite implementation of [`GraphStore`].

use std::{collections::HashMap, path::Path};

use rusqlite::{Connection, OptionalExtension as _, params};

use athanor_core::{
  chat::{Chat, ChatMessage, MinedTable, MoveType, Prompt},
  corpus::{Document, Image},
  dictionary::{
    DictionaryEntry, EntryImage, EntryRelation, EntrySource,
  },
  graph::{AttrMap, Entity, NodeRef, Relationship, merge_attributes},
  metric::Metric,
  reference::{EvidenceSpan, ReferenceNote, ReferenceSource},
  store::GraphStore,
};

use crate::{
  Error, Result,
  encode::{
    RawRelationship, decode_attrs, decode_opt_dt, decode_uuid, encode_attrs,
    encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An Athanor graph store backed by a single SQLite file.
///
/// One connection, one writer. Uniqueness conflicts are absorbed by
/// upsert semantics; they never escape as errors.
pub struct SqliteStore {
  conn: Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn })
  }

  /// Open an in-memory store — useful for testing.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn })
  }

  /// Verify a relationship endpoint exists in its own table.
  fn endpoint_exists(&self, node: &NodeRef) -> Result<bool> {
    let sql = match node {
      NodeRef::Document(_) => "SELECT 1 FROM documents WHERE id = ?1",
      NodeRef::Chat(_) => "SELECT 1 FROM chats WHERE id = ?1",
      NodeRef::Entity(_) => "SELECT 1 FROM entities WHERE id = ?1",
    };
    let found: Option<i64> = self
      .conn
      .query_row(sql, params![node.id_string()], |r| r.get(0))
      .optional()?;
    Ok(found.is_some())
  }

  fn entity_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
  }
}

// ─── GraphStore impl ─────────────────────────────────────────────────────────

impl GraphStore for SqliteStore {
  type Error = Error;

  // ── Batching ──────────────────────────────────────────────────────────

  fn begin_batch(&self) -> Result<()> {
    // Tolerate an already-open batch: the wholesale swaps use savepoints,
    // so only the pipeline ever opens the outer transaction.
    if self.conn.is_autocommit() {
      self.conn.execute_batch("BEGIN IMMEDIATE")?;
    }
    Ok(())
  }

  fn commit_batch(&self) -> Result<()> {
    if !self.conn.is_autocommit() {
      self.conn.execute_batch("COMMIT")?;
    }
    Ok(())
  }

  // ── Entities ──────────────────────────────────────────────────────────

  fn upsert_entity(
    &self,
    name: &str,
    kind: &str,
    attributes: &AttrMap,
  ) -> Result<i64> {
    // The name column is COLLATE NOCASE, so `=` matches any casing while
    // the stored value keeps the first-seen form.
    let existing: Option<(i64, String)> = self
      .conn
      .query_row(
        "SELECT id, attributes FROM entities WHERE name = ?1 AND type = ?2",
        params![name, kind],
        |r| Ok((r.get(0)?, r.get(1)?)),
      )
      .optional()?;

    match existing {
      Some((id, attrs_json)) => {
        let mut merged = decode_attrs(&attrs_json)?;
        merge_attributes(&mut merged, attributes);
        self.conn.execute(
          "UPDATE entities SET attributes = ?1 WHERE id = ?2",
          params![encode_attrs(&merged)?, id],
        )?;
        Ok(id)
      }
      None => {
        self.conn.execute(
          "INSERT INTO entities (name, type, attributes) VALUES (?1, ?2, ?3)",
          params![name, kind, encode_attrs(attributes)?],
        )?;
        Ok(self.conn.last_insert_rowid())
      }
    }
  }

  fn get_entity(&self, id: i64) -> Result<Option<Entity>> {
    let raw = self
      .conn
      .query_row(
        "SELECT id, name, type, attributes FROM entities WHERE id = ?1",
        params![id],
        Self::entity_from_row,
      )
      .optional()?;

    raw
      .map(|(id, name, kind, attrs)| {
        Ok(Entity { id, name, kind, attributes: decode_attrs(&attrs)? })
      })
      .transpose()
  }

  fn find_entity(&self, name: &str, kind: &str) -> Result<Option<Entity>> {
    let raw = self
      .conn
      .query_row(
        "SELECT id, name, type, attributes FROM entities
         WHERE name = ?1 AND type = ?2",
        params![name, kind],
        Self::entity_from_row,
      )
      .optional()?;

    raw
      .map(|(id, name, kind, attrs)| {
        Ok(Entity { id, name, kind, attributes: decode_attrs(&attrs)? })
      })
      .transpose()
  }

  fn list_entities(&self, kind: Option<&str>) -> Result<Vec<Entity>> {
    let mut stmt = match kind {
      Some(_) => self.conn.prepare(
        "SELECT id, name, type, attributes FROM entities
         WHERE type = ?1 ORDER BY id",
      )?,
      None => self.conn.prepare(
        "SELECT id, name, type, attributes FROM entities ORDER BY id",
      )?,
    };

    let rows: Vec<(i64, String, String, String)> = match kind {
      Some(k) => stmt
        .query_map(params![k], Self::entity_from_row)?
        .collect::<rusqlite::Result<_>>()?,
      None => stmt
        .query_map([], Self::entity_from_row)?
        .collect::<rusqlite::Result<_>>()?,
    };

    rows
      .into_iter()
      .map(|(id, name, kind, attrs)| {
        Ok(Entity { id, name, kind, attributes: decode_attrs(&attrs)? })
      })
      .collect()
  }

  // ── Relationships ─────────────────────────────────────────────────────

  fn insert_relationship(&self, rel: &Relationship) -> Result<bool> {
    for node in [&rel.source, &rel.target] {
      if !self.endpoint_exists(node)? {
        return Err(Error::MissingEndpoint(node.prefixed()));
      }
    }

    let inserted = self.conn.execute(
      "INSERT OR IGNORE INTO relationships
         (source_kind, source_id, target_kind, target_id, type, weight)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
      params![
        rel.source.kind_str(),
        rel.source.id_string(),
        rel.target.kind_str(),
        rel.target.id_string(),
        rel.kind.as_str(),
        rel.weight,
      ],
    )?;
    Ok(inserted > 0)
  }

  fn list_relationships(&self) -> Result<Vec<Relationship>> {
    let mut stmt = self.conn.prepare(
      "SELECT source_kind, source_id, target_kind, target_id, type, weight
       FROM relationships ORDER BY id",
    )?;
    let raws: Vec<RawRelationship> = stmt
      .query_map([], |r| {
        Ok(RawRelationship {
          source_kind: r.get(0)?,
          source_id:   r.get(1)?,
          target_kind: r.get(2)?,
          target_id:   r.get(3)?,
          rel_type:    r.get(4)?,
          weight:      r.get(5)?,
        })
      })?
      .collect::<rusqlite::Result<_>>()?;

    raws.into_iter().map(RawRelationship::into_relationship).collect()
  }

  // ── Documents ─────────────────────────────────────────────────────────

  fn upsert_document(&self, doc: &Document) -> Result<()> {
    self.conn.execute(
      "INSERT INTO documents
         (id, filename, path, topic, author, period, century, language,
          size, created_at, summary)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
       ON CONFLICT(id) DO UPDATE SET
         filename   = excluded.filename,
         path       = excluded.path,
         topic      = excluded.topic,
         author     = excluded.author,
         period     = excluded.period,
         century    = excluded.century,
         language   = excluded.language,
         size       = excluded.size,
         created_at = excluded.created_at,
         summary    = excluded.summary",
      params![
        doc.id,
        doc.filename,
        doc.path,
        doc.topic,
        doc.author,
        doc.period,
        doc.century,
        doc.language,
        doc.size,
        doc.created_at.map(encode_dt),
        doc.summary,
      ],
    )?;
    Ok(())
  }

  fn get_document(&self, id: &str) -> Result<Option<Document>> {
    let raw = self
      .conn
      .query_row(
        "SELECT id, filename, path, topic, author, period, century,
                language, size, created_at, summary
         FROM documents WHERE id = ?1",
        params![id],
        document_from_row,
      )
      .optional()?;
    raw.map(finish_document).transpose()
  }

  fn list_documents(&self) -> Result<Vec<Document>> {
    let mut stmt = self.conn.prepare(
      "SELECT id, filename, path, topic, author, period, century,
              language, size, created_at, summary
       FROM documents ORDER BY filename",
    )?;
    let raws: Vec<RawDocument> = stmt
      .query_map([], document_from_row)?
      .collect::<rusqlite::Result<_>>()?;
    raws.into_iter().map(finish_document).collect()
  }

  // ── Chats ─────────────────────────────────────────────────────────────

  fn upsert_chat(&self, chat: &Chat) -> Result<()> {
    self.conn.execute(
      "INSERT INTO chats (id, title, created_at, topic, path)
       VALUES (?1, ?2, ?3, ?4, ?5)
       ON CONFLICT(id) DO UPDATE SET
         title      = excluded.title,
         created_at = excluded.created_at,
         topic      = excluded.topic,
         path       = excluded.path",
      params![
        chat.id,
        chat.title,
        chat.created_at.map(encode_dt),
        chat.topic,
        chat.path,
      ],
    )?;
    Ok(())
  }

  fn list_chats(&self) -> Result<Vec<Chat>> {
    let mut stmt = self
      .conn
      .prepare("SELECT id, title, created_at, topic, path FROM chats ORDER BY id")?;
    let raws: Vec<(String, String, Option<String>, String, String)> = stmt
      .query_map([], |r| {
        Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
      })?
      .collect::<rusqlite::Result<_>>()?;

    raws
      .into_iter()
      .map(|(id, title, created_at, topic, path)| {
        Ok(Chat {
          id,
          title,
          created_at: decode_opt_dt(created_at)?,
          topic,
          path,
        })
      })
      .collect()
  }

  fn replace_messages(
    &self,
    chat_id: &str,
    messages: &[ChatMessage],
  ) -> Result<()> {
    self.conn.execute_batch("SAVEPOINT replace_messages")?;
    let result = (|| -> Result<()> {
      self
        .conn
        .execute("DELETE FROM chat_messages WHERE chat_id = ?1", params![chat_id])?;
      for msg in messages {
        self.conn.execute(
          "INSERT INTO chat_messages (chat_id, role, content, order_index)
           VALUES (?1, ?2, ?3, ?4)",
          params![msg.chat_id, msg.role, msg.content, msg.order_index],
        )?;
      }
      Ok(())
    })();
    finish_savepoint(&self.conn, "replace_messages", result)
  }

  fn list_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>> {
    let mut stmt = self.conn.prepare(
      "SELECT chat_id, role, content, order_index
       FROM chat_messages WHERE chat_id = ?1 ORDER BY order_index",
    )?;
    let msgs = stmt
      .query_map(params![chat_id], |r| {
        Ok(ChatMessage {
          chat_id:     r.get(0)?,
          role:        r.get(1)?,
          content:     r.get(2)?,
          order_index: r.get(3)?,
        })
      })?
      .collect::<rusqlite::Result<_>>()?;
    Ok(msgs)
  }

  fn replace_prompts(&self, chat_id: &str, prompts: &[Prompt]) -> Result<()> {
    self.conn.execute_batch("SAVEPOINT replace_prompts")?;
    let result = (|| -> Result<()> {
      self
        .conn
        .execute("DELETE FROM prompts WHERE chat_id = ?1", params![chat_id])?;
      for p in prompts {
        self.conn.execute(
          "INSERT INTO prompts
             (chat_id, text, move_type, opus_stage, order_index,
              mentions_scholar_name, mentions_text_name)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          params![
            p.chat_id,
            p.text,
            p.move_type.as_str(),
            p.opus_stage,
            p.order_index,
            p.mentions_scholar,
            p.mentions_text,
          ],
        )?;
      }
      Ok(())
    })();
    finish_savepoint(&self.conn, "replace_prompts", result)
  }

  fn list_prompts(&self) -> Result<Vec<Prompt>> {
    let mut stmt = self.conn.prepare(
      "SELECT chat_id, text, move_type, opus_stage, order_index,
              mentions_scholar_name, mentions_text_name
       FROM prompts ORDER BY chat_id, order_index",
    )?;
    let raws: Vec<(String, String, String, String, u32, Option<String>, Option<String>)> =
      stmt
        .query_map([], |r| {
          Ok((
            r.get(0)?,
            r.get(1)?,
            r.get(2)?,
            r.get(3)?,
            r.get(4)?,
            r.get(5)?,
            r.get(6)?,
          ))
        })?
        .collect::<rusqlite::Result<_>>()?;

    raws
      .into_iter()
      .map(|(chat_id, text, mv, stage, idx, scholar, source_text)| {
        Ok(Prompt {
          chat_id,
          text,
          move_type: MoveType::parse(&mv).map_err(Error::Core)?,
          opus_stage: stage,
          order_index: idx,
          mentions_scholar: scholar,
          mentions_text: source_text,
        })
      })
      .collect()
  }

  fn replace_tables(&self, chat_id: &str, tables: &[MinedTable]) -> Result<()> {
    self.conn.execute_batch("SAVEPOINT replace_tables")?;
    let result = (|| -> Result<()> {
      self
        .conn
        .execute("DELETE FROM tables WHERE chat_id = ?1", params![chat_id])?;
      for t in tables {
        self.conn.execute(
          "INSERT INTO tables (chat_id, content, prompt, title, topic)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![t.chat_id, t.content, t.prompt, t.title, t.topic],
        )?;
      }
      Ok(())
    })();
    finish_savepoint(&self.conn, "replace_tables", result)
  }

  fn list_tables(&self) -> Result<Vec<MinedTable>> {
    let mut stmt = self.conn.prepare(
      "SELECT chat_id, content, prompt, title, topic FROM tables ORDER BY id",
    )?;
    let tables = stmt
      .query_map([], |r| {
        Ok(MinedTable {
          chat_id: r.get(0)?,
          content: r.get(1)?,
          prompt:  r.get(2)?,
          title:   r.get(3)?,
          topic:   r.get(4)?,
        })
      })?
      .collect::<rusqlite::Result<_>>()?;
    Ok(tables)
  }

  // ── Reference layer ───────────────────────────────────────────────────

  fn upsert_reference_source(&self, source: &ReferenceSource) -> Result<()> {
    self.conn.execute(
      "INSERT INTO reference_sources
         (id, short_name, citation, source_type, domain, year)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)
       ON CONFLICT(id) DO UPDATE SET
         short_name  = excluded.short_name,
         citation    = excluded.citation,
         source_type = excluded.source_type,
         domain      = excluded.domain,
         year        = excluded.year",
      params![
        source.id,
        source.short_name,
        source.citation,
        source.source_type,
        source.domain,
        source.year,
      ],
    )?;
    Ok(())
  }

  fn list_reference_sources(&self) -> Result<Vec<ReferenceSource>> {
    let mut stmt = self.conn.prepare(
      "SELECT id, short_name, citation, source_type, domain, year
       FROM reference_sources ORDER BY id",
    )?;
    let sources = stmt
      .query_map([], |r| {
        Ok(ReferenceSource {
          id:          r.get(0)?,
          short_name:  r.get(1)?,
          citation:    r.get(2)?,
          source_type: r.get(3)?,
          domain:      r.get(4)?,
          year:        r.get(5)?,
        })
      })?
      .collect::<rusqlite::Result<_>>()?;
    Ok(sources)
  }

  fn insert_reference_note(&self, note: &ReferenceNote) -> Result<()> {
    note.validate().map_err(Error::Core)?;
    if self.get_entity(note.subject_id)?.is_none() {
      return Err(Error::SubjectNotFound(note.subject_id));
    }
    self.conn.execute(
      "INSERT INTO reference_notes
         (id, source_id, subject_type, subject_id, claim_text, stance,
          confidence)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      params![
        encode_uuid(note.id),
        note.source_id,
        note.subject_type,
        note.subject_id,
        note.claim_text,
        note.stance,
        note.confidence,
      ],
    )?;
    Ok(())
  }

  fn list_reference_notes(&self) -> Result<Vec<ReferenceNote>> {
    let mut stmt = self.conn.prepare(
      "SELECT id, source_id, subject_type, subject_id, claim_text, stance,
              confidence
       FROM reference_notes ORDER BY source_id, id",
    )?;
    let raws: Vec<(String, String, String, i64, String, String, f64)> = stmt
      .query_map([], |r| {
        Ok((
          r.get(0)?,
          r.get(1)?,
          r.get(2)?,
          r.get(3)?,
          r.get(4)?,
          r.get(5)?,
          r.get(6)?,
        ))
      })?
      .collect::<rusqlite::Result<_>>()?;

    raws
      .into_iter()
      .map(|(id, source_id, subject_type, subject_id, claim, stance, conf)| {
        Ok(ReferenceNote {
          id: decode_uuid(&id)?,
          source_id,
          subject_type,
          subject_id,
          claim_text: claim,
          stance,
          confidence: conf,
        })
      })
      .collect()
  }

  fn insert_evidence_span(&self, span: &EvidenceSpan) -> Result<()> {
    self.conn.execute(
      "INSERT INTO evidence_spans (id, note_id, doc_id, page, excerpt)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      params![
        encode_uuid(span.id),
        encode_uuid(span.note_id),
        span.doc_id,
        span.page,
        span.excerpt,
      ],
    )?;
    Ok(())
  }

  fn note_counts_by_entity(&self) -> Result<HashMap<i64, u64>> {
    let mut stmt = self.conn.prepare(
      "SELECT subject_id, COUNT(*) FROM reference_notes
       WHERE subject_type = 'entity' GROUP BY subject_id",
    )?;
    let counts = stmt
      .query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, u64>(1)?)))?
      .collect::<rusqlite::Result<_>>()?;
    Ok(counts)
  }

  // ── Images ────────────────────────────────────────────────────────────

  fn upsert_image(&self, image: &Image) -> Result<()> {
    self.conn.execute(
      "INSERT INTO images (id, doc_id, page_number, path, sha256, domain)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)
       ON CONFLICT(id) DO UPDATE SET
         doc_id      = excluded.doc_id,
         page_number = excluded.page_number,
         path        = excluded.path,
         sha256      = excluded.sha256,
         domain      = excluded.domain",
      params![
        image.id,
        image.doc_id,
        image.page_number,
        image.path,
        image.sha256,
        image.domain,
      ],
    )?;
    Ok(())
  }

  fn list_images(&self) -> Result<Vec<Image>> {
    let mut stmt = self.conn.prepare(
      "SELECT id, doc_id, page_number, path, sha256, domain
       FROM images ORDER BY id",
    )?;
    let images = stmt
      .query_map([], |r| {
        Ok(Image {
          id:          r.get(0)?,
          doc_id:      r.get(1)?,
          page_number: r.get(2)?,
          path:        r.get(3)?,
          sha256:      r.get(4)?,
          domain:      r.get(5)?,
        })
      })?
      .collect::<rusqlite::Result<_>>()?;
    Ok(images)
  }

  fn link_image_entity(&self, image_id: &str, entity_id: i64) -> Result<bool> {
    let inserted = self.conn.execute(
      "INSERT OR IGNORE INTO image_entity_links (image_id, entity_id)
       VALUES (?1, ?2)",
      params![image_id, entity_id],
    )?;
    Ok(inserted > 0)
  }

  // ── Derived views ─────────────────────────────────────────────────────

  fn replace_dictionary(&self, entries: &[DictionaryEntry]) -> Result<()> {
    self.conn.execute_batch("SAVEPOINT replace_dictionary")?;
    let result = (|| -> Result<()> {
      // Children first; ON DELETE CASCADE would also cover them, but the
      // explicit order keeps the swap readable in the WAL.
      for table in
        ["entry_synonyms", "entry_sources", "entry_images", "entry_relationships"]
      {
        self.conn.execute(&format!("DELETE FROM {table}"), [])?;
      }
      self.conn.execute("DELETE FROM dictionary_entries", [])?;

      for entry in entries {
        let entry_id = encode_uuid(entry.id);
        self.conn.execute(
          "INSERT INTO dictionary_entries
             (id, headword, short_definition, physical_meaning,
              spiritual_meaning, opus_stage, domain, ambiguity_flag,
              confidence_score, created_by)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          params![
            entry_id,
            entry.headword,
            entry.short_definition,
            entry.physical_meaning,
            entry.spiritual_meaning,
            entry.opus_stage,
            entry.domain,
            entry.ambiguity_flag,
            entry.confidence_score,
            entry.created_by,
          ],
        )?;

        for synonym in &entry.synonyms {
          self.conn.execute(
            "INSERT INTO entry_synonyms (entry_id, synonym) VALUES (?1, ?2)",
            params![entry_id, synonym],
          )?;
        }
        for src in &entry.sources {
          self.conn.execute(
            "INSERT INTO entry_sources (entry_id, source_id, note)
             VALUES (?1, ?2, ?3)",
            params![entry_id, src.source_id, src.note],
          )?;
        }
        for img in &entry.images {
          self.conn.execute(
            "INSERT INTO entry_images (entry_id, image_id, caption)
             VALUES (?1, ?2, ?3)",
            params![entry_id, img.image_id, img.caption],
          )?;
        }
        for rel in &entry.relations {
          self.conn.execute(
            "INSERT INTO entry_relationships (entry_id, other_headword, relation)
             VALUES (?1, ?2, ?3)",
            params![entry_id, rel.other_headword, rel.relation],
          )?;
        }
      }
      Ok(())
    })();
    finish_savepoint(&self.conn, "replace_dictionary", result)
  }

  fn list_dictionary(&self) -> Result<Vec<DictionaryEntry>> {
    let mut stmt = self.conn.prepare(
      "SELECT id, headword, short_definition, physical_meaning,
              spiritual_meaning, opus_stage, domain, ambiguity_flag,
              confidence_score, created_by
       FROM dictionary_entries ORDER BY headword",
    )?;
    let raws: Vec<RawEntry> = stmt
      .query_map([], |r| {
        Ok(RawEntry {
          id:                r.get(0)?,
          headword:          r.get(1)?,
          short_definition:  r.get(2)?,
          physical_meaning:  r.get(3)?,
          spiritual_meaning: r.get(4)?,
          opus_stage:        r.get(5)?,
          domain:            r.get(6)?,
          ambiguity_flag:    r.get(7)?,
          confidence_score:  r.get(8)?,
          created_by:        r.get(9)?,
        })
      })?
      .collect::<rusqlite::Result<_>>()?;

    raws
      .into_iter()
      .map(|raw| {
        let entry_id = raw.id.clone();
        let mut entry = raw.into_entry()?;
        entry.synonyms = self.entry_children(
          "SELECT synonym FROM entry_synonyms WHERE entry_id = ?1 ORDER BY id",
          &entry_id,
          |r| r.get(0),
        )?;
        entry.sources = self.entry_children(
          "SELECT source_id, note FROM entry_sources WHERE entry_id = ?1 ORDER BY id",
          &entry_id,
          |r| Ok(EntrySource { source_id: r.get(0)?, note: r.get(1)? }),
        )?;
        entry.images = self.entry_children(
          "SELECT image_id, caption FROM entry_images WHERE entry_id = ?1 ORDER BY id",
          &entry_id,
          |r| Ok(EntryImage { image_id: r.get(0)?, caption: r.get(1)? }),
        )?;
        entry.relations = self.entry_children(
          "SELECT other_headword, relation FROM entry_relationships
           WHERE entry_id = ?1 ORDER BY id",
          &entry_id,
          |r| Ok(EntryRelation { other_headword: r.get(0)?, relation: r.get(1)? }),
        )?;
        Ok(entry)
      })
      .collect()
  }

  fn replace_metrics(&self, metrics: &[Metric]) -> Result<()> {
    self.conn.execute_batch("SAVEPOINT replace_metrics")?;
    let result = (|| -> Result<()> {
      self.conn.execute("DELETE FROM metrics", [])?;
      for m in metrics {
        self.conn.execute(
          "INSERT INTO metrics
             (entity_id, name, scholar_interest, user_curiosity, gap)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![m.entity_id, m.name, m.scholar_interest, m.user_curiosity, m.gap],
        )?;
      }
      Ok(())
    })();
    finish_savepoint(&self.conn, "replace_metrics", result)
  }

  fn list_metrics(&self) -> Result<Vec<Metric>> {
    let mut stmt = self.conn.prepare(
      "SELECT entity_id, name, scholar_interest, user_curiosity, gap
       FROM metrics ORDER BY gap DESC",
    )?;
    let metrics = stmt
      .query_map([], |r| {
        Ok(Metric {
          entity_id:        r.get(0)?,
          name:             r.get(1)?,
          scholar_interest: r.get(2)?,
          user_curiosity:   r.get(3)?,
          gap:              r.get(4)?,
        })
      })?
      .collect::<rusqlite::Result<_>>()?;
    Ok(metrics)
  }
}

impl SqliteStore {
  fn entry_children<T>(
    &self,
    sql: &str,
    entry_id: &str,
    map: impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
  ) -> Result<Vec<T>> {
    let mut stmt = self.conn.prepare(sql)?;
    let rows = stmt
      .query_map(params![entry_id], map)?
      .collect::<rusqlite::Result<_>>()?;
    Ok(rows)
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

type RawDocument = (
  String,
  String,
  String,
  String,
  String,
  String,
  Option<String>,
  Option<String>,
  u64,
  Option<String>,
  Option<String>,
);

fn document_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawDocument> {
  Ok((
    r.get(0)?,
    r.get(1)?,
    r.get(2)?,
    r.get(3)?,
    r.get(4)?,
    r.get(5)?,
    r.get(6)?,
    r.get(7)?,
    r.get(8)?,
    r.get(9)?,
    r.get(10)?,
  ))
}

fn finish_document(raw: RawDocument) -> Result<Document> {
  let (
    id,
    filename,
    path,
    topic,
    author,
    period,
    century,
    language,
    size,
    created_at,
    summary,
  ) = raw;
  Ok(Document {
    id,
    filename,
    path,
    topic,
    author,
    period,
    century,
    language,
    size,
    created_at: decode_opt_dt(created_at)?,
    summary,
  })
}

struct RawEntry {
  id:                String,
  headword:          String,
  short_definition:  String,
  physical_meaning:  String,
  spiritual_meaning: String,
  opus_stage:        Option<String>,
  domain:            String,
  ambiguity_flag:    bool,
  confidence_score:  f64,
  created_by:        String,
}

impl RawEntry {
  fn into_entry(self) -> Result<DictionaryEntry> {
    Ok(DictionaryEntry {
      id:                decode_uuid(&self.id)?,
      headword:          self.headword,
      short_definition:  self.short_definition,
      physical_meaning:  self.physical_meaning,
      spiritual_meaning: self.spiritual_meaning,
      opus_stage:        self.opus_stage,
      domain:            self.domain,
      ambiguity_flag:    self.ambiguity_flag,
      confidence_score:  self.confidence_score,
      created_by:        self.created_by,
      synonyms:          Vec::new(),
      sources:           Vec::new(),
      images:            Vec::new(),
      relations:         Vec::new(),
    })
  }
}

/// Release or roll back a savepoint depending on `result`.
fn finish_savepoint(
  conn: &Connection,
  name: &str,
  result: Result<()>,
) -> Result<()> {
  match result {
    Ok(()) => {
      conn.execute_batch(&format!("RELEASE {name}"))?;
      Ok(())
    }
    Err(e) => {
      let _ = conn.execute_batch(&format!(
        "ROLLBACK TO {name}; RELEASE {name}"
      ));
      Err(e)
    }
  }
}
