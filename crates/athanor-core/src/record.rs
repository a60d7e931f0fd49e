//! Input records at the adapter boundary.
//!
//! The scanners, extractors, and parsers that feed the engine live
//! outside this repository; they hand over plain JSON records in these
//! shapes. Missing optional metadata is defaulted here, once, so the
//! rest of the engine never sees half-empty rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{
  chat::{Chat, ChatMessage},
  corpus::{Document, Image},
  graph::AttrMap,
  reference::{ReferenceSource, SourceIntent},
};

// ─── Documents ───────────────────────────────────────────────────────────────

/// One scanned document as emitted by the catalog scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
  /// Content hash when the scanner computed one.
  pub id:         Option<String>,
  pub filename:   String,
  pub path:       String,
  #[serde(default)]
  pub topic:      Option<String>,
  #[serde(default)]
  pub author:     Option<String>,
  #[serde(default)]
  pub period:     Option<String>,
  #[serde(default)]
  pub century:    Option<String>,
  #[serde(default)]
  pub language:   Option<String>,
  pub size:       u64,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub summary:    Option<String>,
  /// Extracted text, when the text extractor ran. Consumed by the
  /// mention linker and the search export; not stored on the document.
  #[serde(default)]
  pub text:       Option<String>,
}

impl DocumentRecord {
  /// Resolve the deterministic document id.
  pub fn resolved_id(&self) -> String {
    match &self.id {
      Some(id) => id.clone(),
      None => Document::fallback_id(&self.filename, self.size),
    }
  }

  pub fn into_document(self) -> Document {
    let id = self.resolved_id();
    Document {
      id,
      filename: self.filename,
      path: self.path,
      topic: self.topic.unwrap_or_else(|| "Unsorted".to_owned()),
      author: self.author.unwrap_or_else(|| "Unknown".to_owned()),
      period: self.period.unwrap_or_else(|| "Undetermined".to_owned()),
      century: self.century,
      language: self.language,
      size: self.size,
      created_at: self.created_at,
      summary: self.summary,
    }
  }
}

// ─── Entities ────────────────────────────────────────────────────────────────

/// A candidate entity from a miner or seed list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySeed {
  pub name:       String,
  #[serde(rename = "type")]
  pub kind:       String,
  #[serde(default)]
  pub attributes: AttrMap,
}

// ─── Chats ───────────────────────────────────────────────────────────────────

/// One parsed chat transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
  /// Transcript hash; derived from `path` when the parser omitted it.
  pub id:         Option<String>,
  pub title:      String,
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub topic:      Option<String>,
  pub path:       String,
  pub messages:   Vec<MessageRecord>,
}

/// One transcript message, in original order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
  pub role:    String,
  pub content: String,
}

impl ChatRecord {
  /// Short path-derived id for parsers that did not assign one.
  pub fn resolved_id(&self) -> String {
    match &self.id {
      Some(id) => id.clone(),
      None => {
        let digest = Sha256::digest(self.path.as_bytes());
        format!("{digest:x}")[..12].to_owned()
      }
    }
  }

  pub fn to_chat(&self) -> Chat {
    Chat {
      id:         self.resolved_id(),
      title:      self.title.clone(),
      created_at: self.created_at,
      topic:      self.topic.clone().unwrap_or_else(|| "General".to_owned()),
      path:       self.path.clone(),
    }
  }

  /// Messages with dense order indices matching transcript order.
  pub fn to_messages(&self) -> Vec<ChatMessage> {
    let chat_id = self.resolved_id();
    self
      .messages
      .iter()
      .enumerate()
      .map(|(i, msg)| ChatMessage {
        chat_id:     chat_id.clone(),
        role:        msg.role.clone(),
        content:     msg.content.clone(),
        order_index: i as u32,
      })
      .collect()
  }
}

// ─── Images ──────────────────────────────────────────────────────────────────

/// One extracted image as emitted by the PDF image extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
  #[serde(default)]
  pub id:          Option<String>,
  pub doc_id:      String,
  pub page_number: u32,
  pub path:        String,
  pub sha256:      String,
  #[serde(default)]
  pub domain:      Option<String>,
}

impl ImageRecord {
  pub fn into_image(self) -> Image {
    let id = self
      .id
      .unwrap_or_else(|| self.sha256[..self.sha256.len().min(16)].to_owned());
    Image {
      id,
      doc_id: self.doc_id,
      page_number: self.page_number,
      path: self.path,
      sha256: self.sha256,
      domain: self.domain.unwrap_or_else(|| "General".to_owned()),
    }
  }
}

// ─── Reference material ──────────────────────────────────────────────────────

/// A block of scholarly text attributed to one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimBlock {
  pub source_id: String,
  pub intent:    SourceIntent,
  pub text:      String,
}

/// Sources plus the text blocks to link against the entity catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceBatch {
  pub sources: Vec<ReferenceSource>,
  pub blocks:  Vec<ClaimBlock>,
}
