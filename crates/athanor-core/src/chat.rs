//! Chat transcripts, derived prompts, and mined tables.
//!
//! Transcripts arrive pre-parsed from the (external) chat-log parser as
//! ordered message lists; the engine derives prompts and tables from
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Chats & messages ────────────────────────────────────────────────────────

/// One chat session. `id` is the transcript hash assigned by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
  pub id:         String,
  pub title:      String,
  pub created_at: Option<DateTime<Utc>>,
  pub topic:      String,
  pub path:       String,
}

/// One message within a chat. `order_index` is a dense, per-chat
/// monotonic sequence matching original transcript order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub chat_id:     String,
  /// Open role string from the transcript ("user", "you", "assistant").
  pub role:        String,
  pub content:     String,
  pub order_index: u32,
}

impl ChatMessage {
  /// Whether this message was authored by the human participant.
  pub fn is_user_authored(&self) -> bool {
    matches!(self.role.as_str(), "user" | "you")
  }
}

// ─── Prompts ─────────────────────────────────────────────────────────────────

/// The rhetorical move a prompt makes, classified heuristically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveType {
  Investigate,
  Summarize,
  Tabulate,
  CrossReference,
  Critique,
}

impl MoveType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Investigate => "Investigate",
      Self::Summarize => "Summarize",
      Self::Tabulate => "Tabulate",
      Self::CrossReference => "Cross-Reference",
      Self::Critique => "Critique",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "Investigate" => Ok(Self::Investigate),
      "Summarize" => Ok(Self::Summarize),
      "Tabulate" => Ok(Self::Tabulate),
      "Cross-Reference" => Ok(Self::CrossReference),
      "Critique" => Ok(Self::Critique),
      other => Err(Error::UnknownMoveType(other.to_owned())),
    }
  }

  /// Per-prompt weight in the curiosity metric. Critiques signal twice
  /// the engagement of a plain investigative question.
  pub fn curiosity_weight(&self) -> f64 {
    match self {
      Self::Critique => 2.0,
      _ => 1.0,
    }
  }
}

/// A user-authored question extracted from a chat, with heuristic
/// classification fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
  pub chat_id:          String,
  pub text:             String,
  pub move_type:        MoveType,
  /// Symbolic-stage label from the opus lexicon; "Nigredo" by default.
  pub opus_stage:       String,
  pub order_index:      u32,
  /// First scholar-typed entity name found in the text, if any.
  pub mentions_scholar: Option<String>,
  /// First source-text-typed entity name found in the text, if any.
  pub mentions_text:    Option<String>,
}

// ─── Mined tables ────────────────────────────────────────────────────────────

/// A row-oriented table lifted out of a chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinedTable {
  pub chat_id: String,
  /// The table body as a normalized pipe-delimited grid.
  pub content: String,
  /// Preceding message text, truncated.
  pub prompt:  String,
  /// First line of `prompt`, truncated to 50 chars with an ellipsis.
  pub title:   String,
  pub topic:   String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn move_type_round_trips() {
    for mv in [
      MoveType::Investigate,
      MoveType::Summarize,
      MoveType::Tabulate,
      MoveType::CrossReference,
      MoveType::Critique,
    ] {
      assert_eq!(MoveType::parse(mv.as_str()).unwrap(), mv);
    }
  }

  #[test]
  fn critique_weighs_double() {
    assert_eq!(MoveType::Critique.curiosity_weight(), 2.0);
    assert_eq!(MoveType::Investigate.curiosity_weight(), 1.0);
  }
}
