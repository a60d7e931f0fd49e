//! Output shapes for the JSON artifact contract.
//!
//! Field names here are a compatibility surface; the presentation layer
//! reads these files without consulting this crate.

use std::collections::BTreeMap;

use athanor_core::corpus::Document;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One stopword-filtered corpus word with its occurrence count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordFreq {
  pub word:  String,
  pub count: u64,
}

/// `stats.json`: catalog aggregates plus the word-frequency list.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
  pub documents:        usize,
  pub topics:           BTreeMap<String, u64>,
  pub periods:          BTreeMap<String, u64>,
  pub authors:          BTreeMap<String, u64>,
  pub word_frequencies: Vec<WordFreq>,
}

impl Stats {
  pub fn aggregate(docs: &[Document], word_frequencies: Vec<WordFreq>) -> Self {
    let mut topics: BTreeMap<String, u64> = BTreeMap::new();
    let mut periods: BTreeMap<String, u64> = BTreeMap::new();
    let mut authors: BTreeMap<String, u64> = BTreeMap::new();
    for doc in docs {
      *topics.entry(doc.topic.clone()).or_default() += 1;
      *periods.entry(doc.period.clone()).or_default() += 1;
      *authors.entry(doc.author.clone()).or_default() += 1;
    }
    Self { documents: docs.len(), topics, periods, authors, word_frequencies }
  }
}

/// One `graph.json` node. `id` carries the kind prefix ("doc:", "chat:",
/// "entity:") so ids never collide across tables.
#[derive(Debug, Clone, Serialize)]
pub struct NodeOut {
  pub id:    String,
  pub label: String,
  #[serde(rename = "type")]
  pub kind:  String,
  /// 1 + node degree; drives rendered node size.
  pub size:  u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeOut {
  pub source: String,
  pub target: String,
  pub weight: f64,
}

/// `graph.json`.
#[derive(Debug, Clone, Serialize)]
pub struct GraphOut {
  pub nodes: Vec<NodeOut>,
  pub edges: Vec<EdgeOut>,
}

/// `config.json`: feature flags plus the generation timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigOut {
  pub features:     BTreeMap<String, bool>,
  pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn doc(id: &str, topic: &str, author: &str) -> Document {
    Document {
      id:         id.to_owned(),
      filename:   format!("{id}.pdf"),
      path:       format!("/x/{id}.pdf"),
      topic:      topic.to_owned(),
      author:     author.to_owned(),
      period:     "Renaissance".to_owned(),
      century:    None,
      language:   None,
      size:       1,
      created_at: None,
      summary:    None,
    }
  }

  #[test]
  fn stats_aggregate_counts_by_field() {
    let docs = vec![
      doc("a", "Alchemy", "Ripley"),
      doc("b", "Alchemy", "Unknown"),
      doc("c", "Hermeticism", "Unknown"),
    ];
    let stats = Stats::aggregate(&docs, Vec::new());
    assert_eq!(stats.documents, 3);
    assert_eq!(stats.topics["Alchemy"], 2);
    assert_eq!(stats.authors["Unknown"], 2);
    assert_eq!(stats.periods["Renaissance"], 3);
  }
}
