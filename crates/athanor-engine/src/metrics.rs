//! Interest-gap metrics and document similarity.
//!
//! Scholar interest is how much the reference layer says about an
//! entity; user curiosity is how often (and how pointedly) the chat
//! prompts ask about it. Both are max-normalized per run, so the gap
//! is a relative signal within one corpus snapshot, not an absolute
//! quantity.

use std::collections::BTreeMap;

use athanor_core::{corpus::Document, metric::Metric, store::GraphStore};
use serde::Serialize;
use tracing::info;

use crate::{Error, Result, pipeline::StageReport};

/// Compute per-entity interest-gap metrics from the current graph.
/// Entities with both raw scores zero are excluded.
pub fn compute_interest_gap<S: GraphStore>(store: &S) -> Result<Vec<Metric>> {
  let entities = store.list_entities(None).map_err(Error::store)?;
  let note_counts = store.note_counts_by_entity().map_err(Error::store)?;
  let prompts = store.list_prompts().map_err(Error::store)?;

  let prompt_index: Vec<(String, f64)> = prompts
    .iter()
    .map(|p| (p.text.to_lowercase(), p.move_type.curiosity_weight()))
    .collect();

  let raw: Vec<(i64, String, f64, f64)> = entities
    .into_iter()
    .map(|e| {
      let interest = note_counts.get(&e.id).copied().unwrap_or(0) as f64;
      let lower = e.name.to_lowercase();
      let curiosity: f64 = prompt_index
        .iter()
        .filter(|(text, _)| text.contains(&lower))
        .map(|(_, weight)| weight)
        .sum();
      (e.id, e.name, interest, curiosity)
    })
    .collect();

  let max_interest = raw.iter().map(|r| r.2).fold(0.0, f64::max).max(1.0);
  let max_curiosity = raw.iter().map(|r| r.3).fold(0.0, f64::max).max(1.0);

  Ok(
    raw
      .into_iter()
      .filter(|(_, _, interest, curiosity)| *interest > 0.0 || *curiosity > 0.0)
      .map(|(entity_id, name, interest, curiosity)| {
        let scholar_interest = interest / max_interest;
        let user_curiosity = curiosity / max_curiosity;
        Metric {
          entity_id,
          name,
          scholar_interest,
          user_curiosity,
          gap: user_curiosity - scholar_interest,
        }
      })
      .collect(),
  )
}

/// Recompute the metrics view and swap it in wholesale.
pub fn rebuild_metrics<S: GraphStore>(store: &S) -> Result<StageReport> {
  let metrics = compute_interest_gap(store)?;
  let processed = metrics.len();
  store.replace_metrics(&metrics).map_err(Error::store)?;
  info!(entities = processed, "metrics rebuilt");
  Ok(StageReport { processed, skipped: 0 })
}

// ─── Document similarity ─────────────────────────────────────────────────────

/// Additive metadata similarity. Symmetric; not a metric distance.
pub fn similarity_score(a: &Document, b: &Document) -> u32 {
  let mut score = 0;
  if a.topic == b.topic {
    score += 3;
  }
  if a.period == b.period {
    score += 2;
  }
  if a.author != "Unknown" && a.author == b.author {
    score += 5;
  }
  if let (Some(ca), Some(cb)) = (&a.century, &b.century) {
    if ca == cb {
      score += 1;
    }
  }
  score
}

/// One related-document suggestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedDoc {
  pub doc_id: String,
  pub score:  u32,
}

/// Per-document top 3 related documents by [`similarity_score`].
/// Zero-score pairs are dropped; ties keep corpus iteration order.
pub fn recommendations(
  docs: &[Document],
) -> BTreeMap<String, Vec<RelatedDoc>> {
  let mut recs = BTreeMap::new();
  for doc in docs {
    let mut related: Vec<RelatedDoc> = docs
      .iter()
      .filter(|other| other.id != doc.id)
      .map(|other| RelatedDoc {
        doc_id: other.id.clone(),
        score:  similarity_score(doc, other),
      })
      .filter(|r| r.score > 0)
      .collect();
    related.sort_by(|a, b| b.score.cmp(&a.score));
    related.truncate(3);
    recs.insert(doc.id.clone(), related);
  }
  recs
}

#[cfg(test)]
mod tests {
  use athanor_core::{
    chat::{Chat, MoveType, Prompt},
    graph::AttrMap,
    reference::{ReferenceNote, ReferenceSource, SourceIntent},
  };
  use athanor_store_sqlite::SqliteStore;

  use super::*;

  fn doc(id: &str, topic: &str, period: &str, author: &str) -> Document {
    Document {
      id:         id.to_owned(),
      filename:   format!("{id}.pdf"),
      path:       format!("/corpus/{id}.pdf"),
      topic:      topic.to_owned(),
      author:     author.to_owned(),
      period:     period.to_owned(),
      century:    None,
      language:   None,
      size:       1,
      created_at: None,
      summary:    None,
    }
  }

  fn prompt(text: &str, move_type: MoveType, i: u32) -> Prompt {
    Prompt {
      chat_id:          "c1".to_owned(),
      text:             text.to_owned(),
      move_type,
      opus_stage:       "Nigredo".to_owned(),
      order_index:      i,
      mentions_scholar: None,
      mentions_text:    None,
    }
  }

  #[test]
  fn gap_is_normalized_curiosity_minus_normalized_interest() {
    let store = SqliteStore::open_in_memory().unwrap();
    let a = store
      .upsert_entity("Mercury", "Alchemy Material", &AttrMap::new())
      .unwrap();
    let b = store
      .upsert_entity("Green Lion", "Alchemy Symbol", &AttrMap::new())
      .unwrap();

    store
      .upsert_reference_source(&ReferenceSource {
        id:          "src_x".to_owned(),
        short_name:  "Obrist 2012".to_owned(),
        citation:    "Obrist, Barbara. 'Visualization in Medieval Alchemy'."
          .to_owned(),
        source_type: "Secondary".to_owned(),
        domain:      "Alchemy".to_owned(),
        year:        Some(2012),
      })
      .unwrap();

    // Four notes about Mercury, none about the Green Lion.
    for _ in 0..4 {
      store
        .insert_reference_note(&ReferenceNote::about_entity(
          "src_x",
          a,
          "Mercury appears throughout the visual tradition.",
          SourceIntent::Analytical,
        ))
        .unwrap();
    }

    // One plain prompt about Mercury, one critique about the Green Lion.
    store
      .upsert_chat(&Chat {
        id:         "c1".to_owned(),
        title:      "t".to_owned(),
        created_at: None,
        topic:      "Alchemy".to_owned(),
        path:       "p".to_owned(),
      })
      .unwrap();
    store
      .replace_prompts("c1", &[
        prompt("What is mercury?", MoveType::Investigate, 0),
        prompt("Evaluate the green lion imagery?", MoveType::Critique, 1),
      ])
      .unwrap();

    let metrics = compute_interest_gap(&store).unwrap();
    let mercury = metrics.iter().find(|m| m.entity_id == a).unwrap();
    let lion = metrics.iter().find(|m| m.entity_id == b).unwrap();

    assert_eq!(mercury.scholar_interest, 1.0);
    assert_eq!(lion.scholar_interest, 0.0);
    // Raw curiosity 1.0 vs 2.0, max-normalized to 0.5 vs 1.0.
    assert_eq!(mercury.user_curiosity, 0.5);
    assert_eq!(lion.user_curiosity, 1.0);
    assert_eq!(mercury.gap, -0.5);
    assert_eq!(lion.gap, 1.0);
  }

  #[test]
  fn silent_entities_are_excluded() {
    let store = SqliteStore::open_in_memory().unwrap();
    store
      .upsert_entity("Athanor", "Alchemy Equipment", &AttrMap::new())
      .unwrap();
    assert!(compute_interest_gap(&store).unwrap().is_empty());
  }

  #[test]
  fn similarity_adds_per_matching_field() {
    let a = doc("a", "Alchemy", "Renaissance", "Ripley");
    let b = doc("b", "Alchemy", "Renaissance", "Maier");
    assert_eq!(similarity_score(&a, &b), 5);

    let c = doc("c", "Alchemy", "Renaissance", "Ripley");
    assert_eq!(similarity_score(&a, &c), 10);

    // Shared "Unknown" author earns nothing.
    let u1 = doc("u1", "Hermeticism", "Antiquity", "Unknown");
    let u2 = doc("u2", "Hermeticism", "Medieval", "Unknown");
    assert_eq!(similarity_score(&u1, &u2), 3);

    let mut d = doc("d", "Magic", "Modern", "Yates");
    let mut e = doc("e", "Kabbalah", "Baroque", "Scholem");
    d.century = Some("17th".to_owned());
    e.century = Some("17th".to_owned());
    assert_eq!(similarity_score(&d, &e), 1);
  }

  #[test]
  fn recommendations_cap_at_three_and_drop_zero_scores() {
    let docs = vec![
      doc("a", "Alchemy", "Renaissance", "Ripley"),
      doc("b", "Alchemy", "Renaissance", "Ripley"),
      doc("c", "Alchemy", "Renaissance", "Unknown"),
      doc("d", "Alchemy", "Medieval", "Unknown"),
      doc("e", "Hermeticism", "Antiquity", "Trismegistus"),
    ];
    let recs = recommendations(&docs);

    let for_a = &recs["a"];
    assert_eq!(for_a.len(), 3);
    // Full author+topic+period match ranks first.
    assert_eq!(for_a[0].doc_id, "b");
    assert_eq!(for_a[0].score, 10);
    // Nothing relates to the lone Hermetica.
    assert!(recs["e"].is_empty());
  }
}
