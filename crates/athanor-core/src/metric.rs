//! Interest-gap metrics — the derived analytics view.

use serde::{Deserialize, Serialize};

/// Normalized interest scores for one entity. Recomputed wholesale each
/// metrics run; `gap = user_curiosity - scholar_interest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
  pub entity_id:        i64,
  pub name:             String,
  /// Max-normalized reference-note count, in [0, 1].
  pub scholar_interest: f64,
  /// Max-normalized weighted prompt-mention score, in [0, 1].
  pub user_curiosity:   f64,
  /// In [-1, 1].
  pub gap:              f64,
}
