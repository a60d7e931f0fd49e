//! Keyword-density classification.
//!
//! Classification rules are plain data — an ordered list of labelled
//! keyword sets — injected into the classifier rather than baked in as
//! module constants, so they can be overridden from configuration and
//! tested in isolation. Declaration order matters: on an exact score
//! tie the first-declared label wins.

use serde::{Deserialize, Serialize};

// ─── Lexicon ─────────────────────────────────────────────────────────────────

/// One labelled keyword set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconCategory {
  pub label:    String,
  pub keywords: Vec<String>,
}

/// An ordered classification table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
  pub categories: Vec<LexiconCategory>,
}

impl Lexicon {
  pub fn new(
    categories: impl IntoIterator<Item = (&'static str, &'static [&'static str])>,
  ) -> Self {
    Self {
      categories: categories
        .into_iter()
        .map(|(label, keywords)| LexiconCategory {
          label:    label.to_owned(),
          keywords: keywords.iter().map(|k| (*k).to_owned()).collect(),
        })
        .collect(),
    }
  }

  /// Score every category against `text`: the number of its keywords
  /// that occur as case-insensitive substrings.
  pub fn scores(&self, text: &str) -> Vec<(&str, usize)> {
    let haystack = text.to_lowercase();
    self
      .categories
      .iter()
      .map(|cat| {
        let hits = cat
          .keywords
          .iter()
          .filter(|kw| haystack.contains(&kw.to_lowercase()))
          .count();
        (cat.label.as_str(), hits)
      })
      .collect()
  }

  /// The highest-scoring label, or `None` if nothing scored. Exact ties
  /// go to the first-declared category.
  pub fn classify(&self, text: &str) -> Option<&str> {
    let mut best: Option<(&str, usize)> = None;
    for (label, hits) in self.scores(text) {
      // Strictly-greater replacement keeps the first-declared label on
      // an exact tie.
      if best.is_none_or(|(_, top)| hits > top) {
        best = Some((label, hits));
      }
    }
    best.and_then(|(label, hits)| (hits > 0).then_some(label))
  }

  /// Like [`Lexicon::classify`] but a tie between the top two labels, or
  /// a zero score, yields `"Ambivalent"` instead.
  pub fn classify_or_ambivalent(&self, text: &str) -> &str {
    let mut scores = self.scores(text);
    // Stable sort: declaration order survives among equal scores.
    scores.sort_by(|a, b| b.1.cmp(&a.1));
    match scores.as_slice() {
      [] | [(_, 0), ..] => "Ambivalent",
      [(_, a), (_, b), ..] if a == b => "Ambivalent",
      [(top, _), ..] => top,
    }
  }
}

// ─── Default tables ──────────────────────────────────────────────────────────

/// The four symbolic-narrative stages of the opus, by thematic keyword
/// density.
pub fn default_opus_stages() -> Lexicon {
  Lexicon::new([
    ("Nigredo", [
      "black",
      "crow",
      "raven",
      "putrefaction",
      "death",
      "night",
      "darkness",
      "saturn",
      "lead",
    ]
    .as_slice()),
    ("Albedo", [
      "white",
      "swan",
      "dove",
      "lily",
      "silver",
      "moon",
      "luna",
      "purification",
      "washing",
    ]
    .as_slice()),
    ("Citrinitas", ["yellow", "gold", "solar", "eagle", "light"].as_slice()),
    ("Rubedo", [
      "red", "king", "phoenix", "blood", "stone", "fire", "sun", "sol",
      "fixation",
    ]
    .as_slice()),
  ])
}

/// Physical vs. spiritual register of a text fragment.
pub fn default_domains() -> Lexicon {
  Lexicon::new([
    ("Physical", [
      "furnace", "fire", "acid", "metal", "glass", "distill", "heat", "flask",
      "vessel",
    ]
    .as_slice()),
    ("Spiritual", [
      "soul",
      "spirit",
      "god",
      "prayer",
      "meditation",
      "vision",
      "angel",
      "heaven",
      "inner",
    ]
    .as_slice()),
  ])
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classify_picks_densest_stage() {
    let stages = default_opus_stages();
    assert_eq!(
      stages.classify("the black crow of putrefaction"),
      Some("Nigredo")
    );
    assert_eq!(stages.classify("the red king in the fire"), Some("Rubedo"));
  }

  #[test]
  fn classify_returns_none_on_zero_score() {
    let stages = default_opus_stages();
    assert_eq!(stages.classify("an unremarkable sentence"), None);
  }

  #[test]
  fn exact_tie_goes_to_first_declared_category() {
    // "black" hits Nigredo, "white" hits Albedo: one keyword each.
    let stages = default_opus_stages();
    assert_eq!(stages.classify("black and white"), Some("Nigredo"));
  }

  #[test]
  fn tie_break_follows_declaration_order_not_match_order() {
    // Albedo's keyword appears first in the text; Nigredo still wins the
    // tie because it is declared first.
    let stages = default_opus_stages();
    assert_eq!(stages.classify("white then black"), Some("Nigredo"));
  }

  #[test]
  fn domain_tie_and_zero_are_ambivalent() {
    let domains = default_domains();
    assert_eq!(domains.classify_or_ambivalent("furnace and flask"), "Physical");
    assert_eq!(domains.classify_or_ambivalent("soul and spirit"), "Spiritual");
    assert_eq!(domains.classify_or_ambivalent("fire of the soul"), "Ambivalent");
    assert_eq!(domains.classify_or_ambivalent("nothing here"), "Ambivalent");
  }

  #[test]
  fn matching_is_case_insensitive() {
    let stages = default_opus_stages();
    assert_eq!(stages.classify("The RAVEN descends"), Some("Nigredo"));
  }
}
