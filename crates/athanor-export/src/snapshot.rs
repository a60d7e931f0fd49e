//! Snapshot writer.

use std::{
  collections::BTreeMap,
  fs::{self, File},
  io::BufWriter,
  path::{Path, PathBuf},
  sync::OnceLock,
};

use athanor_core::{corpus::Document, store::GraphStore};
use athanor_engine::{audit::AuditReport, metrics::recommendations};
use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::{
  Error, Result,
  shape::{ConfigOut, EdgeOut, GraphOut, NodeOut, Stats, WordFreq},
};

/// Substituted for chat-derived content in redacted snapshots.
const PLACEHOLDER: &str = "[withheld from public snapshot]";
/// Search blob truncation, in chars.
const SEARCH_MAX: usize = 1000;
/// Word-frequency list length.
const TOP_WORDS: usize = 50;

const STOPWORDS: [&str; 15] = [
  "the", "and", "that", "this", "from", "with", "which", "their", "they",
  "were", "been", "have", "would", "could", "should",
];

fn word_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    // Capitalized names of 4+ letters, or plain words of 5+.
    Regex::new(r"\b[A-Z][a-z]{3,}\b|\b[a-z]{5,}\b").expect("literal pattern")
  })
}

/// Writes the JSON artifact set for one store snapshot.
pub struct Exporter {
  dir:      PathBuf,
  redacted: bool,
}

impl Exporter {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into(), redacted: false }
  }

  /// Public-snapshot mode: chat content is replaced by a placeholder
  /// and filesystem paths are stripped to basenames.
  pub fn redacted(mut self, on: bool) -> Self {
    self.redacted = on;
    self
  }

  fn write_json(&self, name: &str, value: &impl Serialize) -> Result<()> {
    fs::create_dir_all(&self.dir)?;
    let path = self.dir.join(name);
    let file = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(file, value)?;
    info!(artifact = name, "snapshot written");
    Ok(())
  }

  fn redact_path(&self, path: &str) -> String {
    if !self.redacted {
      return path.to_owned();
    }
    Path::new(path)
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  }

  /// Write every artifact. `texts` maps document id to extracted text
  /// (transient pipeline data, never stored) for the search blob and
  /// word frequencies.
  pub fn export_all<S: GraphStore>(
    &self,
    store: &S,
    texts: &BTreeMap<String, String>,
  ) -> Result<()> {
    let mut docs = store.list_documents().map_err(Error::store)?;
    for doc in &mut docs {
      doc.path = self.redact_path(&doc.path);
    }

    self.write_json("docs.json", &docs)?;
    self
      .write_json("entities.json", &store.list_entities(None).map_err(Error::store)?)?;
    self.write_json(
      "stats.json",
      &Stats::aggregate(&docs, word_frequencies(&docs, texts)),
    )?;
    self.export_graph(store)?;
    self.write_json("metrics.json", &store.list_metrics().map_err(Error::store)?)?;
    self.write_json("recommendations.json", &recommendations(&docs))?;
    self.export_search(&docs, texts)?;
    self.export_tables(store)?;
    self.write_json("dictionary.json", &store.list_dictionary().map_err(Error::store)?)?;
    self.export_config()?;
    Ok(())
  }

  fn export_graph<S: GraphStore>(&self, store: &S) -> Result<()> {
    let rels = store.list_relationships().map_err(Error::store)?;

    let edges: Vec<EdgeOut> = rels
      .iter()
      .map(|r| EdgeOut {
        source: r.source.prefixed(),
        target: r.target.prefixed(),
        weight: r.weight.unwrap_or(1.0),
      })
      .collect();

    let mut degree: BTreeMap<String, u64> = BTreeMap::new();
    for edge in &edges {
      *degree.entry(edge.source.clone()).or_default() += 1;
      *degree.entry(edge.target.clone()).or_default() += 1;
    }
    let size = |id: &str| 1 + degree.get(id).copied().unwrap_or(0);

    let mut nodes = Vec::new();
    for doc in store.list_documents().map_err(Error::store)? {
      let id = format!("doc:{}", doc.id);
      nodes.push(NodeOut {
        size: size(&id),
        id,
        label: doc.filename,
        kind: "document".to_owned(),
      });
    }
    for chat in store.list_chats().map_err(Error::store)? {
      let id = format!("chat:{}", chat.id);
      let label =
        if self.redacted { PLACEHOLDER.to_owned() } else { chat.title };
      nodes.push(NodeOut { size: size(&id), id, label, kind: "chat".to_owned() });
    }
    for entity in store.list_entities(None).map_err(Error::store)? {
      let id = format!("entity:{}", entity.id);
      nodes.push(NodeOut {
        size: size(&id),
        id,
        label: entity.name,
        kind: entity.kind,
      });
    }

    self.write_json("graph.json", &GraphOut { nodes, edges })
  }

  fn export_search(
    &self,
    docs: &[Document],
    texts: &BTreeMap<String, String>,
  ) -> Result<()> {
    let mut search: BTreeMap<&str, String> = BTreeMap::new();
    for doc in docs {
      let blob = texts
        .get(&doc.id)
        .map(String::as_str)
        .or(doc.summary.as_deref())
        .unwrap_or_default();
      search.insert(&doc.id, blob.chars().take(SEARCH_MAX).collect());
    }
    self.write_json("search.json", &search)
  }

  fn export_tables<S: GraphStore>(&self, store: &S) -> Result<()> {
    let mut tables = store.list_tables().map_err(Error::store)?;
    if self.redacted {
      for table in &mut tables {
        table.content = PLACEHOLDER.to_owned();
        table.prompt = PLACEHOLDER.to_owned();
        table.title = PLACEHOLDER.to_owned();
      }
    }
    self.write_json("tables.json", &tables)
  }

  fn export_config(&self) -> Result<()> {
    let mut features = BTreeMap::new();
    features.insert("redacted".to_owned(), self.redacted);
    features.insert("graph".to_owned(), true);
    features.insert("dictionary".to_owned(), true);
    features.insert("metrics".to_owned(), true);
    self.write_json("config.json", &ConfigOut {
      features,
      generated_at: Utc::now(),
    })
  }

  /// Write the metadata audit report alongside the snapshot.
  pub fn export_audit(&self, report: &AuditReport) -> Result<()> {
    #[derive(Serialize)]
    struct AuditOut<'a> {
      graded:     &'a [athanor_engine::audit::Graded],
      mend_queue: Vec<&'a athanor_engine::audit::Graded>,
    }
    self.write_json("audit.json", &AuditOut {
      graded:     &report.graded,
      mend_queue: report.mend_queue(athanor_engine::audit::MEND_THRESHOLD),
    })
  }
}

/// Stopword-filtered word counts over extracted text and summaries,
/// most frequent first.
fn word_frequencies(
  docs: &[Document],
  texts: &BTreeMap<String, String>,
) -> Vec<WordFreq> {
  let mut counts: BTreeMap<String, u64> = BTreeMap::new();
  let mut tally = |text: &str| {
    for m in word_pattern().find_iter(text) {
      let word = m.as_str().to_lowercase();
      if STOPWORDS.contains(&word.as_str()) {
        continue;
      }
      *counts.entry(word).or_default() += 1;
    }
  };
  for text in texts.values() {
    tally(text);
  }
  for doc in docs {
    if let Some(summary) = &doc.summary {
      tally(summary);
    }
  }

  let mut freqs: Vec<WordFreq> = counts
    .into_iter()
    .map(|(word, count)| WordFreq { word, count })
    .collect();
  freqs.sort_by(|a, b| b.count.cmp(&a.count).then(a.word.cmp(&b.word)));
  freqs.truncate(TOP_WORDS);
  freqs
}
