//! `athanor` — batch pipeline over the esoterica research corpus.
//!
//! Reads `athanor.toml` (or the path given with `--config`), opens the
//! SQLite store, and runs one or more pipeline stages. Corpus input is
//! a JSON file produced by the external scanners and parsers.
//!
//! # Usage
//!
//! ```
//! athanor run corpus.json
//! athanor ingest-entities seeds.json
//! athanor export --redacted --out public/
//! ```

mod config;

use std::{collections::BTreeMap, fs, path::PathBuf};

use anyhow::{Context, Result};
use athanor_core::store::GraphStore;
use athanor_engine::{CorpusInput, Pipeline, StageReport, audit};
use athanor_export::Exporter;
use athanor_store_sqlite::SqliteStore;
use clap::{Parser, Subcommand};
use config::Settings;
use serde::de::DeserializeOwned;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "athanor", about = "Esoterica corpus pipeline")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "athanor.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Run the full stage sequence over one corpus input file.
  Run { input: PathBuf },
  /// Upsert documents from a corpus input file.
  IngestDocs { input: PathBuf },
  /// Upsert entity seeds from a corpus input file.
  IngestEntities { input: PathBuf },
  /// Upsert chats and derive prompts and tables.
  IngestChats { input: PathBuf },
  /// Upsert extracted images.
  IngestImages { input: PathBuf },
  /// Link entity mentions in document text and chat transcripts.
  Link { input: PathBuf },
  /// Ingest reference sources and link claim notes.
  IngestReference { input: PathBuf },
  /// Manually attach an extracted image to an entity.
  LinkImage { image_id: String, entity_id: i64 },
  /// Rebuild the dictionary view from the entity catalog.
  Synthesize,
  /// Recompute interest-gap metrics.
  Metrics,
  /// Grade metadata richness and print the mend queue.
  Audit,
  /// Write the JSON snapshot artifacts.
  Export {
    /// Public-snapshot mode: redact chat content and paths.
    #[arg(long)]
    redacted: bool,
    /// Output directory; defaults to `snapshot_dir` from config.
    #[arg(long)]
    out:      Option<PathBuf>,
    /// Corpus input file supplying document text for search/stats.
    #[arg(long)]
    input:    Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let store = SqliteStore::open(&settings.db_path).with_context(|| {
    format!("failed to open store at {:?}", settings.db_path)
  })?;
  let mut pipeline =
    Pipeline::new(store).with_commit_every(settings.commit_every);
  if let Some(stages) = settings.stages {
    pipeline = pipeline.with_stages(stages);
  }

  match cli.command {
    Command::Run { input } => {
      let corpus: CorpusInput = read_json(&input)?;
      let summary = pipeline.run(&corpus)?;
      for (stage, report) in &summary.stages {
        print_report(stage, report);
      }
      Exporter::new(&settings.snapshot_dir)
        .redacted(settings.redacted)
        .export_all(pipeline.store(), &document_texts(&corpus))?;
      println!("snapshot written to {:?}", settings.snapshot_dir);
    }
    Command::IngestDocs { input } => {
      let corpus: CorpusInput = read_json(&input)?;
      print_report("ingest-docs", &pipeline.ingest_documents(&corpus.documents)?);
    }
    Command::IngestEntities { input } => {
      let corpus: CorpusInput = read_json(&input)?;
      print_report("ingest-entities", &pipeline.ingest_entities(&corpus.entities)?);
    }
    Command::IngestChats { input } => {
      let corpus: CorpusInput = read_json(&input)?;
      print_report("ingest-chats", &pipeline.ingest_chats(&corpus.chats)?);
    }
    Command::IngestImages { input } => {
      let corpus: CorpusInput = read_json(&input)?;
      print_report("ingest-images", &pipeline.ingest_images(&corpus.images)?);
    }
    Command::Link { input } => {
      let corpus: CorpusInput = read_json(&input)?;
      print_report("link", &pipeline.link(&corpus.documents)?);
    }
    Command::IngestReference { input } => {
      let corpus: CorpusInput = read_json(&input)?;
      let batch = corpus
        .reference
        .context("corpus input carries no reference batch")?;
      print_report("ingest-reference", &pipeline.ingest_reference(&batch)?);
    }
    Command::LinkImage { image_id, entity_id } => {
      let created = pipeline
        .store()
        .link_image_entity(&image_id, entity_id)
        .context("linking image to entity")?;
      println!(
        "{image_id} -> entity {entity_id}: {}",
        if created { "linked" } else { "already linked" }
      );
    }
    Command::Synthesize => {
      print_report("synthesize", &pipeline.synthesize_dictionary()?);
    }
    Command::Metrics => {
      print_report("metrics", &pipeline.compute_metrics()?);
    }
    Command::Audit => {
      let report = audit::audit_store(pipeline.store())?;
      let queue = report.mend_queue(audit::MEND_THRESHOLD);
      println!("{} items graded, {} below threshold", report.graded.len(), queue.len());
      for item in queue {
        println!(
          "  {:>3}  {:<14} {:<10} {}  missing: {}",
          item.score,
          item.grade,
          item.category,
          item.label,
          item.missing.join(", ")
        );
      }
      Exporter::new(&settings.snapshot_dir).export_audit(&report)?;
    }
    Command::Export { redacted, out, input } => {
      let texts = match input {
        Some(path) => document_texts(&read_json::<CorpusInput>(&path)?),
        None => BTreeMap::new(),
      };
      let dir = out.unwrap_or(settings.snapshot_dir);
      Exporter::new(&dir)
        .redacted(redacted || settings.redacted)
        .export_all(pipeline.store(), &texts)?;
      println!("snapshot written to {dir:?}");
    }
  }

  Ok(())
}

fn read_json<T: DeserializeOwned>(path: &PathBuf) -> Result<T> {
  let raw = fs::read_to_string(path)
    .with_context(|| format!("reading {}", path.display()))?;
  serde_json::from_str(&raw)
    .with_context(|| format!("parsing {}", path.display()))
}

/// Transient per-document text for the search and stats artifacts.
fn document_texts(corpus: &CorpusInput) -> BTreeMap<String, String> {
  corpus
    .documents
    .iter()
    .filter_map(|d| d.text.clone().map(|t| (d.resolved_id(), t)))
    .collect()
}

fn print_report(stage: &str, report: &StageReport) {
  println!("{stage}: {} processed, {} skipped", report.processed, report.skipped);
}
