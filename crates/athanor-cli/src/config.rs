//! Runtime configuration, layered from `athanor.toml` and `ATHANOR_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context;
use athanor_core::classify::Lexicon;
use serde::Deserialize;

/// Settings for one invocation. Every field has a default, so a bare
/// `athanor run corpus.json` works with no config file present.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite database path.
  pub db_path:      PathBuf,
  /// Snapshot output directory.
  pub snapshot_dir: PathBuf,
  /// Batch commit cadence, in records.
  pub commit_every: usize,
  /// Default export mode; `export --redacted` overrides per run.
  pub redacted:     bool,
  /// Optional replacement for the built-in opus-stage keyword table.
  pub stages:       Option<Lexicon>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      db_path:      PathBuf::from("athanor.db"),
      snapshot_dir: PathBuf::from("snapshots"),
      commit_every: 50,
      redacted:     false,
      stages:       None,
    }
  }
}

impl Settings {
  /// Config file (optional) layered under `ATHANOR_*` env vars.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("ATHANOR"))
      .build()
      .context("failed to read config")?;
    settings.try_deserialize().context("failed to deserialise Settings")
  }
}
