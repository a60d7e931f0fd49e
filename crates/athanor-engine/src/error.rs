//! Error type for `athanor-engine`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A storage backend failure that could not be absorbed by skipping
  /// the offending item.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("mention pattern error: {0}")]
  Pattern(#[from] regex::Error),
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
