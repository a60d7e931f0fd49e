//! Error types for `athanor-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown node kind discriminant: {0:?}")]
  UnknownNodeKind(String),

  #[error("unknown relationship kind: {0:?}")]
  UnknownRelKind(String),

  #[error("unknown move type: {0:?}")]
  UnknownMoveType(String),

  #[error("confidence {0} outside [0, 1]")]
  ConfidenceOutOfRange(f64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
