//! Error type for `athanor-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] athanor_core::Error),

  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A relationship endpoint does not exist in its table.
  #[error("missing relationship endpoint: {0}")]
  MissingEndpoint(String),

  /// A reference note's subject entity does not exist.
  #[error("note subject entity not found: {0}")]
  SubjectNotFound(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
