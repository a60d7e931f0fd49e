//! JSON snapshot export.
//!
//! Serializes the store into the artifact set consumed by the static
//! presentation layer. Shaping and redaction only; the exporter never
//! mutates the store.

mod error;
mod shape;
mod snapshot;

pub use error::{Error, Result};
pub use shape::{
  ConfigOut, EdgeOut, GraphOut, NodeOut, Stats, WordFreq,
};
pub use snapshot::Exporter;
