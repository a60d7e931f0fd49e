//! The Athanor processing engine.
//!
//! Every stage is generic over [`athanor_core::store::GraphStore`] and
//! follows the same discipline: per-item failures are logged and the
//! item skipped, sibling items are never aborted, and re-running a
//! stage against unchanged input converges on the same graph (the one
//! documented exception is reference-note linking, which appends).

pub mod audit;
pub mod dictionary;
pub mod error;
pub mod mentions;
pub mod metrics;
pub mod pipeline;
pub mod prompts;
pub mod reference;
pub mod resolver;
pub mod tables;

pub use error::{Error, Result};
pub use pipeline::{CorpusInput, Pipeline, RunSummary, StageReport};
