//! SQLite backend for the Athanor graph store.
//!
//! Single synchronous connection, WAL journal. The pipeline is a
//! one-writer batch process, so no connection pooling or async wrapper
//! is involved.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
