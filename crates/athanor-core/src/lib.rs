//! Core types and trait definitions for the Athanor corpus engine.
//!
//! This crate is deliberately free of database and I/O dependencies.
//! All other crates depend on it; it depends on nothing heavier than
//! serde and sha2.

pub mod chat;
pub mod classify;
pub mod corpus;
pub mod dictionary;
pub mod error;
pub mod graph;
pub mod metric;
pub mod record;
pub mod reference;
pub mod store;

pub use error::{Error, Result};
