//! KV store backend implementations for the filer.
//!
//! - **memdb** -- In-memory BTreeMap-backed store with optimistic conflict
//!   detection.

pub mod memdb;

pub use memdb::MemDbEngine;
