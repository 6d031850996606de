//! filer-meta: namespace metadata for the filer.
//!
//! Architecture:
//! - [`filechunks`] - reconciles overlapping chunk lists into the visible view
//! - [`entry::Entry`] - server-side entry with KV store serialization
//! - [`MetaStore`] - metadata tree operations inside KV transactions
//! - [`Filer`] / [`FilerImpl`] - transactional create/update/delete/find/list
//!   that hands released chunks to the [`ChunkGc`] after commit

pub mod config;
pub mod entry;
pub mod filechunks;
pub mod gc;
pub mod key_prefix;
pub mod meta_store;
pub mod service;

pub use config::FilerConfig;
pub use entry::{Attr, AttrUpdate, Entry};
pub use gc::{ChunkDeleter, ChunkGc};
pub use meta_store::MetaStore;
pub use service::{DeleteOptions, Filer, FilerImpl};
