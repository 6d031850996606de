//! Wire messages shared by the filer, its clients and the mount.
//!
//! All messages are plain serde types; the HTTP transport encodes them as
//! JSON with camelCase field names.

pub mod file_id;
pub mod filer;
pub mod master;

pub use file_id::FileId;
