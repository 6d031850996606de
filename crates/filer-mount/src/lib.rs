//! filer-mount: filesystem adaptor over the filer RPC surface.
//!
//! - [`FilerFileSystem`] - shared client, path-keyed attribute cache and
//!   handle ids for one mount
//! - [`Dir`] / [`File`] - node callbacks (attr, lookup, read_dir, open,
//!   setattr, fsync, release)
//! - [`FileHandle`] - per-open write buffer ([`DirtyPages`])
//!
//! The node API is independent of any kernel binding so it can be driven
//! directly in tests.

pub mod config;
pub mod dir;
pub mod file;
pub mod filesystem;
pub mod handle;
pub mod types;

pub use config::MountConfig;
pub use dir::{Dir, DirEntry};
pub use file::File;
pub use filesystem::{FilerFileSystem, Node};
pub use handle::{DirtyPages, FileHandle};
pub use types::{FileAttr, FuseError, FuseResult, SetAttrValues};
