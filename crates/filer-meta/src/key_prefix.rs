//! Key prefix bytes for data stored in the KV engine.

/// Prefix byte for namespace entries. The rest of the key is
/// `<parent dir> NUL <name>`.
pub const ENTRY_PREFIX: u8 = 0x01;

/// Separates the parent directory from the name inside an entry key. Paths
/// never contain NUL, so children of one directory share a key prefix and
/// sort by name.
pub const DIR_NAME_SEPARATOR: u8 = 0x00;
