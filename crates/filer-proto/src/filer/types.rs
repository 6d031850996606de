//! Namespace entities as they travel over the wire.

use filer_types::{Gid, Uid};
use serde::{Deserialize, Serialize};

/// Directory bit of `FuseAttributes::file_mode` (`S_IFDIR`).
pub const MODE_DIR: u32 = 0o040000;
/// Regular-file bit of `FuseAttributes::file_mode` (`S_IFREG`).
pub const MODE_REGULAR: u32 = 0o100000;
pub const MODE_TYPE_MASK: u32 = 0o170000;
pub const MODE_PERM_MASK: u32 = 0o7777;

/// An immutable reference to bytes stored on a volume server.
///
/// `offset` is the logical position in the owning file; `chunk_offset` is the
/// position inside the stored blob where that logical range begins. Chunks
/// produced by a fresh write have `chunk_offset == 0`; compaction may cut a
/// chunk down to a later fragment of the same blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChunk {
    pub file_id: String,
    pub offset: u64,
    pub size: u64,
    #[serde(default)]
    pub mtime: i64,
    #[serde(default)]
    pub chunk_offset: u64,
}

impl FileChunk {
    pub fn new(file_id: impl Into<String>, offset: u64, size: u64) -> Self {
        Self {
            file_id: file_id.into(),
            offset,
            size,
            ..Default::default()
        }
    }

    /// Logical end offset (exclusive), or `None` past `u64::MAX`.
    pub fn checked_end(&self) -> Option<u64> {
        self.offset.checked_add(self.size)
    }

    /// Logical end offset (exclusive), clamped to `u64::MAX`.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FuseAttributes {
    pub file_size: u64,
    /// Seconds since the Unix epoch.
    pub mtime: i64,
    pub file_mode: u32,
    pub uid: Uid,
    pub gid: Gid,
    pub crtime: i64,
    pub mime: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub name: String,
    #[serde(default)]
    pub is_directory: bool,
    #[serde(default)]
    pub chunks: Vec<FileChunk>,
    /// Absent on updates that only replace the chunk list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<FuseAttributes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub url: String,
    pub public_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Locations {
    pub locations: Vec<Location>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_json_field_names() {
        let chunk = FileChunk::new("3,01637037d6", 0, 100);
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["fileId"], "3,01637037d6");
        assert_eq!(json["chunkOffset"], 0);
        assert_eq!(chunk.end(), 100);
    }

    #[test]
    fn test_chunk_end_past_u64_max() {
        let chunk = FileChunk::new("7,aa", u64::MAX - 5, 100);
        assert_eq!(chunk.checked_end(), None);
        assert_eq!(chunk.end(), u64::MAX);
        assert_eq!(FileChunk::new("7,aa", 10, 5).checked_end(), Some(15));
    }

    #[test]
    fn test_entry_defaults_when_fields_missing() {
        let entry: Entry = serde_json::from_str(r#"{"name":"b.txt"}"#).unwrap();
        assert_eq!(entry.name, "b.txt");
        assert!(!entry.is_directory);
        assert!(entry.chunks.is_empty());
        assert!(entry.attributes.is_none());
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("attributes").is_none());
    }

    #[test]
    fn test_chunk_without_chunk_offset() {
        let chunk: FileChunk =
            serde_json::from_str(r#"{"fileId":"1,ab12345678","offset":5,"size":7}"#).unwrap();
        assert_eq!(chunk.chunk_offset, 0);
        assert_eq!(chunk.mtime, 0);
    }
}
