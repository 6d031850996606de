//! Server-side namespace entry with KV store operations.
//!
//! An entry is keyed by `[ENTRY_PREFIX] + parent dir + NUL + name`, so the
//! children of one directory form a contiguous key range ordered by name.
//! The value is the JSON encoding of the attributes and chunk list.

use filer_kv::{KeyRange, RangePage, ReadTxn, WriteTxn};
use filer_proto::filer::{self as proto, FileChunk, FuseAttributes, MODE_DIR, MODE_TYPE_MASK};
use filer_types::{make_error_msg, FullPath, Gid, Result, Status, StatusCode, Uid, UtcTime};
use serde::{Deserialize, Serialize};

use crate::filechunks::total_size;
use crate::key_prefix::{DIR_NAME_SEPARATOR, ENTRY_PREFIX};

/// Permission bits given to directories created implicitly by `create`.
pub const IMPLICIT_DIR_MODE: u32 = MODE_DIR | 0o770;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
    pub mtime: UtcTime,
    pub crtime: UtcTime,
    /// File type and permission bits.
    pub mode: u32,
    pub uid: Uid,
    pub gid: Gid,
    #[serde(default)]
    pub mime: String,
}

impl Attr {
    pub fn is_directory(&self) -> bool {
        self.mode & MODE_TYPE_MASK == MODE_DIR
    }

    /// Overwrite the fields present in `update`, leaving the rest alone.
    pub fn merge(&mut self, update: AttrUpdate) {
        if let Some(mtime) = update.mtime {
            self.mtime = mtime;
        }
        if let Some(mode) = update.mode {
            self.mode = mode;
        }
        if let Some(uid) = update.uid {
            self.uid = uid;
        }
        if let Some(gid) = update.gid {
            self.gid = gid;
        }
        if let Some(mime) = update.mime {
            self.mime = mime;
        }
    }
}

/// The attribute fields an update explicitly sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrUpdate {
    pub mtime: Option<UtcTime>,
    pub mode: Option<u32>,
    pub uid: Option<Uid>,
    pub gid: Option<Gid>,
    pub mime: Option<String>,
}

impl AttrUpdate {
    /// Read presence out of wire attributes: zero `mtime`/`file_mode` and an
    /// empty `mime` mean "unchanged"; owner ids are always carried.
    pub fn from_wire(attrs: &FuseAttributes) -> Self {
        Self {
            mtime: (attrs.mtime != 0).then(|| UtcTime::from_unix_secs(attrs.mtime)),
            mode: (attrs.file_mode != 0).then_some(attrs.file_mode),
            uid: Some(attrs.uid),
            gid: Some(attrs.gid),
            mime: (!attrs.mime.is_empty()).then(|| attrs.mime.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub full_path: FullPath,
    pub attr: Attr,
    /// Always empty for directories.
    pub chunks: Vec<FileChunk>,
}

#[derive(Serialize, Deserialize)]
struct EntryData {
    attr: Attr,
    #[serde(default)]
    chunks: Vec<FileChunk>,
}

impl Entry {
    pub fn new_directory(full_path: FullPath, mode: u32, uid: Uid, gid: Gid, now: UtcTime) -> Self {
        Self {
            full_path,
            attr: Attr {
                mtime: now,
                crtime: now,
                mode: MODE_DIR | (mode & !MODE_TYPE_MASK),
                uid,
                gid,
                mime: String::new(),
            },
            chunks: Vec::new(),
        }
    }

    /// The implicit root directory, never stored.
    pub fn root() -> Self {
        Self::new_directory(
            FullPath::root(),
            0o755,
            Uid(0),
            Gid(0),
            UtcTime::from_unix_secs(0),
        )
    }

    /// Build an entry from its wire form placed under `directory`.
    ///
    /// Either `is_directory` or a directory type in `file_mode` makes the
    /// entry a directory, which drops any chunks. A zero `crtime` is
    /// stamped from `mtime`.
    pub fn from_proto(directory: &FullPath, entry: &proto::Entry) -> Result<Self> {
        let full_path = directory.child(&entry.name)?;
        let attrs = entry.attributes.clone().unwrap_or_default();
        let is_directory = entry.is_directory || attrs.file_mode & MODE_TYPE_MASK == MODE_DIR;
        let mode = if is_directory {
            MODE_DIR | (attrs.file_mode & !MODE_TYPE_MASK)
        } else {
            attrs.file_mode
        };
        let crtime = if attrs.crtime == 0 { attrs.mtime } else { attrs.crtime };
        Ok(Self {
            full_path,
            attr: Attr {
                mtime: UtcTime::from_unix_secs(attrs.mtime),
                crtime: UtcTime::from_unix_secs(crtime),
                mode,
                uid: attrs.uid,
                gid: attrs.gid,
                mime: attrs.mime,
            },
            chunks: if is_directory {
                Vec::new()
            } else {
                entry.chunks.clone()
            },
        })
    }

    pub fn name(&self) -> &str {
        self.full_path.name()
    }

    pub fn is_directory(&self) -> bool {
        self.attr.is_directory()
    }

    pub fn size(&self) -> u64 {
        total_size(&self.chunks)
    }

    pub fn attributes(&self) -> FuseAttributes {
        FuseAttributes {
            file_size: self.size(),
            mtime: self.attr.mtime.unix_secs(),
            file_mode: self.attr.mode,
            uid: self.attr.uid,
            gid: self.attr.gid,
            crtime: self.attr.crtime.unix_secs(),
            mime: self.attr.mime.clone(),
        }
    }

    pub fn to_proto(&self) -> proto::Entry {
        proto::Entry {
            name: self.name().to_string(),
            is_directory: self.is_directory(),
            chunks: self.chunks.clone(),
            attributes: Some(self.attributes()),
        }
    }

    // ---- KV encoding ----

    pub fn pack_key(&self) -> Vec<u8> {
        Self::pack_key_for(&self.full_path)
    }

    /// Key format: `[ENTRY_PREFIX] + dir + NUL + name`.
    pub fn pack_key_for(path: &FullPath) -> Vec<u8> {
        let (dir, name) = path.dir_and_name();
        let mut key = Self::pack_children_prefix(dir);
        key.extend_from_slice(name.as_bytes());
        key
    }

    /// Common prefix of every child key of `dir`.
    pub fn pack_children_prefix(dir: &str) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(2 + dir.len());
        prefix.push(ENTRY_PREFIX);
        prefix.extend_from_slice(dir.as_bytes());
        prefix.push(DIR_NAME_SEPARATOR);
        prefix
    }

    fn pack_value(&self) -> Result<Vec<u8>> {
        let data = EntryData {
            attr: self.attr.clone(),
            chunks: self.chunks.clone(),
        };
        serde_json::to_vec(&data).map_err(|e| {
            Status::with_message(
                StatusCode::DATA_CORRUPTION,
                format!("failed to serialize entry {}: {}", self.full_path, e),
            )
        })
    }

    pub fn unpack(key: &[u8], value: &[u8]) -> Result<Self> {
        if key.first() != Some(&ENTRY_PREFIX) {
            return make_error_msg(StatusCode::DATA_CORRUPTION, "invalid entry key prefix");
        }
        let rest = &key[1..];
        let sep = match rest.iter().position(|b| *b == DIR_NAME_SEPARATOR) {
            Some(sep) => sep,
            None => {
                return make_error_msg(StatusCode::DATA_CORRUPTION, "entry key has no separator")
            }
        };
        let (dir, name) = (&rest[..sep], &rest[sep + 1..]);
        let dir = std::str::from_utf8(dir).map_err(|_| {
            Status::with_message(StatusCode::DATA_CORRUPTION, "entry dir is not valid UTF-8")
        })?;
        let name = std::str::from_utf8(name).map_err(|_| {
            Status::with_message(StatusCode::DATA_CORRUPTION, "entry name is not valid UTF-8")
        })?;
        let full_path = FullPath::from_dir_and_name(dir, name)?;

        let data: EntryData = serde_json::from_slice(value).map_err(|e| {
            Status::with_message(
                StatusCode::DATA_CORRUPTION,
                format!("failed to deserialize entry {}: {}", full_path, e),
            )
        })?;
        Ok(Self {
            full_path,
            attr: data.attr,
            chunks: data.chunks,
        })
    }

    // ---- transaction helpers ----

    /// Load an entry, adding its key to the read-conflict set.
    pub async fn load<T: ReadTxn + ?Sized>(
        txn: &T,
        path: &FullPath,
    ) -> Result<Option<Self>> {
        let key = Self::pack_key_for(path);
        match txn.get(&key).await? {
            Some(v) => Ok(Some(Self::unpack(&key, &v)?)),
            None => Ok(None),
        }
    }

    /// Load an entry without adding a read conflict.
    pub async fn snapshot_load<T: ReadTxn + ?Sized>(
        txn: &T,
        path: &FullPath,
    ) -> Result<Option<Self>> {
        let key = Self::pack_key_for(path);
        match txn.snapshot_get(&key).await? {
            Some(v) => Ok(Some(Self::unpack(&key, &v)?)),
            None => Ok(None),
        }
    }

    pub async fn store<T: WriteTxn + ?Sized>(&self, txn: &mut T) -> Result<()> {
        let value = self.pack_value()?;
        txn.put(&self.pack_key(), &value).await
    }

    pub async fn remove<T: WriteTxn + ?Sized>(&self, txn: &mut T) -> Result<()> {
        txn.delete(&self.pack_key()).await
    }
}

/// One page of a directory's children.
#[derive(Debug, Default)]
pub struct EntryList {
    pub entries: Vec<Entry>,
    pub has_more: bool,
}

impl EntryList {
    /// Load up to `limit` children of `dir` in name order, starting after
    /// (or at, with `inclusive`) `start_from`. An empty `start_from` begins
    /// at the first child. `snapshot` skips read-conflict tracking.
    pub async fn load<T: ReadTxn + ?Sized>(
        txn: &T,
        dir: &FullPath,
        start_from: &str,
        inclusive: bool,
        limit: usize,
        snapshot: bool,
    ) -> Result<Self> {
        let prefix = Entry::pack_children_prefix(dir.as_str());
        let mut range = KeyRange::prefix(&prefix);
        if !start_from.is_empty() {
            let mut key = prefix;
            key.extend_from_slice(start_from.as_bytes());
            range = range.starting_at(key, inclusive);
        }

        let RangePage { entries, has_more } = if snapshot {
            txn.snapshot_scan(&range, limit).await?
        } else {
            txn.scan(&range, limit).await?
        };
        let entries = entries
            .iter()
            .map(|(k, v)| Entry::unpack(k, v))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries, has_more })
    }
}
