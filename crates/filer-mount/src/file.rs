use std::sync::Arc;
use std::time::UNIX_EPOCH;

use filer_proto::filer::{Entry, FileChunk, FuseAttributes, MODE_PERM_MASK, MODE_TYPE_MASK};
use filer_types::{FullPath, Gid, Uid};
use parking_lot::Mutex;

use crate::filesystem::FilerFileSystem;
use crate::handle::FileHandle;
use crate::types::{FileAttr, FuseResult, SetAttrValues};

struct FileState {
    attributes: FuseAttributes,
    chunks: Vec<FileChunk>,
    is_open: bool,
}

/// A regular file node.
///
/// While open, the node's in-memory attributes are authoritative and the
/// shared attribute cache is bypassed.
pub struct File {
    fs: Arc<FilerFileSystem>,
    path: FullPath,
    state: Mutex<FileState>,
}

impl File {
    pub(crate) fn new(fs: Arc<FilerFileSystem>, path: FullPath, entry: Entry) -> Arc<Self> {
        Arc::new(Self {
            fs,
            path,
            state: Mutex::new(FileState {
                attributes: entry.attributes.unwrap_or_default(),
                chunks: entry.chunks,
                is_open: false,
            }),
        })
    }

    pub fn path(&self) -> &FullPath {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().is_open
    }

    pub fn chunks(&self) -> Vec<FileChunk> {
        self.state.lock().chunks.clone()
    }

    pub async fn attr(&self) -> FuseResult<FileAttr> {
        if !self.is_open() {
            let entry = match self.fs.cached(&self.path) {
                Some(entry) => {
                    tracing::trace!(path = %self.path, "file attr from cache");
                    entry
                }
                None => self.fs.fetch_attributes(&self.path).await?,
            };
            let mut state = self.state.lock();
            if !state.is_open {
                state.attributes = entry.attributes.unwrap_or_default();
                state.chunks = entry.chunks;
            }
        }
        let state = self.state.lock();
        Ok(FileAttr::from_wire(&state.attributes, &state.chunks))
    }

    /// Mark the file open and hand out a write-buffering handle.
    pub fn open(self: &Arc<Self>, uid: Uid, gid: Gid) -> FileHandle {
        self.state.lock().is_open = true;
        let handle = FileHandle::new(self.fs.next_handle_id(), self.clone(), uid, gid);
        tracing::debug!(path = %self.path, fh = handle.id, "file open");
        handle
    }

    /// Apply `values` to the in-memory attributes only. A truncate to zero
    /// drops the chunk list; the flush path persists the result.
    pub fn setattr(&self, values: &SetAttrValues) -> FileAttr {
        let attr = {
            let mut state = self.state.lock();
            if let Some(size) = values.size {
                if size == 0 {
                    state.chunks.clear();
                }
                state.attributes.file_size = size;
            }
            if let Some(mode) = values.mode {
                state.attributes.file_mode =
                    (state.attributes.file_mode & MODE_TYPE_MASK) | (mode & MODE_PERM_MASK);
            }
            if let Some(uid) = values.uid {
                state.attributes.uid = Uid(uid);
            }
            if let Some(gid) = values.gid {
                state.attributes.gid = Gid(gid);
            }
            if let Some(mtime) = values.mtime {
                state.attributes.mtime = mtime
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs() as i64)
                    .unwrap_or(0);
            }
            FileAttr::from_wire(&state.attributes, &state.chunks)
        };
        self.fs.invalidate(&self.path);
        tracing::debug!(path = %self.path, ?values, "file setattr");
        attr
    }

    /// Chunks are committed through UpdateEntry when written, so there is
    /// nothing further to sync here.
    pub async fn fsync(&self) -> FuseResult<()> {
        tracing::debug!(path = %self.path, "file fsync");
        Ok(())
    }

    pub(crate) fn release(&self) {
        self.state.lock().is_open = false;
        self.fs.invalidate(&self.path);
        tracing::debug!(path = %self.path, "file release");
    }
}
