use std::sync::Arc;
use std::time::UNIX_EPOCH;

use filer_proto::filer::{ListEntriesReq, LookupDirectoryEntryReq, MODE_DIR};
use filer_types::FullPath;

use crate::filesystem::{FilerFileSystem, Node};
use crate::types::{FileAttr, FuseResult};

/// One row of a directory read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_directory: bool,
}

/// A directory node.
#[derive(Clone)]
pub struct Dir {
    fs: Arc<FilerFileSystem>,
    path: FullPath,
}

impl Dir {
    pub(crate) fn new(fs: Arc<FilerFileSystem>, path: FullPath) -> Self {
        Self { fs, path }
    }

    pub fn path(&self) -> &FullPath {
        &self.path
    }

    pub async fn attr(&self) -> FuseResult<FileAttr> {
        if self.path.is_root() {
            return Ok(FileAttr {
                size: 0,
                mtime: UNIX_EPOCH,
                mode: MODE_DIR | self.fs.config().root_mode,
                uid: 0,
                gid: 0,
            });
        }
        let entry = match self.fs.cached(&self.path) {
            Some(entry) => entry,
            None => self.fs.fetch_attributes(&self.path).await?,
        };
        let attributes = entry.attributes.unwrap_or_default();
        Ok(FileAttr::from_wire(&attributes, &entry.chunks))
    }

    pub async fn lookup(&self, name: &str) -> FuseResult<Node> {
        let path = self.path.child(name)?;
        if let Some(entry) = self.fs.cached(&path) {
            return Ok(self.fs.node(path, entry));
        }
        let rsp = self
            .fs
            .client()
            .lookup_directory_entry(LookupDirectoryEntryReq {
                directory: self.path.as_str().to_string(),
                name: name.to_string(),
            })
            .await
            .inspect_err(|e| tracing::debug!(%path, error = %e, "dir lookup failed"))?;
        tracing::debug!(%path, is_directory = rsp.entry.is_directory, "dir lookup");
        self.fs.cache(&path, rsp.entry.clone());
        Ok(self.fs.node(path, rsp.entry))
    }

    /// List every child, paging through the filer and caching each entry.
    pub async fn read_dir(&self) -> FuseResult<Vec<DirEntry>> {
        let limit = self.fs.config().dir_list_limit.max(1);
        let mut out = Vec::new();
        let mut start_from = String::new();
        loop {
            let rsp = self
                .fs
                .client()
                .list_entries(ListEntriesReq {
                    directory: self.path.as_str().to_string(),
                    start_from_file_name: start_from.clone(),
                    inclusive_start_from: false,
                    limit,
                })
                .await?;
            let count = rsp.entries.len();
            for entry in rsp.entries {
                let path = self.path.child(&entry.name)?;
                out.push(DirEntry {
                    name: entry.name.clone(),
                    is_directory: entry.is_directory,
                });
                start_from = entry.name.clone();
                self.fs.cache(&path, entry);
            }
            if count < limit as usize {
                break;
            }
        }
        tracing::debug!(path = %self.path, count = out.len(), "read dir");
        Ok(out)
    }
}
