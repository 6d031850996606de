//! MetaStore: the metadata tree over a transactional KV store.
//!
//! Every operation runs inside a caller-supplied transaction and is keyed by
//! exact path. Chunk reconciliation and garbage collection live one layer up
//! in [`crate::service`]; here `delete` only reports which chunks it dropped.

use filer_kv::{ReadTxn, WriteTxn};
use filer_proto::filer::FileChunk;
use filer_types::{make_error, make_error_msg, FullPath, MetaCode, Result, StatusCode, UtcTime};

use crate::config::FilerConfig;
use crate::entry::{Entry, EntryList, IMPLICIT_DIR_MODE};

/// Page size used while walking a subtree for recursive delete.
const DELETE_SCAN_BATCH: usize = 1024;

pub struct MetaStore {
    config: FilerConfig,
}

impl MetaStore {
    pub fn new(config: FilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilerConfig {
        &self.config
    }

    /// Find an entry by path. With a read-write transaction the key joins the
    /// read-conflict set, so a concurrent change to it aborts the commit.
    pub async fn find<T: ReadTxn + ?Sized>(
        &self,
        txn: &T,
        path: &FullPath,
    ) -> Result<Entry> {
        if path.is_root() {
            return Ok(Entry::root());
        }
        match Entry::load(txn, path).await? {
            Some(entry) => Ok(entry),
            None => make_error_msg(MetaCode::NOT_FOUND, format!("{path} not found")),
        }
    }

    /// List children of `dir` in name order.
    pub async fn list<T: ReadTxn + ?Sized>(
        &self,
        txn: &T,
        dir: &FullPath,
        start_from: &str,
        inclusive: bool,
        limit: usize,
    ) -> Result<Vec<Entry>> {
        let parent = self.find(txn, dir).await?;
        if !parent.is_directory() {
            return make_error_msg(MetaCode::NOT_DIRECTORY, format!("{dir} is not a directory"));
        }
        let page = EntryList::load(txn, dir, start_from, inclusive, limit, true).await?;
        Ok(page.entries)
    }

    /// Insert a new entry. Missing ancestors are created as directories owned
    /// by the entry's uid/gid.
    pub async fn create<T: WriteTxn + ?Sized>(
        &self,
        txn: &mut T,
        entry: &Entry,
    ) -> Result<()> {
        if entry.full_path.is_root() {
            return make_error_msg(MetaCode::EXISTS, "/ already exists");
        }
        if Entry::load(&*txn, &entry.full_path).await?.is_some() {
            return make_error_msg(MetaCode::EXISTS, format!("{} already exists", entry.full_path));
        }
        self.ensure_parent_dirs(txn, entry).await?;
        entry.store(txn).await
    }

    async fn ensure_parent_dirs<T: WriteTxn + ?Sized>(
        &self,
        txn: &mut T,
        entry: &Entry,
    ) -> Result<()> {
        for ancestor in entry.full_path.ancestors() {
            match Entry::load(&*txn, &ancestor).await? {
                Some(existing) if existing.is_directory() => {}
                Some(_) => {
                    return make_error_msg(
                        MetaCode::NOT_DIRECTORY,
                        format!("{ancestor} is not a directory"),
                    );
                }
                None => {
                    let dir = Entry::new_directory(
                        ancestor,
                        IMPLICIT_DIR_MODE,
                        entry.attr.uid,
                        entry.attr.gid,
                        UtcTime::now(),
                    );
                    tracing::debug!(path = %dir.full_path, "mkdir implicit parent");
                    dir.store(txn).await?;
                }
            }
        }
        Ok(())
    }

    /// Replace an existing entry wholesale.
    pub async fn update<T: WriteTxn + ?Sized>(
        &self,
        txn: &mut T,
        entry: &Entry,
    ) -> Result<()> {
        if entry.full_path.is_root() {
            return make_error_msg(StatusCode::INVALID_ARG, "cannot update /");
        }
        if Entry::load(&*txn, &entry.full_path).await?.is_none() {
            return make_error_msg(MetaCode::NOT_FOUND, format!("{} not found", entry.full_path));
        }
        entry.store(txn).await
    }

    /// Remove an entry and, for a recursive directory delete, everything
    /// below it. Returns the chunks of every removed file.
    pub async fn delete<T: WriteTxn + ?Sized>(
        &self,
        txn: &mut T,
        path: &FullPath,
        recursive: bool,
    ) -> Result<Vec<FileChunk>> {
        if path.is_root() {
            return make_error_msg(StatusCode::INVALID_ARG, "cannot delete /");
        }
        let entry = self.find(&*txn, path).await?;
        let mut removed = Vec::new();

        if entry.is_directory() {
            let first = EntryList::load(&*txn, path, "", false, 1, false).await?;
            if !first.entries.is_empty() {
                if !recursive {
                    return make_error(MetaCode::NOT_EMPTY);
                }
                self.delete_children(txn, path, &mut removed).await?;
            }
        }

        removed.extend(entry.chunks.iter().cloned());
        entry.remove(txn).await?;
        Ok(removed)
    }

    async fn delete_children<T: WriteTxn + ?Sized>(
        &self,
        txn: &mut T,
        root: &FullPath,
        removed: &mut Vec<FileChunk>,
    ) -> Result<()> {
        let mut pending = vec![root.clone()];
        while let Some(dir) = pending.pop() {
            let mut cursor = String::new();
            loop {
                let page =
                    EntryList::load(&*txn, &dir, &cursor, false, DELETE_SCAN_BATCH, false).await?;
                for child in &page.entries {
                    if child.is_directory() {
                        pending.push(child.full_path.clone());
                    }
                    removed.extend(child.chunks.iter().cloned());
                    child.remove(txn).await?;
                }
                match (page.has_more, page.entries.last()) {
                    (true, Some(last)) => cursor = last.name().to_string(),
                    _ => break,
                }
            }
        }
        Ok(())
    }
}
