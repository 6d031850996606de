//! Filer trait and implementation.
//!
//! `FilerImpl` runs each operation in its own KV transaction over a
//! [`MetaStore`] and hands released chunks to the [`ChunkGc`] only after the
//! transaction commits. A commit conflict is returned to the caller as
//! `TransactionCode::CONFLICT`.

use std::sync::Arc;

use async_trait::async_trait;
use filer_kv::{KvEngine, WriteTxn};
use filer_proto::filer::FileChunk;
use filer_types::{make_error_msg, FullPath, MetaCode, Result};

use crate::config::FilerConfig;
use crate::entry::{AttrUpdate, Entry};
use crate::filechunks::{compact_chunks, find_unused_chunks, validate_chunks};
use crate::gc::{ChunkDeleter, ChunkGc};
use crate::meta_store::MetaStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Remove a non-empty directory together with everything below it.
    pub recursive: bool,
    /// Queue the removed chunks for deletion. When false only metadata goes.
    pub delete_data: bool,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            delete_data: true,
        }
    }
}

#[async_trait]
pub trait Filer: Send + Sync {
    /// Persist a new entry as given. Fails with `MetaCode::EXISTS` when the
    /// path is taken.
    async fn create_entry(&self, entry: Entry) -> Result<()>;

    /// Merge `attr` into the stored attributes and replace the chunk list
    /// with the compacted form of `chunks`. Chunks no longer referenced are
    /// queued for deletion. Returns the entry as stored.
    async fn update_entry(
        &self,
        path: &FullPath,
        attr: AttrUpdate,
        chunks: Vec<FileChunk>,
    ) -> Result<Entry>;

    /// Remove an entry and queue its chunks (and its descendants', for a
    /// recursive delete) for deletion.
    async fn delete_entry(&self, path: &FullPath, options: DeleteOptions) -> Result<()>;

    async fn find_entry(&self, path: &FullPath) -> Result<Entry>;

    async fn list_directory_entries(
        &self,
        dir: &FullPath,
        start_from: &str,
        inclusive: bool,
        limit: usize,
    ) -> Result<Vec<Entry>>;
}

pub struct FilerImpl<E: KvEngine> {
    store: Arc<MetaStore>,
    kv_engine: Arc<E>,
    gc: ChunkGc,
}

impl<E: KvEngine> FilerImpl<E> {
    /// Create the filer and start its chunk deletion workers. Must be called
    /// inside a tokio runtime.
    pub fn new(config: FilerConfig, kv_engine: Arc<E>, deleter: Arc<dyn ChunkDeleter>) -> Self {
        let gc = ChunkGc::start(deleter, config.gc_queue_capacity, config.gc_workers);
        Self {
            store: Arc::new(MetaStore::new(config)),
            kv_engine,
            gc,
        }
    }

    pub fn config(&self) -> &FilerConfig {
        self.store.config()
    }

    /// Finish pending chunk deletions and stop the workers.
    pub async fn shutdown(&self) {
        self.gc.shutdown().await;
    }
}

#[async_trait]
impl<E: KvEngine + 'static> Filer for FilerImpl<E> {
    async fn create_entry(&self, entry: Entry) -> Result<()> {
        validate_chunks(&entry.chunks)?;
        tracing::debug!(
            path = %entry.full_path,
            mode = entry.attr.mode,
            chunks = entry.chunks.len(),
            "create entry"
        );
        let mut txn = self.kv_engine.begin_write();
        self.store.create(&mut txn, &entry).await?;
        txn.commit().await
    }

    async fn update_entry(
        &self,
        path: &FullPath,
        attr: AttrUpdate,
        chunks: Vec<FileChunk>,
    ) -> Result<Entry> {
        validate_chunks(&chunks)?;
        let mut txn = self.kv_engine.begin_write();
        let existing = self.store.find(&txn, path).await?;
        if existing.is_directory() && !chunks.is_empty() {
            return make_error_msg(MetaCode::IS_DIRECTORY, format!("{path} is a directory"));
        }

        let unused = find_unused_chunks(&existing.chunks, &chunks);
        let (resolved, garbage) = compact_chunks(&chunks);
        tracing::debug!(
            %path,
            old_chunks = existing.chunks.len(),
            new_chunks = chunks.len(),
            resolved = resolved.len(),
            unused = unused.len(),
            garbage = garbage.len(),
            "update entry"
        );

        let mut updated = Entry {
            full_path: existing.full_path.clone(),
            attr: existing.attr.clone(),
            chunks: resolved,
        };
        updated.attr.merge(attr);
        self.store.update(&mut txn, &updated).await?;
        txn.commit().await?;

        self.gc.enqueue("unused", unused);
        self.gc.enqueue("garbage", garbage);
        Ok(updated)
    }

    async fn delete_entry(&self, path: &FullPath, options: DeleteOptions) -> Result<()> {
        let mut txn = self.kv_engine.begin_write();
        let removed = self.store.delete(&mut txn, path, options.recursive).await?;
        txn.commit().await?;

        tracing::debug!(%path, ?options, chunks = removed.len(), "delete entry");
        if options.delete_data {
            // Split chunks of one blob must be deleted once.
            self.gc.enqueue("deleted", find_unused_chunks(&removed, &[]));
        }
        Ok(())
    }

    async fn find_entry(&self, path: &FullPath) -> Result<Entry> {
        let txn = self.kv_engine.begin_read();
        self.store.find(&txn, path).await
    }

    async fn list_directory_entries(
        &self,
        dir: &FullPath,
        start_from: &str,
        inclusive: bool,
        limit: usize,
    ) -> Result<Vec<Entry>> {
        let txn = self.kv_engine.begin_read();
        let entries = self.store.list(&txn, dir, start_from, inclusive, limit).await?;
        tracing::debug!(%dir, start_from, limit, count = entries.len(), "list entries");
        Ok(entries)
    }
}
