//! Background deletion of chunks that no entry references any more.
//!
//! Metadata changes commit first; the file ids they release are then queued
//! here and deleted by worker tasks, never on the request path. A crash or a
//! full queue leaves orphaned blobs behind, which is safe.

use std::sync::Arc;

use async_trait::async_trait;
use filer_client::VolumeLocator;
use filer_proto::filer::FileChunk;
use filer_types::{Result, Status};
use filer_utils::BackgroundRunner;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};

/// Deletes one stored blob. Deleting an already deleted blob must succeed.
#[async_trait]
pub trait ChunkDeleter: Send + Sync + 'static {
    async fn delete_chunk(&self, file_id: &str) -> Result<()>;
}

#[async_trait]
impl ChunkDeleter for VolumeLocator {
    async fn delete_chunk(&self, file_id: &str) -> Result<()> {
        let token = self.delete_token(file_id)?;
        VolumeLocator::delete_chunk(self, file_id, &token)
            .await
            .map_err(Status::from)
    }
}

type SharedReceiver = Arc<AsyncMutex<mpsc::Receiver<String>>>;

pub struct ChunkGc {
    tx: mpsc::Sender<String>,
    runner: Mutex<Option<BackgroundRunner>>,
}

impl ChunkGc {
    /// Start `workers` deletion tasks fed by a queue of `capacity` file ids.
    pub fn start(deleter: Arc<dyn ChunkDeleter>, capacity: usize, workers: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx: SharedReceiver = Arc::new(AsyncMutex::new(rx));
        let mut runner = BackgroundRunner::new();
        for _ in 0..workers.max(1) {
            let rx = rx.clone();
            let deleter = deleter.clone();
            runner.spawn("chunk-gc", move |shutdown| run_worker(rx, deleter, shutdown));
        }
        tracing::info!(capacity, workers, "chunk gc started");
        Self {
            tx,
            runner: Mutex::new(Some(runner)),
        }
    }

    /// Queue the chunks for deletion. Never blocks; ids that do not fit are
    /// dropped with a warning.
    pub fn enqueue<I>(&self, reason: &str, chunks: I)
    where
        I: IntoIterator<Item = FileChunk>,
    {
        for chunk in chunks {
            tracing::info!(
                reason,
                file_id = %chunk.file_id,
                range = ?(chunk.offset..chunk.end()),
                "deleting chunk"
            );
            match self.tx.try_send(chunk.file_id) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(fid)) => {
                    tracing::warn!(file_id = %fid, "chunk gc queue full, leaving orphan");
                }
                Err(mpsc::error::TrySendError::Closed(fid)) => {
                    tracing::warn!(file_id = %fid, "chunk gc stopped, leaving orphan");
                }
            }
        }
    }

    /// Finish the deletions already queued and stop the workers.
    pub async fn shutdown(&self) {
        let runner = self.runner.lock().take();
        if let Some(runner) = runner {
            runner.shutdown().await;
            tracing::info!("chunk gc stopped");
        }
    }
}

async fn run_worker(
    rx: SharedReceiver,
    deleter: Arc<dyn ChunkDeleter>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let next = {
            let mut rx = rx.lock().await;
            tokio::select! {
                fid = rx.recv() => fid,
                _ = shutdown.changed() => None,
            }
        };
        match next {
            Some(fid) => delete_one(deleter.as_ref(), &fid).await,
            None => break,
        }
    }

    // Drain whatever is still queued so a clean stop loses nothing.
    let rest: Vec<String> = {
        let mut rx = rx.lock().await;
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    };
    for fid in rest {
        delete_one(deleter.as_ref(), &fid).await;
    }
}

async fn delete_one(deleter: &dyn ChunkDeleter, file_id: &str) {
    match deleter.delete_chunk(file_id).await {
        Ok(()) => tracing::debug!(file_id, "chunk deleted"),
        Err(e) => tracing::warn!(file_id, error = %e, "failed to delete chunk"),
    }
}
