use async_trait::async_trait;
use filer_types::Result;

use crate::range::{KeyRange, RangePage};

/// Reads against a consistent snapshot.
///
/// The `snapshot_*` forms never join the conflict set. In a read-only
/// transaction the plain forms behave the same.
#[async_trait]
pub trait ReadTxn: Send + Sync {
    async fn snapshot_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.snapshot_get(key).await
    }

    /// Up to `limit` pairs of `range` in key order.
    async fn snapshot_scan(&self, range: &KeyRange, limit: usize) -> Result<RangePage>;

    async fn scan(&self, range: &KeyRange, limit: usize) -> Result<RangePage> {
        self.snapshot_scan(range, limit).await
    }
}

/// A transaction that buffers mutations until commit.
#[async_trait]
pub trait WriteTxn: ReadTxn {
    async fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    async fn delete(&mut self, key: &[u8]) -> Result<()>;

    /// Apply every buffered mutation atomically.
    async fn commit(&mut self) -> Result<()>;
}

pub trait KvEngine: Send + Sync + 'static {
    type Read: ReadTxn;
    type Write: WriteTxn;

    fn begin_read(&self) -> Self::Read;
    fn begin_write(&self) -> Self::Write;
}
