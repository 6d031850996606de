//! In-memory ordered store.
//!
//! Every transaction reads a copy of the map taken when it began. Write
//! transactions buffer mutations and validate optimistically at commit: each
//! key carries the version of the commit that last touched it, and a commit
//! fails if anything it read with conflict tracking moved past its read
//! version.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use filer_kv::{KeyRange, KvEngine, RangePage, ReadTxn, WriteTxn};
use filer_types::status_code::TransactionCode;
use filer_types::{make_error_msg, Result};

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

#[derive(Default)]
struct Shared {
    data: Map,
    /// Commit version that last wrote or removed each key.
    touched: BTreeMap<Vec<u8>, u64>,
    version: u64,
}

/// Process-local [`KvEngine`]; clones share the same data.
#[derive(Clone, Default)]
pub struct MemDbEngine {
    shared: Arc<RwLock<Shared>>,
}

impl MemDbEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed keys.
    pub fn len(&self) -> usize {
        self.shared.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.read().data.is_empty()
    }

    /// Version of the latest successful commit; 0 before any.
    pub fn version(&self) -> u64 {
        self.shared.read().version
    }

    fn view(&self) -> Snapshot {
        let shared = self.shared.read();
        Snapshot {
            data: shared.data.clone(),
            version: shared.version,
        }
    }
}

impl KvEngine for MemDbEngine {
    type Read = Snapshot;
    type Write = MemDbWriteTxn;

    fn begin_read(&self) -> Snapshot {
        self.view()
    }

    fn begin_write(&self) -> MemDbWriteTxn {
        MemDbWriteTxn {
            base: self.view(),
            pending: BTreeMap::new(),
            read_keys: Mutex::new(Vec::new()),
            read_ranges: Mutex::new(Vec::new()),
            shared: Arc::clone(&self.shared),
        }
    }
}

fn scan_map(map: &Map, range: &KeyRange, limit: usize) -> RangePage {
    let mut page = RangePage::default();
    if range.is_empty() {
        return page;
    }
    for (k, v) in map.range::<[u8], _>(range.bounds()) {
        if page.entries.len() == limit {
            page.has_more = true;
            break;
        }
        page.entries.push((k.clone(), v.clone()));
    }
    page
}

/// A point-in-time copy of the data.
pub struct Snapshot {
    data: Map,
    version: u64,
}

#[async_trait]
impl ReadTxn for Snapshot {
    async fn snapshot_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.get(key).cloned())
    }

    async fn snapshot_scan(&self, range: &KeyRange, limit: usize) -> Result<RangePage> {
        Ok(scan_map(&self.data, range, limit))
    }
}

/// Buffered write transaction.
///
/// Point reads see the transaction's own pending mutations; scans see the
/// snapshot only.
pub struct MemDbWriteTxn {
    base: Snapshot,
    /// `None` removes the key.
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    read_keys: Mutex<Vec<Vec<u8>>>,
    read_ranges: Mutex<Vec<KeyRange>>,
    shared: Arc<RwLock<Shared>>,
}

impl MemDbWriteTxn {
    fn validate(&self, shared: &Shared) -> Result<()> {
        let since = self.base.version;
        let moved = |v: &u64| *v > since;
        if let Some(key) = self
            .read_keys
            .lock()
            .iter()
            .find(|k| shared.touched.get(k.as_slice()).is_some_and(moved))
        {
            return make_error_msg(
                TransactionCode::CONFLICT,
                format!("{} changed by a concurrent commit", String::from_utf8_lossy(key)),
            );
        }
        for range in self.read_ranges.lock().iter().filter(|r| !r.is_empty()) {
            if shared
                .touched
                .range::<[u8], _>(range.bounds())
                .any(|(_, v)| moved(v))
            {
                return make_error_msg(
                    TransactionCode::CONFLICT,
                    "scanned range changed by a concurrent commit",
                );
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ReadTxn for MemDbWriteTxn {
    async fn snapshot_get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.pending.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.base.snapshot_get(key).await,
        }
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.read_keys.lock().push(key.to_vec());
        self.snapshot_get(key).await
    }

    async fn snapshot_scan(&self, range: &KeyRange, limit: usize) -> Result<RangePage> {
        self.base.snapshot_scan(range, limit).await
    }

    async fn scan(&self, range: &KeyRange, limit: usize) -> Result<RangePage> {
        self.read_ranges.lock().push(range.clone());
        self.base.snapshot_scan(range, limit).await
    }
}

#[async_trait]
impl WriteTxn for MemDbWriteTxn {
    async fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.pending.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    async fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.pending.insert(key.to_vec(), None);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let mut shared = self.shared.write();
        self.validate(&shared)?;

        let version = shared.version + 1;
        for (key, value) in std::mem::take(&mut self.pending) {
            match value {
                Some(value) => shared.data.insert(key.clone(), value),
                None => shared.data.remove(&key),
            };
            shared.touched.insert(key, version);
        }
        shared.version = version;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed(engine: &MemDbEngine, pairs: &[(&[u8], &[u8])]) {
        let mut txn = engine.begin_write();
        for (k, v) in pairs {
            txn.put(k, v).await.unwrap();
        }
        txn.commit().await.unwrap();
    }

    fn keys(page: &RangePage) -> Vec<&[u8]> {
        page.entries.iter().map(|(k, _)| k.as_slice()).collect()
    }

    #[tokio::test]
    async fn test_commit_is_visible_to_new_reads() {
        let engine = MemDbEngine::new();
        assert!(engine.is_empty());
        seed(&engine, &[(b"/a", b"1"), (b"/b", b"2")]).await;
        assert_eq!(engine.len(), 2);
        assert_eq!(engine.version(), 1);

        let ro = engine.begin_read();
        assert_eq!(ro.get(b"/a").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(ro.get(b"/c").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pending_writes_are_private() {
        let engine = MemDbEngine::new();
        let mut txn = engine.begin_write();
        txn.put(b"k", b"v").await.unwrap();
        assert_eq!(txn.get(b"k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(engine.begin_read().get(b"k").await.unwrap(), None);

        txn.delete(b"k").await.unwrap();
        assert_eq!(txn.get(b"k").await.unwrap(), None);
        txn.commit().await.unwrap();
        assert!(engine.is_empty());
    }

    #[tokio::test]
    async fn test_reader_keeps_its_snapshot() {
        let engine = MemDbEngine::new();
        seed(&engine, &[(b"x", b"before")]).await;
        let ro = engine.begin_read();
        seed(&engine, &[(b"x", b"after")]).await;

        assert_eq!(ro.get(b"x").await.unwrap(), Some(b"before".to_vec()));
        assert_eq!(
            engine.begin_read().get(b"x").await.unwrap(),
            Some(b"after".to_vec())
        );
    }

    #[tokio::test]
    async fn test_point_read_conflict() {
        let engine = MemDbEngine::new();
        let mut a = engine.begin_write();
        let mut b = engine.begin_write();
        assert_eq!(a.get(b"/f").await.unwrap(), None);
        assert_eq!(b.get(b"/f").await.unwrap(), None);

        a.put(b"/f", b"a").await.unwrap();
        a.commit().await.unwrap();

        b.put(b"/f", b"b").await.unwrap();
        let err = b.commit().await.unwrap_err();
        assert_eq!(err.code(), TransactionCode::CONFLICT);
        assert_eq!(
            engine.begin_read().get(b"/f").await.unwrap(),
            Some(b"a".to_vec())
        );
    }

    #[tokio::test]
    async fn test_snapshot_reads_do_not_conflict() {
        let engine = MemDbEngine::new();
        let mut a = engine.begin_write();
        let mut b = engine.begin_write();
        b.snapshot_get(b"k").await.unwrap();
        b.snapshot_scan(&KeyRange::prefix(b""), 10).await.unwrap();

        a.put(b"k", b"1").await.unwrap();
        a.commit().await.unwrap();

        b.put(b"other", b"2").await.unwrap();
        b.commit().await.unwrap();
        assert_eq!(engine.len(), 2);
    }

    #[tokio::test]
    async fn test_scan_conflict() {
        let engine = MemDbEngine::new();
        let mut a = engine.begin_write();
        let mut b = engine.begin_write();
        b.scan(&KeyRange::prefix(b"d/"), 10).await.unwrap();

        a.put(b"d/new", b"1").await.unwrap();
        a.commit().await.unwrap();

        b.delete(b"d").await.unwrap();
        assert_eq!(
            b.commit().await.unwrap_err().code(),
            TransactionCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn test_disjoint_writers_both_commit() {
        let engine = MemDbEngine::new();
        let mut a = engine.begin_write();
        let mut b = engine.begin_write();
        a.get(b"/x").await.unwrap();
        b.scan(&KeyRange::prefix(b"/y/"), 10).await.unwrap();
        a.put(b"/x", b"1").await.unwrap();
        b.put(b"/y/1", b"2").await.unwrap();
        a.commit().await.unwrap();
        b.commit().await.unwrap();
        assert_eq!(engine.version(), 2);
    }

    #[tokio::test]
    async fn test_scan_limit_and_resume() {
        let engine = MemDbEngine::new();
        let mut txn = engine.begin_write();
        for i in 0u8..20 {
            txn.put(&[7, i], &[i]).await.unwrap();
        }
        txn.put(&[8], &[0]).await.unwrap();
        txn.commit().await.unwrap();

        let ro = engine.begin_read();
        let range = KeyRange::prefix(&[7]);
        let page = ro.scan(&range, 5).await.unwrap();
        assert_eq!(page.entries.len(), 5);
        assert!(page.has_more);
        assert_eq!(page.entries[4].0, vec![7, 4]);

        let rest = ro
            .scan(&range.clone().starting_at(vec![7, 4], false), 100)
            .await
            .unwrap();
        assert_eq!(rest.entries.len(), 15);
        assert!(!rest.has_more);
        assert_eq!(rest.entries[0].0, vec![7, 5]);

        assert!(ro.scan(&range, 0).await.unwrap().entries.is_empty());
    }

    #[tokio::test]
    async fn test_prefix_scan_bounds() {
        let engine = MemDbEngine::new();
        seed(
            &engine,
            &[(b"pre:aa", b"1"), (b"pre:bb", b"2"), (b"prf:dd", b"4"), (b"\xff\x01", b"5")],
        )
        .await;

        let ro = engine.begin_read();
        let page = ro.scan(&KeyRange::prefix(b"pre:"), 100).await.unwrap();
        assert_eq!(keys(&page), vec![b"pre:aa".as_slice(), b"pre:bb".as_slice()]);

        let tail = ro.scan(&KeyRange::prefix(b"\xff"), 10).await.unwrap();
        assert_eq!(keys(&tail), vec![b"\xff\x01".as_slice()]);

        let empty = KeyRange::prefix(b"pre:").starting_at(b"pre;".to_vec(), true);
        assert!(ro.scan(&empty, 10).await.unwrap().entries.is_empty());
    }
}
