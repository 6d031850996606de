//! `FilerFileSystem` holds the filer client, the attribute cache and the
//! handle counter shared by every node of one mount.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use filer_client::{FilerClient, HttpFilerClient};
use filer_proto::filer::{Entry, GetEntryAttributesReq, MODE_DIR, MODE_TYPE_MASK};
use filer_types::FullPath;
use filer_utils::TtlCache;

use crate::config::MountConfig;
use crate::dir::Dir;
use crate::file::File;
use crate::types::FuseResult;

/// A node returned by lookup.
pub enum Node {
    Dir(Dir),
    File(Arc<File>),
}

impl Node {
    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Dir(_))
    }
}

pub struct FilerFileSystem {
    client: Arc<dyn FilerClient>,
    config: MountConfig,
    /// Entries keyed by full path. Writers invalidate, never update in place.
    entry_cache: TtlCache<String, Entry>,
    next_handle: AtomicU64,
}

impl FilerFileSystem {
    pub fn new(client: Arc<dyn FilerClient>, config: MountConfig) -> Arc<Self> {
        Arc::new(Self {
            entry_cache: TtlCache::new(config.attr_cache_ttl, config.attr_cache_capacity),
            client,
            config,
            next_handle: AtomicU64::new(1),
        })
    }

    /// Mount against a remote filer over HTTP.
    pub fn connect(config: MountConfig) -> FuseResult<Arc<Self>> {
        let client = HttpFilerClient::new(config.filer.clone())?;
        tracing::info!(filer = %config.filer.filer_address, "mount connected");
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn root(self: &Arc<Self>) -> Dir {
        Dir::new(self.clone(), FullPath::root())
    }

    pub fn config(&self) -> &MountConfig {
        &self.config
    }

    pub fn client(&self) -> &dyn FilerClient {
        self.client.as_ref()
    }

    pub(crate) fn cached(&self, path: &FullPath) -> Option<Entry> {
        self.entry_cache.get(&path.as_str().to_string())
    }

    pub(crate) fn cache(&self, path: &FullPath, entry: Entry) {
        self.entry_cache.insert(path.as_str().to_string(), entry);
    }

    pub(crate) fn invalidate(&self, path: &FullPath) {
        self.entry_cache.invalidate(&path.as_str().to_string());
    }

    pub(crate) fn next_handle_id(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }

    /// Fetch attributes and chunks of `path` from the filer and cache them.
    pub(crate) async fn fetch_attributes(&self, path: &FullPath) -> FuseResult<Entry> {
        let (dir, name) = path.dir_and_name();
        let rsp = self
            .client
            .get_entry_attributes(GetEntryAttributesReq {
                name: name.to_string(),
                parent_dir: dir.to_string(),
            })
            .await
            .inspect_err(|e| tracing::debug!(%path, error = %e, "get attributes failed"))?;
        tracing::debug!(
            %path,
            mode = rsp.attributes.file_mode,
            chunks = rsp.chunks.len(),
            "fetched attributes"
        );
        let entry = Entry {
            name: name.to_string(),
            is_directory: rsp.attributes.file_mode & MODE_TYPE_MASK == MODE_DIR,
            chunks: rsp.chunks,
            attributes: Some(rsp.attributes),
        };
        self.cache(path, entry.clone());
        Ok(entry)
    }

    pub(crate) fn node(self: &Arc<Self>, path: FullPath, entry: Entry) -> Node {
        if entry.is_directory {
            Node::Dir(Dir::new(self.clone(), path))
        } else {
            Node::File(File::new(self.clone(), path, entry))
        }
    }
}
