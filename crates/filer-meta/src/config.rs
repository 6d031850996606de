//! Configuration for the filer core.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilerConfig {
    /// Page size for `ListEntries` when the caller passes zero.
    pub list_default_limit: u32,

    /// Upper bound on a single `ListEntries` page.
    pub list_max_limit: u32,

    /// Page size of the HTTP directory listing when `limit` is absent.
    pub dir_listing_limit: u32,

    /// Capacity of the chunk deletion queue. File ids beyond it are dropped
    /// with a warning and left for an orphan sweep.
    pub gc_queue_capacity: usize,

    /// Number of tasks issuing chunk deletions.
    pub gc_workers: usize,
}

impl Default for FilerConfig {
    fn default() -> Self {
        Self {
            list_default_limit: filer_proto::filer::DEFAULT_LIST_ENTRIES_LIMIT,
            list_max_limit: 10_000,
            dir_listing_limit: 100,
            gc_queue_capacity: 4096,
            gc_workers: 2,
        }
    }
}

impl FilerConfig {
    /// Resolve the page size actually used for a list request.
    pub fn list_limit(&self, requested: u32) -> usize {
        let limit = if requested == 0 {
            self.list_default_limit
        } else {
            requested
        };
        limit.min(self.list_max_limit) as usize
    }
}
