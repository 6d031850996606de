use std::collections::BTreeMap;
use std::sync::Arc;

use filer_types::{Gid, Uid};

use crate::file::File;

/// Buffered writes of one open file, keyed by file offset.
///
/// Pages never overlap: a write trims or replaces whatever it covers, so
/// later writes win.
#[derive(Debug, Default)]
pub struct DirtyPages {
    pages: BTreeMap<u64, Vec<u8>>,
}

impl DirtyPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, offset: u64, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let end = offset + data.len() as u64;
        let overlapping: Vec<u64> = self
            .pages
            .range(..end)
            .filter(|(start, page)| **start + page.len() as u64 > offset)
            .map(|(start, _)| *start)
            .collect();
        for start in overlapping {
            let Some(page) = self.pages.remove(&start) else {
                continue;
            };
            let page_end = start + page.len() as u64;
            if start < offset {
                self.pages
                    .insert(start, page[..(offset - start) as usize].to_vec());
            }
            if page_end > end {
                self.pages.insert(end, page[(end - start) as usize..].to_vec());
            }
        }
        self.pages.insert(offset, data.to_vec());
    }

    /// Buffered bytes not yet uploaded.
    pub fn dirty_size(&self) -> u64 {
        self.pages.values().map(|p| p.len() as u64).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Pages in offset order.
    pub fn pages(&self) -> impl Iterator<Item = (u64, &[u8])> {
        self.pages.iter().map(|(off, p)| (*off, p.as_slice()))
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}

/// State of one `open` of a file.
pub struct FileHandle {
    pub id: u64,
    pub uid: Uid,
    pub gid: Gid,
    file: Arc<File>,
    dirty_pages: DirtyPages,
}

impl FileHandle {
    pub(crate) fn new(id: u64, file: Arc<File>, uid: Uid, gid: Gid) -> Self {
        Self {
            id,
            uid,
            gid,
            file,
            dirty_pages: DirtyPages::new(),
        }
    }

    pub fn file(&self) -> &Arc<File> {
        &self.file
    }

    /// Buffer `data` at `offset`, returning the number of bytes accepted.
    pub fn write(&mut self, offset: u64, data: &[u8]) -> usize {
        self.dirty_pages.write(offset, data);
        tracing::trace!(
            path = %self.file.path(),
            fh = self.id,
            offset,
            len = data.len(),
            "buffered write"
        );
        data.len()
    }

    pub fn dirty_size(&self) -> u64 {
        self.dirty_pages.dirty_size()
    }

    pub fn dirty_pages(&self) -> &DirtyPages {
        &self.dirty_pages
    }

    /// Drop the handle and close the file.
    pub fn release(self) {
        self.file.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(pages: &DirtyPages) -> Vec<(u64, Vec<u8>)> {
        pages.pages().map(|(o, p)| (o, p.to_vec())).collect()
    }

    #[test]
    fn test_disjoint_writes() {
        let mut pages = DirtyPages::new();
        pages.write(10, b"abc");
        pages.write(0, b"xy");
        pages.write(5, b"");
        assert_eq!(pages.dirty_size(), 5);
        assert_eq!(layout(&pages), vec![(0, b"xy".to_vec()), (10, b"abc".to_vec())]);
    }

    #[test]
    fn test_later_write_wins() {
        let mut pages = DirtyPages::new();
        pages.write(0, b"aaaaaaaaaa");
        pages.write(3, b"BBB");
        assert_eq!(
            layout(&pages),
            vec![
                (0, b"aaa".to_vec()),
                (3, b"BBB".to_vec()),
                (6, b"aaaa".to_vec()),
            ]
        );
        assert_eq!(pages.dirty_size(), 10);

        pages.write(2, b"cccccc");
        assert_eq!(
            layout(&pages),
            vec![(0, b"aa".to_vec()), (2, b"cccccc".to_vec()), (8, b"aa".to_vec())]
        );

        pages.write(0, b"dddddddddddd");
        assert_eq!(layout(&pages), vec![(0, b"dddddddddddd".to_vec())]);
        assert_eq!(pages.dirty_size(), 12);

        pages.clear();
        assert!(pages.is_empty());
    }

    #[test]
    fn test_adjacent_pages_untouched() {
        let mut pages = DirtyPages::new();
        pages.write(0, b"ab");
        pages.write(4, b"ef");
        pages.write(2, b"cd");
        assert_eq!(
            layout(&pages),
            vec![(0, b"ab".to_vec()), (2, b"cd".to_vec()), (4, b"ef".to_vec())]
        );
    }
}
