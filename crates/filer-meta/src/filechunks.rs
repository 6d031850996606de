//! Chunk reconciliation for file entries.
//!
//! A file's content is the result of replaying its chunks in append order:
//! a later chunk hides whatever bytes of earlier chunks it overlaps. The
//! functions here turn such a chunk list into the non-overlapping view that
//! gets persisted, and report which stored blobs are no longer reachable.

use std::collections::HashSet;

use filer_proto::filer::FileChunk;
use filer_types::{make_error_msg, Result, StatusCode};

/// A logical byte range `[start, stop)` served by one stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleInterval {
    pub start: u64,
    pub stop: u64,
    pub file_id: String,
    pub mtime: i64,
    /// Position inside the blob that holds the byte at `start`.
    pub chunk_offset: u64,
}

impl VisibleInterval {
    fn from_chunk(chunk: &FileChunk) -> Self {
        Self {
            start: chunk.offset,
            stop: chunk.end(),
            file_id: chunk.file_id.clone(),
            mtime: chunk.mtime,
            chunk_offset: chunk.chunk_offset,
        }
    }

    fn slice(&self, start: u64, stop: u64) -> Self {
        Self {
            start,
            stop,
            file_id: self.file_id.clone(),
            mtime: self.mtime,
            chunk_offset: self.chunk_offset + (start - self.start),
        }
    }

    fn into_chunk(self) -> FileChunk {
        FileChunk {
            file_id: self.file_id,
            offset: self.start,
            size: self.stop - self.start,
            mtime: self.mtime,
            chunk_offset: self.chunk_offset,
        }
    }
}

/// The part of one blob needed to serve a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkView {
    pub file_id: String,
    /// Offset inside the blob.
    pub offset: u64,
    pub size: u64,
    /// Offset inside the file.
    pub logic_offset: u64,
}

/// Logical file size: the furthest byte any chunk reaches, 0 when empty.
pub fn total_size(chunks: &[FileChunk]) -> u64 {
    chunks.iter().map(FileChunk::end).max().unwrap_or(0)
}

/// Reject chunks without a blob id or whose range runs past `u64::MAX`.
pub fn validate_chunks(chunks: &[FileChunk]) -> Result<()> {
    for chunk in chunks {
        if chunk.file_id.is_empty() {
            return make_error_msg(
                StatusCode::INVALID_ARG,
                format!("chunk at offset {} has no file id", chunk.offset),
            );
        }
        if chunk.checked_end().is_none() {
            return make_error_msg(
                StatusCode::INVALID_ARG,
                format!(
                    "chunk {} range {}+{} overflows",
                    chunk.file_id, chunk.offset, chunk.size
                ),
            );
        }
    }
    Ok(())
}

/// Replay `chunks` in order and return the visible intervals sorted by
/// offset. Ties go to the later chunk.
pub fn non_overlapping_visible_intervals(chunks: &[FileChunk]) -> Vec<VisibleInterval> {
    let mut visibles: Vec<VisibleInterval> = Vec::new();
    for chunk in chunks.iter().filter(|c| c.size > 0) {
        let (start, stop) = (chunk.offset, chunk.end());
        let mut next = Vec::with_capacity(visibles.len() + 2);
        for v in visibles.drain(..) {
            if v.stop <= start || v.start >= stop {
                next.push(v);
                continue;
            }
            if v.start < start {
                next.push(v.slice(v.start, start));
            }
            if v.stop > stop {
                next.push(v.slice(stop, v.stop));
            }
        }
        next.push(VisibleInterval::from_chunk(chunk));
        next.sort_by_key(|v| v.start);
        visibles = next;
    }
    visibles
}

/// Split `chunks` into the resolved, non-overlapping list to persist and the
/// chunks whose bytes are entirely hidden by later writes.
///
/// A blob that keeps at least one visible byte is never garbage, even if the
/// resolved list only references a fragment of it. Garbage is deduplicated
/// by file id.
pub fn compact_chunks(chunks: &[FileChunk]) -> (Vec<FileChunk>, Vec<FileChunk>) {
    let visibles = non_overlapping_visible_intervals(chunks);
    let live: HashSet<&str> = visibles.iter().map(|v| v.file_id.as_str()).collect();

    let mut seen = HashSet::new();
    let garbage = chunks
        .iter()
        .filter(|c| !live.contains(c.file_id.as_str()))
        .filter(|c| seen.insert(c.file_id.as_str()))
        .cloned()
        .collect();

    let compacted = visibles.into_iter().map(VisibleInterval::into_chunk).collect();
    (compacted, garbage)
}

/// Chunks of `old` whose file id does not appear in `new`, one per file id.
pub fn find_unused_chunks(old: &[FileChunk], new: &[FileChunk]) -> Vec<FileChunk> {
    let kept: HashSet<&str> = new.iter().map(|c| c.file_id.as_str()).collect();
    let mut seen = HashSet::new();
    old.iter()
        .filter(|c| !kept.contains(c.file_id.as_str()))
        .filter(|c| seen.insert(c.file_id.as_str()))
        .cloned()
        .collect()
}

/// Blob ranges that together serve the logical range `[offset, offset + size)`.
/// Holes are simply absent from the result.
pub fn view_from_chunks(chunks: &[FileChunk], offset: u64, size: u64) -> Vec<ChunkView> {
    let stop = offset.saturating_add(size);
    non_overlapping_visible_intervals(chunks)
        .into_iter()
        .filter(|v| v.start < stop && v.stop > offset)
        .map(|v| {
            let start = v.start.max(offset);
            let end = v.stop.min(stop);
            ChunkView {
                offset: v.chunk_offset + (start - v.start),
                size: end - start,
                logic_offset: start,
                file_id: v.file_id,
            }
        })
        .collect()
}
