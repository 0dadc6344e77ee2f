//! Chunk type and range math.

/// A single chunk: byte range [start, end) (half-open) of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based position in the delivery order.
    pub index: usize,
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
}

impl Chunk {
    /// Length of this chunk in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Number of chunks needed for `body_len` bytes: `ceil(body_len / chunk_size)`.
///
/// Returns 0 if `body_len` is 0 or `chunk_size` is 0.
pub fn total_chunks(body_len: usize, chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return 0;
    }
    body_len.div_ceil(chunk_size)
}

/// Byte range of chunk `index`: `[index * chunk_size, min((index + 1) * chunk_size, body_len))`.
///
/// Returns None when `index` is past the last chunk. The last chunk may be shorter.
pub fn chunk_range(body_len: usize, chunk_size: usize, index: usize) -> Option<Chunk> {
    if index >= total_chunks(body_len, chunk_size) {
        return None;
    }
    let start = index * chunk_size;
    let end = start.saturating_add(chunk_size).min(body_len);
    Some(Chunk { index, start, end })
}
