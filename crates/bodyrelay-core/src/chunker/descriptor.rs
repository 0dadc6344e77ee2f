//! Per-dispatch chunk descriptor.

use crate::classifier::BodyFormat;

use super::range::{chunk_range, total_chunks};

/// Everything the transport needs to send one chunk. Borrows the body;
/// built lazily for the chunk being dispatched, never for the whole plan.
#[derive(Debug, Clone, Copy)]
pub struct ChunkDescriptor<'a> {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub data: &'a [u8],
    pub total_chunks: usize,
    pub format: BodyFormat,
}

impl<'a> ChunkDescriptor<'a> {
    /// Describes chunk `index` of `body`, or None if `index` is out of range.
    pub fn for_index(
        body: &'a [u8],
        chunk_size: usize,
        index: usize,
        format: BodyFormat,
    ) -> Option<Self> {
        let chunk = chunk_range(body.len(), chunk_size, index)?;
        Some(Self {
            index,
            start: chunk.start,
            end: chunk.end,
            data: &body[chunk.start..chunk.end],
            total_chunks: total_chunks(body.len(), chunk_size),
            format,
        })
    }
}
