//! Chunk math for sequential delivery.
//!
//! Splits a body into fixed-size, half-open byte ranges and builds the
//! per-dispatch descriptor that the transport sends.

mod descriptor;
mod range;

pub use descriptor::ChunkDescriptor;
pub use range::{chunk_range, total_chunks, Chunk};
