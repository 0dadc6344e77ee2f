//! Chunk transport: one POST per call, no implicit retry.
//!
//! `ChunkTransport` is the seam between the sequence driver and the network;
//! `CurlTransport` is the libcurl implementation, tests substitute their own.

mod http;

pub use http::CurlTransport;

use crate::chunker::ChunkDescriptor;
use crate::retry::ChunkError;

/// Metadata of the intercepted request, forwarded read-only in headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginRequest {
    pub url: String,
    pub path: String,
}

/// One chunk plus the metadata that travels with it.
#[derive(Debug, Clone, Copy)]
pub struct ChunkRequest<'a> {
    pub chunk: ChunkDescriptor<'a>,
    pub origin: &'a OriginRequest,
}

/// Response to a chunk POST (any status).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkResponse {
    pub status: u32,
    pub body: Vec<u8>,
}

/// Sends a single chunk. Resolves exactly once per call.
pub trait ChunkTransport {
    /// POST `request` to the upload endpoint. `Err` only when no response was
    /// obtained or the request could not be built; non-2xx statuses are `Ok`.
    fn post(&mut self, request: &ChunkRequest<'_>) -> Result<ChunkResponse, ChunkError>;
}

pub const CONTENT_TYPE: &str = "application/octet-stream";

/// Header lines (`Name: value`) for a chunk POST.
///
/// Fails with `ChunkError::Internal` if a forwarded value contains a line
/// break, which would otherwise split the header block.
pub fn header_lines(request: &ChunkRequest<'_>, client_id: &str) -> Result<Vec<String>, ChunkError> {
    let chunk = &request.chunk;
    let pairs: [(&str, String); 7] = [
        ("Content-Type", CONTENT_TYPE.to_string()),
        ("User-Agent", client_id.to_string()),
        ("X-Original-Url", request.origin.url.clone()),
        ("X-Request-Path", request.origin.path.clone()),
        ("X-Chunk-Index", chunk.index.to_string()),
        ("X-Total-Chunks", chunk.total_chunks.to_string()),
        ("X-Body-Format", chunk.format.as_str().to_string()),
    ];
    pairs
        .into_iter()
        .map(|(name, value)| {
            if value.contains(['\r', '\n']) {
                return Err(ChunkError::Internal(format!(
                    "header {} contains a line break",
                    name
                )));
            }
            Ok(format!("{}: {}", name, value))
        })
        .collect()
}
