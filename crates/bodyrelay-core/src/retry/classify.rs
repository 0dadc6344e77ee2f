//! Map chunk POST results to failure kinds.

use super::error::ChunkError;
use super::policy::FailureKind;

/// True for statuses in [200, 300).
pub fn is_success(status: u32) -> bool {
    (200..300).contains(&status)
}

/// Turn a non-2xx response into `ChunkError::HttpStatus`.
pub fn check_status(status: u32, body: &[u8]) -> Result<(), ChunkError> {
    if is_success(status) {
        Ok(())
    } else {
        Err(ChunkError::HttpStatus {
            status,
            body_len: body.len(),
        })
    }
}

/// Classify a chunk error into a FailureKind.
pub fn classify(e: &ChunkError) -> FailureKind {
    match e {
        ChunkError::Transport(_) => FailureKind::Transport,
        ChunkError::HttpStatus { .. } => FailureKind::HttpStatus,
        ChunkError::Internal(_) => FailureKind::Internal,
    }
}
