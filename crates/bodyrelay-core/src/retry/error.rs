//! Chunk delivery error type for retry classification.

use std::fmt;

/// Error from a single chunk POST attempt.
#[derive(Debug)]
pub enum ChunkError {
    /// Curl reported an error before a response was obtained (connect, timeout, etc.).
    Transport(curl::Error),
    /// Response obtained with a status outside [200, 300).
    HttpStatus { status: u32, body_len: usize },
    /// The request could not be built or its result handled (bad header value, panic).
    Internal(String),
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::Transport(e) => write!(f, "transport: {}", e),
            ChunkError::HttpStatus { status, body_len } => {
                write!(f, "HTTP {} (body_len={})", status, body_len)
            }
            ChunkError::Internal(msg) => write!(f, "internal: {}", msg),
        }
    }
}

impl std::error::Error for ChunkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChunkError::Transport(e) => Some(e),
            ChunkError::HttpStatus { .. } | ChunkError::Internal(_) => None,
        }
    }
}

impl From<curl::Error> for ChunkError {
    fn from(e: curl::Error) -> Self {
        ChunkError::Transport(e)
    }
}
