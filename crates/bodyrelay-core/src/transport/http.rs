//! libcurl-backed chunk transport.

use std::time::Duration;

use crate::config::RelayConfig;
use crate::retry::ChunkError;

use super::{header_lines, ChunkRequest, ChunkResponse, ChunkTransport};

/// POSTs chunks with a fresh curl Easy handle per call.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    upload_url: String,
    client_id: String,
    connect_timeout: Duration,
    timeout: Duration,
}

fn setup(e: curl::Error) -> ChunkError {
    ChunkError::Internal(format!("curl setup: {}", e))
}

impl CurlTransport {
    pub fn new(upload_url: &str, client_id: &str, connect_timeout: Duration, timeout: Duration) -> Self {
        Self {
            upload_url: upload_url.to_string(),
            client_id: client_id.to_string(),
            connect_timeout,
            timeout,
        }
    }

    pub fn from_config(cfg: &RelayConfig) -> Self {
        Self::new(
            &cfg.upload_url,
            &cfg.client_id,
            cfg.connect_timeout(),
            cfg.timeout(),
        )
    }
}

impl ChunkTransport for CurlTransport {
    fn post(&mut self, request: &ChunkRequest<'_>) -> Result<ChunkResponse, ChunkError> {
        let lines = header_lines(request, &self.client_id)?;

        let mut easy = curl::easy::Easy::new();
        easy.url(&self.upload_url).map_err(setup)?;
        easy.post(true).map_err(setup)?;
        easy.post_fields_copy(request.chunk.data).map_err(setup)?;
        easy.connect_timeout(self.connect_timeout).map_err(setup)?;
        easy.timeout(self.timeout).map_err(setup)?;

        let mut list = curl::easy::List::new();
        for line in &lines {
            list.append(line).map_err(setup)?;
        }
        // No 100-continue round trip for large chunks.
        list.append("Expect:").map_err(setup)?;
        easy.http_headers(list).map_err(setup)?;

        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(setup)?;
            transfer.perform().map_err(ChunkError::Transport)?;
        }

        let status = easy.response_code().map_err(ChunkError::Transport)?;
        Ok(ChunkResponse { status, body })
    }
}
