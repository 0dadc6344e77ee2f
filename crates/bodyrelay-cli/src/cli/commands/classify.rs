//! `bodyrelay classify [FILE]` – show format tag and chunk plan.

use anyhow::Result;
use bodyrelay_core::chunker::total_chunks;
use bodyrelay_core::classifier::classify;
use bodyrelay_core::config::RelayConfig;
use bodyrelay_core::submit::human_size;
use std::path::Path;

use super::input::read_body;

pub async fn run_classify(cfg: &RelayConfig, file: Option<&Path>) -> Result<()> {
    let body = read_body(file)?;
    let format = classify(&body);
    let chunks = total_chunks(body.len(), cfg.chunk_size);
    println!("format: {}", format);
    println!("length: {} ({})", body.len(), human_size(body.len() as u64));
    println!("chunks: {} x {}", chunks, human_size(cfg.chunk_size as u64));
    Ok(())
}
