//! `bodyrelay send [FILE]` – relay a captured body in chunks.

use anyhow::{Context, Result};
use bodyrelay_core::config::RelayConfig;
use bodyrelay_core::pipeline::{self, Interception};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::input::read_body;

#[derive(Debug)]
pub struct SendArgs {
    pub file: Option<PathBuf>,
    pub url: String,
    pub path: String,
    pub upload_url: Option<String>,
    pub chunk_size: Option<usize>,
}

/// Applies command-line overrides and re-validates.
fn effective_config(cfg: &RelayConfig, args: &SendArgs) -> Result<RelayConfig> {
    let mut cfg = cfg.clone();
    if let Some(url) = &args.upload_url {
        cfg.upload_url = url.clone();
    }
    if let Some(size) = args.chunk_size {
        cfg.chunk_size = size;
    }
    cfg.validate()?;
    Ok(cfg)
}

pub async fn run_send(cfg: &RelayConfig, args: SendArgs) -> Result<()> {
    let cfg = effective_config(cfg, &args)?;
    let body = read_body(args.file.as_deref())?;
    let len = body.len();
    let interception = Interception::new(body, &args.url, &args.path);

    let done = Arc::new(AtomicBool::new(false));
    let done_cb = Arc::clone(&done);
    pipeline::spawn_relay(interception, &cfg, move || done_cb.store(true, Ordering::SeqCst))
        .context("invalid relay settings")?
        .await
        .context("relay task join")?;

    if done.load(Ordering::SeqCst) {
        println!("{}", finish_line(len));
    }
    Ok(())
}

/// Printed once the run ends; success or abort is only known from the log.
fn finish_line(len: usize) -> String {
    format!("relay finished; see log for outcome ({} bytes read)", len)
}
