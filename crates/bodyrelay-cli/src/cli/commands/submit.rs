//! `bodyrelay submit FILE` – multipart submission to the local API.

use anyhow::{Context, Result};
use bodyrelay_core::config::RelayConfig;
use bodyrelay_core::notify::{LogSink, Notice, NoticeKind, NotificationSink};
use bodyrelay_core::submit::{self, human_size, FileType};
use std::path::Path;
use std::time::Duration;

/// Prints notices and mirrors them to the log. Sticky notices go to
/// stderr, transient ones to stdout.
struct TerminalSink;

#[derive(Debug, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

fn render(notice: &Notice) -> (Stream, String) {
    let line = format!("{} {}: {}", notice.kind.icon(), notice.title, notice.message);
    if notice.is_sticky() {
        (Stream::Stderr, line)
    } else {
        (Stream::Stdout, line)
    }
}

impl NotificationSink for TerminalSink {
    fn notify(&self, notice: &Notice) {
        match render(notice) {
            (Stream::Stderr, line) => eprintln!("{}", line),
            (Stream::Stdout, line) => println!("{}", line),
        }
        LogSink.notify(notice);
    }
}

pub async fn run_submit(
    cfg: &RelayConfig,
    file: &Path,
    filetype: FileType,
    region: &str,
    endpoint: Option<String>,
) -> Result<()> {
    let submit_cfg = cfg.submit_or_default();
    let endpoint = endpoint.unwrap_or(submit_cfg.endpoint);
    let timeout = Duration::from_secs(submit_cfg.timeout_secs);
    let size = std::fs::metadata(file)
        .with_context(|| format!("stat {}", file.display()))?
        .len();
    let sink = TerminalSink;
    sink.notify(&Notice::new(
        NoticeKind::Info,
        "Uploading",
        &format!("{} ({})", file.display(), human_size(size)),
    ));

    let result = tokio::task::spawn_blocking({
        let file = file.to_path_buf();
        let region = region.to_string();
        move || submit::submit_file(&endpoint, &file, filetype, &region, timeout)
    })
    .await
    .context("submit task join")?;

    let notice = submit::notice_for(&result);
    sink.notify(&notice);
    if notice.kind == NoticeKind::Error {
        anyhow::bail!("submission of {} failed", file.display());
    }
    Ok(())
}
