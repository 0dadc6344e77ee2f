//! Multipart form submission to the local API (`{file, filetype, region}`).
//!
//! The endpoint replies with JSON `{"success": bool, "errormsg": string}`;
//! the reply is turned into a notice for the user.

mod form;

pub use form::submit_file;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::notify::{Notice, NoticeKind};

/// Kind of captured file being submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Mysekai,
    Suite,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Mysekai => "mysekai",
            FileType::Suite => "suite",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysekai" => Ok(FileType::Mysekai),
            "suite" => Ok(FileType::Suite),
            other => anyhow::bail!("unknown filetype: {}", other),
        }
    }
}

/// JSON reply of the submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReply {
    pub success: bool,
    #[serde(default)]
    pub errormsg: String,
}

pub fn parse_reply(body: &[u8]) -> Result<SubmitReply> {
    serde_json::from_slice(body).context("submission reply is not valid JSON")
}

/// Notice describing a submission result. Failures stay until dismissed.
pub fn notice_for(result: &Result<SubmitReply>) -> Notice {
    match result {
        Ok(reply) if reply.success => Notice::preset(NoticeKind::Success),
        Ok(reply) => {
            let msg = if reply.errormsg.is_empty() {
                "The server rejected the file."
            } else {
                reply.errormsg.as_str()
            };
            Notice::new(NoticeKind::Error, "Upload failed", msg).with_duration(Duration::ZERO)
        }
        Err(e) => Notice::new(NoticeKind::Error, "Network error", &format!("{:#}", e)).with_duration(Duration::ZERO),
    }
}

/// Human-readable size with 1024-based units, e.g. `0 Bytes`, `1.5 KB`, `2 MB`.
pub fn human_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    // Drop trailing zeros: 2.00 -> 2, 1.50 -> 1.5
    let text = format!("{:.2}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", text, UNITS[unit])
}
