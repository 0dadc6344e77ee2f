//! Notification sink: the only surface the relay offers to a UI.

use std::fmt;
use std::time::Duration;

/// Default on-screen lifetime of a notice.
pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NoticeKind {
    pub fn icon(&self) -> &'static str {
        match self {
            NoticeKind::Success => "✓",
            NoticeKind::Error => "✕",
            NoticeKind::Warning => "⚠",
            NoticeKind::Info => "ℹ",
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
            NoticeKind::Warning => "warning",
            NoticeKind::Info => "info",
        };
        f.write_str(s)
    }
}

/// A notice. `duration` of zero means it stays until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
    pub duration: Duration,
}

impl Notice {
    pub fn new(kind: NoticeKind, title: &str, message: &str) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message: message.to_string(),
            duration: DEFAULT_NOTICE_DURATION,
        }
    }

    /// Stock title and message for `kind`.
    pub fn preset(kind: NoticeKind) -> Self {
        let (title, message) = match kind {
            NoticeKind::Success => ("Operation succeeded", "Your operation completed successfully."),
            NoticeKind::Error => ("Operation failed", "Sorry, the operation failed. Please try again later."),
            NoticeKind::Warning => ("Warning", "This operation may carry risk."),
            NoticeKind::Info => ("Information", "This is an informational notice."),
        };
        Self::new(kind, title, message)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_sticky(&self) -> bool {
        self.duration.is_zero()
    }
}

pub trait NotificationSink {
    fn notify(&self, notice: &Notice);
}

/// Forwards notices to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notice: &Notice) {
        match notice.kind {
            NoticeKind::Error => {
                tracing::error!(title = %notice.title, sticky = notice.is_sticky(), "{}", notice.message)
            }
            NoticeKind::Warning => {
                tracing::warn!(title = %notice.title, sticky = notice.is_sticky(), "{}", notice.message)
            }
            NoticeKind::Success | NoticeKind::Info => tracing::info!(
                kind = %notice.kind,
                title = %notice.title,
                duration_ms = notice.duration.as_millis() as u64,
                "{}",
                notice.message
            ),
        }
    }
}
