use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Display class of a notice. Only `Error` blocks a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Updated,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Updated => "updated",
        }
    }
}

/// A transient message queued for display after a pipeline transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub code: String,
    pub message: String,
    pub severity: Severity,
}

/// Validators report problems as error-severity notices.
pub type ValidationError = Notice;

impl Notice {
    pub fn new(code: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, Severity::Error)
    }

    pub fn updated(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, Severity::Updated)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Per-request notice queue, partitioned by channel.
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    channels: BTreeMap<String, Vec<Notice>>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, channel: &str, notice: Notice) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .push(notice);
    }

    pub fn peek(&self, channel: &str) -> &[Notice] {
        self.channels
            .get(channel)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Take every queued notice for the channel; each notice is shown once.
    pub fn drain(&mut self, channel: &str) -> Vec<Notice> {
        self.channels.remove(channel).unwrap_or_default()
    }

    pub fn has_errors(&self, channel: &str) -> bool {
        self.peek(channel).iter().any(Notice::is_error)
    }
}
