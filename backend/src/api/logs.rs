//! Pipeline log broadcasting.
//!
//! Every entry is echoed to stderr (stdout stays free for JSON output) and
//! broadcast to subscribers, which the server streams to clients over
//! Server-Sent Events.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Buffered entries per subscriber before the slowest one starts lagging.
const CHANNEL_CAPACITY: usize = 256;

/// Log level for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    /// Nesting depth for sub-step messages
    #[serde(default)]
    pub indent: u8,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            indent: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Console rendering with level prefix and indentation.
    pub fn render(&self) -> String {
        let prefix = match self.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        format!("{}{} {}", "   ".repeat(self.indent as usize), prefix, self.message)
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

/// Broadcasts log entries to all subscribers
pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Echo an entry and send it to all subscribers
    pub fn log(&self, entry: LogEntry) {
        eprintln!("{}", entry.render());

        // no subscribers is fine
        let _ = self.sender.send(entry);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Success, msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Warning, msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Error, msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg).with_indent(indent));
}
