//! # Trace Logger
//!
//! Structured trace log behind the shell's `-x` flag and `debug` command.
//!
//! ## Philosophy
//!
//! Tracing is explicit and structured, not printf-style: call sites build a
//! `LogEntry` with typed fields, the log keeps a bounded in-memory history,
//! and echoing to stderr is a display decision made in one place.

use std::collections::VecDeque;
use std::fmt;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational messages
    Info,
    /// Warnings
    Warn,
    /// Errors
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        };
        write!(f, "{}", s)
    }
}

/// A structured log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Structured fields
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    /// Creates a new log entry
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field to the log entry
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)?;
        for (key, value) in &self.fields {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

/// Bounded in-memory trace log.
#[derive(Debug)]
pub struct TraceLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    /// When set, entries are also echoed to stderr as they arrive.
    echo: bool,
}

impl TraceLog {
    /// Default number of retained entries.
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Creates a trace log with the default capacity, echo disabled.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a trace log retaining at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            echo: false,
        }
    }

    /// Enables or disables the stderr echo (the `debug on|off` command).
    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }

    /// Returns whether the stderr echo is active.
    pub fn echo(&self) -> bool {
        self.echo
    }

    /// Records an entry, evicting the oldest when full.
    pub fn record(&mut self, entry: LogEntry) {
        if self.echo {
            eprintln!("{}", entry);
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Convenience: records a debug entry.
    pub fn debug(&mut self, message: impl Into<String>) {
        self.record(LogEntry::new(LogLevel::Debug, message));
    }

    /// Returns the retained entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TraceLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_display() {
        let entry = LogEntry::new(LogLevel::Debug, "dispatch")
            .with_field("term", "showrpt")
            .with_field("block", "main");
        assert_eq!(entry.to_string(), "[DEBUG] dispatch term=showrpt block=main");
    }

    #[test]
    fn test_record_and_iterate() {
        let mut log = TraceLog::new();
        log.debug("one");
        log.debug("two");
        let messages: Vec<_> = log.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["one", "two"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = TraceLog::with_capacity(2);
        log.debug("one");
        log.debug("two");
        log.debug("three");
        assert_eq!(log.len(), 2);
        let messages: Vec<_> = log.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }

    #[test]
    fn test_echo_defaults_off() {
        let log = TraceLog::new();
        assert!(!log.echo());
        assert!(log.is_empty());
    }
}
