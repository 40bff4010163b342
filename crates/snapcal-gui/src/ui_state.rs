//! UI-specific state (ephemeral)

use std::collections::VecDeque;

/// UI-specific state that doesn't need to be persisted
pub struct UiState {
    /// Technical log visibility
    pub technical_log_expanded: bool,

    /// Technical log entries (max 200)
    pub technical_log: VecDeque<LogEntry>,

    /// API key input buffer for direct entry
    pub api_key_input: String,

    /// Settings section visibility
    pub settings_expanded: bool,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            technical_log_expanded: false,
            technical_log: VecDeque::with_capacity(200),
            api_key_input: String::new(),
            settings_expanded: false,
        }
    }

    /// Add a log entry, maintaining max 200 entries
    pub fn add_log_entry(&mut self, entry: LogEntry) {
        if self.technical_log.len() >= 200 {
            self.technical_log.pop_front();
        }
        self.technical_log.push_back(entry);
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}

/// Technical log entry
#[derive(Clone)]
pub struct LogEntry {
    /// Timestamp
    pub timestamp: String,

    /// Log level
    pub level: LogLevel,

    /// Message
    pub message: String,
}

/// Log level for coloring
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}
