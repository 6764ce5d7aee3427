//! Log record structure

use super::level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fully materialised log event.
///
/// The timestamp is captured when the record is built, at the call site, so
/// asynchronous processing never shifts it. The message and logger name are
/// owned: records cross threads through the backend queue and must not
/// borrow from transient storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub logger_name: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub module_path: Option<String>,
}

impl LogRecord {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// so a record always renders as a single line.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(
        level: LogLevel,
        message: impl Into<String>,
        logger_name: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: Self::sanitize_message(&message.into()),
            logger_name: logger_name.into(),
            file: None,
            line: None,
            module_path: None,
        }
    }

    pub fn with_location(mut self, file: &str, line: u32, module_path: &str) -> Self {
        self.file = Some(file.to_string());
        self.line = Some(line);
        self.module_path = Some(module_path.to_string());
        self
    }
}
