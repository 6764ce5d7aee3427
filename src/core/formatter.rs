//! Formatter trait and the built-in pattern and JSON formatters

use super::record::LogRecord;
use chrono::SecondsFormat;
use colored::Colorize;

/// Turns a [`LogRecord`] into the text a sink will receive.
///
/// Formatters are called once per record. In the asynchronous path the call
/// happens on the backend worker thread, but implementations must be safe to
/// invoke from anywhere.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;
}

/// The default human-readable line format:
///
/// ```text
/// [2024-01-01 12:00:00.123] [INFO] [logger_name] message
/// ```
pub struct PatternFormatter {
    use_colors: bool,
}

impl PatternFormatter {
    pub fn new() -> Self {
        Self { use_colors: false }
    }

    /// Colour the level token with ANSI escapes, for console sinks.
    pub fn with_colors() -> Self {
        Self { use_colors: true }
    }
}

impl Default for PatternFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for PatternFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let level = if self.use_colors {
            record
                .level
                .to_str()
                .color(record.level.color_code())
                .to_string()
        } else {
            record.level.to_str().to_string()
        };

        format!(
            "[{}] [{}] [{}] {}\n",
            record.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            level,
            record.logger_name,
            record.message
        )
    }
}

/// One JSON object per line (JSONL), for log aggregation tooling.
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let mut object = serde_json::Map::new();

        object.insert(
            "timestamp".to_string(),
            serde_json::Value::String(
                record
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        );
        object.insert(
            "level".to_string(),
            serde_json::Value::String(record.level.to_str().to_string()),
        );
        object.insert(
            "logger".to_string(),
            serde_json::Value::String(record.logger_name.clone()),
        );
        object.insert(
            "message".to_string(),
            serde_json::Value::String(record.message.clone()),
        );

        if let Some(file) = &record.file {
            object.insert("file".to_string(), serde_json::Value::String(file.clone()));
        }
        if let Some(line) = record.line {
            object.insert("line".to_string(), serde_json::Value::Number(line.into()));
        }
        if let Some(module_path) = &record.module_path {
            object.insert(
                "module".to_string(),
                serde_json::Value::String(module_path.clone()),
            );
        }

        match serde_json::to_string(&serde_json::Value::Object(object)) {
            Ok(mut line) => {
                line.push('\n');
                line
            }
            Err(_) => String::new(),
        }
    }
}
