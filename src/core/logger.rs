//! Synchronous logger front-end

use std::sync::Arc;

use parking_lot::RwLock;

use super::error::Result;
use super::formatter::{Formatter, PatternFormatter};
use super::level::LogLevel;
use super::record::LogRecord;
use super::sink::Sink;

/// A named logger that formats and writes records inline on the calling
/// thread.
///
/// Sinks and the formatter are held behind shared handles, so a `Logger` in
/// an `Arc` can be used concurrently from any number of threads.
pub struct Logger {
    name: String,
    min_level: RwLock<LogLevel>,
    sinks: RwLock<Vec<Arc<dyn Sink>>>,
    formatter: RwLock<Arc<dyn Formatter>>,
}

impl Logger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_level: RwLock::new(LogLevel::Trace),
            sinks: RwLock::new(Vec::new()),
            formatter: RwLock::new(Arc::new(PatternFormatter::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> LogLevel {
        *self.min_level.read()
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.min_level.write() = level;
    }

    pub fn add_sink(&self, sink: Arc<dyn Sink>) {
        self.sinks.write().push(sink);
    }

    pub fn set_formatter(&self, formatter: Arc<dyn Formatter>) {
        *self.formatter.write() = formatter;
    }

    fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level >= *self.min_level.read()
    }

    /// Core logging method: filter, materialise a record, format, write.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }
        self.dispatch(LogRecord::new(level, message, self.name.as_str()));
    }

    /// Logging entry point used by the macros to attach call-site location.
    pub fn log_at(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        file: &str,
        line: u32,
        module_path: &str,
    ) {
        if !self.enabled(level) {
            return;
        }
        let record = LogRecord::new(level, message, self.name.as_str())
            .with_location(file, line, module_path);
        self.dispatch(record);
    }

    fn dispatch(&self, record: LogRecord) {
        let formatter = Arc::clone(&*self.formatter.read());
        let formatted = formatter.format(&record);

        for sink in self.sinks.read().iter() {
            if let Err(error) = sink.write(&formatted) {
                eprintln!("[LOGRELAY] sink '{}' write failed: {}", sink.name(), error);
            }
        }
    }

    /// Flush every attached sink.
    pub fn flush(&self) -> Result<()> {
        for sink in self.sinks.read().iter() {
            sink.flush()?;
        }
        Ok(())
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn critical(&self, message: impl Into<String>) {
        self.log(LogLevel::Critical, message);
    }
}
