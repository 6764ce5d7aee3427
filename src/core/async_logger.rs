//! Asynchronous logger front-end
//!
//! Same surface as the synchronous [`Logger`](super::logger::Logger), but
//! `log` only materialises the record and hands it to the process-wide
//! [`AsyncBackend`]; formatting and sink I/O happen on the backend worker.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::backend::{AsyncBackend, BackendConfig, LogItem};

use super::error::Result;
use super::formatter::{Formatter, PatternFormatter};
use super::level::LogLevel;
use super::record::LogRecord;
use super::sink::Sink;

/// A named logger whose records are processed on the backend worker thread.
///
/// Each submitted item carries clones of the formatter and sink handles, so
/// reconfiguring or dropping the logger never invalidates records already in
/// flight.
pub struct AsyncLogger {
    name: String,
    min_level: RwLock<LogLevel>,
    sinks: RwLock<Vec<Arc<dyn Sink>>>,
    formatter: RwLock<Arc<dyn Formatter>>,
}

impl AsyncLogger {
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

    /// Core async logging method: returns as soon as the record is queued.
    /// Records are silently dropped when the backend is not running.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }
        self.submit(LogRecord::new(level, message, self.name.as_str()));
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
        self.submit(record);
    }

    fn submit(&self, record: LogRecord) {
        let backend = AsyncBackend::global();
        if !backend.is_running() {
            return;
        }
        let item = LogItem::new(
            record,
            Arc::clone(&*self.formatter.read()),
            self.sinks.read().clone(),
        );
        backend.submit(item);
    }

    /// Ask the backend to process pending items now. Non-blocking; use
    /// [`flush_wait`](Self::flush_wait) to wait for completion.
    pub fn flush(&self) {
        AsyncBackend::global().flush();
    }

    /// Flush and wait until items submitted before this call have been
    /// written, bounded by `timeout`.
    pub fn flush_wait(&self, timeout: Duration) -> bool {
        AsyncBackend::global().wait_for_drain(timeout)
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

impl Drop for AsyncLogger {
    fn drop(&mut self) {
        // Nudge the worker; never block in a destructor.
        AsyncBackend::global().flush();
    }
}

/// Start the process-wide async backend. Call once at startup, before the
/// first [`AsyncLogger`] submission.
pub fn init_async(config: BackendConfig) -> Result<()> {
    AsyncBackend::global().start(config)
}

/// Drain pending records and stop the process-wide backend. Call before
/// program exit.
pub fn shutdown_async(timeout: Duration) {
    AsyncBackend::global().stop(timeout);
}

/// Whether the process-wide backend is currently running.
pub fn is_async_running() -> bool {
    AsyncBackend::global().is_running()
}
