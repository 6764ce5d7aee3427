//! # logrelay
//!
//! A structured logging library with synchronous and asynchronous
//! front-ends over a shared formatter and sink model.
//!
//! ## Features
//!
//! - **Asynchronous backend**: a bounded lock-free MPMC queue feeding a
//!   single background worker that batches, formats, and writes records
//! - **Explicit lifecycle**: `start`, `flush`, `wait_for_drain`, and `stop`
//!   with drain-on-shutdown and bounded waits
//! - **Multiple sinks**: console, file, and custom sinks behind one trait
//! - **Thread safe**: loggers and sinks are shared handles, usable from any
//!   number of threads
//!
//! ## Quick start
//!
//! ```
//! use logrelay::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! // Synchronous logging
//! let logger = Logger::new("app");
//! logger.add_sink(Arc::new(NullSink::new()));
//! logger.info("application started");
//!
//! // Asynchronous logging
//! init_async(BackendConfig::default()).unwrap();
//! let fast = AsyncLogger::new("hot-path");
//! fast.add_sink(Arc::new(NullSink::new()));
//! fast.info("handled request");
//! fast.flush_wait(Duration::from_secs(1));
//! shutdown_async(Duration::from_secs(5));
//! ```

pub mod backend;
pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::backend::{AsyncBackend, BackendConfig, LogItem, DEFAULT_SHUTDOWN_TIMEOUT};
    pub use crate::core::{
        get_default_logger, get_logger, init_async, is_async_running, set_default_logger,
        shutdown_async, AsyncLogger, Formatter, JsonFormatter, LogLevel, LogRecord, Logger,
        LoggerError, PatternFormatter, Registry, Result, Sink,
    };
    pub use crate::sinks::{ConsoleSink, FileSink, NullSink};
}

pub use crate::backend::{AsyncBackend, BackendConfig, LogItem, RingQueue, DEFAULT_SHUTDOWN_TIMEOUT};
pub use crate::core::{
    get_default_logger, get_logger, init_async, is_async_running, set_default_logger,
    shutdown_async, AsyncLogger, Formatter, JsonFormatter, LogLevel, LogRecord, Logger,
    LoggerError, PatternFormatter, Registry, Result, Sink,
};
pub use crate::sinks::{ConsoleSink, FileSink, NullSink};
