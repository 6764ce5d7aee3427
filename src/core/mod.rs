//! Core logger types and traits

pub mod async_logger;
pub mod error;
pub mod formatter;
pub mod level;
pub mod logger;
pub mod record;
pub mod registry;
pub mod sink;

pub use async_logger::{init_async, is_async_running, shutdown_async, AsyncLogger};
pub use error::{LoggerError, Result};
pub use formatter::{Formatter, JsonFormatter, PatternFormatter};
pub use level::LogLevel;
pub use logger::Logger;
pub use record::LogRecord;
pub use registry::{get_default_logger, get_logger, set_default_logger, Registry};
pub use sink::Sink;
