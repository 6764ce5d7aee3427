//! Built-in sink implementations

pub mod console;
pub mod file;
pub mod null;

pub use console::ConsoleSink;
pub use file::FileSink;
pub use null::NullSink;
