//! Null sink implementation

use crate::core::error::Result;
use crate::core::sink::Sink;

/// Discards all output. Useful for measuring the overhead of the logging
/// pipeline without any actual I/O.
pub struct NullSink;

impl NullSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for NullSink {
    fn write(&self, _message: &str) -> Result<()> {
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}
