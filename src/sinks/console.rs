//! Console sink implementation

use std::io::{self, Write};

use parking_lot::Mutex;

use crate::core::error::Result;
use crate::core::sink::Sink;

/// Writes formatted records to stdout, serialised by an internal mutex.
pub struct ConsoleSink {
    lock: Mutex<()>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self { lock: Mutex::new(()) }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn write(&self, message: &str) -> Result<()> {
        let _guard = self.lock.lock();
        io::stdout().write_all(message.as_bytes())?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let _guard = self.lock.lock();
        io::stdout().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
