//! File sink implementation

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::core::error::{LoggerError, Result};
use crate::core::sink::Sink;

/// Writes formatted records to a file through a buffered writer.
///
/// Open failures are reported from the constructor; a constructed sink only
/// surfaces I/O errors through `write`/`flush`, which the callers swallow.
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileSink {
    /// Open `path` for appending, creating it if absent.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_options(path, true)
    }

    /// Open `path`, either appending to or truncating existing content.
    pub fn with_options(path: impl Into<PathBuf>, append: bool) -> Result<Self> {
        let path = path.into();

        let mut options = OpenOptions::new();
        options.create(true);
        if append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }

        let file = options
            .open(&path)
            .map_err(|source| LoggerError::file_sink(path.display().to_string(), source.to_string()))?;

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn write(&self, message: &str) -> Result<()> {
        self.writer.lock().write_all(message.as_bytes())?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // Ensure buffered output reaches the disk.
        let _ = self.writer.lock().flush();
    }
}
