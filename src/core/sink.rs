//! Sink trait for log output destinations

use super::error::Result;

/// An output endpoint that accepts pre-formatted log text.
///
/// Sink handles are shared (`Arc<dyn Sink>`) between loggers and in-flight
/// queue items, so implementations take `&self` and synchronise internally.
pub trait Sink: Send + Sync {
    /// Write one formatted record. The text already carries its trailing
    /// newline.
    fn write(&self, message: &str) -> Result<()>;

    /// Push any buffered output to the underlying device.
    fn flush(&self) -> Result<()>;

    fn name(&self) -> &str;
}
