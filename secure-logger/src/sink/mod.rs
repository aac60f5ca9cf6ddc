//! Destinations for finalized records.
//!
//! Sinks only ever see redacted records by shared reference. Failures are
//! returned, never panicked; the dispatcher decides what to do with them.

pub mod console;
pub mod ring_buffer;
pub mod store;

pub use console::ConsoleSink;
pub use ring_buffer::{RingBufferSink, DEFAULT_STORAGE_KEY, RING_BUFFER_CAPACITY};
pub use store::{FileStore, KeyValueStore, MemoryStore};

use crate::error::Result;
use crate::record::LogRecord;

pub trait LogSink: Send + Sync {
    fn name(&self) -> &str;

    fn write(&self, record: &LogRecord) -> Result<()>;

    /// Best-effort operator notice about a failure elsewhere in the pipeline.
    fn diagnostic(&self, _message: &str) {}
}
