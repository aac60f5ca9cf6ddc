use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

use super::store::{KeyValueStore, MemoryStore};
use super::LogSink;
use crate::error::{LoggerError, Result};
use crate::record::LogRecord;

pub const RING_BUFFER_CAPACITY: usize = 100;

/// Namespace key of the persisted buffer.
pub const DEFAULT_STORAGE_KEY: &str = "secure_logger_logs";

/// Bounded, persisted FIFO of records awaiting remote delivery.
///
/// The in-memory copy and the persisted value are swapped together under one
/// lock, so concurrent appenders never observe more than
/// [`RING_BUFFER_CAPACITY`] entries and eviction stays strictly oldest-first.
pub struct RingBufferSink {
    store: Arc<dyn KeyValueStore>,
    key: String,
    entries: Mutex<VecDeque<LogRecord>>,
}

impl RingBufferSink {
    /// Opens the buffer persisted under `key`. An unreadable or corrupt
    /// value is reported and replaced by an empty buffer.
    pub fn open(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let entries = match Self::load(store.as_ref(), &key) {
            Ok(entries) => {
                tracing::debug!(key = %key, entries = entries.len(), "Loaded persisted log buffer");
                entries
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "Discarding unreadable log buffer");
                VecDeque::new()
            }
        };

        Self {
            store,
            key,
            entries: Mutex::new(entries),
        }
    }

    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryStore::new()), DEFAULT_STORAGE_KEY)
    }

    pub fn load(store: &dyn KeyValueStore, key: &str) -> Result<VecDeque<LogRecord>> {
        let Some(raw) = store.get(key)? else {
            return Ok(VecDeque::new());
        };

        let value: Value = serde_json::from_str(&raw)?;
        if !value.is_array() {
            return Err(LoggerError::CorruptStore(key.to_string()));
        }

        let mut entries: VecDeque<LogRecord> = serde_json::from_value(value)?;
        while entries.len() > RING_BUFFER_CAPACITY {
            entries.pop_front();
        }
        Ok(entries)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn append(&self, record: LogRecord) -> Result<()> {
        let mut entries = self.entries.lock();

        let mut next = entries.clone();
        if next.len() >= RING_BUFFER_CAPACITY {
            next.pop_front();
        }
        next.push_back(record);

        let serialized = serde_json::to_string(&next)?;
        self.store.set(&self.key, &serialized)?;
        *entries = next;
        Ok(())
    }

    /// Entries oldest first.
    pub fn list_all(&self) -> Vec<LogRecord> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) -> Result<()> {
        let mut entries = self.entries.lock();
        self.store.remove(&self.key)?;
        entries.clear();
        Ok(())
    }
}

impl LogSink for RingBufferSink {
    fn name(&self) -> &str {
        "ring_buffer"
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        self.append(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::Classification;
    use crate::severity::Severity;

    fn record(n: usize) -> LogRecord {
        LogRecord::new(Severity::Error, format!("entry {n}"), None, Classification::Production)
    }

    fn messages(sink: &RingBufferSink) -> Vec<String> {
        sink.list_all().iter().map(|r| r.message().to_string()).collect()
    }

    #[test]
    fn test_append_in_order() {
        let sink = RingBufferSink::in_memory();
        assert!(sink.is_empty());
        for n in 0..3 {
            sink.append(record(n)).unwrap();
        }
        assert_eq!(messages(&sink), ["entry 0", "entry 1", "entry 2"]);
    }

    #[test]
    fn test_evicts_oldest_beyond_capacity() {
        let sink = RingBufferSink::in_memory();
        for n in 0..150 {
            sink.append(record(n)).unwrap();
        }

        assert_eq!(sink.len(), RING_BUFFER_CAPACITY);
        let expected: Vec<String> = (50..150).map(|n| format!("entry {n}")).collect();
        assert_eq!(messages(&sink), expected);
    }

    #[test]
    fn test_persists_to_store() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let sink = RingBufferSink::open(Arc::clone(&store), "logs");
        sink.append(record(1)).unwrap();
        sink.append(record(2)).unwrap();

        let reopened = RingBufferSink::open(store, "logs");
        assert_eq!(messages(&reopened), ["entry 1", "entry 2"]);
    }

    #[test]
    fn test_corrupt_store_starts_empty() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set("logs", "{\"not\":\"a list\"}").unwrap();
        assert!(matches!(
            RingBufferSink::load(store.as_ref(), "logs"),
            Err(LoggerError::CorruptStore(_))
        ));

        let sink = RingBufferSink::open(Arc::clone(&store), "logs");
        assert!(sink.is_empty());
        sink.append(record(7)).unwrap();
        assert_eq!(RingBufferSink::load(store.as_ref(), "logs").unwrap().len(), 1);
    }

    #[test]
    fn test_clear_empties_store() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let sink = RingBufferSink::open(Arc::clone(&store), "logs");
        sink.append(record(1)).unwrap();
        sink.clear().unwrap();
        assert!(sink.is_empty());
        assert!(store.get("logs").unwrap().is_none());
    }
}
