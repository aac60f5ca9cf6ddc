//! End-to-end tests for the logging pipeline
//!
//! These tests drive the public API the way an application would:
//! 1. Development policy: console output with field masking
//! 2. Production policy: filtered-out calls never touch a sink
//! 3. Remote hook backed by the persisted ring buffer
//! 4. Ring buffer survives a restart within the same store directory
//! 5. Store failures never reach the caller
//! 6. Concurrent appenders keep the 100-entry cap and FIFO order
//! 7. Process-wide dispatcher and the logging macros

use parking_lot::Mutex;
use secure_logger::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Default)]
struct RecordingSink {
    records: Mutex<Vec<LogRecord>>,
    diagnostics: Mutex<Vec<String>>,
    writes: AtomicUsize,
}

impl RecordingSink {
    fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl LogSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn diagnostic(&self, message: &str) {
        self.diagnostics.lock().push(message.to_string());
    }
}

/// Store whose writes always fail, like a full quota.
struct FullStore;

impl KeyValueStore for FullStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn set(&self, key: &str, _value: &str) -> Result<()> {
        Err(LoggerError::Storage {
            key: key.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "quota exceeded"),
        })
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}

fn as_sink(sink: &Arc<RecordingSink>) -> Arc<dyn LogSink> {
    Arc::clone(sink) as Arc<dyn LogSink>
}

#[test]
fn test_development_console_record_masks_sensitive_fields() {
    let console = Arc::new(RecordingSink::default());
    let logger = Dispatcher::builder()
        .host("localhost")
        .console_sink(as_sink(&console))
        .build();

    assert!(logger.policy().is_development());
    logger.info("user action", Some(json!({ "email": "a@b.com", "name": "X" })));

    let records = console.records();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.level(), Severity::Info);
    assert_eq!(record.message(), "user action");
    assert_eq!(record.data(), Some(&json!({ "email": "***", "name": "***" })));
    assert_eq!(record.environment(), Classification::Development);
}

#[test]
fn test_production_debug_touches_no_sink() {
    let console = Arc::new(RecordingSink::default());
    let remote = Arc::new(RecordingSink::default());
    let logger = Dispatcher::builder()
        .host("app.example.com")
        .console_sink(as_sink(&console))
        .remote_sink(as_sink(&remote))
        .build();

    logger.debug("calculation started", Some(json!({ "rr": 15, "vte": 0.5 })));

    assert_eq!(console.writes(), 0);
    assert_eq!(remote.writes(), 0);
}

#[test]
fn test_production_error_lands_in_ring_buffer() {
    let ring_buffer = Arc::new(RingBufferSink::in_memory());
    let logger = Dispatcher::builder()
        .host("app.example.com")
        .remote_sink(Arc::clone(&ring_buffer) as Arc<dyn LogSink>)
        .build();

    logger.error(
        "sync failed for mario.rossi@gmail.com",
        Some(json!({ "userId": 42, "attempt": 3, "detail": "token eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiJ4In0.c2ln" })),
    );
    logger.security("suspicious input", Some(json!({ "input": "<script>alert(1)</script>" })));

    let entries = ring_buffer.list_all();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].message(), "sync failed for ***@gmail.com");
    assert_eq!(
        entries[0].data(),
        Some(&json!({ "userId": "***", "attempt": 3, "detail": "token [TOKEN_REDACTED]" }))
    );
    assert_eq!(entries[0].environment(), Classification::Production);
    assert_eq!(entries[1].level(), Severity::Security);
}

#[test]
fn test_ring_buffer_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = LoggerConfig {
        host: Some("app.example.com".to_string()),
        storage_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    {
        let logger = Dispatcher::from_config(&config).unwrap();
        for n in 0..105 {
            logger.error(format!("failure {n}"), None);
        }
    }

    let store = FileStore::new(dir.path()).unwrap();
    let reopened = RingBufferSink::open(Arc::new(store), DEFAULT_STORAGE_KEY);
    let messages: Vec<String> = reopened.list_all().iter().map(|r| r.message().to_string()).collect();
    let expected: Vec<String> = (5..105).map(|n| format!("failure {n}")).collect();
    assert_eq!(messages, expected);

    let raw = std::fs::read_to_string(dir.path().join("secure_logger_logs.json")).unwrap();
    let persisted: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let first = &persisted[0];
    assert_eq!(first["level"], "ERROR");
    assert_eq!(first["message"], "failure 5");
    assert_eq!(first["environment"], "production");
    let timestamp = first["timestamp"].as_str().unwrap();
    assert!(timestamp.ends_with('Z'));
    assert_eq!(timestamp.len(), "2024-03-01T12:30:00.000Z".len());
}

#[test]
fn test_store_failure_is_swallowed_and_reported() {
    let console = Arc::new(RecordingSink::default());
    let ring_buffer = Arc::new(RingBufferSink::open(Arc::new(FullStore), DEFAULT_STORAGE_KEY));
    let resolver = PolicyResolver::for_host("app.example.com").with_overrides(PolicyOverrides {
        console: Some(true),
        ..Default::default()
    });
    let logger = Dispatcher::builder()
        .resolver(resolver)
        .console_sink(as_sink(&console))
        .remote_sink(Arc::clone(&ring_buffer) as Arc<dyn LogSink>)
        .build();

    logger.error("cannot persist", None);

    assert!(ring_buffer.is_empty());
    assert_eq!(console.writes(), 1);
    let diagnostics = console.diagnostics.lock();
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics[0].contains("quota exceeded"));
}

#[test]
fn test_store_failure_silent_without_console() {
    let console = Arc::new(RecordingSink::default());
    let logger = Dispatcher::builder()
        .host("app.example.com")
        .console_sink(as_sink(&console))
        .remote_sink(Arc::new(RingBufferSink::open(Arc::new(FullStore), "logs")))
        .build();

    logger.error("cannot persist", None);

    assert_eq!(console.writes(), 0);
    assert!(console.diagnostics.lock().is_empty());
}

#[test]
fn test_concurrent_appends_keep_cap_and_order() {
    let ring_buffer = Arc::new(RingBufferSink::in_memory());
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let ring_buffer = Arc::clone(&ring_buffer);
            thread::spawn(move || {
                for n in 0..50 {
                    let record = LogRecord::new(
                        Severity::Error,
                        format!("{worker}:{n}"),
                        None,
                        Classification::Production,
                    );
                    ring_buffer.append(record).unwrap();
                    assert!(ring_buffer.len() <= RING_BUFFER_CAPACITY);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let entries = ring_buffer.list_all();
    assert_eq!(entries.len(), RING_BUFFER_CAPACITY);

    let mut last_seen = vec![None; 8];
    for entry in &entries {
        let (worker, n) = entry.message().split_once(':').unwrap();
        let worker: usize = worker.parse().unwrap();
        let n: usize = n.parse().unwrap();
        if let Some(previous) = last_seen[worker] {
            assert!(n > previous, "worker {worker} out of order");
        }
        last_seen[worker] = Some(n);
    }
}

#[test]
fn test_process_wide_dispatcher_and_macros() {
    reset_global();

    let console = Arc::new(RecordingSink::default());
    let installed = install(
        Dispatcher::builder()
            .host("192.168.1.5")
            .console_sink(as_sink(&console))
            .build(),
    )
    .unwrap();

    assert!(Arc::ptr_eq(&installed, &global()));
    assert!(matches!(
        install(Dispatcher::builder().host("localhost").build()),
        Err(LoggerError::AlreadyInitialized)
    ));

    secure_logger::secure_debug!("mounted");
    secure_logger::secure_warn!("high value", json!({ "value": 18, "patientId": "p-9" }));

    let records = console.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].level(), Severity::Debug);
    assert_eq!(records[1].data(), Some(&json!({ "value": 18, "patientId": "***" })));

    reset_global();
    let replacement = install(Dispatcher::builder().host("myhost.local").build()).unwrap();
    assert!(!Arc::ptr_eq(&installed, &replacement));
    reset_global();
}
