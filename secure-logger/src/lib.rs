//! Privacy-preserving structured logging with automatic PII redaction
//!
//! Every record passes through three stages before it reaches any output:
//!
//! 1. **Level gate**: records below the minimum severity of the resolved
//!    environment policy are dropped before anything is allocated.
//! 2. **Redaction**: values under sensitive field names are replaced with
//!    `***`, and every string (the message included) is scrubbed with the
//!    built-in content patterns.
//! 3. **Fan-out**: the record goes to the console sink and/or the
//!    remote hook, which by default is a persisted 100-entry ring buffer.
//!
//! # Environment policy
//!
//! The policy is derived once from a host identifier:
//!
//! - `localhost`, `127.0.0.1`, `::1`, `192.168.*`, `10.*`, `*.local` →
//!   **development**: everything from `DEBUG` up, console on, remote off.
//! - anything else → **production**: `ERROR` and `SECURITY` only, console
//!   off, remote on.
//!
//! # Detected Data Types
//!
//! Patterns run in this order, each over the previous output:
//!
//! - **Email Addresses**: mario.rossi@gmail.com → ***@gmail.com
//! - **Phone Numbers**: +39 333 1234567 → [PHONE_REDACTED]
//! - **Credit Cards**: Visa, Mastercard, Amex, Diners and Discover numbers → [CARD_REDACTED]
//! - **Tax Codes**: RSSMRA85T10A562S → [CF_REDACTED]
//! - **IBAN**: IT60X0542811101000000123456 → [IBAN_REDACTED]
//! - **Bearer Tokens**: eyJhbGciOi... → [TOKEN_REDACTED]
//!
//! # Example
//!
//! ```rust
//! use secure_logger::Dispatcher;
//! use serde_json::json;
//!
//! let logger = Dispatcher::builder().host("localhost").build();
//!
//! logger.info("user action", Some(json!({ "email": "a@b.com", "step": 2 })));
//! // ℹ️ [INFO] 2024-03-01T08:00:00.000Z user action {"email":"***","step":2}
//!
//! logger.error("export failed for mario.rossi@gmail.com", None);
//! // ❌ [ERROR] ... export failed for ***@gmail.com
//! ```
//!
//! # Configuration
//!
//! ```toml
//! # secure-logger.toml (or SECURE_LOGGER_* variables)
//! host = "app.example.com"
//! min_severity = "WARN"
//! sensitive_fields = ["mrn"]
//!
//! [[custom_patterns]]
//! name = "mrn"
//! pattern = "\\bMRN-\\d+\\b"
//! replacement = "MRN-[REDACTED]"
//! ```

pub mod config;
pub mod dispatcher;
pub mod environment;
pub mod error;
pub mod gate;
pub mod macros;
pub mod record;
pub mod redactor;
pub mod severity;
pub mod sink;

pub use config::*;
pub use dispatcher::{global, install, reset_global, Dispatcher, DispatcherBuilder};
pub use environment::*;
pub use error::*;
pub use gate::should_emit;
pub use record::*;
pub use redactor::*;
pub use severity::*;
pub use sink::{
    ConsoleSink, FileStore, KeyValueStore, LogSink, MemoryStore, RingBufferSink,
    DEFAULT_STORAGE_KEY, RING_BUFFER_CAPACITY,
};
