//! The log dispatcher: gate, redact, then fan out to the active sinks.
//!
//! A [`Dispatcher`] is an ordinary value and can be built and passed around
//! explicitly with [`Dispatcher::builder`]. For call sites that want a
//! process-wide handle, [`global`] builds one from configuration on first
//! access and hands out the same instance afterwards.

use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

use crate::config::LoggerConfig;
use crate::environment::{EnvHost, EnvironmentPolicy, PolicyResolver};
use crate::error::{LoggerError, Result};
use crate::gate::should_emit;
use crate::record::{LogData, LogRecord};
use crate::redactor::Redactor;
use crate::severity::Severity;
use crate::sink::{ConsoleSink, LogSink, RingBufferSink};

lazy_static! {
    static ref GLOBAL: RwLock<Option<Arc<Dispatcher>>> = RwLock::new(None);
}

pub struct Dispatcher {
    policy: EnvironmentPolicy,
    redactor: Redactor,
    console: Arc<dyn LogSink>,
    remote: Arc<dyn LogSink>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Builds from a loaded configuration; the ring buffer is persisted in
    /// the configured store.
    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        let redactor = config.redactor()?;
        Ok(Self::assemble(config, redactor))
    }

    /// Builds from `SECURE_LOGGER_*` configuration. Configuration problems
    /// fall back to defaults instead of failing.
    pub fn from_env() -> Self {
        let config = LoggerConfig::load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Logger configuration unreadable, using defaults");
            LoggerConfig::default()
        });
        let redactor = config.redactor().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Ignoring custom redaction rules");
            Redactor::default()
        });
        Self::assemble(&config, redactor)
    }

    fn assemble(config: &LoggerConfig, redactor: Redactor) -> Self {
        let ring_buffer = RingBufferSink::open(config.store(), config.storage_key.clone());
        Self::builder()
            .resolver(config.resolver())
            .redactor(redactor)
            .remote_sink(Arc::new(ring_buffer))
            .build()
    }

    pub fn policy(&self) -> &EnvironmentPolicy {
        &self.policy
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    pub fn debug(&self, message: impl AsRef<str>, data: Option<LogData>) {
        self.log(Severity::Debug, message.as_ref(), data);
    }

    pub fn info(&self, message: impl AsRef<str>, data: Option<LogData>) {
        self.log(Severity::Info, message.as_ref(), data);
    }

    pub fn warn(&self, message: impl AsRef<str>, data: Option<LogData>) {
        self.log(Severity::Warn, message.as_ref(), data);
    }

    pub fn error(&self, message: impl AsRef<str>, data: Option<LogData>) {
        self.log(Severity::Error, message.as_ref(), data);
    }

    pub fn security(&self, message: impl AsRef<str>, data: Option<LogData>) {
        self.log(Severity::Security, message.as_ref(), data);
    }

    pub fn log(&self, level: Severity, message: &str, data: Option<LogData>) {
        if !should_emit(level, &self.policy) {
            return;
        }

        let record = self.build_record(level, message, data);

        if self.policy.console_enabled {
            // Console output is fire-and-forget.
            let _ = self.console.write(&record);
        }

        if self.policy.remote_enabled {
            if let Err(err) = self.remote.write(&record) {
                self.report_sink_failure(self.remote.name(), &err);
            }
        }
    }

    fn build_record(&self, level: Severity, message: &str, data: Option<LogData>) -> LogRecord {
        let (message, data) = if self.policy.sanitize_enabled {
            (
                self.redactor.sanitize_str(message),
                data.map(|data| self.redactor.sanitize(&data)),
            )
        } else {
            (message.to_string(), data)
        };

        LogRecord::new(level, message, data, self.policy.classification)
    }

    fn report_sink_failure(&self, sink: &str, err: &LoggerError) {
        if self.policy.console_enabled {
            self.console.diagnostic(&format!("{sink}: {err}"));
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("policy", &self.policy)
            .field("console", &self.console.name())
            .field("remote", &self.remote.name())
            .finish()
    }
}

/// Assembles a [`Dispatcher`]. Anything left unset gets the default: policy
/// from `SECURE_LOGGER_HOST`, the built-in redactor, standard streams for the
/// console and an in-memory ring buffer for the remote hook.
#[derive(Default)]
pub struct DispatcherBuilder {
    resolver: Option<PolicyResolver>,
    redactor: Option<Redactor>,
    console: Option<Arc<dyn LogSink>>,
    remote: Option<Arc<dyn LogSink>>,
}

impl DispatcherBuilder {
    pub fn resolver(mut self, resolver: PolicyResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn host(self, host: impl Into<String>) -> Self {
        self.resolver(PolicyResolver::for_host(host))
    }

    pub fn redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = Some(redactor);
        self
    }

    pub fn console_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.console = Some(sink);
        self
    }

    /// Destination for records when remote logging is enabled.
    pub fn remote_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.remote = Some(sink);
        self
    }

    pub fn build(self) -> Dispatcher {
        let resolver = self
            .resolver
            .unwrap_or_else(|| PolicyResolver::new(EnvHost::default()));
        let policy = resolver.resolve().clone();

        if policy.is_development() {
            tracing::info!(
                min_level = %policy.min_severity,
                console = policy.console_enabled,
                remote = policy.remote_enabled,
                "Secure logger initialized"
            );
        }

        Dispatcher {
            policy,
            redactor: self.redactor.unwrap_or_default(),
            console: self.console.unwrap_or_else(|| Arc::new(ConsoleSink::stdio())),
            remote: self.remote.unwrap_or_else(|| Arc::new(RingBufferSink::in_memory())),
        }
    }
}

/// The process-wide dispatcher, built from the environment on first access.
pub fn global() -> Arc<Dispatcher> {
    global_with(Dispatcher::from_env)
}

/// Builds with `build` while no lock is held; the first instance stored wins.
fn global_with(build: impl FnOnce() -> Dispatcher) -> Arc<Dispatcher> {
    if let Some(dispatcher) = GLOBAL.read().as_ref() {
        return Arc::clone(dispatcher);
    }

    let candidate = Arc::new(build());

    let mut slot = GLOBAL.write();
    // Another thread, or `build` itself, may have stored one meanwhile.
    Arc::clone(slot.get_or_insert(candidate))
}

/// Installs an explicitly built dispatcher as the process-wide one. Fails if
/// one has already been built.
pub fn install(dispatcher: Dispatcher) -> Result<Arc<Dispatcher>> {
    let mut slot = GLOBAL.write();
    if slot.is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }
    let dispatcher = Arc::new(dispatcher);
    *slot = Some(Arc::clone(&dispatcher));
    Ok(dispatcher)
}

/// Drops the process-wide dispatcher. Test isolation only.
#[doc(hidden)]
pub fn reset_global() {
    GLOBAL.write().take();
}
