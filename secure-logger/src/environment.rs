//! Runtime environment classification and the logging policy derived from it.
//!
//! Classification is purely syntactic on a host identifier (the hostname part
//! of the authority the service is reached under). Anything unrecognised is
//! treated as production, which is the stricter, quieter policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use crate::severity::Severity;

const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1"];
const PRIVATE_PREFIXES: &[&str] = &["192.168.", "10."];
const LOCAL_SUFFIX: &str = ".local";

pub const DEFAULT_HOST_VAR: &str = "SECURE_LOGGER_HOST";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Development,
    Production,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify(host: &str) -> Classification {
    if LOOPBACK_HOSTS.contains(&host)
        || PRIVATE_PREFIXES.iter().any(|prefix| host.starts_with(prefix))
        || host.ends_with(LOCAL_SUFFIX)
    {
        Classification::Development
    } else {
        Classification::Production
    }
}

/// Supplies the host identifier used for classification.
pub trait HostSource: Send + Sync {
    fn host(&self) -> String;
}

impl HostSource for Box<dyn HostSource> {
    fn host(&self) -> String {
        self.as_ref().host()
    }
}

/// Fixed host identifier.
#[derive(Debug, Clone)]
pub struct StaticHost(pub String);

impl StaticHost {
    pub fn new(host: impl Into<String>) -> Self {
        Self(host.into())
    }
}

impl HostSource for StaticHost {
    fn host(&self) -> String {
        self.0.clone()
    }
}

/// Reads the host identifier from an environment variable; unset reads as empty.
#[derive(Debug, Clone)]
pub struct EnvHost {
    var: String,
}

impl EnvHost {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvHost {
    fn default() -> Self {
        Self::new(DEFAULT_HOST_VAR)
    }
}

impl HostSource for EnvHost {
    fn host(&self) -> String {
        std::env::var(&self.var).unwrap_or_default()
    }
}

/// Explicit overrides of the derived policy; `None` keeps the derived value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOverrides {
    pub min_severity: Option<Severity>,
    pub console: Option<bool>,
    pub remote: Option<bool>,
    pub sanitize: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentPolicy {
    pub classification: Classification,
    pub min_severity: Severity,
    pub console_enabled: bool,
    pub remote_enabled: bool,
    pub sanitize_enabled: bool,
    pub analytics_enabled: bool,
    pub cache_lifetime: Duration,
    pub host: String,
    pub detected_at: DateTime<Utc>,
}

impl EnvironmentPolicy {
    pub fn for_classification(classification: Classification, host: impl Into<String>) -> Self {
        let (min_severity, console_enabled, remote_enabled, cache_ms) = match classification {
            Classification::Development => (Severity::Debug, true, false, 60_000),
            Classification::Production => (Severity::Error, false, true, 300_000),
        };

        Self {
            classification,
            min_severity,
            console_enabled,
            remote_enabled,
            sanitize_enabled: true,
            analytics_enabled: classification == Classification::Production,
            cache_lifetime: Duration::from_millis(cache_ms),
            host: host.into(),
            detected_at: Utc::now(),
        }
    }

    pub fn from_host(host: &str) -> Self {
        Self::for_classification(classify(host), host)
    }

    pub fn with_overrides(mut self, overrides: &PolicyOverrides) -> Self {
        if let Some(level) = overrides.min_severity {
            self.min_severity = level;
        }
        if let Some(console) = overrides.console {
            self.console_enabled = console;
        }
        if let Some(remote) = overrides.remote {
            self.remote_enabled = remote;
        }
        if let Some(sanitize) = overrides.sanitize {
            self.sanitize_enabled = sanitize;
        }
        self
    }

    pub fn is_development(&self) -> bool {
        self.classification == Classification::Development
    }

    pub fn is_production(&self) -> bool {
        self.classification == Classification::Production
    }

    /// Console output doubles as the debug mode switch.
    pub fn debug_mode(&self) -> bool {
        self.console_enabled
    }

    /// Operator-facing key/value table of the resolved environment.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Environment", self.classification.to_string()),
            ("Hostname", self.host.clone()),
            ("Remote Logging", self.remote_enabled.to_string()),
            ("Analytics", self.analytics_enabled.to_string()),
            ("Debug Mode", self.debug_mode().to_string()),
            ("Cache TTL", format!("{}s", self.cache_lifetime.as_secs())),
        ]
    }
}

/// Memoizing policy resolver: the host source is consulted on the first
/// [`resolve`](Self::resolve) only.
pub struct PolicyResolver {
    source: Box<dyn HostSource>,
    overrides: PolicyOverrides,
    cached: OnceLock<EnvironmentPolicy>,
}

impl PolicyResolver {
    pub fn new(source: impl HostSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            overrides: PolicyOverrides::default(),
            cached: OnceLock::new(),
        }
    }

    pub fn for_host(host: impl Into<String>) -> Self {
        Self::new(StaticHost::new(host))
    }

    pub fn with_overrides(mut self, overrides: PolicyOverrides) -> Self {
        self.overrides = overrides;
        self.cached = OnceLock::new();
        self
    }

    pub fn resolve(&self) -> &EnvironmentPolicy {
        self.cached.get_or_init(|| {
            let host = self.source.host();
            let policy = EnvironmentPolicy::from_host(&host).with_overrides(&self.overrides);

            if policy.is_development() {
                tracing::info!(
                    host = %policy.host,
                    environment = %policy.classification,
                    remote_logging = policy.remote_enabled,
                    debug_mode = policy.debug_mode(),
                    "Environment detected"
                );
            } else {
                tracing::debug!(environment = %policy.classification, "Environment detected");
            }

            policy
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.cached.get().is_some()
    }

    /// Forgets the cached policy so the next `resolve` detects again.
    pub fn reset(&mut self) {
        self.cached.take();
    }
}

impl fmt::Debug for PolicyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyResolver")
            .field("overrides", &self.overrides)
            .field("cached", &self.cached.get())
            .finish()
    }
}
