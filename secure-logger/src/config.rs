// Logger configuration
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::environment::{EnvHost, HostSource, PolicyOverrides, PolicyResolver, StaticHost};
use crate::error::Result;
use crate::redactor::{RedactionPattern, Redactor};
use crate::severity::Severity;
use crate::sink::{FileStore, KeyValueStore, MemoryStore, DEFAULT_STORAGE_KEY};

pub const ENV_PREFIX: &str = "SECURE_LOGGER_";
pub const CONFIG_PATH_VAR: &str = "SECURE_LOGGER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "secure-logger.toml";

/// Extra content pattern declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub name: String,
    pub pattern: String,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub host: Option<String>,
    pub min_severity: Option<Severity>,
    pub console: Option<bool>,
    pub remote: Option<bool>,
    pub sanitize: Option<bool>,
    pub storage_dir: Option<PathBuf>,
    pub storage_key: String,
    pub sensitive_fields: Vec<String>,
    pub custom_patterns: Vec<PatternConfig>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            host: None,
            min_severity: None,
            console: None,
            remote: None,
            sanitize: None,
            storage_dir: None,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            sensitive_fields: Vec::new(),
            custom_patterns: Vec::new(),
        }
    }
}

impl LoggerConfig {
    /// Defaults, then the TOML file named by `SECURE_LOGGER_CONFIG`
    /// (or `secure-logger.toml`), then `SECURE_LOGGER_*` variables.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::figment(path.as_ref()).extract()?)
    }

    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]))
    }

    pub fn overrides(&self) -> PolicyOverrides {
        PolicyOverrides {
            min_severity: self.min_severity,
            console: self.console,
            remote: self.remote,
            sanitize: self.sanitize,
        }
    }

    pub fn host_source(&self) -> Box<dyn HostSource> {
        match &self.host {
            Some(host) => Box::new(StaticHost::new(host.clone())),
            None => Box::new(EnvHost::default()),
        }
    }

    pub fn resolver(&self) -> PolicyResolver {
        PolicyResolver::new(self.host_source()).with_overrides(self.overrides())
    }

    /// Built-in redactor extended with the configured fields and patterns.
    pub fn redactor(&self) -> Result<Redactor> {
        let mut redactor = Redactor::default();
        for field in &self.sensitive_fields {
            redactor = redactor.with_field(field.clone());
        }
        for custom in &self.custom_patterns {
            let pattern = RedactionPattern::new(&custom.name, &custom.pattern, &custom.replacement)?;
            redactor = redactor.with_pattern(pattern);
        }
        Ok(redactor)
    }

    /// The persisted scope for the ring buffer, falling back to memory when
    /// no directory can be used.
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        let opened = match &self.storage_dir {
            Some(dir) => FileStore::new(dir.clone()),
            None => FileStore::open_default(),
        };

        match opened {
            Ok(store) => Arc::new(store),
            Err(err) => {
                tracing::warn!(error = %err, "Log store unavailable, keeping records in memory");
                Arc::new(MemoryStore::new())
            }
        }
    }
}
