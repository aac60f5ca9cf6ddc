use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Storage error for key '{key}': {source}")]
    Storage {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Persisted log store under '{0}' is not a record list")]
    CorruptStore(String),

    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Invalid severity: {0}")]
    InvalidSeverity(String),

    #[error("Invalid redaction pattern '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("No platform data directory available")]
    NoDataDirectory,

    #[error("Process-wide dispatcher already initialized")]
    AlreadyInitialized,
}

impl From<figment::Error> for LoggerError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, LoggerError>;
