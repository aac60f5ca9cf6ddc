use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::environment::Classification;
use crate::severity::Severity;

/// Arbitrary structured payload attached to a record.
pub type LogData = Value;

/// A finalized, already-redacted log record.
///
/// Records are built by the dispatcher and handed to sinks by shared
/// reference; there is no way to mutate one after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(with = "iso_millis")]
    timestamp: DateTime<Utc>,
    level: Severity,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<LogData>,
    environment: Classification,
}

impl LogRecord {
    pub fn new(
        level: Severity,
        message: impl Into<String>,
        data: Option<LogData>,
        environment: Classification,
    ) -> Self {
        Self::at(Utc::now(), level, message, data, environment)
    }

    pub fn at(
        timestamp: DateTime<Utc>,
        level: Severity,
        message: impl Into<String>,
        data: Option<LogData>,
        environment: Classification,
    ) -> Self {
        // Persisted and console timestamps carry milliseconds only.
        Self {
            timestamp: timestamp.trunc_subsecs(3),
            level,
            message: message.into(),
            data,
            environment,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// ISO-8601 with millisecond precision and a `Z` suffix.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn level(&self) -> Severity {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&LogData> {
        self.data.as_ref()
    }

    pub fn environment(&self) -> Classification {
        self.environment
    }
}

mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|timestamp| timestamp.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}
