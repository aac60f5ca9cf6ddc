use parking_lot::Mutex;
use std::io::{self, Write};

use super::LogSink;
use crate::error::{LoggerError, Result};
use crate::record::LogRecord;
use crate::severity::Severity;

type Writer = Mutex<Box<dyn Write + Send>>;

/// Operator-visible console output.
///
/// `ERROR` and `WARN` lines go to the error stream, everything else to the
/// output stream.
pub struct ConsoleSink {
    out: Writer,
    err: Writer,
}

impl ConsoleSink {
    pub fn stdio() -> Self {
        Self::with_writers(io::stdout(), io::stderr())
    }

    pub fn with_writers(out: impl Write + Send + 'static, err: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
            err: Mutex::new(Box::new(err)),
        }
    }

    pub fn format_line(record: &LogRecord) -> String {
        let level = record.level();
        let mut line = format!(
            "{} [{}] {} {}",
            level.icon(),
            level,
            record.timestamp_iso(),
            record.message()
        );
        if let Some(data) = record.data() {
            line.push(' ');
            line.push_str(&data.to_string());
        }
        line
    }

    fn stream_for(&self, level: Severity) -> &Writer {
        match level {
            Severity::Error | Severity::Warn => &self.err,
            Severity::Debug | Severity::Info | Severity::Security => &self.out,
        }
    }

    fn emit(writer: &Writer, line: &str) -> io::Result<()> {
        let mut writer = writer.lock();
        writeln!(writer, "{line}")?;
        writer.flush()
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::stdio()
    }
}

impl LogSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let line = Self::format_line(record);
        Self::emit(self.stream_for(record.level()), &line).map_err(|source| LoggerError::Storage {
            key: self.name().to_string(),
            source,
        })
    }

    fn diagnostic(&self, message: &str) {
        let _ = Self::emit(&self.err, &format!("❌ Failed to save log: {message}"));
    }
}
