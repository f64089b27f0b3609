use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::level::Loglevel;

/// A single log record emitted somewhere in the simulation pipeline and
/// forwarded to the host's configured sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// The message text, without any metadata rendered into it.
    pub message: String,
    /// Name of the logger that produced the message, usually the display
    /// name of a plugin.
    pub logger: String,
    pub level: Loglevel,
    /// Logical source of the message. Its significance depends on the
    /// language of the producing plugin (crate/module path for Rust,
    /// module for scripts); it may be absent.
    pub module: Option<String>,
    /// Source filename, if known.
    pub file: Option<String>,
    /// Line number within `file`, if known.
    pub line: Option<u32>,
    pub timestamp: DateTime<Utc>,
    /// Process id of the generating process.
    pub process: u32,
    /// Thread id of the generating thread.
    pub thread: u64,
}

impl LogRecord {
    /// Stamps the current time and process id; source fields start empty.
    pub fn new(message: impl Into<String>, logger: impl Into<String>, level: Loglevel) -> Self {
        LogRecord {
            message: message.into(),
            logger: logger.into(),
            level,
            module: None,
            file: None,
            line: None,
            timestamp: Utc::now(),
            process: std::process::id(),
            thread: 0,
        }
    }

    pub fn with_location(
        mut self,
        module: impl Into<String>,
        file: impl Into<String>,
        line: u32,
    ) -> Self {
        self.module = Some(module.into());
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// Nanoseconds since the Unix epoch. Saturates at the chrono range
    /// limits rather than panicking.
    pub fn timestamp_nanos(&self) -> i64 {
        self.timestamp.timestamp_nanos_opt().unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_fills_ambient_fields() {
        let record = LogRecord::new("ping", "front", Loglevel::Info);
        assert_eq!(record.message, "ping");
        assert_eq!(record.logger, "front");
        assert_eq!(record.process, std::process::id());
        assert!(record.module.is_none());
        assert!(record.timestamp_nanos() > 0);
    }

    #[test]
    fn location_is_attached() {
        let record = LogRecord::new("x", "back", Loglevel::Debug).with_location(
            "backend::kernel",
            "kernel.rs",
            42,
        );
        assert_eq!(record.module.as_deref(), Some("backend::kernel"));
        assert_eq!(record.file.as_deref(), Some("kernel.rs"));
        assert_eq!(record.line, Some(42));
    }
}
