//! Log entry structure

use super::log_context::LogContext;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One event as produced by the logging framework and handed to hooks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub context: LogContext,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
            context: LogContext::new(),
        }
    }

    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Add a single structured field
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<super::log_context::FieldValue>,
    {
        self.context.add_field(key, value);
        self
    }

    /// Milliseconds since the Unix epoch, as the backend expects them
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_millis() {
        let ts = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let entry = LogEntry::new(LogLevel::Info, "hello").with_timestamp(ts);
        assert_eq!(entry.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_with_field() {
        let entry = LogEntry::new(LogLevel::Warn, "disk")
            .with_field("free_mb", 12)
            .with_field("mount", "/var");
        assert_eq!(entry.context.fields().len(), 2);
    }
}
