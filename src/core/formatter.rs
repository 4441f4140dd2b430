//! JSON rendering of log entries
//!
//! Every event shipped to a log stream is one single-line JSON object holding
//! the entry's structured fields plus three reserved keys:
//!
//! - `level`: lowercase level name
//! - `msg`: the message text
//! - `time`: RFC 3339 timestamp in UTC
//!
//! A structured field named like a reserved key is kept under `fields.<key>`
//! instead of being overwritten. If the entry already has a field with that
//! name, `fields.` is prepended again until the key is free, so no field value
//! is ever dropped.

use super::{error::Result, log_entry::LogEntry};
use chrono::SecondsFormat;
use serde_json::{Map, Value};

const LEVEL_KEY: &str = "level";
const MESSAGE_KEY: &str = "msg";
const TIME_KEY: &str = "time";

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Build the JSON object for an entry
    pub fn to_value(&self, entry: &LogEntry) -> Value {
        let mut object = Map::new();

        // a `fields.<key>` field sorts before `<key>`, so it is already in
        // `object` when the reserved key is moved
        for (key, value) in entry.context.fields() {
            let key = match key.as_str() {
                LEVEL_KEY | MESSAGE_KEY | TIME_KEY => {
                    let mut moved = format!("fields.{}", key);
                    while object.contains_key(&moved) {
                        moved = format!("fields.{}", moved);
                    }
                    moved
                }
                _ => key.clone(),
            };
            object.insert(key, value.to_json_value());
        }

        object.insert(
            LEVEL_KEY.to_string(),
            Value::String(entry.level.as_lowercase().to_string()),
        );
        object.insert(MESSAGE_KEY.to_string(), Value::String(entry.message.clone()));
        object.insert(
            TIME_KEY.to_string(),
            Value::String(entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        Value::Object(object)
    }

    /// Render an entry as the message text of a log event
    pub fn format(&self, entry: &LogEntry) -> Result<String> {
        Ok(serde_json::to_string(&self.to_value(entry))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogContext, LogLevel};
    use chrono::{TimeZone, Utc};

    fn entry() -> LogEntry {
        LogEntry::new(LogLevel::Warn, "disk almost full")
            .with_timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap())
            .with_context(
                LogContext::new()
                    .with_field("mount", "/var")
                    .with_field("free_mb", 12),
            )
    }

    #[test]
    fn test_format_single_line() {
        let text = JsonFormatter::new().format(&entry()).unwrap();
        assert!(!text.contains('\n'));

        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["level"], "warning");
        assert_eq!(parsed["msg"], "disk almost full");
        assert_eq!(parsed["time"], "2024-05-01T12:30:00.000Z");
        assert_eq!(parsed["mount"], "/var");
        assert_eq!(parsed["free_mb"], 12);
    }

    #[test]
    fn test_reserved_keys_are_prefixed() {
        let entry = LogEntry::new(LogLevel::Info, "real message")
            .with_field("msg", "shadow")
            .with_field("level", 3);

        let value = JsonFormatter::new().to_value(&entry);
        assert_eq!(value["msg"], "real message");
        assert_eq!(value["level"], "info");
        assert_eq!(value["fields.msg"], "shadow");
        assert_eq!(value["fields.level"], 3);
    }

    #[test]
    fn test_message_with_newlines_stays_one_line() {
        let entry = LogEntry::new(LogLevel::Error, "line one\nline two");
        let text = JsonFormatter::new().format(&entry).unwrap();
        assert!(!text.contains('\n'));
        assert!(text.contains("line one\\nline two"));
    }

    #[test]
    fn test_moved_key_does_not_overwrite_existing_field() {
        let entry = LogEntry::new(LogLevel::Info, "m")
            .with_field("level", "user-level")
            .with_field("fields.level", "other");

        let value = JsonFormatter::new().to_value(&entry);
        assert_eq!(value["level"], "info");
        assert_eq!(value["fields.level"], "other");
        assert_eq!(value["fields.fields.level"], "user-level");
        assert_eq!(value.as_object().unwrap().len(), 5);
    }
}
