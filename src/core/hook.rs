//! Hook trait for log event consumers

use super::{error::Result, log_entry::LogEntry, log_level::LogLevel};

/// A consumer that the logging framework invokes once per log event.
///
/// Hooks are shared between every thread that logs, so all methods take
/// `&self`; implementations synchronize internally.
pub trait Hook: Send + Sync {
    /// Deliver one entry, or report why delivery failed
    fn fire(&self, entry: &LogEntry) -> Result<()>;

    /// Levels this hook wants to receive
    fn levels(&self) -> &[LogLevel];

    /// Push out anything the hook is holding back
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;

    /// Whether `level` is one of [`Hook::levels`]
    fn accepts(&self, level: LogLevel) -> bool {
        self.levels().contains(&level)
    }
}
