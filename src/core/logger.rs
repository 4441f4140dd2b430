//! Minimal logger dispatching entries to hooks

use super::{
    error::Result, hook::Hook, log_context::LogContext, log_entry::LogEntry,
    log_level::LogLevel,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Producer side of the logging pipeline
///
/// Every entry at or above the minimum level is fired at each hook whose
/// [`Hook::levels`] include the entry's level. All matching hooks are fired
/// even when one fails; the first failure is returned.
pub struct Logger {
    min_level: RwLock<LogLevel>,
    hooks: RwLock<Vec<Arc<dyn Hook>>>,
    /// Fields attached to every entry unless the entry sets the key itself
    fields: LogContext,
}

impl Logger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_level: RwLock::new(LogLevel::Info),
            hooks: RwLock::new(Vec::new()),
            fields: LogContext::new(),
        }
    }

    pub fn add_hook(&self, hook: Arc<dyn Hook>) {
        debug!(hook = hook.name(), "hook registered");
        self.hooks.write().push(hook);
    }

    pub fn set_min_level(&self, level: LogLevel) {
        *self.min_level.write() = level;
    }

    pub fn min_level(&self) -> LogLevel {
        *self.min_level.read()
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.read().len()
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) -> Result<()> {
        self.log_with_context(level, message, LogContext::new())
    }

    /// Log with structured context fields
    pub fn log_with_context(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        context: LogContext,
    ) -> Result<()> {
        if level < self.min_level() {
            return Ok(());
        }
        self.fire(&LogEntry::new(level, message).with_context(context))
    }

    /// Fire a fully built entry, skipping the minimum level check
    pub fn fire(&self, entry: &LogEntry) -> Result<()> {
        let entry = if self.fields.is_empty() {
            entry.clone()
        } else {
            let mut entry = entry.clone();
            entry.context.merge_missing(&self.fields);
            entry
        };

        let hooks = self.hooks.read();
        let mut first_error = None;
        for hook in hooks.iter().filter(|h| h.accepts(entry.level)) {
            if let Err(e) = hook.fire(&entry) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Flush every hook, returning the first failure
    pub fn flush(&self) -> Result<()> {
        let hooks = self.hooks.read();
        let mut first_error = None;
        for hook in hooks.iter() {
            if let Err(e) = hook.flush() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) -> Result<()> {
        self.log(LogLevel::Trace, message)
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) -> Result<()> {
        self.log(LogLevel::Debug, message)
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) -> Result<()> {
        self.log(LogLevel::Info, message)
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) -> Result<()> {
        self.log(LogLevel::Warn, message)
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) -> Result<()> {
        self.log(LogLevel::Error, message)
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) -> Result<()> {
        self.log(LogLevel::Fatal, message)
    }

    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use logstream_hook::backend::{LogStreamClient, MemoryLogStreams};
/// use logstream_hook::prelude::*;
/// use std::sync::Arc;
///
/// let backend = Arc::new(MemoryLogStreams::new());
/// backend.create_log_group("app");
/// let hook = LogStreamHook::builder("app", "web-1")
///     .build(backend as Arc<dyn LogStreamClient>)
///     .unwrap();
///
/// let logger = Logger::builder()
///     .min_level(LogLevel::Debug)
///     .field("service", "web")
///     .hook(hook)
///     .build();
///
/// logger.info("ready").unwrap();
/// ```
pub struct LoggerBuilder {
    min_level: LogLevel,
    hooks: Vec<Arc<dyn Hook>>,
    fields: LogContext,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            hooks: Vec::new(),
            fields: LogContext::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn hook<H: Hook + 'static>(mut self, hook: H) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Add a hook the caller keeps a handle to
    #[must_use = "builder methods return a new value"]
    pub fn shared_hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Attach a field to every entry
    #[must_use = "builder methods return a new value"]
    pub fn field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<super::log_context::FieldValue>,
    {
        self.fields.add_field(key, value);
        self
    }

    pub fn build(self) -> Logger {
        Logger {
            min_level: RwLock::new(self.min_level),
            hooks: RwLock::new(self.hooks),
            fields: self.fields,
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
