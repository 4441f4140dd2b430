//! Core logging types and the hook trait

pub mod error;
pub mod formatter;
pub mod hook;
pub mod log_context;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod overflow_policy;

pub use error::{HookError, Result};
pub use formatter::JsonFormatter;
pub use hook::Hook;
pub use log_context::{FieldValue, LogContext};
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder};
pub use metrics::HookMetrics;
pub use overflow_policy::OverflowPolicy;
