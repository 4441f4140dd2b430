//! Logging macros with `format!`-style arguments.
//!
//! Each macro evaluates to the [`Result`](crate::Result) of delivering the
//! entry, so a failed synchronous append or a pending flush failure can be
//! handled or propagated with `?`.
//!
//! # Examples
//!
//! ```
//! use logstream_hook::prelude::*;
//! use logstream_hook::info;
//!
//! let logger = Logger::new();
//!
//! info!(logger, "Server started").unwrap();
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port).unwrap();
//! ```

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use logstream_hook::prelude::*;
/// # let logger = Logger::new();
/// use logstream_hook::log;
/// log!(logger, LogLevel::Info, "Simple message").unwrap();
/// log!(logger, LogLevel::Error, "Error code: {}", 500).unwrap();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

/// Log a trace-level message.
///
/// # Examples
///
/// ```
/// # use logstream_hook::prelude::*;
/// # let logger = Logger::new();
/// # logger.set_min_level(LogLevel::Trace);
/// use logstream_hook::trace;
/// trace!(logger, "Entering function: calculate()").unwrap();
/// trace!(logger, "Variable value: {}", 42).unwrap();
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use logstream_hook::prelude::*;
/// # let logger = Logger::new();
/// use logstream_hook::debug;
/// debug!(logger, "Debug information").unwrap();
/// debug!(logger, "Counter value: {}", 10).unwrap();
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use logstream_hook::prelude::*;
/// # let logger = Logger::new();
/// use logstream_hook::info;
/// info!(logger, "Application started").unwrap();
/// info!(logger, "Processing {} items", 100).unwrap();
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use logstream_hook::prelude::*;
/// # let logger = Logger::new();
/// use logstream_hook::warn;
/// warn!(logger, "Low disk space").unwrap();
/// warn!(logger, "Retry attempt {} of {}", 3, 5).unwrap();
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use logstream_hook::prelude::*;
/// # let logger = Logger::new();
/// use logstream_hook::error;
/// error!(logger, "Failed to connect to database").unwrap();
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error").unwrap();
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
///
/// # Examples
///
/// ```
/// # use logstream_hook::prelude::*;
/// # let logger = Logger::new();
/// use logstream_hook::fatal;
/// fatal!(logger, "Critical system failure").unwrap();
/// fatal!(logger, "Unable to recover from error: {}", "disk full").unwrap();
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::backend::{LogStreamClient, MemoryLogStreams};
    use crate::core::{LogLevel, Logger};
    use crate::hooks::LogStreamHook;
    use std::sync::Arc;

    fn logger() -> (Arc<MemoryLogStreams>, Logger) {
        let backend = Arc::new(MemoryLogStreams::new());
        backend.create_log_group("app");
        let hook = LogStreamHook::builder("app", "macros")
            .build(Arc::clone(&backend) as Arc<dyn LogStreamClient>)
            .unwrap();
        let logger = Logger::builder()
            .min_level(LogLevel::Trace)
            .hook(hook)
            .build();
        (backend, logger)
    }

    fn messages(backend: &MemoryLogStreams) -> Vec<serde_json::Value> {
        backend
            .events("app", "macros")
            .iter()
            .map(|e| serde_json::from_str(&e.message).unwrap())
            .collect()
    }

    #[test]
    fn test_log_macro_formats_arguments() {
        let (backend, logger) = logger();
        log!(logger, LogLevel::Info, "Formatted: {}", 42).unwrap();

        let events = messages(&backend);
        assert_eq!(events[0]["msg"], "Formatted: 42");
        assert_eq!(events[0]["level"], "info");
    }

    #[test]
    fn test_level_macros() {
        let (backend, logger) = logger();
        trace!(logger, "t").unwrap();
        debug!(logger, "d {}", 1).unwrap();
        info!(logger, "i").unwrap();
        warn!(logger, "Retry {} of {}", 1, 3).unwrap();
        error!(logger, "e").unwrap();
        fatal!(logger, "f").unwrap();

        let levels: Vec<_> = messages(&backend)
            .iter()
            .map(|v| v["level"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            levels,
            vec!["trace", "debug", "info", "warning", "error", "fatal"]
        );
    }

    #[test]
    fn test_macro_propagates_delivery_error() {
        let (backend, logger) = logger();
        backend.fail_next_put(crate::backend::BackendError::Throttled);
        assert!(error!(logger, "lost").is_err());
    }
}
