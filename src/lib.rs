//! # logstream_hook
//!
//! A logging hook that ships entries to a remote log stream whose appends
//! are gated by a sequence token.
//!
//! ## Features
//!
//! - **Synchronous or batched**: append every entry as it is logged, or queue
//!   entries and flush them on a fixed interval from a background worker
//! - **Token chaining**: each append presents the token returned by the
//!   previous one; a failed append leaves the token untouched
//! - **Bounded queue**: configurable overflow policy, nothing is silently dropped
//! - **Pluggable backend**: any [`backend::LogStreamClient`]; an in-memory
//!   implementation is included
//!
//! ## Example
//!
//! ```
//! use logstream_hook::backend::{LogStreamClient, MemoryLogStreams};
//! use logstream_hook::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let backend = Arc::new(MemoryLogStreams::new());
//! backend.create_log_group("app");
//!
//! let hook = LogStreamHook::builder("app", "web-1")
//!     .batch_interval(Duration::from_millis(100))
//!     .build(Arc::clone(&backend) as Arc<dyn LogStreamClient>)
//!     .unwrap();
//! let hook = Arc::new(hook);
//!
//! let logger = Logger::builder().shared_hook(hook.clone()).build();
//! logger.info("queued").unwrap();
//!
//! hook.shutdown(Duration::from_secs(1)).unwrap();
//! assert_eq!(backend.events("app", "web-1").len(), 1);
//! ```

pub mod backend;
pub mod core;
pub mod hooks;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        FieldValue, Hook, HookError, HookMetrics, JsonFormatter, LogContext, LogEntry, LogLevel,
        Logger, LoggerBuilder, OverflowPolicy, Result,
    };
    pub use crate::hooks::{FlushFailure, HookBuilder, HookConfig, LogStreamHook};
}

pub use backend::{BackendError, LogStreamClient, MemoryLogStreams, SequenceToken};
pub use core::{
    FieldValue, Hook, HookError, HookMetrics, JsonFormatter, LogContext, LogEntry, LogLevel,
    Logger, LoggerBuilder, OverflowPolicy, Result,
};
pub use hooks::{
    FlushFailure, HookBuilder, HookConfig, LogStreamHook, DEFAULT_SHUTDOWN_TIMEOUT,
};
