//! Hooks that ship log entries to a log-stream backend

pub mod config;
pub mod failure_channel;
mod flush_loop;
pub mod log_stream;
mod sync_delivery;

pub use config::{
    HookConfig, DEFAULT_FAILURE_SLOTS, DEFAULT_QUEUE_CAPACITY, DEFAULT_REQUEST_TIMEOUT,
};
pub use failure_channel::FlushFailure;
pub use log_stream::{HookBuilder, LogStreamHook, DEFAULT_SHUTDOWN_TIMEOUT};
