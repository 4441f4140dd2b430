//! Error types for the log stream hook

use crate::backend::BackendError;

pub type Result<T> = std::result::Result<T, HookError>;

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// The describe or create call made while building the hook failed
    #[error("Failed to set up log stream '{log_group}/{log_stream}': {source}")]
    Construction {
        log_group: String,
        log_stream: String,
        #[source]
        source: BackendError,
    },

    /// A synchronous append was rejected by the backend
    #[error("Append failed: {source}")]
    Append {
        #[source]
        source: BackendError,
    },

    /// A background flush failed.
    ///
    /// This is reported to whichever producer call reads the failure channel
    /// next, which is usually not the call whose event was in the failed batch.
    /// `event_count` is the batch size when the attempt started. Events not
    /// yet appended stay pending and are retried on the next tick; appends
    /// that succeeded earlier in the same attempt are not repeated.
    #[error("Flush of batch #{batch_id} ({event_count} events) failed: {source}")]
    FlushFailed {
        batch_id: u64,
        event_count: usize,
        #[source]
        source: BackendError,
    },

    /// Queue full with buffer details
    #[error("Log queue full: {current}/{max} events buffered")]
    QueueFull { current: usize, max: usize },

    /// The hook was shut down and no longer accepts events
    #[error("Hook already stopped")]
    HookStopped,

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl HookError {
    /// Create a construction error for the given stream
    pub fn construction(
        log_group: impl Into<String>,
        log_stream: impl Into<String>,
        source: BackendError,
    ) -> Self {
        HookError::Construction {
            log_group: log_group.into(),
            log_stream: log_stream.into(),
            source,
        }
    }

    /// Wrap a backend failure from a synchronous append
    pub fn append(source: BackendError) -> Self {
        HookError::Append { source }
    }

    /// Create a queue full error with buffer details
    pub fn queue_full(current: usize, max: usize) -> Self {
        HookError::QueueFull { current, max }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        HookError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        HookError::Other(msg.into())
    }

    /// The backend failure behind this error, if there is one
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            HookError::Construction { source, .. }
            | HookError::Append { source }
            | HookError::FlushFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
