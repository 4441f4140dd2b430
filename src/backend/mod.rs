//! Remote log stream backend boundary
//!
//! A log stream is an append-only sequence of events inside a log group.
//! Writes are gated by a sequence token: every append must present the token
//! returned by the previous successful append (or no token for a stream that
//! has never been written), and every successful append hands back the token
//! for the next one.

pub mod memory;

pub use memory::MemoryLogStreams;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Maximum number of events accepted in one append request
pub const MAX_BATCH_EVENTS: usize = 10_000;

/// Maximum size of one append request, in bytes
pub const MAX_BATCH_BYTES: usize = 1_048_576;

/// Per-event overhead counted against [`MAX_BATCH_BYTES`]
pub const EVENT_OVERHEAD_BYTES: usize = 26;

/// Opaque token required to append to a stream in order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceToken(String);

impl SequenceToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SequenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SequenceToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// One timestamped message as stored in a stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLogEvent {
    pub message: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl InputLogEvent {
    pub fn new(message: impl Into<String>, timestamp: i64) -> Self {
        Self {
            message: message.into(),
            timestamp,
        }
    }

    /// Bytes this event counts for against [`MAX_BATCH_BYTES`]
    pub fn size_bytes(&self) -> usize {
        self.message.len() + EVENT_OVERHEAD_BYTES
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutLogEventsRequest {
    pub log_group: String,
    pub log_stream: String,
    /// `None` only for the first write to a stream
    pub sequence_token: Option<SequenceToken>,
    pub events: Vec<InputLogEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutLogEventsResponse {
    pub next_sequence_token: Option<SequenceToken>,
}

/// What a describe call reports about one stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStreamDescription {
    pub log_stream: String,
    /// `None` until the stream has received its first event
    pub upload_sequence_token: Option<SequenceToken>,
}

/// Failures reported by a [`LogStreamClient`]
///
/// The hook treats all of them as opaque: none gets special-case recovery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Resource not found: {resource}")]
    ResourceNotFound { resource: String },

    #[error("Resource already exists: {resource}")]
    ResourceAlreadyExists { resource: String },

    #[error("Invalid sequence token, expected {}", token_or_none(.expected))]
    InvalidSequenceToken { expected: Option<SequenceToken> },

    #[error("Data already accepted, next token {}", token_or_none(.next))]
    DataAlreadyAccepted { next: Option<SequenceToken> },

    #[error("Request throttled by the backend")]
    Throttled,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        BackendError::ResourceNotFound {
            resource: resource.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        BackendError::InvalidParameter(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        BackendError::Unavailable(message.into())
    }
}

fn token_or_none(token: &Option<SequenceToken>) -> &str {
    token.as_ref().map(SequenceToken::as_str).unwrap_or("none")
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Capability to talk to a remote log stream service.
///
/// Implementations own transport, credentials and sessions. Every call gets
/// the hook's `timeout` and must give up with [`BackendError::Timeout`] once
/// it has elapsed; the hook never waits on a backend call without bound.
pub trait LogStreamClient: Send + Sync {
    /// List the streams of `log_group` whose names start with `prefix`
    fn describe_log_streams(
        &self,
        log_group: &str,
        prefix: &str,
        timeout: Duration,
    ) -> BackendResult<Vec<LogStreamDescription>>;

    /// Create an empty stream; it starts without a sequence token
    fn create_log_stream(
        &self,
        log_group: &str,
        log_stream: &str,
        timeout: Duration,
    ) -> BackendResult<()>;

    /// Append a batch of events, in order, under the request's sequence token
    fn put_log_events(
        &self,
        request: &PutLogEventsRequest,
        timeout: Duration,
    ) -> BackendResult<PutLogEventsResponse>;
}

/// Split `events` into request-sized chunks, preserving order
///
/// Each chunk holds at most [`MAX_BATCH_EVENTS`] events and at most
/// [`MAX_BATCH_BYTES`] bytes, except that an event larger than the byte limit
/// on its own still gets a chunk of its own (the backend will reject it).
pub fn chunk_ranges(events: &[InputLogEvent]) -> Vec<std::ops::Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    let mut bytes = 0;

    for (idx, event) in events.iter().enumerate() {
        let size = event.size_bytes();
        let count = idx - start;
        if count > 0 && (count >= MAX_BATCH_EVENTS || bytes + size > MAX_BATCH_BYTES) {
            ranges.push(start..idx);
            start = idx;
            bytes = 0;
        }
        bytes += size;
    }

    if start < events.len() {
        ranges.push(start..events.len());
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_bytes_counts_overhead() {
        let event = InputLogEvent::new("abcd", 0);
        assert_eq!(event.size_bytes(), 4 + EVENT_OVERHEAD_BYTES);
    }

    #[test]
    fn test_chunk_ranges_small_batch_is_one_chunk() {
        let events: Vec<_> = (0..10).map(|i| InputLogEvent::new("m", i)).collect();
        assert_eq!(chunk_ranges(&events), vec![0..10]);
        assert!(chunk_ranges(&[]).is_empty());
    }

    #[test]
    fn test_chunk_ranges_by_count() {
        let events: Vec<_> = (0..MAX_BATCH_EVENTS + 5)
            .map(|i| InputLogEvent::new("m", i as i64))
            .collect();
        assert_eq!(
            chunk_ranges(&events),
            vec![0..MAX_BATCH_EVENTS, MAX_BATCH_EVENTS..MAX_BATCH_EVENTS + 5]
        );
    }

    #[test]
    fn test_chunk_ranges_by_bytes() {
        let half = "x".repeat(MAX_BATCH_BYTES / 2);
        let events = vec![
            InputLogEvent::new(half.clone(), 1),
            InputLogEvent::new(half.clone(), 2),
            InputLogEvent::new(half, 3),
        ];
        // two halves plus overhead exceed the limit, so each event stands alone
        assert_eq!(chunk_ranges(&events), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::InvalidSequenceToken {
            expected: Some(SequenceToken::new("42")),
        };
        assert_eq!(err.to_string(), "Invalid sequence token, expected 42");

        let err = BackendError::InvalidSequenceToken { expected: None };
        assert_eq!(err.to_string(), "Invalid sequence token, expected none");
    }
}
