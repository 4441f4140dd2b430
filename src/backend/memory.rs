//! In-process log stream backend
//!
//! Keeps log groups and streams in memory and enforces the same append
//! protocol as a remote service: groups and streams must exist, batches must
//! be non-empty and every append must present the stream's current sequence
//! token. Failures and latency can be injected, and every append request is
//! recorded so callers can inspect exactly what was sent.

use super::{
    BackendError, BackendResult, InputLogEvent, LogStreamClient, LogStreamDescription,
    PutLogEventsRequest, PutLogEventsResponse, SequenceToken,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::thread;
use std::time::Duration;

#[derive(Debug, Default)]
struct StreamState {
    events: Vec<InputLogEvent>,
    token: Option<SequenceToken>,
}

#[derive(Debug, Default)]
struct State {
    groups: HashMap<String, BTreeMap<String, StreamState>>,
    requests: Vec<PutLogEventsRequest>,
    injected_failures: VecDeque<Option<BackendError>>,
    latency: Duration,
    tokens_issued: u64,
}

/// Thread-safe in-memory [`LogStreamClient`]
///
/// # Example
///
/// ```
/// use logstream_hook::backend::{LogStreamClient, MemoryLogStreams};
/// use std::time::Duration;
///
/// let backend = MemoryLogStreams::new();
/// backend.create_log_group("app");
/// backend
///     .create_log_stream("app", "web-1", Duration::from_secs(1))
///     .unwrap();
///
/// assert!(backend.upload_token("app", "web-1").is_none());
/// ```
#[derive(Debug, Default)]
pub struct MemoryLogStreams {
    state: Mutex<State>,
}

impl MemoryLogStreams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log group; creating an existing group is a no-op
    pub fn create_log_group(&self, log_group: &str) {
        self.state
            .lock()
            .groups
            .entry(log_group.to_string())
            .or_default();
    }

    /// Make the next append fail with `error` instead of reaching the stream
    ///
    /// Scripted outcomes queue up and are consumed one per append, oldest
    /// first.
    pub fn fail_next_put(&self, error: BackendError) {
        self.state.lock().injected_failures.push_back(Some(error));
    }

    /// Let the next append through untouched, ahead of queued failures
    pub fn pass_next_put(&self) {
        self.state.lock().injected_failures.push_back(None);
    }

    /// Delay every call by `latency`; calls whose timeout is shorter fail
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// Events stored in a stream, in append order
    pub fn events(&self, log_group: &str, log_stream: &str) -> Vec<InputLogEvent> {
        self.state
            .lock()
            .groups
            .get(log_group)
            .and_then(|streams| streams.get(log_stream))
            .map(|stream| stream.events.clone())
            .unwrap_or_default()
    }

    /// The token the next append to a stream must present
    pub fn upload_token(&self, log_group: &str, log_stream: &str) -> Option<SequenceToken> {
        self.state
            .lock()
            .groups
            .get(log_group)
            .and_then(|streams| streams.get(log_stream))
            .and_then(|stream| stream.token.clone())
    }

    /// Every append request received so far, including rejected ones
    pub fn put_requests(&self) -> Vec<PutLogEventsRequest> {
        self.state.lock().requests.clone()
    }

    pub fn put_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    fn wait(&self, timeout: Duration) -> BackendResult<()> {
        let latency = self.state.lock().latency;
        if latency.is_zero() {
            return Ok(());
        }
        if latency > timeout {
            thread::sleep(timeout);
            return Err(BackendError::Timeout(timeout));
        }
        thread::sleep(latency);
        Ok(())
    }
}

impl LogStreamClient for MemoryLogStreams {
    fn describe_log_streams(
        &self,
        log_group: &str,
        prefix: &str,
        timeout: Duration,
    ) -> BackendResult<Vec<LogStreamDescription>> {
        self.wait(timeout)?;

        let state = self.state.lock();
        let streams = state
            .groups
            .get(log_group)
            .ok_or_else(|| BackendError::not_found(format!("log group '{}'", log_group)))?;

        Ok(streams
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, stream)| LogStreamDescription {
                log_stream: name.clone(),
                upload_sequence_token: stream.token.clone(),
            })
            .collect())
    }

    fn create_log_stream(
        &self,
        log_group: &str,
        log_stream: &str,
        timeout: Duration,
    ) -> BackendResult<()> {
        self.wait(timeout)?;

        let mut state = self.state.lock();
        let streams = state
            .groups
            .get_mut(log_group)
            .ok_or_else(|| BackendError::not_found(format!("log group '{}'", log_group)))?;

        if streams.contains_key(log_stream) {
            return Err(BackendError::ResourceAlreadyExists {
                resource: format!("log stream '{}'", log_stream),
            });
        }
        streams.insert(log_stream.to_string(), StreamState::default());
        Ok(())
    }

    fn put_log_events(
        &self,
        request: &PutLogEventsRequest,
        timeout: Duration,
    ) -> BackendResult<PutLogEventsResponse> {
        let injected = {
            let mut state = self.state.lock();
            state.requests.push(request.clone());
            state.injected_failures.pop_front().flatten()
        };

        self.wait(timeout)?;
        if let Some(error) = injected {
            return Err(error);
        }

        if request.events.is_empty() {
            return Err(BackendError::invalid_parameter("events must not be empty"));
        }

        let mut state = self.state.lock();
        let issued = state.tokens_issued + 1;

        let stream = state
            .groups
            .get_mut(&request.log_group)
            .ok_or_else(|| {
                BackendError::not_found(format!("log group '{}'", request.log_group))
            })?
            .get_mut(&request.log_stream)
            .ok_or_else(|| {
                BackendError::not_found(format!("log stream '{}'", request.log_stream))
            })?;

        if stream.token != request.sequence_token {
            return Err(BackendError::InvalidSequenceToken {
                expected: stream.token.clone(),
            });
        }

        let next = SequenceToken::new(format!("{:020}", issued));
        stream.events.extend(request.events.iter().cloned());
        stream.token = Some(next.clone());
        state.tokens_issued = issued;

        Ok(PutLogEventsResponse {
            next_sequence_token: Some(next),
        })
    }
}
