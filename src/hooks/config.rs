//! Configuration for [`LogStreamHook`](super::LogStreamHook)

use crate::backend::{InputLogEvent, PutLogEventsRequest, SequenceToken};
use crate::core::{HookError, OverflowPolicy, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default bound of the batching queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Default bound on every backend call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of flush failures held for producers to pick up
pub const DEFAULT_FAILURE_SLOTS: usize = 1;

/// Settings fixed for the whole lifetime of a hook
///
/// `batch_interval` decides the delivery path once and for all: zero ships
/// every entry synchronously from the calling thread, anything else queues
/// entries for a background worker that flushes them on every tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    pub log_group: String,
    pub log_stream: String,
    pub batch_interval: Duration,
    pub queue_capacity: usize,
    pub overflow_policy: OverflowPolicy,
    pub failure_slots: usize,
    pub request_timeout: Duration,
    /// Create the stream during construction when it does not exist yet
    pub create_stream: bool,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            log_group: String::new(),
            log_stream: String::new(),
            batch_interval: Duration::ZERO,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overflow_policy: OverflowPolicy::default(),
            failure_slots: DEFAULT_FAILURE_SLOTS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            create_stream: true,
        }
    }
}

impl HookConfig {
    pub fn new(log_group: impl Into<String>, log_stream: impl Into<String>) -> Self {
        Self {
            log_group: log_group.into(),
            log_stream: log_stream.into(),
            ..Self::default()
        }
    }

    pub fn is_batching(&self) -> bool {
        !self.batch_interval.is_zero()
    }

    pub fn validate(&self) -> Result<()> {
        if self.log_group.is_empty() {
            return Err(HookError::config("HookConfig", "log_group must not be empty"));
        }
        if self.log_stream.is_empty() {
            return Err(HookError::config("HookConfig", "log_stream must not be empty"));
        }
        if self.request_timeout.is_zero() {
            return Err(HookError::config(
                "HookConfig",
                "request_timeout must be greater than zero",
            ));
        }
        if self.is_batching() {
            if self.queue_capacity == 0 {
                return Err(HookError::config(
                    "HookConfig",
                    "queue_capacity must be greater than zero",
                ));
            }
            if self.failure_slots == 0 {
                return Err(HookError::config(
                    "HookConfig",
                    "failure_slots must be greater than zero",
                ));
            }
        }
        Ok(())
    }

    /// Append request for this hook's stream
    pub(crate) fn put_request(
        &self,
        sequence_token: Option<SequenceToken>,
        events: Vec<InputLogEvent>,
    ) -> PutLogEventsRequest {
        PutLogEventsRequest {
            log_group: self.log_group.clone(),
            log_stream: self.log_stream.clone(),
            sequence_token,
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HookConfig::new("app", "web-1");
        assert!(!config.is_batching());
        assert_eq!(config.queue_capacity, 10_000);
        assert_eq!(config.failure_slots, 1);
        assert_eq!(config.overflow_policy, OverflowPolicy::Block);
        assert!(config.create_stream);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_names() {
        let err = HookConfig::new("", "web-1").validate().unwrap_err();
        assert!(err.to_string().contains("log_group"));

        let err = HookConfig::new("app", "").validate().unwrap_err();
        assert!(err.to_string().contains("log_stream"));
    }

    #[test]
    fn test_validate_batching_bounds() {
        let mut config = HookConfig::new("app", "web-1");
        config.batch_interval = Duration::from_secs(1);
        config.queue_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(HookError::InvalidConfiguration { .. })
        ));

        // queue settings are irrelevant to the synchronous path
        config.batch_interval = Duration::ZERO;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: HookConfig = serde_json::from_str(
            r#"{"log_group": "app", "log_stream": "web-1", "batch_interval": {"secs": 5, "nanos": 0}}"#,
        )
        .unwrap();
        assert_eq!(config.batch_interval, Duration::from_secs(5));
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert!(config.is_batching());
    }
}
