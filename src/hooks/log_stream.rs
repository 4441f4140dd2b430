//! Hook shipping entries to a remote log stream

use super::config::HookConfig;
use super::failure_channel::FlushFailure;
use super::flush_loop::BatchedDelivery;
use super::sync_delivery::SyncDelivery;
use crate::backend::{BackendError, InputLogEvent, LogStreamClient, SequenceToken};
use crate::core::{
    Hook, HookError, HookMetrics, JsonFormatter, LogEntry, LogLevel, OverflowPolicy, Result,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Default shutdown timeout used when a hook is dropped (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// The delivery path, chosen once at construction
///
/// Each variant owns the sequence token its own way: behind a mutex for the
/// synchronous path, inside the worker thread for the batching path.
enum Delivery {
    Sync(SyncDelivery),
    Batched(BatchedDelivery),
}

/// Ships every log entry to one log stream
///
/// With a zero batch interval, [`Hook::fire`] appends the entry before it
/// returns and reports the backend's answer. Otherwise `fire` only queues
/// the entry; a worker appends everything queued once per interval, and a
/// failed append is reported by a *later* `fire` call (whichever one runs
/// next), not by the call that queued the affected entries.
///
/// # Example
///
/// ```
/// use logstream_hook::backend::{LogStreamClient, MemoryLogStreams};
/// use logstream_hook::prelude::*;
/// use std::sync::Arc;
///
/// let backend = Arc::new(MemoryLogStreams::new());
/// backend.create_log_group("app");
///
/// let hook = LogStreamHook::builder("app", "web-1")
///     .build(Arc::clone(&backend) as Arc<dyn LogStreamClient>)
///     .unwrap();
///
/// hook.fire(&LogEntry::new(LogLevel::Info, "started")).unwrap();
/// assert_eq!(backend.events("app", "web-1").len(), 1);
/// ```
pub struct LogStreamHook {
    config: Arc<HookConfig>,
    formatter: JsonFormatter,
    delivery: Delivery,
    metrics: Arc<HookMetrics>,
}

impl LogStreamHook {
    /// Build a hook for `config.log_group`/`config.log_stream`
    ///
    /// Looks the stream up first. An existing stream seeds the sequence token
    /// with its upload token; a missing one starts without a token and is
    /// created when `config.create_stream` is set. Any backend failure here
    /// fails construction.
    pub fn new(config: HookConfig, client: Arc<dyn LogStreamClient>) -> Result<Self> {
        config.validate()?;
        let token = Self::discover_token(&config, client.as_ref())?;

        let config = Arc::new(config);
        let metrics = Arc::new(HookMetrics::new());

        let delivery = if config.is_batching() {
            Delivery::Batched(BatchedDelivery::spawn(
                Arc::clone(&config),
                client,
                token,
                Arc::clone(&metrics),
            )?)
        } else {
            Delivery::Sync(SyncDelivery::new(
                Arc::clone(&config),
                client,
                token,
                Arc::clone(&metrics),
            ))
        };

        Ok(Self {
            config,
            formatter: JsonFormatter::new(),
            delivery,
            metrics,
        })
    }

    fn discover_token(
        config: &HookConfig,
        client: &dyn LogStreamClient,
    ) -> Result<Option<SequenceToken>> {
        let construction = |e| HookError::construction(&config.log_group, &config.log_stream, e);

        let streams = client
            .describe_log_streams(&config.log_group, &config.log_stream, config.request_timeout)
            .map_err(construction)?;

        // describe matches by prefix, "web-1" must not pick up "web-10"
        if let Some(existing) = streams
            .into_iter()
            .find(|s| s.log_stream == config.log_stream)
        {
            debug!(
                log_group = %config.log_group,
                log_stream = %config.log_stream,
                token = ?existing.upload_sequence_token,
                "using existing log stream"
            );
            return Ok(existing.upload_sequence_token);
        }

        if config.create_stream {
            match client.create_log_stream(
                &config.log_group,
                &config.log_stream,
                config.request_timeout,
            ) {
                Ok(()) | Err(BackendError::ResourceAlreadyExists { .. }) => {}
                Err(e) => return Err(construction(e)),
            }
            debug!(
                log_group = %config.log_group,
                log_stream = %config.log_stream,
                "created log stream"
            );
        }
        Ok(None)
    }

    /// Create a builder for a hook on `log_group`/`log_stream`
    #[must_use]
    pub fn builder(log_group: impl Into<String>, log_stream: impl Into<String>) -> HookBuilder {
        HookBuilder::new(log_group, log_stream)
    }

    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    pub fn metrics(&self) -> &HookMetrics {
        &self.metrics
    }

    pub fn is_batching(&self) -> bool {
        matches!(self.delivery, Delivery::Batched(_))
    }

    /// Format an entry into the event that will be appended
    pub fn to_event(&self, entry: &LogEntry) -> Result<InputLogEvent> {
        Ok(InputLogEvent::new(
            self.formatter.format(entry)?,
            entry.timestamp_millis(),
        ))
    }

    /// The token the next append will present
    ///
    /// For a batching hook this is a round trip to the worker, answered after
    /// everything queued before the call.
    pub fn sequence_token(&self) -> Result<Option<SequenceToken>> {
        match &self.delivery {
            Delivery::Sync(sync) => Ok(sync.sequence_token()),
            Delivery::Batched(batched) => batched.sequence_token(),
        }
    }

    /// Take every flush failure no producer call has reported yet
    pub fn take_flush_failures(&self) -> Vec<FlushFailure> {
        match &self.delivery {
            Delivery::Sync(_) => Vec::new(),
            Delivery::Batched(batched) => batched.take_failures(),
        }
    }

    /// Stop the hook, delivering whatever is still pending
    ///
    /// A batching hook stops accepting events, its worker drains the queue
    /// and makes a final flush, and this call waits up to `timeout` for that
    /// to finish. The final flush outcome is returned, to this call and to
    /// every other call that reaches the end of the worker, concurrent or
    /// later. Later `fire` calls fail with [`HookError::HookStopped`].
    pub fn shutdown(&self, timeout: Duration) -> Result<()> {
        match &self.delivery {
            Delivery::Sync(_) => Ok(()),
            Delivery::Batched(batched) => batched.shutdown(timeout),
        }
    }
}

impl Hook for LogStreamHook {
    fn fire(&self, entry: &LogEntry) -> Result<()> {
        let event = self.to_event(entry)?;

        match &self.delivery {
            Delivery::Sync(sync) => {
                self.metrics.record_fired();
                sync.append_one(event)
            }
            Delivery::Batched(batched) => batched.push(event),
        }
    }

    fn levels(&self) -> &[LogLevel] {
        &LogLevel::ALL
    }

    fn flush(&self) -> Result<()> {
        match &self.delivery {
            Delivery::Sync(_) => Ok(()),
            Delivery::Batched(batched) => batched.flush(),
        }
    }

    fn name(&self) -> &str {
        "log_stream"
    }
}

impl Drop for LogStreamHook {
    fn drop(&mut self) {
        if let Delivery::Batched(batched) = &self.delivery {
            if batched.is_stopped() {
                return;
            }
            if let Err(e) = batched.shutdown(DEFAULT_SHUTDOWN_TIMEOUT) {
                error!(
                    log_stream = %self.config.log_stream,
                    error = %e,
                    "log stream hook dropped with undelivered events"
                );
            }
        }
    }
}

/// Builder for constructing a [`LogStreamHook`] with a fluent API
///
/// # Example
/// ```
/// use logstream_hook::backend::{LogStreamClient, MemoryLogStreams};
/// use logstream_hook::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let backend = Arc::new(MemoryLogStreams::new());
/// backend.create_log_group("app");
///
/// let hook = LogStreamHook::builder("app", "worker-7")
///     .batch_interval(Duration::from_millis(200))
///     .overflow_policy(OverflowPolicy::BlockWithTimeout(Duration::from_millis(50)))
///     .build(backend as Arc<dyn LogStreamClient>)
///     .unwrap();
///
/// assert!(hook.is_batching());
/// ```
pub struct HookBuilder {
    config: HookConfig,
}

impl HookBuilder {
    pub fn new(log_group: impl Into<String>, log_stream: impl Into<String>) -> Self {
        Self {
            config: HookConfig::new(log_group, log_stream),
        }
    }

    /// Tick period of the batching worker; zero (the default) ships every
    /// entry synchronously
    #[must_use = "builder methods return a new value"]
    pub fn batch_interval(mut self, interval: Duration) -> Self {
        self.config.batch_interval = interval;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.config.overflow_policy = policy;
        self
    }

    /// How many unread flush failures are kept before the oldest is evicted
    #[must_use = "builder methods return a new value"]
    pub fn failure_slots(mut self, slots: usize) -> Self {
        self.config.failure_slots = slots;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn create_stream(mut self, create: bool) -> Self {
        self.config.create_stream = create;
        self
    }

    pub fn config(&self) -> &HookConfig {
        &self.config
    }

    /// Build the hook against `client`
    pub fn build(self, client: Arc<dyn LogStreamClient>) -> Result<LogStreamHook> {
        LogStreamHook::new(self.config, client)
    }
}
