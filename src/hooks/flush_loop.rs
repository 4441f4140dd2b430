//! Batching delivery path
//!
//! Producers push events onto a bounded queue. A single worker thread owns
//! the pending batch and the sequence token; it waits on two sources at once:
//!
//! - the queue, whose events are appended to the batch without any I/O
//! - a ticker firing every `batch_interval`, on which a non-empty batch is
//!   appended to the stream in arrival order
//!
//! A failed flush keeps the batch and the token as they were and publishes
//! the failure for the next producer call. Since only the worker ever reads
//! or writes the token, no lock guards it.

use super::config::HookConfig;
use super::failure_channel::{failure_channel, FailurePublisher, FailureReceiver, FlushFailure};
use crate::backend::{chunk_ranges, InputLogEvent, LogStreamClient, SequenceToken};
use crate::core::{HookError, HookMetrics, OverflowPolicy, Result};
use crossbeam_channel::{
    bounded, select, tick, Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError,
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

pub(crate) enum Command {
    Event(InputLogEvent),
    /// Flush the pending batch now and report the outcome
    Flush(Sender<Result<()>>),
    /// Report the current sequence token
    Token(Sender<Option<SequenceToken>>),
}

/// Outcome of the worker's final flush
type FinalFlush = std::result::Result<(), FlushFailure>;

/// How the worker thread ended, kept for every `shutdown` caller
#[derive(Debug, Clone)]
enum WorkerExit {
    Flushed,
    FinalFlushFailed(FlushFailure),
    Panicked,
}

impl WorkerExit {
    fn to_result(&self) -> Result<()> {
        match self {
            WorkerExit::Flushed => Ok(()),
            WorkerExit::FinalFlushFailed(failure) => Err(failure.clone().into()),
            WorkerExit::Panicked => Err(HookError::other("flush worker panicked")),
        }
    }
}

/// Join handle until the worker has been joined, its exit afterwards
struct WorkerSlot {
    handle: Option<thread::JoinHandle<FinalFlush>>,
    exit: Option<WorkerExit>,
}

/// State owned by the worker thread
struct FlushLoop {
    config: Arc<HookConfig>,
    client: Arc<dyn LogStreamClient>,
    token: Option<SequenceToken>,
    batch: Vec<InputLogEvent>,
    next_batch_id: u64,
    failures: FailurePublisher,
    metrics: Arc<HookMetrics>,
}

impl FlushLoop {
    fn run(mut self, commands: Receiver<Command>, ticks: Receiver<Instant>) -> FinalFlush {
        loop {
            select! {
                recv(commands) -> command => match command {
                    Ok(Command::Event(event)) => self.batch.push(event),
                    Ok(Command::Flush(ack)) => {
                        let _ = ack.send(self.flush().map_err(HookError::from));
                    }
                    Ok(Command::Token(ack)) => {
                        let _ = ack.send(self.token.clone());
                    }
                    // every sender is gone: the hook is shutting down
                    Err(_) => break,
                },
                recv(ticks) -> _ => self.on_tick(),
            }
        }

        debug!(
            log_stream = %self.config.log_stream,
            pending = self.batch.len(),
            "flush worker stopping"
        );
        self.flush()
    }

    fn on_tick(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        if let Err(failure) = self.flush_batch() {
            warn!(
                log_stream = %self.config.log_stream,
                batch_id = failure.batch_id,
                pending = self.batch.len(),
                error = %failure.error,
                "flush failed, keeping batch for the next tick"
            );
            self.failures.publish(failure);
        }
    }

    fn flush(&mut self) -> FinalFlush {
        if self.batch.is_empty() {
            return Ok(());
        }
        self.flush_batch()
    }

    /// Send the whole batch, chunked to the backend's request limits
    ///
    /// Chunks go out in order, each under the token returned for the previous
    /// one. On failure the delivered prefix is removed and the rest is kept.
    fn flush_batch(&mut self) -> FinalFlush {
        let batch_id = self.next_batch_id;
        self.next_batch_id += 1;
        let event_count = self.batch.len();
        let mut delivered = 0;

        for range in chunk_ranges(&self.batch) {
            let request = self
                .config
                .put_request(self.token.clone(), self.batch[range.clone()].to_vec());
            self.metrics.record_append();

            match self
                .client
                .put_log_events(&request, self.config.request_timeout)
            {
                Ok(response) => {
                    self.token = response.next_sequence_token;
                    self.metrics.record_delivered(range.len());
                    delivered = range.end;
                }
                Err(error) => {
                    self.metrics.record_append_failure();
                    self.batch.drain(..delivered);
                    return Err(FlushFailure {
                        batch_id,
                        event_count,
                        error,
                    });
                }
            }
        }

        debug!(
            log_stream = %self.config.log_stream,
            batch_id,
            event_count,
            "flushed batch"
        );
        self.batch.clear();
        Ok(())
    }
}

/// Producer-facing handle of the batching path
pub(crate) struct BatchedDelivery {
    config: Arc<HookConfig>,
    sender: RwLock<Option<Sender<Command>>>,
    worker: Mutex<WorkerSlot>,
    /// Disconnects when the worker thread exits; never carries a message
    done: Receiver<()>,
    failures: FailureReceiver,
    metrics: Arc<HookMetrics>,
}

impl BatchedDelivery {
    /// Start the worker, ticking every `config.batch_interval`
    pub(crate) fn spawn(
        config: Arc<HookConfig>,
        client: Arc<dyn LogStreamClient>,
        token: Option<SequenceToken>,
        metrics: Arc<HookMetrics>,
    ) -> Result<Self> {
        let ticks = tick(config.batch_interval);
        Self::spawn_with_ticks(config, client, token, metrics, ticks)
    }

    pub(crate) fn spawn_with_ticks(
        config: Arc<HookConfig>,
        client: Arc<dyn LogStreamClient>,
        token: Option<SequenceToken>,
        metrics: Arc<HookMetrics>,
        ticks: Receiver<Instant>,
    ) -> Result<Self> {
        let (sender, commands) = bounded(config.queue_capacity);
        let (publisher, failures) = failure_channel(config.failure_slots, Arc::clone(&metrics));

        let flush_loop = FlushLoop {
            config: Arc::clone(&config),
            client,
            token,
            batch: Vec::new(),
            next_batch_id: 1,
            failures: publisher,
            metrics: Arc::clone(&metrics),
        };

        let (done_signal, done) = bounded::<()>(0);
        let worker = thread::Builder::new()
            .name(format!("logstream-flush-{}", config.log_stream))
            .spawn(move || {
                // dropped on return or unwind
                let _done_signal = done_signal;
                flush_loop.run(commands, ticks)
            })?;

        Ok(Self {
            config,
            sender: RwLock::new(Some(sender)),
            worker: Mutex::new(WorkerSlot {
                handle: Some(worker),
                exit: None,
            }),
            done,
            failures,
            metrics,
        })
    }

    /// Queue an event, then report a pending flush failure if there is one
    pub(crate) fn push(&self, event: InputLogEvent) -> Result<()> {
        {
            let guard = self.sender.read();
            let sender = guard.as_ref().ok_or(HookError::HookStopped)?;

            match sender.try_send(Command::Event(event)) {
                Ok(()) => {}
                Err(TrySendError::Full(command)) => self.handle_overflow(sender, command)?,
                Err(TrySendError::Disconnected(_)) => return Err(HookError::HookStopped),
            }
        }
        self.metrics.record_fired();

        match self.failures.try_take() {
            Some(failure) => Err(failure.into()),
            None => Ok(()),
        }
    }

    fn handle_overflow(&self, sender: &Sender<Command>, command: Command) -> Result<()> {
        self.metrics.record_queue_full();
        let capacity = self.config.queue_capacity;

        match self.config.overflow_policy {
            OverflowPolicy::Block => {
                self.metrics.record_block();
                sender.send(command).map_err(|_| HookError::HookStopped)
            }
            OverflowPolicy::BlockWithTimeout(timeout) => {
                self.metrics.record_block();
                match sender.send_timeout(command, timeout) {
                    Ok(()) => Ok(()),
                    Err(SendTimeoutError::Timeout(_)) => {
                        Err(HookError::queue_full(sender.len(), capacity))
                    }
                    Err(SendTimeoutError::Disconnected(_)) => Err(HookError::HookStopped),
                }
            }
            OverflowPolicy::Fail => Err(HookError::queue_full(sender.len(), capacity)),
        }
    }

    /// Ask the worker to flush now; events queued before this call are included
    pub(crate) fn flush(&self) -> Result<()> {
        let (ack, outcome) = bounded(1);
        self.send_command(Command::Flush(ack))?;
        outcome.recv().map_err(|_| HookError::HookStopped)?
    }

    pub(crate) fn sequence_token(&self) -> Result<Option<SequenceToken>> {
        let (ack, token) = bounded(1);
        self.send_command(Command::Token(ack))?;
        token.recv().map_err(|_| HookError::HookStopped)
    }

    fn send_command(&self, command: Command) -> Result<()> {
        let guard = self.sender.read();
        let sender = guard.as_ref().ok_or(HookError::HookStopped)?;
        sender.send(command).map_err(|_| HookError::HookStopped)
    }

    pub(crate) fn take_failures(&self) -> Vec<FlushFailure> {
        self.failures.drain()
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.sender.read().is_none()
    }

    /// Stop accepting events, let the worker drain the queue and flush the
    /// final batch, and wait up to `timeout` for it to finish
    ///
    /// Every call, concurrent or later, waits for the same worker and returns
    /// the outcome of its final flush. A call that times out leaves the worker
    /// running; a later call can wait for it again.
    pub(crate) fn shutdown(&self, timeout: Duration) -> Result<()> {
        // dropping the last queue sender is the stop signal
        drop(self.sender.write().take());

        if let Err(RecvTimeoutError::Timeout) = self.done.recv_timeout(timeout) {
            warn!(
                log_stream = %self.config.log_stream,
                ?timeout,
                "flush worker did not finish in time, pending events may be lost"
            );
            return Err(HookError::other(format!(
                "flush worker did not stop within {:?}",
                timeout
            )));
        }

        let mut slot = self.worker.lock();
        if let Some(handle) = slot.handle.take() {
            slot.exit = Some(self.join(handle));
        }
        match &slot.exit {
            Some(exit) => exit.to_result(),
            // the handle is only taken together with recording the exit
            None => Err(HookError::HookStopped),
        }
    }

    fn join(&self, handle: thread::JoinHandle<FinalFlush>) -> WorkerExit {
        match handle.join() {
            Ok(Ok(())) => WorkerExit::Flushed,
            Ok(Err(failure)) => {
                error!(
                    log_stream = %self.config.log_stream,
                    batch_id = failure.batch_id,
                    error = %failure.error,
                    "final flush failed, pending events were not delivered"
                );
                WorkerExit::FinalFlushFailed(failure)
            }
            Err(_) => {
                error!(log_stream = %self.config.log_stream, "flush worker panicked");
                WorkerExit::Panicked
            }
        }
    }
}
