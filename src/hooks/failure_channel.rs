//! Flush failure reporting from the flush worker back to producers
//!
//! The worker publishes one [`FlushFailure`] per failed flush; producer calls
//! pick them up without blocking. The channel holds a fixed number of
//! failures. When it is full the oldest unread failure is evicted for the
//! newest one, so with a single slot (the default) two failures that happen
//! before any producer looks leave only the second observable. Evictions are
//! counted in [`HookMetrics::failures_overwritten`] and logged.

use crate::backend::BackendError;
use crate::core::{HookError, HookMetrics};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::Arc;
use tracing::warn;

/// Outcome of one failed flush attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushFailure {
    /// Identifies the flush attempt; increases by one per attempt
    pub batch_id: u64,
    /// Events in the batch when the attempt started
    ///
    /// A batch too large for one request goes out in several appends. Those
    /// that succeeded before the failing one are not resent, so fewer than
    /// `event_count` events may still be pending.
    pub event_count: usize,
    pub error: BackendError,
}

impl From<FlushFailure> for HookError {
    fn from(failure: FlushFailure) -> Self {
        HookError::FlushFailed {
            batch_id: failure.batch_id,
            event_count: failure.event_count,
            source: failure.error,
        }
    }
}

/// Worker side of the channel
pub(crate) struct FailurePublisher {
    sender: Sender<FlushFailure>,
    evictor: Receiver<FlushFailure>,
    metrics: Arc<HookMetrics>,
}

/// Producer side of the channel
pub(crate) struct FailureReceiver {
    receiver: Receiver<FlushFailure>,
}

pub(crate) fn failure_channel(
    slots: usize,
    metrics: Arc<HookMetrics>,
) -> (FailurePublisher, FailureReceiver) {
    let (sender, receiver) = bounded(slots.max(1));
    let publisher = FailurePublisher {
        sender,
        evictor: receiver.clone(),
        metrics,
    };
    (publisher, FailureReceiver { receiver })
}

impl FailurePublisher {
    pub(crate) fn publish(&self, failure: FlushFailure) {
        let mut pending = failure;
        loop {
            match self.sender.try_send(pending) {
                Ok(()) => return,
                Err(TrySendError::Full(failure)) => {
                    // a producer may drain the slot first, then the retry just succeeds
                    if let Ok(evicted) = self.evictor.try_recv() {
                        self.metrics.record_failure_overwritten();
                        warn!(
                            batch_id = evicted.batch_id,
                            error = %evicted.error,
                            "flush failure overwritten before any producer observed it"
                        );
                    }
                    pending = failure;
                }
                // unreachable while `evictor` is alive
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }
}

impl FailureReceiver {
    /// Take the oldest unread failure, if any
    pub(crate) fn try_take(&self) -> Option<FlushFailure> {
        self.receiver.try_recv().ok()
    }

    /// Take every unread failure, oldest first
    pub(crate) fn drain(&self) -> Vec<FlushFailure> {
        self.receiver.try_iter().collect()
    }
}
