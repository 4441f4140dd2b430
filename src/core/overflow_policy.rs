//! Overflow policies for the batching queue
//!
//! When the batching queue is full, these policies determine how a producer
//! call behaves. None of them drop the event silently: the caller either
//! waits for room or gets [`HookError::QueueFull`](super::HookError::QueueFull).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Policy for handling a full batching queue
///
/// # Example
///
/// ```
/// use logstream_hook::OverflowPolicy;
/// use std::time::Duration;
///
/// // Default behavior: wait for the flush loop to make room
/// let policy = OverflowPolicy::default();
/// assert_eq!(policy, OverflowPolicy::Block);
///
/// // Wait a little, then give up with an error
/// let policy = OverflowPolicy::BlockWithTimeout(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Block until space is available
    ///
    /// Applies backpressure to the logging call site. Nothing is lost.
    #[default]
    Block,

    /// Block with timeout, then fail with `QueueFull`
    BlockWithTimeout(Duration),

    /// Fail immediately with `QueueFull`
    Fail,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Block => write!(f, "Block"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
            OverflowPolicy::Fail => write!(f, "Fail"),
        }
    }
}
