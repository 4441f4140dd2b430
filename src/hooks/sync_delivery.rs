//! Synchronous delivery path
//!
//! Each event is appended from the calling thread as a one-event batch. The
//! sequence token sits behind a mutex that is held for the whole round trip,
//! so concurrent callers queue up and no two appends ever present the same
//! token.

use super::config::HookConfig;
use crate::backend::{InputLogEvent, LogStreamClient, SequenceToken};
use crate::core::{HookError, HookMetrics, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

pub(crate) struct SyncDelivery {
    config: Arc<HookConfig>,
    client: Arc<dyn LogStreamClient>,
    token: Mutex<Option<SequenceToken>>,
    metrics: Arc<HookMetrics>,
}

impl SyncDelivery {
    pub(crate) fn new(
        config: Arc<HookConfig>,
        client: Arc<dyn LogStreamClient>,
        token: Option<SequenceToken>,
        metrics: Arc<HookMetrics>,
    ) -> Self {
        Self {
            config,
            client,
            token: Mutex::new(token),
            metrics,
        }
    }

    /// Append one event; on failure the token is left untouched
    pub(crate) fn append_one(&self, event: InputLogEvent) -> Result<()> {
        let mut token = self.token.lock();

        let request = self.config.put_request(token.clone(), vec![event]);
        self.metrics.record_append();

        match self
            .client
            .put_log_events(&request, self.config.request_timeout)
        {
            Ok(response) => {
                debug!(
                    log_stream = %self.config.log_stream,
                    next_token = ?response.next_sequence_token,
                    "appended event"
                );
                *token = response.next_sequence_token;
                self.metrics.record_delivered(1);
                Ok(())
            }
            Err(error) => {
                self.metrics.record_append_failure();
                Err(HookError::append(error))
            }
        }
    }

    pub(crate) fn sequence_token(&self) -> Option<SequenceToken> {
        self.token.lock().clone()
    }
}
