//! Deferred reply completions.
//!
//! Each scheduled reply is a tokio task that sleeps for the configured delay
//! and then posts a [`ReplyDue`] into a channel. The task never touches
//! conversation state; the store drains the channel and applies the reply.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::AbortHandle;
use tracing::debug;

use crate::model::Mode;
use crate::store::{CompletionKey, PendingReply};

/// A completion whose delay has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyDue {
    pub key: CompletionKey,
    pub mode: Mode,
}

pub struct ReplyScheduler {
    delay: Duration,
    tx: UnboundedSender<ReplyDue>,
    tasks: HashMap<CompletionKey, AbortHandle>,
}

impl ReplyScheduler {
    pub fn new(delay: Duration) -> (Self, UnboundedReceiver<ReplyDue>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            delay,
            tx,
            tasks: HashMap::new(),
        };
        (scheduler, rx)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Starts the timer for `pending`. Must be called inside a tokio runtime.
    pub fn schedule(&mut self, pending: PendingReply) {
        let tx = self.tx.clone();
        let delay = self.delay;
        let due = ReplyDue {
            key: pending.key,
            mode: pending.mode,
        };
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver only goes away on shutdown
            let _ = tx.send(due);
        });
        if let Some(previous) = self.tasks.insert(pending.key, handle.abort_handle()) {
            previous.abort();
        }
        debug!(session = %pending.key.session_id, delay_ms = delay.as_millis() as u64, "reply scheduled");
    }

    /// Claims a fired completion. Returns false if it was cancelled meanwhile.
    pub fn complete(&mut self, key: &CompletionKey) -> bool {
        self.tasks.remove(key).is_some()
    }

    pub fn cancel(&mut self, key: &CompletionKey) -> bool {
        match self.tasks.remove(key) {
            Some(handle) => {
                handle.abort();
                debug!(session = %key.session_id, "reply cancelled");
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }
}

impl Drop for ReplyScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
