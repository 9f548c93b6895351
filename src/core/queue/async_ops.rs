//! Tokio adaptors for monitored queues.
//!
//! Async callers never park a thread. Each attempt is a non-blocking try; on
//! a full or empty queue the future waits for the queue's change
//! notification and tries again. A dropped future therefore never pushes or
//! pops anything after the caller stopped waiting.

use std::time::Duration;

use tokio::time::{self, Instant};

use crate::core::error::{PopError, PushError};
use crate::core::queue::{BoundedStorage, MonitoredQueue};
use crate::metrics;

impl<T, S: BoundedStorage<T>> MonitoredQueue<T, S> {
    /// Async [`push_back`](Self::push_back).
    pub async fn push_back_async(&self, item: T) -> Result<(), PushError<T>> {
        let mut item = item;
        loop {
            // Register before trying so a pop between the try and the await
            // is not missed.
            let notified = self.changed().notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.offer(item) {
                Err(PushError::Full(back)) => item = back,
                other => return other,
            }
            notified.await;
        }
    }

    /// Async [`pop_front`](Self::pop_front).
    pub async fn pop_front_async(&self) -> Result<T, PopError> {
        let epoch = self.reset_epoch();
        loop {
            let notified = self.changed().notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_pop_since(epoch) {
                Err(PopError::Empty) => {}
                other => return other,
            }
            notified.await;
        }
    }

    /// Async [`timed_pop_front`](Self::timed_pop_front) with a relative timeout.
    pub async fn timed_pop_front_async(&self, timeout: Duration) -> Result<T, PopError> {
        if !self.supports_timed_operations() {
            return Err(PopError::TimedOperationsUnsupported);
        }
        let deadline = Instant::now() + timeout;
        let epoch = self.reset_epoch();
        loop {
            let notified = self.changed().notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.try_pop_since(epoch) {
                Err(PopError::Empty) => {}
                other => return other,
            }
            if time::timeout_at(deadline, notified).await.is_err() {
                metrics::inc_timed_out(1);
                return Err(PopError::Timeout);
            }
        }
    }
}
