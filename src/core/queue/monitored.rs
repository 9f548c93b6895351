//! Bounded queue instrumented with watermark-based backpressure state.
//!
//! A [`MonitoredQueue`] owns a [`BoundedStorage`] and serialises every access
//! to it under one mutex, together with the derived [`QueueState`]. Count and
//! state therefore always move in the same critical section; readers of
//! [`MonitoredQueue::state`] on other threads may still observe a value that
//! is one operation stale.
//!
//! Blocking operations park the calling thread on a condition variable
//! (`not_full` for pushers, `not_empty` for poppers). [`MonitoredQueue::reset`]
//! drains the queue and wakes everyone: pushers continue into the emptied
//! queue, poppers that were waiting at reset time return [`PopError::Reset`].
//!
//! State transitions are numbered under the queue lock and handed to the
//! callback one at a time, in order. A transition that reaches the callback
//! after a newer one was already delivered is dropped, so the last `to` an
//! observer saw always matches the queue's current state.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard, ReentrantMutex, RwLock};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::core::error::{PopError, PushError, WatermarkError};
use crate::core::queue::state::{next_state, QueueState, Watermarks};
use crate::core::queue::{BoundedStorage, FixedQueue};
use crate::core::throttle::ThrottledAction;
use crate::metrics;

/// Callback invoked with `(previous, current)` whenever the state changes.
pub type StateCallback = Arc<dyn Fn(QueueState, QueueState) + Send + Sync>;

const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_WARN_MAX_PER_INTERVAL: u32 = 1;

struct Inner<S> {
    storage: S,
    state: QueueState,
    watermarks: Option<Watermarks>,
    push_disabled: bool,
    /// Bumped by every reset so that waiting poppers can tell they were interrupted.
    reset_epoch: u64,
    /// Number of the last state transition.
    transition_seq: u64,
    warn_throttle: ThrottledAction,
}

impl<S> Inner<S> {
    fn stamp(&mut self, previous: QueueState, current: QueueState) -> StateChange {
        self.transition_seq += 1;
        StateChange {
            seq: self.transition_seq,
            previous,
            current,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct StateChange {
    seq: u64,
    previous: QueueState,
    current: QueueState,
}

type Transition = Option<StateChange>;

pub struct MonitoredQueue<T, S = FixedQueue<T>> {
    name: String,
    capacity: usize,
    timed_operations: bool,
    inner: Mutex<Inner<S>>,
    not_empty: Condvar,
    not_full: Condvar,
    /// Wakes async waiters on every push, pop, reset and disable.
    changed: Notify,
    on_state_change: RwLock<Option<StateCallback>>,
    /// Sequence number of the last delivered transition. Reentrant so the
    /// callback may itself push or pop.
    delivered: ReentrantMutex<Cell<u64>>,
    _items: PhantomData<fn(T) -> T>,
}

impl<T: Send> MonitoredQueue<T, FixedQueue<T>> {
    /// Creates a queue of `capacity` elements without timed operations.
    pub fn new(capacity: usize) -> Self {
        Self::with_timed_operations(capacity, false)
    }

    pub fn with_timed_operations(capacity: usize, timed_operations: bool) -> Self {
        Self::with_storage(FixedQueue::new(capacity), timed_operations)
    }
}

impl<T, S: BoundedStorage<T>> MonitoredQueue<T, S> {
    /// Wraps an existing storage. The queue capacity is the storage capacity.
    ///
    /// # Panics
    /// If the storage has zero capacity or is not empty.
    pub fn with_storage(storage: S, timed_operations: bool) -> Self {
        let capacity = storage.capacity();
        assert!(capacity > 0, "queue capacity must be positive");
        assert!(storage.is_empty(), "storage must be empty when wrapped");

        Self {
            name: String::from("queue"),
            capacity,
            timed_operations,
            inner: Mutex::new(Inner {
                storage,
                state: QueueState::Normal,
                watermarks: None,
                push_disabled: false,
                reset_epoch: 0,
                transition_seq: 0,
                warn_throttle: ThrottledAction::new(
                    DEFAULT_WARN_INTERVAL,
                    DEFAULT_WARN_MAX_PER_INTERVAL,
                ),
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            changed: Notify::new(),
            on_state_change: RwLock::new(None),
            delivered: ReentrantMutex::new(Cell::new(0)),
            _items: PhantomData,
        }
    }

    /// Names the queue in log lines.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replaces the rate limit on watermark warnings.
    pub fn with_warning_throttle(self, throttle: ThrottledAction) -> Self {
        self.inner.lock().warn_throttle = throttle;
        self
    }

    /// Registers the callback run on every state transition, replacing any
    /// previous one. It runs after the internal lock is released, so it may
    /// call back into the queue. Calls never overlap; a thread whose
    /// transition is ready waits for the callback in progress to return.
    pub fn on_state_change<F>(&self, callback: F)
    where
        F: Fn(QueueState, QueueState) + Send + Sync + 'static,
    {
        let callback: StateCallback = Arc::new(callback);
        *self.on_state_change.write() = Some(callback);
    }

    // ───────────────────────────────────────────────────────────
    // Push
    // ───────────────────────────────────────────────────────────

    /// Appends `item`, blocking while the queue is full.
    ///
    /// Fails only when pushing is disabled.
    pub fn push_back(&self, item: T) -> Result<(), PushError<T>> {
        let mut item = item;
        let mut inner = self.inner.lock();
        loop {
            if inner.push_disabled {
                return Err(PushError::Disabled(item));
            }
            match inner.storage.try_push(item) {
                Ok(()) => break,
                Err(back) => {
                    item = back;
                    self.not_full.wait(&mut inner);
                }
            }
        }
        self.pushed(inner);
        Ok(())
    }

    /// Appends `item` if there is room right now.
    pub fn try_push_back(&self, item: T) -> Result<(), PushError<T>> {
        let res = self.offer(item);
        if let Err(PushError::Full(_)) = &res {
            metrics::inc_rejected_full(1);
        }
        res
    }

    /// `try_push_back` without counting a full queue as a rejection.
    pub(crate) fn offer(&self, item: T) -> Result<(), PushError<T>> {
        let mut inner = self.inner.lock();
        if inner.push_disabled {
            return Err(PushError::Disabled(item));
        }
        if let Err(back) = inner.storage.try_push(item) {
            return Err(PushError::Full(back));
        }
        self.pushed(inner);
        Ok(())
    }

    /// Appends `item`, blocking while the queue is full but no later than `deadline`.
    pub fn timed_push_back(&self, item: T, deadline: Instant) -> Result<(), PushError<T>> {
        if !self.timed_operations {
            return Err(PushError::TimedOperationsUnsupported(item));
        }

        let mut item = item;
        let mut inner = self.inner.lock();
        loop {
            if inner.push_disabled {
                return Err(PushError::Disabled(item));
            }
            match inner.storage.try_push(item) {
                Ok(()) => break,
                Err(back) => {
                    item = back;
                    if Instant::now() >= deadline {
                        metrics::inc_timed_out(1);
                        return Err(PushError::Timeout(item));
                    }
                    self.not_full.wait_until(&mut inner, deadline);
                }
            }
        }
        self.pushed(inner);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────
    // Pop
    // ───────────────────────────────────────────────────────────

    /// Removes the head element, blocking while the queue is empty.
    ///
    /// Returns [`PopError::Reset`] if the queue is reset while waiting.
    pub fn pop_front(&self) -> Result<T, PopError> {
        let mut inner = self.inner.lock();
        let epoch = inner.reset_epoch;
        loop {
            if let Some(item) = inner.storage.try_pop() {
                self.popped(inner);
                return Ok(item);
            }
            if inner.reset_epoch != epoch {
                return Err(PopError::Reset);
            }
            self.not_empty.wait(&mut inner);
        }
    }

    /// Removes the head element if there is one.
    pub fn try_pop_front(&self) -> Result<T, PopError> {
        let mut inner = self.inner.lock();
        match inner.storage.try_pop() {
            Some(item) => {
                self.popped(inner);
                Ok(item)
            }
            None => Err(PopError::Empty),
        }
    }

    /// Like `try_pop_front`, but reports [`PopError::Reset`] on an empty queue
    /// that was reset after `epoch` was read.
    pub(crate) fn try_pop_since(&self, epoch: u64) -> Result<T, PopError> {
        let mut inner = self.inner.lock();
        match inner.storage.try_pop() {
            Some(item) => {
                self.popped(inner);
                Ok(item)
            }
            None if inner.reset_epoch != epoch => Err(PopError::Reset),
            None => Err(PopError::Empty),
        }
    }

    pub(crate) fn reset_epoch(&self) -> u64 {
        self.inner.lock().reset_epoch
    }

    pub(crate) fn changed(&self) -> &Notify {
        &self.changed
    }

    /// Removes the head element, blocking while the queue is empty but no later
    /// than `deadline`.
    pub fn timed_pop_front(&self, deadline: Instant) -> Result<T, PopError> {
        if !self.timed_operations {
            return Err(PopError::TimedOperationsUnsupported);
        }

        let mut inner = self.inner.lock();
        let epoch = inner.reset_epoch;
        loop {
            if let Some(item) = inner.storage.try_pop() {
                self.popped(inner);
                return Ok(item);
            }
            if inner.reset_epoch != epoch {
                return Err(PopError::Reset);
            }
            if Instant::now() >= deadline {
                metrics::inc_timed_out(1);
                return Err(PopError::Timeout);
            }
            self.not_empty.wait_until(&mut inner, deadline);
        }
    }

    // ───────────────────────────────────────────────────────────
    // Manipulators
    // ───────────────────────────────────────────────────────────

    /// Replaces the watermarks and re-evaluates the state against them.
    pub fn set_watermarks(&self, low: usize, high: usize, high2: usize) -> Result<(), WatermarkError> {
        let marks = Watermarks::new(low, high, high2, self.capacity)?;
        let mut inner = self.inner.lock();
        inner.watermarks = Some(marks);
        debug!(
            target: "floodgate::queue",
            queue = %self.name,
            low, high, high2,
            "Watermarks configured"
        );
        let transition = self.recompute(&mut inner);
        drop(inner);
        self.notify_transition(transition);
        Ok(())
    }

    /// Drops every element and forces the state back to `Normal`.
    ///
    /// Wakes all blocked pushers and poppers.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        let dropped = inner.storage.len();
        inner.storage.clear();
        inner.reset_epoch = inner.reset_epoch.wrapping_add(1);
        let previous = std::mem::replace(&mut inner.state, QueueState::Normal);
        let transition = (previous != QueueState::Normal)
            .then(|| inner.stamp(previous, QueueState::Normal));
        drop(inner);

        self.not_full.notify_all();
        self.not_empty.notify_all();
        self.changed.notify_waiters();
        metrics::inc_resets(1);
        info!(
            target: "floodgate::queue",
            queue = %self.name,
            dropped,
            "Queue reset"
        );

        self.notify_transition(transition);
    }

    /// Makes every push fail with [`PushError::Disabled`] and wakes blocked pushers.
    pub fn disable_push_back(&self) {
        self.inner.lock().push_disabled = true;
        self.not_full.notify_all();
        self.changed.notify_waiters();
    }

    pub fn enable_push_back(&self) {
        self.inner.lock().push_disabled = false;
    }

    // ───────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn supports_timed_operations(&self) -> bool {
        self.timed_operations
    }

    /// Snapshot of the element count.
    pub fn num_elements(&self) -> usize {
        self.inner.lock().storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_elements() == 0
    }

    pub fn state(&self) -> QueueState {
        self.inner.lock().state
    }

    pub fn is_push_back_disabled(&self) -> bool {
        self.inner.lock().push_disabled
    }

    /// `None` until [`set_watermarks`](Self::set_watermarks) succeeds.
    pub fn watermarks(&self) -> Option<Watermarks> {
        self.inner.lock().watermarks
    }

    pub fn low_watermark(&self) -> usize {
        self.watermarks().map_or(0, |m| m.low)
    }

    pub fn high_watermark(&self) -> usize {
        self.watermarks().map_or(0, |m| m.high)
    }

    pub fn high_watermark2(&self) -> usize {
        self.watermarks().map_or(0, |m| m.high2)
    }

    // ───────────────────────────────────────────────────────────
    // Internals
    // ───────────────────────────────────────────────────────────

    fn pushed(&self, mut inner: MutexGuard<'_, Inner<S>>) {
        let transition = self.recompute(&mut inner);
        drop(inner);
        self.not_empty.notify_one();
        self.changed.notify_waiters();
        metrics::inc_pushed(1);
        self.notify_transition(transition);
    }

    fn popped(&self, mut inner: MutexGuard<'_, Inner<S>>) {
        let transition = self.recompute(&mut inner);
        drop(inner);
        self.not_full.notify_one();
        self.changed.notify_waiters();
        metrics::inc_popped(1);
        self.notify_transition(transition);
    }

    fn recompute(&self, inner: &mut Inner<S>) -> Transition {
        let count = inner.storage.len();
        let previous = inner.state;
        let current = next_state(previous, count, self.capacity, inner.watermarks.as_ref());
        if current == previous {
            return None;
        }
        inner.state = current;

        let name = &self.name;
        let capacity = self.capacity;
        if current > previous {
            inner.warn_throttle.throttle(|| {
                warn!(
                    target: "floodgate::queue",
                    queue = %name,
                    count,
                    capacity,
                    from = %previous,
                    to = %current,
                    "Queue state escalated"
                );
            });
        } else {
            debug!(
                target: "floodgate::queue",
                queue = %name,
                count,
                from = %previous,
                to = %current,
                "Queue state relaxed"
            );
        }
        Some(inner.stamp(previous, current))
    }

    fn notify_transition(&self, transition: Transition) {
        let Some(change) = transition else {
            return;
        };
        metrics::inc_state_transitions(1);

        let delivered = self.delivered.lock();
        if change.seq <= delivered.get() {
            debug!(
                target: "floodgate::queue",
                queue = %self.name,
                from = %change.previous,
                to = %change.current,
                "Superseded state change not delivered"
            );
            return;
        }
        delivered.set(change.seq);

        let callback = self.on_state_change.read().clone();
        if let Some(callback) = callback {
            callback(change.previous, change.current);
        }
    }
}

impl<T, S: BoundedStorage<T>> fmt::Debug for MonitoredQueue<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MonitoredQueue")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("num_elements", &inner.storage.len())
            .field("state", &inner.state)
            .field("watermarks", &inner.watermarks)
            .field("timed_operations", &self.timed_operations)
            .finish()
    }
}
