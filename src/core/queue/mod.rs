//! Floodgate queue module.
//!
//! Defines the bounded storage abstraction and the watermark-monitored
//! queue built on top of it.
//!
//! Supports:
//! - Blocking, non-blocking and timed push/pop
//! - Three-level watermarks with hysteresis for backpressure signalling

pub mod async_ops;
pub mod fixed;
pub mod monitored;
pub mod state;

pub use fixed::FixedQueue;
pub use monitored::MonitoredQueue;
pub use state::{QueueState, Watermarks};

/// Trait representing the fixed-capacity FIFO storage under a monitored queue.
///
/// Implementations do not synchronise on their own account: the
/// [`MonitoredQueue`] owning the storage serialises every call under its lock.
pub trait BoundedStorage<T>: Send {
    /// Append at the tail, handing the item back when at capacity.
    fn try_push(&mut self, item: T) -> Result<(), T>;

    /// Remove from the head.
    fn try_pop(&mut self) -> Option<T>;

    /// Number of elements currently stored.
    fn len(&self) -> usize;

    /// Maximum number of elements the storage holds.
    fn capacity(&self) -> usize;

    /// Drop every stored element.
    fn clear(&mut self);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
