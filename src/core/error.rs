use std::fmt;

/// Status code for a queue that is full (push) or empty (pop).
pub const RC_UNAVAILABLE: i32 = -1;
/// Status code for a deadline that passed before the operation could complete.
pub const RC_TIMEOUT: i32 = -2;
/// Status code for a queue that was disabled (push) or reset (pop) underneath the caller.
pub const RC_INTERRUPTED: i32 = -3;
/// Status code for a timed operation on a queue built without timed support.
pub const RC_UNSUPPORTED: i32 = -4;

/// Failure of a push. The rejected item is handed back to the caller.
#[derive(PartialEq, Eq)]
pub enum PushError<T> {
    /// The queue is at capacity (`try_push_back` only).
    Full(T),
    /// The deadline of a `timed_push_back` passed first.
    Timeout(T),
    /// Pushing has been disabled on the queue.
    Disabled(T),
    /// Timed push on a queue constructed without timed operations.
    TimedOperationsUnsupported(T),
}

impl<T> PushError<T> {
    /// Returns the item that could not be enqueued.
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full(item)
            | PushError::Timeout(item)
            | PushError::Disabled(item)
            | PushError::TimedOperationsUnsupported(item) => item,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            PushError::Full(_) => RC_UNAVAILABLE,
            PushError::Timeout(_) => RC_TIMEOUT,
            PushError::Disabled(_) => RC_INTERRUPTED,
            PushError::TimedOperationsUnsupported(_) => RC_UNSUPPORTED,
        }
    }
}

// Manual impl so payloads need not be `Debug`.
impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PushError::Full(_) => "Full",
            PushError::Timeout(_) => "Timeout",
            PushError::Disabled(_) => "Disabled",
            PushError::TimedOperationsUnsupported(_) => "TimedOperationsUnsupported",
        };
        write!(f, "PushError::{name}(..)")
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Full(_) => write!(f, "Queue is full"),
            PushError::Timeout(_) => write!(f, "Timed out waiting for queue capacity"),
            PushError::Disabled(_) => write!(f, "Queue is disabled for pushing"),
            PushError::TimedOperationsUnsupported(_) => {
                write!(f, "Queue was not configured for timed operations")
            }
        }
    }
}

impl<T> std::error::Error for PushError<T> {}

/// Failure of a pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopError {
    /// The queue is empty (`try_pop_front` only).
    Empty,
    /// The deadline of a `timed_pop_front` passed first.
    Timeout,
    /// The queue was reset while the caller was waiting for an element.
    Reset,
    /// Timed pop on a queue constructed without timed operations.
    TimedOperationsUnsupported,
}

impl PopError {
    pub fn code(&self) -> i32 {
        match self {
            PopError::Empty => RC_UNAVAILABLE,
            PopError::Timeout => RC_TIMEOUT,
            PopError::Reset => RC_INTERRUPTED,
            PopError::TimedOperationsUnsupported => RC_UNSUPPORTED,
        }
    }
}

impl fmt::Display for PopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopError::Empty => write!(f, "Queue is empty"),
            PopError::Timeout => write!(f, "Timed out waiting for an element"),
            PopError::Reset => write!(f, "Queue was reset while waiting"),
            PopError::TimedOperationsUnsupported => {
                write!(f, "Queue was not configured for timed operations")
            }
        }
    }
}

impl std::error::Error for PopError {}

/// Rejected watermark configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkError {
    pub low: usize,
    pub high: usize,
    pub high2: usize,
    pub capacity: usize,
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid watermarks: expected low <= high <= high2 <= capacity, got {} / {} / {} with capacity {}",
            self.low, self.high, self.high2, self.capacity
        )
    }
}

impl std::error::Error for WatermarkError {}
