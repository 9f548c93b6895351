use std::fmt;

use crate::core::error::WatermarkError;

/// Backpressure state derived from the element count of a monitored queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum QueueState {
    #[default]
    Normal,
    HighWatermarkReached,
    HighWatermark2Reached,
    QueueFilled,
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueState::Normal => write!(f, "NORMAL"),
            QueueState::HighWatermarkReached => write!(f, "HIGH_WATERMARK_REACHED"),
            QueueState::HighWatermark2Reached => write!(f, "HIGH_WATERMARK2_REACHED"),
            QueueState::QueueFilled => write!(f, "QUEUE_FILLED"),
        }
    }
}

/// The three element-count thresholds of a monitored queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermarks {
    pub low: usize,
    pub high: usize,
    pub high2: usize,
}

impl Watermarks {
    /// Builds watermarks, rejecting anything but `low <= high <= high2 <= capacity`.
    pub fn new(low: usize, high: usize, high2: usize, capacity: usize) -> Result<Self, WatermarkError> {
        let marks = Self { low, high, high2 };
        marks.validate(capacity)?;
        Ok(marks)
    }

    pub fn validate(&self, capacity: usize) -> Result<(), WatermarkError> {
        if self.low <= self.high && self.high <= self.high2 && self.high2 <= capacity {
            Ok(())
        } else {
            Err(WatermarkError {
                low: self.low,
                high: self.high,
                high2: self.high2,
                capacity,
            })
        }
    }
}

/// Computes the state for `count` elements.
///
/// Pure function of its inputs. Between `low` and `high` the current state is
/// kept, so a queue that went up only drops back to `Normal` once the count
/// falls below `low`. Without watermarks the state stays `Normal`.
pub fn next_state(
    current: QueueState,
    count: usize,
    capacity: usize,
    watermarks: Option<&Watermarks>,
) -> QueueState {
    let Some(marks) = watermarks else {
        return QueueState::Normal;
    };

    if count >= capacity {
        QueueState::QueueFilled
    } else if count >= marks.high2 {
        QueueState::HighWatermark2Reached
    } else if count >= marks.high {
        QueueState::HighWatermarkReached
    } else if count < marks.low {
        QueueState::Normal
    } else {
        current
    }
}
