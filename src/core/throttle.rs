//! Rate limiting for repetitive side effects (mostly log lines).
//!
//! A [`ThrottledAction`] lets an action run at most `max_per_interval` times
//! within each `interval`. Attempts past the limit are counted, and when the
//! next interval opens a reset hook reports how many were suppressed.

use std::time::{Duration, Instant};

use tracing::info;

#[derive(Debug, Clone)]
pub struct ThrottledAction {
    interval: Duration,
    max_per_interval: u32,
    count_since_last_reset: u32,
    last_reset: Instant,
}

impl ThrottledAction {
    pub fn new(interval: Duration, max_per_interval: u32) -> Self {
        Self {
            interval,
            max_per_interval,
            count_since_last_reset: 0,
            last_reset: Instant::now(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_per_interval(&self) -> u32 {
        self.max_per_interval
    }

    /// Attempts made in the current interval, including suppressed ones.
    pub fn count_since_last_reset(&self) -> u32 {
        self.count_since_last_reset
    }

    /// Runs `action` unless the per-interval budget is spent. Returns whether it ran.
    ///
    /// When a new interval starts after actions were suppressed, an `info!`
    /// line reports how many were skipped.
    pub fn throttle<F: FnOnce()>(&mut self, action: F) -> bool {
        self.throttle_with_reset(action, |skipped| {
            info!(
                target: "floodgate::throttle",
                skipped,
                "Throttled action skipped during the last interval"
            );
        })
    }

    /// Like [`throttle`](Self::throttle), but the interval never restarts.
    pub fn throttle_no_reset<F: FnOnce()>(&mut self, action: F) -> bool {
        self.count_since_last_reset = self.count_since_last_reset.saturating_add(1);
        if self.count_since_last_reset <= self.max_per_interval {
            action();
            true
        } else {
            false
        }
    }

    /// Like [`throttle`](Self::throttle) with a custom reset hook, which receives
    /// the number of suppressed attempts. The hook only runs if something was
    /// suppressed.
    pub fn throttle_with_reset<F, R>(&mut self, action: F, on_reset: R) -> bool
    where
        F: FnOnce(),
        R: FnOnce(u32),
    {
        let now = Instant::now();
        if now.duration_since(self.last_reset) >= self.interval {
            if self.count_since_last_reset > self.max_per_interval {
                on_reset(self.count_since_last_reset - self.max_per_interval);
            }
            self.count_since_last_reset = 0;
            self.last_reset = now;
        }
        self.throttle_no_reset(action)
    }
}
