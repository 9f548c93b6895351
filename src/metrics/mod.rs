use std::sync::atomic::{AtomicU64, Ordering};

// Global counters (low overhead). These are coarse-grained and process-wide,
// summed over every monitored queue.
static PUSHED: AtomicU64 = AtomicU64::new(0);
static POPPED: AtomicU64 = AtomicU64::new(0);
static REJECTED_FULL: AtomicU64 = AtomicU64::new(0);
static TIMED_OUT: AtomicU64 = AtomicU64::new(0);
static STATE_TRANSITIONS: AtomicU64 = AtomicU64::new(0);
static RESETS: AtomicU64 = AtomicU64::new(0);

#[inline]
pub fn inc_pushed(n: u64) {
    PUSHED.fetch_add(n, Ordering::Relaxed);
}
#[inline]
pub fn inc_popped(n: u64) {
    POPPED.fetch_add(n, Ordering::Relaxed);
}
#[inline]
pub fn inc_rejected_full(n: u64) {
    REJECTED_FULL.fetch_add(n, Ordering::Relaxed);
}
#[inline]
pub fn inc_timed_out(n: u64) {
    TIMED_OUT.fetch_add(n, Ordering::Relaxed);
}
#[inline]
pub fn inc_state_transitions(n: u64) {
    STATE_TRANSITIONS.fetch_add(n, Ordering::Relaxed);
}
#[inline]
pub fn inc_resets(n: u64) {
    RESETS.fetch_add(n, Ordering::Relaxed);
}

pub fn pushed() -> u64 {
    PUSHED.load(Ordering::Relaxed)
}

pub fn popped() -> u64 {
    POPPED.load(Ordering::Relaxed)
}

pub fn snapshot() -> String {
    // Simple text format (Prometheus-style without HELP/TYPE lines for brevity)
    format!(
        "floodgate_pushed {}\nfloodgate_popped {}\nfloodgate_rejected_full {}\nfloodgate_timed_out {}\nfloodgate_state_transitions {}\nfloodgate_resets {}\n",
        PUSHED.load(Ordering::Relaxed),
        POPPED.load(Ordering::Relaxed),
        REJECTED_FULL.load(Ordering::Relaxed),
        TIMED_OUT.load(Ordering::Relaxed),
        STATE_TRANSITIONS.load(Ordering::Relaxed),
        RESETS.load(Ordering::Relaxed),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_lists_every_counter() {
        inc_pushed(2);
        let text = snapshot();
        for name in [
            "floodgate_pushed",
            "floodgate_popped",
            "floodgate_rejected_full",
            "floodgate_timed_out",
            "floodgate_state_transitions",
            "floodgate_resets",
        ] {
            assert!(text.contains(name), "missing {name}");
        }
        assert!(pushed() >= 2);
    }
}
