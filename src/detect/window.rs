//! Sliding time window of event timestamps for a single source.

use std::collections::VecDeque;
use std::time::Duration;

/// Recent event timestamps for one (event type, source) pair.
///
/// Timestamps are appended at the tail and evicted from the head, so the
/// deque stays ordered oldest-first as long as the capture clock is
/// non-decreasing. Out-of-order timestamps are accepted; eviction then stops
/// at the first head entry that is not expired, which can leave stale
/// entries behind it until the head itself ages out.
#[derive(Debug, Default, Clone)]
pub struct EventWindow {
    times: VecDeque<Duration>,
}

impl EventWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event timestamp at the tail.
    pub fn record(&mut self, at: Duration) {
        self.times.push_back(at);
    }

    /// Drops head entries older than `window` relative to `now`.
    ///
    /// An entry exactly `window` old is kept. The subtraction saturates, so a
    /// head timestamp later than `now` is treated as fresh.
    pub fn evict_expired(&mut self, now: Duration, window: Duration) {
        while let Some(t) = self.times.front() {
            if now.saturating_sub(*t) > window {
                self.times.pop_front();
            } else {
                break;
            }
        }
    }

    /// Number of retained timestamps.
    pub fn count(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_record_and_count() {
        let mut w = EventWindow::new();
        assert!(w.is_empty());
        w.record(ms(10));
        w.record(ms(20));
        assert_eq!(w.count(), 2);
    }

    #[test]
    fn test_evict_keeps_only_entries_within_window() {
        let mut w = EventWindow::new();
        for t in [0, 200, 400, 900, 1000, 1500] {
            w.record(ms(t));
        }

        let now = ms(1500);
        let window = ms(1000);
        w.evict_expired(now, window);

        // 0, 200 and 400 are more than one second old.
        assert_eq!(w.count(), 3);
        let expected = [900u64, 1000, 1500]
            .iter()
            .filter(|t| now - ms(**t) <= window)
            .count();
        assert_eq!(w.count(), expected);
    }

    #[test]
    fn test_boundary_entry_is_retained() {
        let mut w = EventWindow::new();
        w.record(ms(0));
        w.evict_expired(ms(5000), Duration::from_secs(5));
        assert_eq!(w.count(), 1);

        w.evict_expired(ms(5001), Duration::from_secs(5));
        assert_eq!(w.count(), 0);
    }

    #[test]
    fn test_out_of_order_does_not_panic() {
        let mut w = EventWindow::new();
        w.record(ms(3000));
        w.record(ms(100));
        w.record(ms(3100));

        // The head (3000) is fresh, so the stale 100 behind it survives.
        w.evict_expired(ms(3200), ms(1000));
        assert_eq!(w.count(), 3);

        // A "now" earlier than the head saturates to zero age.
        w.evict_expired(ms(50), ms(1000));
        assert_eq!(w.count(), 3);

        // Once the head ages out the whole backlog drains.
        w.evict_expired(ms(10_000), ms(1000));
        assert!(w.is_empty());
    }
}
