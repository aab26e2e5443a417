//! Periodic cleanup of idle per-source windows.
//!
//! The detector creates a window for every source it ever sees. Sources that
//! go quiet leave an empty (or fully expired) window behind, which on a long
//! capture adds up. The sweeper runs [`AttackDetector::sweep`] on the capture
//! thread whenever `interval` of packet time has passed, so no lock or
//! second thread is needed and replayed captures sweep at their own pace.

use crate::detect::AttackDetector;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct IdleSweeper {
    interval:   Duration,
    last_sweep: Duration,
}

impl IdleSweeper {
    /// A zero interval disables sweeping.
    pub fn new(interval: Duration) -> Self {
        Self { interval, last_sweep: Duration::ZERO }
    }

    /// Sweeps `detector` if `interval` has elapsed since the previous sweep.
    /// Returns whether a sweep ran.
    pub fn maybe_sweep(&mut self, detector: &mut AttackDetector, now: Duration) -> bool {
        if self.interval.is_zero() || now.saturating_sub(self.last_sweep) < self.interval {
            return false;
        }
        detector.sweep(now);
        self.last_sweep = now;
        true
    }

    /// Restarts the interval for a new capture session.
    pub fn reset(&mut self) {
        self.last_sweep = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{DetectorConfig, PacketSummary};

    #[test]
    fn test_sweeps_on_interval() {
        let mut detector = AttackDetector::new(DetectorConfig::default()).unwrap();
        let mut sweeper = IdleSweeper::new(Duration::from_secs(10));

        detector.inspect(&PacketSummary::syn("10.0.0.1"), Duration::ZERO).unwrap();
        assert!(!sweeper.maybe_sweep(&mut detector, Duration::from_secs(3)));
        assert_eq!(detector.tracked_sources(), 1);

        assert!(sweeper.maybe_sweep(&mut detector, Duration::from_secs(10)));
        assert_eq!(detector.tracked_sources(), 0);

        assert!(!sweeper.maybe_sweep(&mut detector, Duration::from_secs(15)));
    }

    #[test]
    fn test_zero_interval_disables() {
        let mut detector = AttackDetector::new(DetectorConfig::default()).unwrap();
        let mut sweeper = IdleSweeper::new(Duration::ZERO);
        detector.inspect(&PacketSummary::syn("10.0.0.1"), Duration::ZERO).unwrap();
        assert!(!sweeper.maybe_sweep(&mut detector, Duration::from_secs(3600)));
        assert_eq!(detector.tracked_sources(), 1);
    }
}
