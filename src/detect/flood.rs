//! Per-event-type flood detection.
//!
//! Every source gets its own [`EventWindow`], but all sources of one event
//! type share a single [`AdaptiveThreshold`]. The baseline is therefore fed by
//! whichever source produced the current event, which makes it follow the most
//! active sender rather than a true global average. This matches the
//! behaviour the detector has always had and is kept on purpose.

use crate::detect::alert::FloodKind;
use crate::detect::config::FloodConfig;
use crate::detect::threshold::AdaptiveThreshold;
use crate::detect::window::EventWindow;
use std::collections::HashMap;
use std::time::Duration;

/// Outcome of feeding one qualifying event into a [`FloodDetector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloodCheck {
    /// Events/sec for the source over its window.
    pub rate:      f64,
    /// Threshold after folding this event into the baseline.
    pub threshold: f64,
}

impl FloodCheck {
    pub fn is_flood(&self) -> bool {
        self.rate >= self.threshold
    }
}

#[derive(Debug, Clone)]
pub struct FloodDetector {
    kind:        FloodKind,
    window:      Duration,
    window_secs: f64,
    threshold:   AdaptiveThreshold,
    sources:     HashMap<String, EventWindow>,
}

impl FloodDetector {
    /// `cfg` must already be validated; a zero window would divide by zero.
    pub fn new(kind: FloodKind, cfg: &FloodConfig, alpha: f64, decay: f64) -> Self {
        Self {
            kind,
            window:      cfg.window(),
            window_secs: cfg.window_secs,
            threshold:   AdaptiveThreshold::new(cfg.initial_baseline, alpha, decay, cfg.multiplier),
            sources:     HashMap::new(),
        }
    }

    pub fn kind(&self) -> FloodKind {
        self.kind
    }

    /// Records one qualifying event from `source` at `now` and evaluates it.
    ///
    /// Only the source's own window is evicted; other windows age out when
    /// their sources send again or on the next [`sweep`](Self::sweep).
    pub fn observe(&mut self, source: &str, now: Duration) -> FloodCheck {
        let span = self.window;
        // Only a source seen for the first time costs a key allocation.
        let count = match self.sources.get_mut(source) {
            Some(window) => Self::record(window, now, span),
            None => {
                let mut window = EventWindow::new();
                let count = Self::record(&mut window, now, span);
                self.sources.insert(source.to_string(), window);
                count
            }
        };

        let rate = count as f64 / self.window_secs;
        let threshold = self.threshold.update_and_get_threshold(rate);
        FloodCheck { rate, threshold }
    }

    fn record(window: &mut EventWindow, now: Duration, span: Duration) -> usize {
        window.record(now);
        window.evict_expired(now, span);
        window.count()
    }

    /// Evicts expired entries everywhere and drops windows left empty.
    ///
    /// An empty window behaves exactly like a missing one, so this never
    /// changes what [`observe`](Self::observe) reports.
    pub fn sweep(&mut self, now: Duration) {
        let window = self.window;
        self.sources.retain(|_, w| {
            w.evict_expired(now, window);
            !w.is_empty()
        });
    }

    /// Number of sources with a live window.
    pub fn tracked_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn baseline(&self) -> f64 {
        self.threshold.baseline()
    }

    pub fn reset(&mut self) {
        self.sources.clear();
        self.threshold.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> FloodDetector {
        FloodDetector::new(FloodKind::Syn, &FloodConfig::new(1.0, 1.2, 2.0), 0.2, 0.3)
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_rate_is_count_over_window() {
        let mut d = FloodDetector::new(FloodKind::Dns, &FloodConfig::new(5.0, 3.0, 3.0), 0.2, 0.3);
        for t in 0..10 {
            d.observe("10.0.0.1", ms(t * 100));
        }
        let check = d.observe("10.0.0.1", ms(1000));
        assert!((check.rate - 11.0 / 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_second_event_crosses_initial_threshold() {
        let mut d = detector();

        let first = d.observe("10.0.0.5", ms(0));
        assert!(!first.is_flood());
        assert!((first.threshold - 1.744).abs() < 1e-9);

        let second = d.observe("10.0.0.5", ms(50));
        assert_eq!(second.rate, 2.0);
        assert!(second.is_flood());
    }

    #[test]
    fn test_windows_are_per_source() {
        let mut d = detector();
        for t in 0..5 {
            d.observe("10.0.0.1", ms(t * 10));
        }
        let other = d.observe("10.0.0.2", ms(60));
        assert_eq!(other.rate, 1.0);
        assert_eq!(d.tracked_sources(), 2);
    }

    #[test]
    fn test_repeat_source_keeps_one_window() {
        let mut d = detector();
        for t in 0..4 {
            d.observe("10.0.0.1", ms(t * 100));
        }
        assert_eq!(d.tracked_sources(), 1);
        assert_eq!(d.observe("10.0.0.1", ms(400)).rate, 5.0);

        // The first event after a sweep starts a fresh window.
        d.sweep(ms(5000));
        assert_eq!(d.tracked_sources(), 0);
        assert_eq!(d.observe("10.0.0.1", ms(5000)).rate, 1.0);
        assert_eq!(d.tracked_sources(), 1);
    }

    #[test]
    fn test_baseline_is_shared_across_sources() {
        let mut d = detector();
        for t in 0..10 {
            d.observe("10.0.0.1", ms(t * 10));
        }
        let loud = d.baseline();

        // A fresh quiet source still sees the baseline the loud one pushed up.
        let quiet = d.observe("10.0.0.2", ms(200));
        assert!(loud > 1.2);
        assert!(quiet.threshold > quiet.rate);
        assert!(!quiet.is_flood());
    }

    #[test]
    fn test_sweep_drops_only_idle_sources() {
        let mut d = detector();
        d.observe("10.0.0.1", ms(0));
        d.observe("10.0.0.2", ms(1500));

        d.sweep(ms(2000));
        assert_eq!(d.tracked_sources(), 1);

        d.sweep(ms(10_000));
        assert_eq!(d.tracked_sources(), 0);
    }

    #[test]
    fn test_reset_clears_windows_and_baseline() {
        let mut d = detector();
        for t in 0..20 {
            d.observe("10.0.0.5", ms(t * 10));
        }
        d.reset();
        assert_eq!(d.tracked_sources(), 0);
        assert_eq!(d.baseline(), 1.2);
    }
}
