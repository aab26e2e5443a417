//! EWMA baseline and dynamic alert threshold for one event type.

/// Smoothed baseline rate shared by every source of one event type.
///
/// Each update first decays the baseline and then blends in the observed
/// rate, so a stale elevated baseline keeps fading even while new
/// observations pull it around. For a constant rate `r` the threshold
/// settles at `multiplier * alpha / (alpha + decay - alpha * decay) * r`.
#[derive(Debug, Clone)]
pub struct AdaptiveThreshold {
    baseline:   f64,
    initial:    f64,
    alpha:      f64,
    decay:      f64,
    multiplier: f64,
}

impl AdaptiveThreshold {
    /// Parameters are expected to be validated by [`DetectorConfig`].
    ///
    /// [`DetectorConfig`]: crate::detect::DetectorConfig
    pub fn new(initial: f64, alpha: f64, decay: f64, multiplier: f64) -> Self {
        Self {
            baseline: initial,
            initial,
            alpha,
            decay,
            multiplier,
        }
    }

    /// Folds one observation into the baseline and returns the new threshold.
    ///
    /// Must be called once per qualifying event. Negative rates are clamped
    /// to zero so the baseline never goes negative.
    pub fn update_and_get_threshold(&mut self, observed_rate: f64) -> f64 {
        let observed = observed_rate.max(0.0);
        self.baseline *= 1.0 - self.decay;
        self.baseline = self.alpha * observed + (1.0 - self.alpha) * self.baseline;
        self.baseline * self.multiplier
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Restores the configured initial baseline.
    pub fn reset(&mut self) {
        self.baseline = self.initial;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_decay_applied_before_blend() {
        let mut t = AdaptiveThreshold::new(1.2, 0.2, 0.3, 2.0);

        // 1.2 * 0.7 = 0.84, then 0.2 * 1.0 + 0.8 * 0.84 = 0.872
        let threshold = t.update_and_get_threshold(1.0);
        assert!(approx(t.baseline(), 0.872));
        assert!(approx(threshold, 1.744));
    }

    #[test]
    fn test_baseline_converges_for_constant_rate() {
        let mut t = AdaptiveThreshold::new(3.0, 0.2, 0.1, 2.0);
        for _ in 0..500 {
            t.update_and_get_threshold(4.0);
        }
        let steady = 0.2 / (0.2 + 0.1 - 0.2 * 0.1) * 4.0;
        assert!((t.baseline() - steady).abs() < 1e-6);
    }

    #[test]
    fn test_negative_rate_is_clamped() {
        let mut t = AdaptiveThreshold::new(0.0, 0.5, 0.3, 2.0);
        let threshold = t.update_and_get_threshold(-10.0);
        assert_eq!(t.baseline(), 0.0);
        assert_eq!(threshold, 0.0);
    }

    #[test]
    fn test_reset_restores_initial() {
        let mut t = AdaptiveThreshold::new(2.0, 0.2, 0.3, 2.0);
        t.update_and_get_threshold(50.0);
        assert!(t.baseline() > 2.0);
        t.reset();
        assert_eq!(t.baseline(), 2.0);
    }
}
