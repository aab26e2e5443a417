//! Detector configuration.
//!
//! Defaults follow the tuning the monitor has always shipped with: a five
//! second window, SYN threshold at twice the baseline, DNS at three times,
//! and alerts below five events per second hidden.

use crate::detect::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Window and threshold settings for one flood event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodConfig {
    /// Length of the per-source sliding window, in seconds.
    pub window_secs:      f64,
    /// Baseline rate (events/sec) used before any traffic is seen and after a reset.
    pub initial_baseline: f64,
    /// Threshold = baseline * multiplier.
    pub multiplier:       f64,
}

impl FloodConfig {
    pub fn new(window_secs: f64, initial_baseline: f64, multiplier: f64) -> Self {
        Self { window_secs, initial_baseline, multiplier }
    }

    /// Window length. Saturates for values [`DetectorConfig::validate`] rejects.
    pub fn window(&self) -> Duration {
        Duration::try_from_secs_f64(self.window_secs).unwrap_or(Duration::MAX)
    }

    fn validate(&self, event: &'static str) -> Result<(), ConfigError> {
        if self.window_secs <= 0.0 || Duration::try_from_secs_f64(self.window_secs).is_err() {
            return Err(ConfigError::InvalidWindow { event, value: self.window_secs });
        }
        if !self.multiplier.is_finite() || self.multiplier <= 0.0 {
            return Err(ConfigError::InvalidMultiplier { event, value: self.multiplier });
        }
        if !self.initial_baseline.is_finite() || self.initial_baseline < 0.0 {
            return Err(ConfigError::InvalidBaseline { event, value: self.initial_baseline });
        }
        Ok(())
    }
}

/// ARP spoofing checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoofConfig {
    pub enabled: bool,
    /// Also flag one network address announced by several link addresses.
    pub check_shared_addresses: bool,
}

impl Default for SpoofConfig {
    fn default() -> Self {
        Self { enabled: true, check_shared_addresses: true }
    }
}

/// Full detector configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub syn:            FloodConfig,
    pub dns:            FloodConfig,
    /// ARP request flood detection; off unless configured.
    pub arp:            Option<FloodConfig>,
    /// EWMA smoothing factor.
    pub alpha:          f64,
    /// Fraction of the baseline forgotten on every update.
    pub decay:          f64,
    /// Global quiet period after an emitted alert, in seconds.
    pub cooldown_secs:  f64,
    /// Flood alerts below this rate (events/sec) are not reported.
    pub min_alert_rate: f64,
    pub spoof:          SpoofConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            syn:            FloodConfig::new(5.0, 2.0, 2.0),
            dns:            FloodConfig::new(5.0, 3.0, 3.0),
            arp:            None,
            alpha:          0.2,
            decay:          0.3,
            cooldown_secs:  0.5,
            min_alert_rate: 5.0,
            spoof:          SpoofConfig::default(),
        }
    }
}

impl DetectorConfig {
    /// Checks every numeric field. A detector is never built from a config
    /// that fails here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.syn.validate("syn")?;
        self.dns.validate("dns")?;
        if let Some(arp) = &self.arp {
            arp.validate("arp")?;
        }
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(ConfigError::InvalidAlpha(self.alpha));
        }
        if !(self.decay >= 0.0 && self.decay < 1.0) {
            return Err(ConfigError::InvalidDecay(self.decay));
        }
        if Duration::try_from_secs_f64(self.cooldown_secs).is_err() {
            return Err(ConfigError::InvalidCooldown(self.cooldown_secs));
        }
        if !self.min_alert_rate.is_finite() || self.min_alert_rate < 0.0 {
            return Err(ConfigError::InvalidMinAlertRate(self.min_alert_rate));
        }
        Ok(())
    }

    /// Cooldown length. Saturates for values [`validate`](Self::validate) rejects.
    pub fn cooldown(&self) -> Duration {
        Duration::try_from_secs_f64(self.cooldown_secs).unwrap_or(Duration::MAX)
    }
}
