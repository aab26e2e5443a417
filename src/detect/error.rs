use thiserror::Error;

/// Invalid detector configuration. Raised by [`AttackDetector::new`] and never
/// at packet time.
///
/// [`AttackDetector::new`]: crate::detect::AttackDetector::new
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{event}: window duration must be a positive number of seconds, got {value}")]
    InvalidWindow { event: &'static str, value: f64 },

    #[error("{event}: threshold multiplier must be positive, got {value}")]
    InvalidMultiplier { event: &'static str, value: f64 },

    #[error("{event}: initial baseline rate must be zero or positive, got {value}")]
    InvalidBaseline { event: &'static str, value: f64 },

    #[error("EWMA alpha must be in (0, 1], got {0}")]
    InvalidAlpha(f64),

    #[error("decay factor must be in [0, 1), got {0}")]
    InvalidDecay(f64),

    #[error("alert cooldown must be zero or positive, got {0}")]
    InvalidCooldown(f64),

    #[error("minimum alert rate must be zero or positive, got {0}")]
    InvalidMinAlertRate(f64),
}

/// A packet claimed a layer but did not carry a field detection needs.
///
/// Only the affected event type is skipped; the packet is still inspected
/// for the others and the next packet is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessingError {
    #[error("{event} check skipped: {layer} layer present but {field} is missing")]
    MissingField {
        event: &'static str,
        layer: &'static str,
        field: &'static str,
    },
}
