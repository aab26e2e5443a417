//! Attack detection engine.
//!
//! [`AttackDetector`] is the single entry point used by the capture loop. It
//! owns one [`FloodDetector`] per rate-based event type and a
//! [`SpoofTracker`], checks them in a fixed priority order for every packet,
//! and surfaces at most one alert per packet subject to a global cooldown.
//!
//! The detector performs no I/O and holds no threads. It expects packets in
//! non-decreasing timestamp order; out-of-order delivery across a window
//! boundary can keep stale events alive or evict live ones early.

pub mod alert;
pub mod config;
pub mod error;
pub mod flood;
pub mod packet;
pub mod spoof;
pub mod threshold;
pub mod window;

pub use alert::{Alert, AlertKind, FloodKind, SpoofFinding};
pub use config::{DetectorConfig, FloodConfig, SpoofConfig};
pub use error::{ConfigError, ProcessingError};
pub use flood::{FloodCheck, FloodDetector};
pub use packet::{ArpLayer, DnsLayer, PacketFields, PacketSummary, TcpFlags};
pub use spoof::SpoofTracker;
pub use threshold::AdaptiveThreshold;
pub use window::EventWindow;

use std::time::Duration;

/// Caller-owned detection state for one capture session at a time.
#[derive(Debug, Clone)]
pub struct AttackDetector {
    syn:            FloodDetector,
    dns:            FloodDetector,
    arp:            Option<FloodDetector>,
    spoof:          Option<SpoofTracker>,
    cooldown:       Duration,
    min_alert_rate: f64,
    last_alert:     Option<Duration>,
}

impl AttackDetector {
    /// Builds a detector, rejecting invalid configuration up front.
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let alpha = config.alpha;
        let decay = config.decay;

        Ok(Self {
            syn:            FloodDetector::new(FloodKind::Syn, &config.syn, alpha, decay),
            dns:            FloodDetector::new(FloodKind::Dns, &config.dns, alpha, decay),
            arp:            config
                .arp
                .as_ref()
                .map(|cfg| FloodDetector::new(FloodKind::Arp, cfg, alpha, decay)),
            spoof:          config
                .spoof
                .enabled
                .then(|| SpoofTracker::new(config.spoof.check_shared_addresses)),
            cooldown:       config.cooldown(),
            min_alert_rate: config.min_alert_rate,
            last_alert:     None,
        })
    }

    /// Inspects one packet observed at `now` (time since session start).
    ///
    /// Event types are checked in the order SYN, DNS, ARP flood, ARP
    /// spoofing, and the scan stops at the first alert candidate. Flood
    /// candidates below the minimum alert rate are dropped and the scan
    /// continues. A candidate arriving within the cooldown of the previously
    /// emitted alert is suppressed, whatever its type or source.
    ///
    /// A packet that claims a layer but lacks a needed field is skipped for
    /// that event type only. If nothing alerts, the first such problem is
    /// returned as an error; an alert on the same packet takes precedence.
    pub fn inspect<P: PacketFields + ?Sized>(
        &mut self,
        packet: &P,
        now:    Duration,
    ) -> Result<Option<Alert>, ProcessingError> {
        let mut first_error = None;
        let mut candidate = None;

        for step in [Step::Syn, Step::Dns, Step::ArpFlood, Step::Spoof] {
            match self.check(step, packet, now) {
                Ok(Some(alert)) => {
                    candidate = Some(alert);
                    break;
                }
                Ok(None) => {}
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match candidate {
            Some(alert) => Ok(self.emit(alert, now)),
            None => match first_error {
                Some(e) => Err(e),
                None => Ok(None),
            },
        }
    }

    /// Forgets all per-source history, spoofing state and the cooldown clock,
    /// and restores every baseline to its configured initial value.
    pub fn reset(&mut self) {
        self.syn.reset();
        self.dns.reset();
        if let Some(arp) = &mut self.arp {
            arp.reset();
        }
        if let Some(spoof) = &mut self.spoof {
            spoof.clear();
        }
        self.last_alert = None;
    }

    /// Drops per-source windows that hold no events within their window.
    pub fn sweep(&mut self, now: Duration) {
        self.syn.sweep(now);
        self.dns.sweep(now);
        if let Some(arp) = &mut self.arp {
            arp.sweep(now);
        }
    }

    /// Live per-source windows across all flood types.
    pub fn tracked_sources(&self) -> usize {
        self.syn.tracked_sources()
            + self.dns.tracked_sources()
            + self.arp.as_ref().map_or(0, FloodDetector::tracked_sources)
    }

    /// Link addresses known to the spoof tracker.
    pub fn tracked_links(&self) -> usize {
        self.spoof.as_ref().map_or(0, SpoofTracker::len)
    }

    pub fn baseline(&self, kind: FloodKind) -> Option<f64> {
        match kind {
            FloodKind::Syn => Some(self.syn.baseline()),
            FloodKind::Dns => Some(self.dns.baseline()),
            FloodKind::Arp => self.arp.as_ref().map(FloodDetector::baseline),
        }
    }

    // ── Per-type checks ──────────────────────────────────────────────────────

    fn check<P: PacketFields + ?Sized>(
        &mut self,
        step:   Step,
        packet: &P,
        now:    Duration,
    ) -> Result<Option<Alert>, ProcessingError> {
        match step {
            Step::Syn => {
                if !packet.has_transport_tcp() {
                    return Ok(None);
                }
                let flags = packet
                    .tcp_flags()
                    .ok_or_else(|| missing("syn", "tcp", "flags"))?;
                if !flags.is_pure_syn() {
                    return Ok(None);
                }
                let src = packet
                    .network_src()
                    .ok_or_else(|| missing("syn", "network", "source address"))?;
                Ok(self.flood_candidate(FloodKind::Syn, src, now))
            }
            Step::Dns => {
                if !packet.has_dns() {
                    return Ok(None);
                }
                let is_query = packet
                    .dns_is_query()
                    .ok_or_else(|| missing("dns", "dns", "query/response flag"))?;
                if !is_query {
                    return Ok(None);
                }
                let src = packet
                    .network_src()
                    .ok_or_else(|| missing("dns", "network", "source address"))?;
                Ok(self.flood_candidate(FloodKind::Dns, src, now))
            }
            Step::ArpFlood => {
                if self.arp.is_none() || !packet.has_arp_like_layer() {
                    return Ok(None);
                }
                let link = packet
                    .arp_link_src()
                    .ok_or_else(|| missing("arp", "arp", "sender link address"))?;
                Ok(self.flood_candidate(FloodKind::Arp, link, now))
            }
            Step::Spoof => {
                let Some(tracker) = self.spoof.as_mut() else {
                    return Ok(None);
                };
                if !packet.has_arp_like_layer() {
                    return Ok(None);
                }
                let link = packet
                    .arp_link_src()
                    .ok_or_else(|| missing("spoof", "arp", "sender link address"))?;
                let claimed = packet
                    .arp_network_src()
                    .ok_or_else(|| missing("spoof", "arp", "sender network address"))?;
                Ok(tracker
                    .observe(link, claimed)
                    .map(|finding| Alert::spoof(now, finding)))
            }
        }
    }

    /// Feeds one event to the flood detector for `kind` and returns an alert
    /// when it crosses both the adaptive threshold and the rate floor.
    fn flood_candidate(&mut self, kind: FloodKind, source: &str, now: Duration) -> Option<Alert> {
        let detector = match kind {
            FloodKind::Syn => &mut self.syn,
            FloodKind::Dns => &mut self.dns,
            FloodKind::Arp => self.arp.as_mut()?,
        };
        let check = detector.observe(source, now);
        if check.is_flood() && check.rate >= self.min_alert_rate {
            Some(Alert::flood(now, detector.kind(), source, check.rate))
        } else {
            None
        }
    }

    /// Applies the global cooldown and records the emission time.
    fn emit(&mut self, alert: Alert, now: Duration) -> Option<Alert> {
        if let Some(last) = self.last_alert {
            if now.saturating_sub(last) < self.cooldown {
                return None;
            }
        }
        self.last_alert = Some(now);
        Some(alert)
    }
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Syn,
    Dns,
    ArpFlood,
    Spoof,
}

fn missing(event: &'static str, layer: &'static str, field: &'static str) -> ProcessingError {
    ProcessingError::MissingField { event, layer, field }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn no_floor() -> DetectorConfig {
        DetectorConfig {
            syn: FloodConfig::new(1.0, 1.2, 2.0),
            min_alert_rate: 0.0,
            ..DetectorConfig::default()
        }
    }

    /// A packet that claims layers without filling them in.
    struct Truncated {
        tcp: bool,
        dns: bool,
    }

    impl PacketFields for Truncated {
        fn network_src(&self) -> Option<&str> { Some("10.0.0.7") }
        fn has_transport_tcp(&self) -> bool { self.tcp }
        fn tcp_flags(&self) -> Option<TcpFlags> { None }
        fn has_dns(&self) -> bool { self.dns }
        fn dns_is_query(&self) -> Option<bool> { None }
        fn has_arp_like_layer(&self) -> bool { false }
        fn arp_link_src(&self) -> Option<&str> { None }
        fn arp_network_src(&self) -> Option<&str> { None }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut cfg = DetectorConfig::default();
        cfg.syn.window_secs = 0.0;
        assert!(AttackDetector::new(cfg).is_err());
    }

    #[test]
    fn test_durations_beyond_range_rejected() {
        let mut cfg = DetectorConfig::default();
        cfg.syn.window_secs = 1e20;
        assert!(matches!(
            AttackDetector::new(cfg),
            Err(ConfigError::InvalidWindow { event: "syn", .. })
        ));

        let cfg = DetectorConfig { cooldown_secs: 1e20, ..DetectorConfig::default() };
        assert!(matches!(AttackDetector::new(cfg), Err(ConfigError::InvalidCooldown(_))));
    }

    #[test]
    fn test_first_crossing_alerts() {
        let mut d = AttackDetector::new(no_floor()).unwrap();
        let p = PacketSummary::syn("10.0.0.5");

        assert_eq!(d.inspect(&p, ms(0)).unwrap(), None);
        let alert = d.inspect(&p, ms(50)).unwrap().expect("second SYN crosses the threshold");
        assert_eq!(alert.kind, AlertKind::Flood {
            kind:   FloodKind::Syn,
            source: "10.0.0.5".into(),
            rate:   2.0,
        });
    }

    #[test]
    fn test_syn_ack_and_responses_ignored() {
        let mut d = AttackDetector::new(no_floor()).unwrap();
        let syn_ack = PacketSummary::tcp("10.0.0.5", TcpFlags { syn: true, ack: true });
        let response = PacketSummary::dns("10.0.0.53", false);
        for t in 0..100 {
            assert_eq!(d.inspect(&syn_ack, ms(t)).unwrap(), None);
            assert_eq!(d.inspect(&response, ms(t)).unwrap(), None);
        }
        assert_eq!(d.tracked_sources(), 0);
        assert_eq!(d.baseline(FloodKind::Syn), Some(1.2));
    }

    #[test]
    fn test_min_alert_rate_hides_slow_crossings() {
        let mut d = AttackDetector::new(DetectorConfig {
            syn: FloodConfig::new(1.0, 1.2, 2.0),
            ..DetectorConfig::default()
        })
        .unwrap();
        let p = PacketSummary::syn("10.0.0.5");

        let alerts: Vec<_> = (0..5)
            .filter_map(|i| d.inspect(&p, ms(i * 10)).unwrap())
            .collect();
        assert_eq!(alerts.len(), 1);
        assert!(matches!(alerts[0].kind, AlertKind::Flood { rate, .. } if rate == 5.0));
    }

    #[test]
    fn test_cooldown_is_global() {
        let mut d = AttackDetector::new(DetectorConfig {
            dns: FloodConfig::new(1.0, 1.2, 2.0),
            ..no_floor()
        })
        .unwrap();

        let syn = PacketSummary::syn("10.0.0.1");
        d.inspect(&syn, ms(0)).unwrap();
        assert!(d.inspect(&syn, ms(10)).unwrap().is_some());

        // A DNS flood from another host inside the cooldown is swallowed.
        let query = PacketSummary::dns("10.0.0.2", true);
        assert_eq!(d.inspect(&query, ms(100)).unwrap(), None);
        assert_eq!(d.inspect(&query, ms(200)).unwrap(), None);

        // Once the cooldown has passed it surfaces.
        let late = d.inspect(&query, ms(510)).unwrap().expect("cooldown elapsed");
        assert!(matches!(late.kind, AlertKind::Flood { kind: FloodKind::Dns, .. }));
    }

    #[test]
    fn test_spoof_alert_through_detector() {
        let mut d = AttackDetector::new(DetectorConfig::default()).unwrap();
        assert_eq!(d.inspect(&PacketSummary::arp("aa:aa:aa:aa:aa:01", "10.0.0.1"), ms(0)).unwrap(), None);

        let alert = d
            .inspect(&PacketSummary::arp("aa:aa:aa:aa:aa:01", "10.0.0.2"), ms(1000))
            .unwrap()
            .expect("second address");
        assert_eq!(
            alert.to_string(),
            "[1.00] ARP Spoof Caution: aa:aa:aa:aa:aa:01 claims multiple addresses (10.0.0.1, 10.0.0.2)"
        );
        assert_eq!(d.tracked_links(), 1);
    }

    #[test]
    fn test_spoofing_disabled() {
        let mut cfg = DetectorConfig::default();
        cfg.spoof.enabled = false;
        let mut d = AttackDetector::new(cfg).unwrap();
        d.inspect(&PacketSummary::arp("aa:aa:aa:aa:aa:01", "10.0.0.1"), ms(0)).unwrap();
        assert_eq!(d.inspect(&PacketSummary::arp("aa:aa:aa:aa:aa:01", "10.0.0.2"), ms(1000)).unwrap(), None);
    }

    #[test]
    fn test_arp_flood_optional() {
        let mut cfg = no_floor();
        cfg.spoof.enabled = false;
        cfg.arp = Some(FloodConfig::new(1.0, 1.0, 2.0));
        let mut d = AttackDetector::new(cfg).unwrap();

        let p = PacketSummary::arp("aa:aa:aa:aa:aa:01", "10.0.0.1");
        let alert = (0..10).find_map(|i| d.inspect(&p, ms(i * 20)).unwrap());
        assert!(matches!(
            alert.map(|a| a.kind),
            Some(AlertKind::Flood { kind: FloodKind::Arp, .. })
        ));
    }

    #[test]
    fn test_missing_fields_reported_per_type() {
        let mut d = AttackDetector::new(no_floor()).unwrap();

        assert_eq!(
            d.inspect(&Truncated { tcp: true, dns: false }, ms(0)),
            Err(ProcessingError::MissingField { event: "syn", layer: "tcp", field: "flags" })
        );
        assert_eq!(
            d.inspect(&Truncated { tcp: false, dns: true }, ms(0)),
            Err(ProcessingError::MissingField { event: "dns", layer: "dns", field: "query/response flag" })
        );

        // The next well-formed packet is unaffected.
        let p = PacketSummary::syn("10.0.0.5");
        assert_eq!(d.inspect(&p, ms(10)), Ok(None));
        assert!(d.inspect(&p, ms(20)).unwrap().is_some());
    }

    #[test]
    fn test_missing_source_address() {
        let mut d = AttackDetector::new(no_floor()).unwrap();
        let mut p = PacketSummary::syn("10.0.0.5");
        p.network_src = None;
        assert!(matches!(
            d.inspect(&p, ms(0)),
            Err(ProcessingError::MissingField { event: "syn", layer: "network", .. })
        ));
    }

    #[test]
    fn test_sweep_and_reset() {
        let mut d = AttackDetector::new(no_floor()).unwrap();
        d.inspect(&PacketSummary::syn("10.0.0.1"), ms(0)).unwrap();
        d.inspect(&PacketSummary::dns("10.0.0.2", true), ms(0)).unwrap();
        assert_eq!(d.tracked_sources(), 2);

        // The SYN window is one second, the DNS window five.
        d.sweep(ms(2000));
        assert_eq!(d.tracked_sources(), 1);

        d.reset();
        assert_eq!(d.tracked_sources(), 0);
        assert_eq!(d.baseline(FloodKind::Dns), Some(3.0));
    }
}
