//! Alert values produced by the detector and their display formats.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Rate-based event types, in the order the detector checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FloodKind {
    Syn,
    Dns,
    Arp,
}

impl FloodKind {
    /// Lowercase label used in rates ("syn/sec").
    pub fn label(self) -> &'static str {
        match self {
            FloodKind::Syn => "syn",
            FloodKind::Dns => "dns",
            FloodKind::Arp => "arp",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            FloodKind::Syn => "SYN",
            FloodKind::Dns => "DNS",
            FloodKind::Arp => "ARP",
        }
    }

    /// Alert text for a flood of this kind from `source` at `rate` events/sec.
    pub fn caution(self, source: &str, rate: f64) -> String {
        format!(
            "{} Flood Caution: High {} rate from {} ({:.2} {}/sec)",
            self.tag(),
            self.label(),
            source,
            rate,
            self.label()
        )
    }
}

/// Address conflicts reported by the spoof tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "finding", rename_all = "snake_case")]
pub enum SpoofFinding {
    /// One link-layer address has announced several network addresses.
    LinkClaimsMany { link: String, claimed: Vec<String> },
    /// One network address has been announced by several link-layer addresses.
    AddressClaimedByMany { address: String, links: Vec<String> },
}

impl fmt::Display for SpoofFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpoofFinding::LinkClaimsMany { link, claimed } => write!(
                f,
                "ARP Spoof Caution: {} claims multiple addresses ({})",
                link,
                claimed.join(", ")
            ),
            SpoofFinding::AddressClaimedByMany { address, links } => write!(
                f,
                "ARP Spoof Caution: {} claimed by multiple link addresses ({})",
                address,
                links.join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AlertKind {
    Flood {
        kind:   FloodKind,
        source: String,
        /// Events per second over the source's window.
        rate:   f64,
    },
    Spoof(SpoofFinding),
}

/// One-shot alert handed to the caller of [`AttackDetector::inspect`].
///
/// [`AttackDetector::inspect`]: crate::detect::AttackDetector::inspect
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    /// Time since the start of the capture session.
    pub at:   Duration,
    pub kind: AlertKind,
}

impl Alert {
    pub fn flood(at: Duration, kind: FloodKind, source: &str, rate: f64) -> Self {
        Self {
            at,
            kind: AlertKind::Flood { kind, source: source.to_string(), rate },
        }
    }

    pub fn spoof(at: Duration, finding: SpoofFinding) -> Self {
        Self { at, kind: AlertKind::Spoof(finding) }
    }

    /// Message body without the relative-time prefix.
    pub fn message(&self) -> String {
        match &self.kind {
            AlertKind::Flood { kind, source, rate } => kind.caution(source, *rate),
            AlertKind::Spoof(finding) => finding.to_string(),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}] {}", self.at.as_secs_f64(), self.message())
    }
}
