use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Set to `true` by the Ctrl+C handler; the capture loop exits on its next wakeup.
pub type ShutdownFlag = Arc<AtomicBool>;

pub type SharedStats = Arc<SessionStats>;

/// Protocols counted for the session summary.
///
/// Classification is by header and well-known port, so a packet can count
/// towards several (an IPv4 UDP DNS query counts as IP, UDP and DNS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Ip,
    Tcp,
    Udp,
    Dns,
    Dhcp,
    Http,
    Ntp,
    Arp,
}

impl Protocol {
    pub const ALL: [Protocol; 8] = [
        Protocol::Ip,
        Protocol::Tcp,
        Protocol::Udp,
        Protocol::Dns,
        Protocol::Dhcp,
        Protocol::Http,
        Protocol::Ntp,
        Protocol::Arp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Protocol::Ip   => "IP",
            Protocol::Tcp  => "TCP",
            Protocol::Udp  => "UDP",
            Protocol::Dns  => "DNS",
            Protocol::Dhcp => "DHCP",
            Protocol::Http => "HTTP",
            Protocol::Ntp  => "NTP",
            Protocol::Arp  => "ARP",
        }
    }
}

/// Running totals for the current process, shared between the capture
/// thread (writer) and `main` (summary).
#[derive(Debug, Default)]
pub struct SessionStats {
    /// Every frame handed to the dissector, parsable or not.
    pub packets_total:     AtomicU64,
    /// Alerts delivered to the UI thread.
    pub alerts_emitted:    AtomicU64,
    /// Packets the detector could not fully inspect.
    pub processing_errors: AtomicU64,
    /// Reports discarded because the UI thread was behind.
    pub reports_dropped:   AtomicU64,
    /// Live per-source windows when capture stopped.
    pub sources_tracked:   AtomicUsize,
    /// Per-protocol counters, indexed by [`Protocol::ALL`] position.
    protocols:             [AtomicU64; 8],
    /// Packets per network-layer source address.
    talkers:               DashMap<String, u64>,
}

impl SessionStats {
    pub fn new() -> SharedStats {
        Arc::new(Self::default())
    }

    pub fn count_protocol(&self, proto: Protocol) {
        self.protocols[proto as usize].fetch_add(1, Ordering::Relaxed);
    }

    pub fn protocol_count(&self, proto: Protocol) -> u64 {
        self.protocols[proto as usize].load(Ordering::Relaxed)
    }

    /// `(name, count)` for every protocol, in [`Protocol::ALL`] order.
    pub fn protocol_counts(&self) -> Vec<(&'static str, u64)> {
        Protocol::ALL
            .iter()
            .map(|p| (p.name(), self.protocol_count(*p)))
            .collect()
    }

    pub fn count_talker(&self, src: &str) {
        if let Some(mut n) = self.talkers.get_mut(src) {
            *n += 1;
            return;
        }
        *self.talkers.entry(src.to_string()).or_insert(0) += 1;
    }

    /// The `n` busiest sources, highest count first, ties broken by address.
    pub fn top_talkers(&self, n: usize) -> Vec<(String, u64)> {
        let mut all: Vec<(String, u64)> = self
            .talkers
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        all.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        all.truncate(n);
        all
    }
}
