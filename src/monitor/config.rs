use std::time::Duration;

/// Read timeout for live capture.
///
/// libpcap returns `TimeoutExpired` after this long without traffic, which
/// lets the capture loop notice the shutdown flag on a quiet interface.
pub const CAPTURE_TIMEOUT_MS: i32 = 200;

/// Capacity of the report channel between the capture thread and the UI.
///
/// Alerts are advisory, so when the UI falls this far behind new reports are
/// dropped and counted rather than blocking capture.
pub const REPORT_QUEUE_DEPTH: usize = 256;

/// Default interval, in packet time, between idle-window sweeps of the detector.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Number of sources listed in the session summary.
pub const TOP_TALKERS: usize = 5;

pub const DNS_PORT: u16 = 53;
pub const MDNS_PORT: u16 = 5353;
pub const DHCP_PORTS: [u16; 2] = [67, 68];
pub const NTP_PORT: u16 = 123;
pub const HTTP_PORTS: [u16; 2] = [80, 8080];
