//! floodwatch: live network traffic monitor with adaptive flood and ARP
//! spoofing detection.
//!
//! [`detect`] is the detection engine and has no I/O. [`monitor`] feeds it
//! from libpcap (live or pcap replay) and [`logger`] renders what it finds.

pub mod detect;
pub mod logger;
pub mod monitor;
