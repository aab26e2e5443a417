//! Capture engine.
//!
//! A dedicated capture thread owns the [`AttackDetector`]. It reads frames
//! from libpcap (a live interface or one or more pcap files), dissects them,
//! updates session statistics and hands whatever the detector reports to the
//! calling thread over a bounded channel. The calling thread does nothing but
//! log, so a slow terminal or log file never stalls capture.
//!
//! Packet time is the pcap header timestamp relative to the first packet of
//! the session. Each replay file is its own session: the detector is reset
//! and the clock restarts.

pub mod config;
pub mod dissect;
pub mod error;
pub mod eviction;
pub mod parsers;
pub mod types;

pub use error::MonitorError;

use crate::detect::{Alert, AttackDetector, DetectorConfig, ProcessingError};
use crate::logger::{Event, SharedLogger};
use crate::monitor::config::{CAPTURE_TIMEOUT_MS, REPORT_QUEUE_DEPTH};
use crate::monitor::dissect::{dissect, hexdump};
use crate::monitor::eviction::IdleSweeper;
use crate::monitor::types::{SharedStats, ShutdownFlag};

use pcap::{Activated, Active, Capture, Device};
use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread;
use std::time::Duration;

/// Where packets come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSource {
    /// Promiscuous capture on `iface`, or libpcap's default device.
    Live { iface: Option<String> },
    /// Offline replay, one session per file, in order.
    Replay { files: Vec<String> },
}

/// Configuration bundle passed from `main` into the capture engine.
pub struct MonitorConfig {
    pub source:         CaptureSource,
    pub detector:       DetectorConfig,
    pub logger:         SharedLogger,
    pub stats:          SharedStats,
    /// Set by the Ctrl+C handler; capture stops at the next wakeup.
    pub shutdown:       ShutdownFlag,
    /// Packet-time interval between idle sweeps. Zero disables sweeping.
    pub sweep_interval: Duration,
    /// Log a one-line summary of every packet.
    pub verbose:        bool,
    /// Payload bytes hexdumped under each verbose line. Zero disables.
    pub payload_bytes:  usize,
}

/// What the capture thread hands to the logging thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Alert(Alert),
    Fault { at: Duration, error: ProcessingError },
}

/// Runs a capture session to completion.
///
/// Returns once the source is exhausted (replay) or the shutdown flag is set.
/// Configuration problems and a live device that cannot be opened are
/// reported before any packet is read. An unreadable replay file is logged
/// and skipped.
pub fn start_monitor(cfg: MonitorConfig) -> Result<(), MonitorError> {
    let detector = AttackDetector::new(cfg.detector.clone())?;

    let (input, lossless) = match &cfg.source {
        CaptureSource::Live { iface } => {
            let (cap, name) = open_live(iface.as_deref())?;
            cfg.logger.log(&Event::Info {
                message: &format!("Capturing on {}", name),
            });
            (Input::Live(cap), false)
        }
        // Offline input can wait for the logger, so nothing is dropped.
        CaptureSource::Replay { files } => (Input::Replay(files.clone()), true),
    };

    let (tx, rx) = mpsc::sync_channel(REPORT_QUEUE_DEPTH);
    let worker = CaptureLoop {
        detector,
        sweeper:  IdleSweeper::new(cfg.sweep_interval),
        reports:  tx,
        lossless,
        origin:   None,
        logger:   SharedLogger::clone(&cfg.logger),
        stats:    SharedStats::clone(&cfg.stats),
        shutdown: ShutdownFlag::clone(&cfg.shutdown),
        verbose:  cfg.verbose,
        payload_bytes: cfg.payload_bytes,
    };
    let handle = thread::spawn(move || worker.run(input));

    // Ends when the capture thread drops its sender.
    for report in rx {
        log_report(&cfg, &report);
    }

    handle.join().map_err(|_| MonitorError::WorkerPanicked)?
}

fn log_report(cfg: &MonitorConfig, report: &Report) {
    match report {
        Report::Alert(alert) => {
            cfg.stats.alerts_emitted.fetch_add(1, Ordering::Relaxed);
            cfg.logger.log(&Event::from_alert(alert));
        }
        Report::Fault { at, error } => {
            cfg.stats.processing_errors.fetch_add(1, Ordering::Relaxed);
            cfg.logger.log(&Event::from_error(at.as_secs_f64(), error));
        }
    }
}

/// Opens a promiscuous live capture. The read timeout lets the loop notice
/// the shutdown flag on a quiet interface.
fn open_live(iface: Option<&str>) -> Result<(Capture<Active>, String), MonitorError> {
    let device = match iface {
        Some(name) => Device::from(name),
        None => Device::lookup()
            .map_err(MonitorError::Lookup)?
            .ok_or(MonitorError::NoDevice)?,
    };
    let name = device.name.clone();

    let cap = Capture::from_device(device)
        .and_then(|c| c.promisc(true).timeout(CAPTURE_TIMEOUT_MS).open())
        .map_err(|source| MonitorError::OpenDevice { name: name.clone(), source })?;

    Ok((cap, name))
}

enum Input {
    Live(Capture<Active>),
    Replay(Vec<String>),
}

// ── Capture thread ────────────────────────────────────────────────────────────

struct CaptureLoop {
    detector: AttackDetector,
    sweeper:  IdleSweeper,
    reports:  SyncSender<Report>,
    /// Block on a full report queue instead of dropping.
    lossless: bool,
    /// pcap timestamp of the first packet of the current session.
    origin:   Option<Duration>,
    logger:   SharedLogger,
    stats:    SharedStats,
    shutdown: ShutdownFlag,
    verbose:  bool,
    payload_bytes: usize,
}

impl CaptureLoop {
    fn run(mut self, input: Input) -> Result<(), MonitorError> {
        let result = match input {
            Input::Live(cap) => self.drain(cap),
            Input::Replay(files) => {
                for path in files {
                    if self.shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    if let Err(e) = self.replay(&path) {
                        self.logger.log(&Event::Info { message: &e.to_string() });
                    }
                }
                Ok(())
            }
        };

        self.stats
            .sources_tracked
            .store(self.detector.tracked_sources(), Ordering::Relaxed);
        result
    }

    fn replay(&mut self, path: &str) -> Result<(), MonitorError> {
        let cap = Capture::from_file(path).map_err(|source| MonitorError::OpenFile {
            path: path.to_string(),
            source,
        })?;

        self.logger.log(&Event::Info {
            message: &format!("Replaying {}", path),
        });
        self.begin_session();
        self.drain(cap)
    }

    fn begin_session(&mut self) {
        self.detector.reset();
        self.sweeper.reset();
        self.origin = None;
    }

    fn drain<T: Activated + ?Sized>(&mut self, mut cap: Capture<T>) -> Result<(), MonitorError> {
        while !self.shutdown.load(Ordering::Relaxed) {
            match cap.next_packet() {
                Ok(pkt) => {
                    let ts = pkt.header.ts;
                    let stamp = Duration::new(
                        ts.tv_sec.max(0) as u64,
                        (ts.tv_usec.max(0) as u32).saturating_mul(1_000),
                    );
                    let at = self.elapsed(stamp);
                    self.process(pkt.data, at);
                }
                Err(pcap::Error::TimeoutExpired) => continue,
                Err(pcap::Error::NoMorePackets) => break,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Session-relative time of a packet stamped `stamp`.
    fn elapsed(&mut self, stamp: Duration) -> Duration {
        let origin = *self.origin.get_or_insert(stamp);
        stamp.saturating_sub(origin)
    }

    fn process(&mut self, frame: &[u8], at: Duration) {
        self.stats.packets_total.fetch_add(1, Ordering::Relaxed);

        let payload_limit = if self.verbose { self.payload_bytes } else { 0 };
        if let Some(pkt) = dissect(frame, payload_limit) {
            for proto in &pkt.protocols {
                self.stats.count_protocol(*proto);
            }
            if let Some(src) = pkt.summary.network_src.as_deref() {
                self.stats.count_talker(src);
            }
            if self.verbose {
                self.logger.log(&Event::Packet {
                    at:      at.as_secs_f64(),
                    summary: &pkt.line,
                    payload: (!pkt.payload.is_empty()).then(|| hexdump(&pkt.payload)),
                });
            }

            match self.detector.inspect(&pkt.summary, at) {
                Ok(Some(alert)) => self.report(Report::Alert(alert)),
                Ok(None) => {}
                Err(error) => self.report(Report::Fault { at, error }),
            }
        }

        self.sweeper.maybe_sweep(&mut self.detector, at);
    }

    fn report(&self, report: Report) {
        if self.lossless {
            // Only fails once the receiver is gone, at which point nobody is
            // listening anyway.
            let _ = self.reports.send(report);
            return;
        }
        if let Err(TrySendError::Full(_)) = self.reports.try_send(report) {
            self.stats.reports_dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}
