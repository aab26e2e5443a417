//! Structured logging for floodwatch.
//!
//! Provides a [`Logger`] that writes events to stdout and optionally to a log
//! file. Output is either human-readable plain text or newline-delimited JSON
//! (NDJSON) for log shippers and SIEM platforms.

use crate::detect::{Alert, AlertKind, FloodKind, ProcessingError, SpoofFinding};
use chrono::Local;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::sync::{Arc, Mutex};

// ── Event types ──────────────────────────────────────────────────────────────

/// All distinct event kinds that floodwatch can emit.
///
/// `#[serde(tag = "event")]` puts an `"event"` key in every JSON line so
/// consumers can filter by type without inspecting structure.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event<'a> {
    /// Informational startup / status message.
    Info { message: &'a str },

    /// One entry of `--list-interfaces`.
    Interface {
        index:       usize,
        name:        &'a str,
        description: &'a str,
        mac:         Option<String>,
        addresses:   Vec<String>,
    },

    /// One-line summary of a captured packet (`--verbose`), with a hexdump
    /// of the leading payload bytes when `--payload-bytes` is set.
    Packet {
        at:      f64,
        summary: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<String>,
    },

    /// A per-source event rate crossed its adaptive threshold.
    FloodAlert {
        at:     f64,
        kind:   FloodKind,
        source: &'a str,
        rate:   f64,
    },

    /// Conflicting ARP announcements.
    SpoofAlert {
        at:      f64,
        #[serde(flatten)]
        finding: &'a SpoofFinding,
    },

    /// A packet could not be fully inspected. Not an attack.
    ProcessingError { at: f64, error: String },

    /// Session summary emitted on shutdown.
    SessionSummary {
        duration_secs:     u64,
        packets_total:     u64,
        protocols:         Vec<(&'static str, u64)>,
        alerts_emitted:    u64,
        processing_errors: u64,
        reports_dropped:   u64,
        sources_tracked:   usize,
        top_talkers:       Vec<(String, u64)>,
    },
}

impl<'a> Event<'a> {
    /// Maps a detector alert to its log event.
    pub fn from_alert(alert: &'a Alert) -> Self {
        let at = alert.at.as_secs_f64();
        match &alert.kind {
            AlertKind::Flood { kind, source, rate } => Event::FloodAlert {
                at,
                kind: *kind,
                source,
                rate: *rate,
            },
            AlertKind::Spoof(finding) => Event::SpoofAlert { at, finding },
        }
    }

    pub fn from_error(at: f64, error: &ProcessingError) -> Self {
        Event::ProcessingError { at, error: error.to_string() }
    }
}

// ── Logger ───────────────────────────────────────────────────────────────────

/// Shared, thread-safe structured logger.
///
/// Constructed once in `main` and handed out as an `Arc<Logger>`. The
/// internal `Mutex` serialises file writes so lines never interleave.
pub struct Logger {
    /// Whether to format events as NDJSON instead of plain text.
    json:   bool,
    /// Optional buffered file writer. `None` when `--log-file` was not given.
    file:   Option<Mutex<BufWriter<std::fs::File>>>,
}

pub type SharedLogger = Arc<Logger>;

impl Logger {
    /// Creates a new logger.
    ///
    /// # Errors
    /// Returns an `io::Error` if the log file cannot be opened or created.
    pub fn new(json: bool, log_path: Option<&str>) -> io::Result<Self> {
        let file = match log_path {
            Some(path) => {
                let f = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                Some(Mutex::new(BufWriter::new(f)))
            }
            None => None,
        };

        Ok(Self { json, file })
    }

    /// Logs a single [`Event`] to stdout and, if configured, the log file.
    pub fn log(&self, event: &Event) {
        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
        let line = self.render(event, &timestamp);

        println!("{}", line);

        if let Some(mutex) = &self.file {
            if let Ok(mut writer) = mutex.lock() {
                let _ = writeln!(writer, "{}", line);
                let _ = writer.flush();
            }
        }
    }

    fn render(&self, event: &Event, timestamp: &str) -> String {
        if self.json {
            let mut val = serde_json::to_value(event).unwrap_or_default();
            if let Some(obj) = val.as_object_mut() {
                obj.insert(
                    "timestamp".to_string(),
                    serde_json::Value::String(timestamp.to_string()),
                );
            }
            serde_json::to_string(&val).unwrap_or_default()
        } else {
            format!("[{}] {}", timestamp, plain_text(event))
        }
    }
}

/// Formats an [`Event`] as plain text (no wall-clock timestamp).
///
/// Alert lines carry the detector's own message so they read the same in
/// the log as on the terminal.
fn plain_text(event: &Event) -> String {
    match event {
        Event::Info { message } =>
            format!("[INFO] {}", message),

        Event::Interface { index, name, description, mac, addresses } => format!(
            "[IFACE] {}: {} ({}) mac={} addrs=[{}]",
            index,
            name,
            description,
            mac.as_deref().unwrap_or("-"),
            addresses.join(", ")
        ),

        Event::Packet { at, summary, payload: None } =>
            format!("[PKT] [{:.2}] {}", at, summary),

        Event::Packet { at, summary, payload: Some(dump) } =>
            format!("[PKT] [{:.2}] {}\n{}", at, summary, dump),

        Event::FloodAlert { at, kind, source, rate } =>
            format!("[ALERT] [{:.2}] {}", at, kind.caution(source, *rate)),

        Event::SpoofAlert { at, finding } =>
            format!("[ALERT] [{:.2}] {}", at, finding),

        Event::ProcessingError { at, error } =>
            format!("[PROCESSING ERROR] [{:.2}] {}", at, error),

        Event::SessionSummary {
            duration_secs,
            packets_total,
            protocols,
            alerts_emitted,
            processing_errors,
            reports_dropped,
            sources_tracked,
            top_talkers,
        } => {
            let protocols = protocols
                .iter()
                .map(|(name, count)| format!("{}={}", name, count))
                .collect::<Vec<_>>()
                .join(" ");
            let talkers = top_talkers
                .iter()
                .map(|(ip, count)| format!("{}:{}", ip, count))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "[SUMMARY] duration={}s packets={} [{}] alerts={} errors={} dropped={} sources={} top=[{}]",
                duration_secs,
                packets_total,
                protocols,
                alerts_emitted,
                processing_errors,
                reports_dropped,
                sources_tracked,
                talkers
            )
        }
    }
}
