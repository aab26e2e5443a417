mod cli;

use clap::Parser;
use cli::Cli;
use floodwatch::logger::{Event, Logger, SharedLogger};
use floodwatch::monitor::config::TOP_TALKERS;
use floodwatch::monitor::types::{SessionStats, SharedStats, ShutdownFlag};
use floodwatch::monitor::{start_monitor, MonitorConfig};
use pnet::datalink;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let logger: SharedLogger = match Logger::new(cli.json, cli.log_file.as_deref()) {
        Ok(l) => Arc::new(l),
        Err(e) => {
            eprintln!("floodwatch: cannot open log file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.list_interfaces {
        list_interfaces(&logger);
        return ExitCode::SUCCESS;
    }

    // Validate before touching the capture device.
    let detector = match cli.detector_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            logger.log(&Event::Info { message: &format!("Error: {}", e) });
            return ExitCode::FAILURE;
        }
    };

    let shutdown: ShutdownFlag = Arc::new(AtomicBool::new(false));
    register_shutdown_handler(Arc::clone(&shutdown), &logger);

    let stats = SessionStats::new();
    let session_start = Instant::now();

    logger.log(&Event::Info { message: "floodwatch started" });

    let cfg = MonitorConfig {
        source:         cli.capture_source(),
        detector,
        logger:         Arc::clone(&logger),
        stats:          Arc::clone(&stats),
        shutdown:       Arc::clone(&shutdown),
        sweep_interval: cli.sweep_interval(),
        verbose:        cli.verbose,
        payload_bytes:  cli.payload_bytes,
    };

    let code = match start_monitor(cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger.log(&Event::Info { message: &format!("Monitor error: {}", e) });
            ExitCode::FAILURE
        }
    };

    print_summary(&logger, &stats, session_start);
    code
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Registers a signal handler for graceful shutdown on Ctrl+C.
///
/// Without it the process still stops on Ctrl+C, just without a summary, so
/// a registration failure is logged rather than fatal.
fn register_shutdown_handler(shutdown: ShutdownFlag, logger: &SharedLogger) {
    let res = ctrlc::set_handler(move || {
        println!("\n[!] Ctrl+C received, shutting down...");
        shutdown.store(true, Ordering::SeqCst);
    });
    if let Err(e) = res {
        logger.log(&Event::Info {
            message: &format!("Warning: cannot register Ctrl+C handler: {}", e),
        });
    }
}

/// Logs every interface pnet can see, with its MAC and addresses.
fn list_interfaces(logger: &SharedLogger) {
    for iface in datalink::interfaces() {
        let addresses = iface.ips.iter().map(|ip| ip.to_string()).collect();
        logger.log(&Event::Interface {
            index:       iface.index as usize,
            name:        &iface.name,
            description: &iface.description,
            mac:         iface.mac.map(|m| m.to_string()),
            addresses,
        });
    }
}

/// Logs the session summary: duration, packet and protocol counts, alerts
/// and the busiest sources.
fn print_summary(logger: &SharedLogger, stats: &SharedStats, session_start: Instant) {
    logger.log(&Event::SessionSummary {
        duration_secs:     session_start.elapsed().as_secs(),
        packets_total:     stats.packets_total.load(Ordering::Relaxed),
        protocols:         stats.protocol_counts(),
        alerts_emitted:    stats.alerts_emitted.load(Ordering::Relaxed),
        processing_errors: stats.processing_errors.load(Ordering::Relaxed),
        reports_dropped:   stats.reports_dropped.load(Ordering::Relaxed),
        sources_tracked:   stats.sources_tracked.load(Ordering::Relaxed),
        top_talkers:       stats.top_talkers(TOP_TALKERS),
    });
}
