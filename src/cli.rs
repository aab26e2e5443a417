use clap::Parser;
use floodwatch::detect::{DetectorConfig, FloodConfig};
use floodwatch::monitor::config::SWEEP_INTERVAL;
use floodwatch::monitor::{CaptureSource, MonitorError};
use std::time::Duration;

/// floodwatch: terminal network traffic monitor.
///
/// Captures from a live interface or replays pcap files, classifies traffic
/// by protocol and flags SYN floods, DNS query floods and ARP spoofing
/// against adaptive per-type thresholds.
#[derive(Parser, Debug, Clone)]
#[command(
    name    = "floodwatch",
    version,
    about   = "Network traffic monitor with adaptive flood and ARP spoofing detection",
    long_about = None,
)]
pub struct Cli {
    // ── Input ────────────────────────────────────────────────────────────────

    /// Network interface to capture on.
    ///
    /// If omitted, libpcap picks its default device. See --list-interfaces.
    #[arg(short = 'i', long = "interface", value_name = "IFACE")]
    pub interface: Option<String>,

    /// Read packets from a saved pcap file instead of a live interface.
    ///
    /// May be given several times; files are replayed in order and each one
    /// starts with fresh detection state.
    #[arg(short = 'r', long = "read", value_name = "FILE", conflicts_with = "interface")]
    pub pcap_files: Vec<String>,

    /// Print the interfaces available for capture and exit.
    #[arg(long = "list-interfaces")]
    pub list_interfaces: bool,

    // ── Logging ──────────────────────────────────────────────────────────────

    /// Write log output to this file in addition to stdout.
    ///
    /// The file is created if it does not exist and appended to if it does.
    /// JSON mode (--json) affects the format written to this file as well.
    #[arg(short = 'o', long = "log-file", value_name = "PATH")]
    pub log_file: Option<String>,

    /// Emit log entries as newline-delimited JSON (NDJSON).
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    /// Log a one-line summary of every captured packet.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// With --verbose, hexdump up to N leading payload bytes of each packet.
    /// 0 disables the dump; 100 shows a typical request line and headers.
    #[arg(long = "payload-bytes", value_name = "N", default_value_t = 0, requires = "verbose")]
    pub payload_bytes: usize,

    // ── Detection (overrides the config file and built-in defaults) ──────────

    /// Load detector settings from a JSON file. Flags below override it.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<String>,

    /// Sliding window length in seconds, for every flood type.
    #[arg(long = "window", value_name = "SECS")]
    pub window: Option<f64>,

    /// Initial SYN baseline rate (events/sec).
    #[arg(long = "syn-baseline", value_name = "RATE")]
    pub syn_baseline: Option<f64>,

    /// SYN threshold as a multiple of the baseline.
    #[arg(long = "syn-multiplier", value_name = "X")]
    pub syn_multiplier: Option<f64>,

    /// Initial DNS query baseline rate (events/sec).
    #[arg(long = "dns-baseline", value_name = "RATE")]
    pub dns_baseline: Option<f64>,

    /// DNS threshold as a multiple of the baseline.
    #[arg(long = "dns-multiplier", value_name = "X")]
    pub dns_multiplier: Option<f64>,

    /// EWMA smoothing factor, in (0, 1].
    #[arg(long = "alpha", value_name = "A")]
    pub alpha: Option<f64>,

    /// Fraction of the baseline forgotten on every update, in [0, 1).
    #[arg(long = "decay", value_name = "D")]
    pub decay: Option<f64>,

    /// Seconds of silence after any alert before the next one is shown.
    #[arg(long = "cooldown", value_name = "SECS")]
    pub cooldown: Option<f64>,

    /// Hide flood alerts below this rate (events/sec). 0 shows all.
    #[arg(long = "min-alert-rate", value_name = "RATE")]
    pub min_alert_rate: Option<f64>,

    /// Also detect ARP floods per sender MAC.
    #[arg(long = "arp-flood")]
    pub arp_flood: bool,

    /// Disable ARP spoofing detection.
    #[arg(long = "no-spoof")]
    pub no_spoof: bool,

    /// How often, in seconds of packet time, idle sources are forgotten. 0 disables.
    #[arg(long = "sweep-interval", value_name = "SECS", default_value_t = SWEEP_INTERVAL.as_secs())]
    pub sweep_interval: u64,
}

impl Cli {
    /// Builds the detector configuration: defaults, then `--config`, then
    /// individual flags.
    pub fn detector_config(&self) -> Result<DetectorConfig, MonitorError> {
        let mut cfg = match &self.config {
            Some(path) => load_config(path)?,
            None => DetectorConfig::default(),
        };
        self.apply_overrides(&mut cfg);
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_overrides(&self, cfg: &mut DetectorConfig) {
        if self.arp_flood && cfg.arp.is_none() {
            let syn = &cfg.syn;
            cfg.arp = Some(FloodConfig::new(syn.window_secs, syn.initial_baseline, syn.multiplier));
        }
        if let Some(w) = self.window {
            cfg.syn.window_secs = w;
            cfg.dns.window_secs = w;
            if let Some(arp) = &mut cfg.arp {
                arp.window_secs = w;
            }
        }
        if let Some(v) = self.syn_baseline   { cfg.syn.initial_baseline = v; }
        if let Some(v) = self.syn_multiplier { cfg.syn.multiplier = v; }
        if let Some(v) = self.dns_baseline   { cfg.dns.initial_baseline = v; }
        if let Some(v) = self.dns_multiplier { cfg.dns.multiplier = v; }
        if let Some(v) = self.alpha          { cfg.alpha = v; }
        if let Some(v) = self.decay          { cfg.decay = v; }
        if let Some(v) = self.cooldown       { cfg.cooldown_secs = v; }
        if let Some(v) = self.min_alert_rate { cfg.min_alert_rate = v; }
        if self.no_spoof {
            cfg.spoof.enabled = false;
        }
    }

    pub fn capture_source(&self) -> CaptureSource {
        if self.pcap_files.is_empty() {
            CaptureSource::Live { iface: self.interface.clone() }
        } else {
            CaptureSource::Replay { files: self.pcap_files.clone() }
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }
}

fn load_config(path: &str) -> Result<DetectorConfig, MonitorError> {
    let data = std::fs::read_to_string(path).map_err(|source| MonitorError::ConfigFile {
        path: path.to_string(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| MonitorError::ConfigParse {
        path: path.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("floodwatch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_without_flags() {
        let cli = parse(&[]);
        assert_eq!(cli.detector_config().unwrap(), DetectorConfig::default());
        assert_eq!(cli.capture_source(), CaptureSource::Live { iface: None });
        assert_eq!(cli.sweep_interval(), SWEEP_INTERVAL);
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = parse(&[
            "--window", "2",
            "--syn-multiplier", "4",
            "--dns-baseline", "1.5",
            "--min-alert-rate", "0",
            "--no-spoof",
        ]);
        let cfg = cli.detector_config().unwrap();
        assert_eq!(cfg.syn, FloodConfig::new(2.0, 2.0, 4.0));
        assert_eq!(cfg.dns, FloodConfig::new(2.0, 1.5, 3.0));
        assert_eq!(cfg.min_alert_rate, 0.0);
        assert!(!cfg.spoof.enabled);
    }

    #[test]
    fn test_arp_flood_inherits_window() {
        let cfg = parse(&["--arp-flood", "--window", "3"]).detector_config().unwrap();
        assert_eq!(cfg.arp, Some(FloodConfig::new(3.0, 2.0, 2.0)));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let err = parse(&["--window", "0"]).detector_config().unwrap_err();
        assert!(matches!(err, MonitorError::Config(_)));

        for args in [["--window", "1e20"], ["--cooldown", "1e20"]] {
            let err = parse(&args).detector_config().unwrap_err();
            assert!(matches!(err, MonitorError::Config(_)));
        }
    }

    #[test]
    fn test_payload_bytes_needs_verbose() {
        assert_eq!(parse(&[]).payload_bytes, 0);
        assert_eq!(parse(&["-v", "--payload-bytes", "100"]).payload_bytes, 100);
        assert!(Cli::try_parse_from(["floodwatch", "--payload-bytes", "100"]).is_err());
    }

    #[test]
    fn test_replay_files_in_order() {
        let cli = parse(&["-r", "a.pcap", "-r", "b.pcap"]);
        assert_eq!(
            cli.capture_source(),
            CaptureSource::Replay { files: vec!["a.pcap".into(), "b.pcap".into()] }
        );
    }

    #[test]
    fn test_interface_conflicts_with_replay() {
        let res = Cli::try_parse_from(["floodwatch", "-i", "eth0", "-r", "a.pcap"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_config_file_then_flags() {
        let path = std::env::temp_dir().join(format!("floodwatch-cli-{}.json", std::process::id()));
        {
            let mut f = std::fs::File::create(&path).unwrap();
            write!(f, r#"{{"alpha": 0.5, "dns": {{"window_secs": 10, "initial_baseline": 1, "multiplier": 5}}}}"#).unwrap();
        }

        let path_str = path.to_string_lossy().into_owned();
        let cfg = parse(&["--config", &path_str, "--alpha", "0.4"]).detector_config().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(cfg.alpha, 0.4);
        assert_eq!(cfg.dns, FloodConfig::new(10.0, 1.0, 5.0));
        assert_eq!(cfg.syn, DetectorConfig::default().syn);
    }

    #[test]
    fn test_missing_config_file() {
        let err = parse(&["--config", "/nonexistent/floodwatch.json"]).detector_config().unwrap_err();
        assert!(matches!(err, MonitorError::ConfigFile { .. }));
    }
}
