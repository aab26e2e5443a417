use crate::detect::ConfigError;
use std::io;
use thiserror::Error;

/// Failures that stop a capture session or prevent one from starting.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("cannot open interface '{name}': {source}")]
    OpenDevice {
        name:   String,
        #[source]
        source: pcap::Error,
    },

    #[error("pcap device lookup failed: {0}")]
    Lookup(#[source] pcap::Error),

    #[error("no capture device found")]
    NoDevice,

    #[error("cannot open pcap file '{path}': {source}")]
    OpenFile {
        path:   String,
        #[source]
        source: pcap::Error,
    },

    #[error("capture failed: {0}")]
    Capture(#[from] pcap::Error),

    #[error("invalid detector configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot read config file '{path}': {source}")]
    ConfigFile {
        path:   String,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config file '{path}': {source}")]
    ConfigParse {
        path:   String,
        #[source]
        source: serde_json::Error,
    },

    #[error("capture thread panicked")]
    WorkerPanicked,
}
