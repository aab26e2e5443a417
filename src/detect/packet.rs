//! Boundary between the dissector and the detection engine.
//!
//! The engine never sees raw bytes. It only needs the handful of header
//! fields exposed by [`PacketFields`]; anything that can answer these
//! questions can be inspected.

/// TCP flag bits relevant to detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TcpFlags {
    pub syn: bool,
    pub ack: bool,
}

impl TcpFlags {
    /// A connection-opening SYN, not a SYN-ACK.
    pub fn is_pure_syn(&self) -> bool {
        self.syn && !self.ack
    }
}

/// Field accessors the detector reads from a dissected packet.
///
/// Presence checks (`has_*`) and field accessors are separate so that a layer
/// which is present but incomplete can be told apart from an absent layer.
pub trait PacketFields {
    /// Network-layer source address.
    fn network_src(&self) -> Option<&str>;

    fn has_transport_tcp(&self) -> bool;
    fn tcp_flags(&self) -> Option<TcpFlags>;

    fn has_dns(&self) -> bool;
    /// `Some(true)` for a query, `Some(false)` for a response.
    fn dns_is_query(&self) -> Option<bool>;

    fn has_arp_like_layer(&self) -> bool;
    fn arp_link_src(&self) -> Option<&str>;
    fn arp_network_src(&self) -> Option<&str>;
}

/// DNS header fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsLayer {
    /// `None` when the payload was too short to read the QR bit.
    pub is_query: Option<bool>,
}

/// ARP sender fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArpLayer {
    pub link_src:    Option<String>,
    pub network_src: Option<String>,
}

/// Owned record produced by the dissector for every captured frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketSummary {
    pub network_src: Option<String>,
    pub tcp:         Option<TcpFlags>,
    pub dns:         Option<DnsLayer>,
    pub arp:         Option<ArpLayer>,
}

impl PacketSummary {
    /// A TCP segment from `src` with the given flags.
    pub fn tcp(src: &str, flags: TcpFlags) -> Self {
        Self {
            network_src: Some(src.to_string()),
            tcp: Some(flags),
            ..Self::default()
        }
    }

    /// A pure SYN from `src`.
    pub fn syn(src: &str) -> Self {
        Self::tcp(src, TcpFlags { syn: true, ack: false })
    }

    /// A DNS message from `src`.
    pub fn dns(src: &str, is_query: bool) -> Self {
        Self {
            network_src: Some(src.to_string()),
            dns: Some(DnsLayer { is_query: Some(is_query) }),
            ..Self::default()
        }
    }

    /// An ARP frame whose sender claims `ip` for `mac`.
    pub fn arp(mac: &str, ip: &str) -> Self {
        Self {
            arp: Some(ArpLayer {
                link_src:    Some(mac.to_string()),
                network_src: Some(ip.to_string()),
            }),
            ..Self::default()
        }
    }
}

impl PacketFields for PacketSummary {
    fn network_src(&self) -> Option<&str> {
        self.network_src.as_deref()
    }

    fn has_transport_tcp(&self) -> bool {
        self.tcp.is_some()
    }

    fn tcp_flags(&self) -> Option<TcpFlags> {
        self.tcp
    }

    fn has_dns(&self) -> bool {
        self.dns.is_some()
    }

    fn dns_is_query(&self) -> Option<bool> {
        self.dns.as_ref().and_then(|d| d.is_query)
    }

    fn has_arp_like_layer(&self) -> bool {
        self.arp.is_some()
    }

    fn arp_link_src(&self) -> Option<&str> {
        self.arp.as_ref().and_then(|a| a.link_src.as_deref())
    }

    fn arp_network_src(&self) -> Option<&str> {
        self.arp.as_ref().and_then(|a| a.network_src.as_deref())
    }
}
