//! Frame dissection into the fields the detector reads.
//!
//! Ethernet and ARP are decoded with pnet, everything above the link layer
//! with etherparse. The result also carries the protocol classification used
//! for session statistics and a one-line description for `--verbose`.

use crate::detect::{ArpLayer, DnsLayer, PacketSummary, TcpFlags};
use crate::monitor::config::{DHCP_PORTS, DNS_PORT, HTTP_PORTS, MDNS_PORT, NTP_PORT};
use crate::monitor::parsers::{parse_dns_header, parse_dns_name};
use crate::monitor::types::Protocol;
use etherparse::{InternetSlice, SlicedPacket, TcpHeaderSlice, TransportSlice, UdpHeaderSlice};
use pnet::packet::arp::{ArpHardwareTypes, ArpOperations, ArpPacket};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::Packet;

/// Everything extracted from one captured frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dissected {
    pub summary:   PacketSummary,
    pub protocols: Vec<Protocol>,
    pub line:      String,
    /// Leading bytes of the innermost payload, at most the requested limit.
    pub payload:   Vec<u8>,
}

/// Dissects an Ethernet frame, keeping up to `payload_limit` bytes of the
/// innermost payload for display.
///
/// Returns `None` for frames that are neither ARP nor IP, and for frames too
/// short to hold the headers they announce.
pub fn dissect(frame: &[u8], payload_limit: usize) -> Option<Dissected> {
    let eth = EthernetPacket::new(frame)?;
    if eth.get_ethertype() == EtherTypes::Arp {
        return Some(dissect_arp(&eth));
    }

    let sliced = SlicedPacket::from_ethernet(frame).ok()?;
    let (src, dst) = match &sliced.ip {
        Some(InternetSlice::Ipv4(h, _)) => (
            h.source_addr().to_string(),
            h.destination_addr().to_string(),
        ),
        Some(InternetSlice::Ipv6(h, _)) => (
            h.source_addr().to_string(),
            h.destination_addr().to_string(),
        ),
        None => return None,
    };

    let mut out = Dissected {
        line: format!("IP {} -> {}", src, dst),
        summary: PacketSummary {
            network_src: Some(src),
            ..PacketSummary::default()
        },
        protocols: vec![Protocol::Ip],
        payload: sliced.payload[..sliced.payload.len().min(payload_limit)].to_vec(),
    };

    match &sliced.transport {
        Some(TransportSlice::Tcp(tcp)) => dissect_tcp(tcp, sliced.payload, &mut out),
        Some(TransportSlice::Udp(udp)) => dissect_udp(udp, sliced.payload, &mut out),
        _ => {}
    }

    Some(out)
}

/// Classic hexdump: offset, sixteen bytes in hex, printable ASCII.
pub fn hexdump(bytes: &[u8]) -> String {
    bytes
        .chunks(16)
        .enumerate()
        .map(|(i, chunk)| {
            let hex = chunk
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" ");
            let ascii: String = chunk
                .iter()
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
                .collect();
            format!("{:04x}  {:<47}  {}", i * 16, hex, ascii)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn dissect_tcp(tcp: &TcpHeaderSlice, payload: &[u8], out: &mut Dissected) {
    let (sport, dport) = (tcp.source_port(), tcp.destination_port());
    out.protocols.push(Protocol::Tcp);
    out.summary.tcp = Some(TcpFlags { syn: tcp.syn(), ack: tcp.ack() });

    let mut flags = String::new();
    for (set, c) in [(tcp.syn(), 'S'), (tcp.ack(), 'A'), (tcp.fin(), 'F'), (tcp.rst(), 'R'), (tcp.psh(), 'P')] {
        if set {
            flags.push(c);
        }
    }
    out.line.push_str(&format!(" | TCP {} -> {} [{}]", sport, dport, flags));

    // DNS over TCP: each message carries a two-byte length prefix. Segments
    // without payload (handshake, bare ACKs) are not DNS messages.
    if !payload.is_empty() && (sport == DNS_PORT || dport == DNS_PORT) {
        dissect_dns(payload.get(2..).unwrap_or_default(), out);
    }

    if !payload.is_empty() && (HTTP_PORTS.contains(&sport) || HTTP_PORTS.contains(&dport)) {
        out.protocols.push(Protocol::Http);
        out.line.push_str(&format!(" | HTTP {} bytes", payload.len()));
    }
}

fn dissect_udp(udp: &UdpHeaderSlice, payload: &[u8], out: &mut Dissected) {
    let (sport, dport) = (udp.source_port(), udp.destination_port());
    out.protocols.push(Protocol::Udp);
    out.line.push_str(&format!(" | UDP {} -> {}", sport, dport));

    let on = |port: u16| sport == port || dport == port;

    if on(DNS_PORT) || on(MDNS_PORT) {
        dissect_dns(payload, out);
    }
    if DHCP_PORTS.iter().any(|p| on(*p)) {
        out.protocols.push(Protocol::Dhcp);
        out.line.push_str(" | DHCP");
    }
    if on(NTP_PORT) {
        out.protocols.push(Protocol::Ntp);
        out.line.push_str(" | NTP");
    }
}

fn dissect_dns(message: &[u8], out: &mut Dissected) {
    out.protocols.push(Protocol::Dns);
    let header = parse_dns_header(message);
    out.summary.dns = Some(DnsLayer { is_query: header.map(|h| h.is_query) });

    match header {
        Some(h) => {
            let kind = if h.is_query { "query" } else { "response" };
            let name = parse_dns_name(message).unwrap_or_default();
            out.line.push_str(&format!(" | DNS {} {:#06x} qd={} {}", kind, h.id, h.qd_count, name));
        }
        None => out.line.push_str(" | DNS (truncated)"),
    }
}

/// ARP packets with sender address 0.0.0.0 are counted but carry no address
/// claim, so they get no ARP layer.
fn dissect_arp(eth: &EthernetPacket) -> Dissected {
    let mut out = Dissected {
        protocols: vec![Protocol::Arp],
        ..Dissected::default()
    };

    match ArpPacket::new(eth.payload()) {
        Some(arp)
            if arp.get_hardware_type() == ArpHardwareTypes::Ethernet
                && arp.get_protocol_type() == EtherTypes::Ipv4 =>
        {
            let mac = arp.get_sender_hw_addr().to_string();
            let ip = arp.get_sender_proto_addr();
            let target = arp.get_target_proto_addr();
            let op = match arp.get_operation() {
                ArpOperations::Request => "request",
                ArpOperations::Reply => "reply",
                _ => "other",
            };
            out.line = format!("ARP {} {} ({}) -> {}", op, ip, mac, target);

            if !ip.is_unspecified() {
                out.summary.arp = Some(ArpLayer {
                    link_src:    Some(mac),
                    network_src: Some(ip.to_string()),
                });
            }
        }
        _ => {
            out.line = format!("ARP (unsupported or truncated) from {}", eth.get_source());
            out.summary.arp = Some(ArpLayer::default());
        }
    }

    out
}
