//! Minimal DNS header parsing for detection and packet summaries.

/// Length of the fixed DNS header.
pub const DNS_HEADER_LEN: usize = 12;

/// Fields read from the fixed DNS header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsHeader {
    pub id:       u16,
    /// QR bit clear.
    pub is_query: bool,
    pub qd_count: u16,
}

/// Reads the fixed 12-byte DNS header. `None` if the payload is shorter.
pub fn parse_dns_header(payload: &[u8]) -> Option<DnsHeader> {
    if payload.len() < DNS_HEADER_LEN {
        return None;
    }
    Some(DnsHeader {
        id:       u16::from_be_bytes([payload[0], payload[1]]),
        is_query: payload[2] & 0x80 == 0,
        qd_count: u16::from_be_bytes([payload[4], payload[5]]),
    })
}

/// Parses the first question name from a DNS message.
///
/// Compression pointers are not followed; the first question of a query is
/// always written out in full.
pub fn parse_dns_name(payload: &[u8]) -> Option<String> {
    if payload.len() < DNS_HEADER_LEN { return None; }
    let mut idx = DNS_HEADER_LEN;
    let mut name = String::new();
    while idx < payload.len() {
        let len = payload[idx] as usize;
        if len == 0 || len & 0xC0 != 0 || idx + len + 1 > payload.len() { break; }
        if !name.is_empty() { name.push('.'); }
        idx += 1;
        name.push_str(std::str::from_utf8(&payload[idx..idx + len]).ok()?);
        idx += len;
    }
    if name.is_empty() { None } else { Some(name) }
}
