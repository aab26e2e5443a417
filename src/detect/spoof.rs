//! ARP spoofing detection from sender address announcements.

use crate::detect::alert::SpoofFinding;
use std::collections::{BTreeSet, HashMap};

/// Remembers every (link address, network address) pair ever announced.
///
/// Entries are never aged out; only [`clear`](Self::clear) empties the maps.
#[derive(Debug, Default, Clone)]
pub struct SpoofTracker {
    /// Link address -> network addresses it has claimed.
    claims:        HashMap<String, BTreeSet<String>>,
    /// Network address -> link addresses that claimed it.
    owners:        HashMap<String, BTreeSet<String>>,
    check_shared:  bool,
}

impl SpoofTracker {
    /// With `check_shared` set, an address announced by a second link
    /// address is reported as well.
    pub fn new(check_shared: bool) -> Self {
        Self { check_shared, ..Self::default() }
    }

    /// Records that `link` announced `claimed`.
    ///
    /// Reports a finding only when this call adds a new address to a set that
    /// then holds more than one entry. Repeating a known pair never reports.
    /// When both directions conflict on the same call the link-side finding
    /// wins.
    pub fn observe(&mut self, link: &str, claimed: &str) -> Option<SpoofFinding> {
        let addrs = self.claims.entry(link.to_string()).or_default();
        let link_finding = if addrs.insert(claimed.to_string()) && addrs.len() > 1 {
            Some(SpoofFinding::LinkClaimsMany {
                link:    link.to_string(),
                claimed: addrs.iter().cloned().collect(),
            })
        } else {
            None
        };

        if !self.check_shared {
            return link_finding;
        }

        let links = self.owners.entry(claimed.to_string()).or_default();
        let shared_finding = if links.insert(link.to_string()) && links.len() > 1 {
            Some(SpoofFinding::AddressClaimedByMany {
                address: claimed.to_string(),
                links:   links.iter().cloned().collect(),
            })
        } else {
            None
        };

        link_finding.or(shared_finding)
    }

    /// Number of link addresses seen.
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    pub fn clear(&mut self) {
        self.claims.clear();
        self.owners.clear();
    }
}
