use std::net::Ipv4Addr;

use pnet::util::MacAddr;

use crate::common::{self, WOL_PAYLOAD_LEN};
use crate::decode::{self, Ipv4Header, UdpHeader};

/// What a datagram has to look like to count as a wake-up for this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetFilter {
    pub mac: MacAddr,
    /// Resolved once from the configured dotted quad.
    pub source: Option<u32>,
    pub port: u16,
}

impl TargetFilter {
    pub fn new(mac: MacAddr, source: Option<Ipv4Addr>, port: u16) -> Self {
        Self { mac, source: source.map(u32::from), port }
    }

    /// Decodes `raw` and validates it, returning the sender on a match.
    /// Undecodable input is simply not a match.
    pub fn matches(&self, raw: &[u8]) -> Option<Ipv4Addr> {
        match decode::decode(raw) {
            Ok(dgram) if validate(dgram.payload, &dgram.ip, &dgram.udp, self) => Some(dgram.ip.source_addr()),
            Ok(_) => None,
            Err(e) => {
                log::trace!("[filter] skipping datagram: {}", e);
                None
            }
        }
    }
}

pub fn validate(payload: &[u8], ip: &Ipv4Header, udp: &UdpHeader, filter: &TargetFilter) -> bool {
    if ip.version != 4 {
        return false;
    }
    if filter.source.is_some_and(|src| src != ip.source) {
        return false;
    }
    if udp.destination_port != filter.port {
        return false;
    }
    if udp.payload_len() != WOL_PAYLOAD_LEN {
        return false;
    }

    if common::check_wol_payload(payload, &filter.mac) {
        return true;
    }

    if let Some(other) = common::wol_payload_get_target_mac(payload) {
        log::debug!("[filter] ignoring magic packet for {} from {}", other, ip.source_addr());
    }
    false
}
