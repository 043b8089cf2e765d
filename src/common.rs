use pnet::util::MacAddr;

pub const BROADCAST_MAC: [u8; 6] = [ 0xff, 0xff, 0xff, 0xff, 0xff, 0xff ];

/// Magic packet body without a SecureOn password: sync stream + 16 MAC repetitions.
pub const MAC_REPEAT: usize = 16;
pub const WOL_PAYLOAD_LEN: usize = BROADCAST_MAC.len() + MAC_REPEAT * 6;

pub const DEFAULT_PORT: u16 = 9;

/// Large enough for any IPv4 datagram.
pub const MAX_DATAGRAM: usize = 65535;

fn mac_octets(mac: &MacAddr) -> [u8; 6] {
    [mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]
}

/// Checks `payload` against the canonical magic packet for `target`.
pub fn check_wol_payload(payload: &[u8], target: &MacAddr) -> bool {
    if payload.len() != WOL_PAYLOAD_LEN { return false; }

    let (sync, body) = payload.split_at(BROADCAST_MAC.len());
    if sync != BROADCAST_MAC {
        return false;
    }

    let target = mac_octets(target);
    body.chunks_exact(6).all(|block| block == target)
}

/// Returns the MAC a well-formed magic packet is addressed to, whoever that is.
pub fn wol_payload_get_target_mac(payload: &[u8]) -> Option<MacAddr> {
    if payload.len() != WOL_PAYLOAD_LEN || payload[..6] != BROADCAST_MAC { return None; }

    let blocks: Vec<&[u8]> = payload[6..].chunks_exact(6).collect();
    if blocks.iter().any(|b| *b != blocks[0]) {
        return None;
    }

    let b = blocks[0];
    Some(MacAddr::new(b[0], b[1], b[2], b[3], b[4], b[5]))
}

pub fn magic_packet(mac: &MacAddr) -> [u8; WOL_PAYLOAD_LEN] {
    let mut body = [0xff; WOL_PAYLOAD_LEN];
    let octets = mac_octets(mac);
    for block in body[6..].chunks_exact_mut(6) {
        block.copy_from_slice(&octets);
    }
    body
}
