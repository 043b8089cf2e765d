//! IPv4 + UDP header decoding for datagrams read off a raw socket.
//!
//! All multi-byte fields are network byte order and are read with the
//! explicit big-endian helpers below, never through host struct layout.

use std::net::Ipv4Addr;

use thiserror::Error;

pub const IPV4_MIN_HEADER_LEN: usize = 20;
pub const UDP_HEADER_LEN: usize = 8;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("datagram truncated")]
    Truncated,
    #[error("IPv4 header length of {0} words is below the minimum of 5")]
    HeaderLength(u8),
    #[error("UDP length {0} is shorter than the UDP header")]
    UdpLength(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    pub version: u8,
    pub header_len_words: u8,
    /// Source address as read from bytes 12..16.
    pub source: u32,
}

impl Ipv4Header {
    pub fn header_len(&self) -> usize {
        self.header_len_words as usize * 4
    }

    pub fn source_addr(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    pub source_port: u16,
    pub destination_port: u16,
    /// Header plus data.
    pub length: u16,
    pub checksum: u16,
}

impl UdpHeader {
    pub fn payload_len(&self) -> usize {
        (self.length as usize).saturating_sub(UDP_HEADER_LEN)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct UdpDatagram<'a> {
    pub ip: Ipv4Header,
    pub udp: UdpHeader,
    pub payload: &'a [u8],
}

fn read_u16_be(buf: &[u8], off: usize) -> u16 {
    u16::from_be_bytes([buf[off], buf[off + 1]])
}

fn read_u32_be(buf: &[u8], off: usize) -> u32 {
    u32::from_be_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

/// Splits one captured IPv4 datagram into its headers and UDP payload.
///
/// IP options between the fixed header and `header_len()` are skipped.
/// The version nibble is reported as-is; rejecting non-IPv4 is left to the
/// caller.
pub fn decode(raw: &[u8]) -> Result<UdpDatagram<'_>, DecodeError> {
    if raw.len() < IPV4_MIN_HEADER_LEN + UDP_HEADER_LEN {
        return Err(DecodeError::Truncated);
    }

    let ip = Ipv4Header {
        version: raw[0] >> 4,
        header_len_words: raw[0] & 0x0f,
        source: read_u32_be(raw, 12),
    };
    if ip.header_len() < IPV4_MIN_HEADER_LEN {
        return Err(DecodeError::HeaderLength(ip.header_len_words));
    }

    let udp_off = ip.header_len();
    if raw.len() < udp_off + UDP_HEADER_LEN {
        return Err(DecodeError::Truncated);
    }

    let udp = UdpHeader {
        source_port: read_u16_be(raw, udp_off),
        destination_port: read_u16_be(raw, udp_off + 2),
        length: read_u16_be(raw, udp_off + 4),
        checksum: read_u16_be(raw, udp_off + 6),
    };
    if (udp.length as usize) < UDP_HEADER_LEN {
        return Err(DecodeError::UdpLength(udp.length));
    }

    let payload_off = udp_off + UDP_HEADER_LEN;
    let payload = raw
        .get(payload_off..payload_off + udp.payload_len())
        .ok_or(DecodeError::Truncated)?;

    Ok(UdpDatagram { ip, udp, payload })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds an IPv4/UDP datagram with `options` appended to the fixed IP header.
    pub(crate) fn build_datagram(src: Ipv4Addr, dst_port: u16, options: &[u8], payload: &[u8]) -> Vec<u8> {
        assert_eq!(options.len() % 4, 0);
        let ihl = ((IPV4_MIN_HEADER_LEN + options.len()) / 4) as u8;
        let udp_len = (UDP_HEADER_LEN + payload.len()) as u16;
        let total_len = ihl as u16 * 4 + udp_len;

        let mut pkt = vec![0x40 | ihl, 0];
        pkt.extend_from_slice(&total_len.to_be_bytes());
        pkt.extend_from_slice(&[0, 0, 0x40, 0, 64, 17, 0, 0]);
        pkt.extend_from_slice(&src.octets());
        pkt.extend_from_slice(&[192, 168, 1, 255]);
        pkt.extend_from_slice(options);

        pkt.extend_from_slice(&40000u16.to_be_bytes());
        pkt.extend_from_slice(&dst_port.to_be_bytes());
        pkt.extend_from_slice(&udp_len.to_be_bytes());
        pkt.extend_from_slice(&[0, 0]);
        pkt.extend_from_slice(payload);
        pkt
    }

    #[test]
    fn test_decode_plain_header() {
        let pkt = build_datagram(Ipv4Addr::new(192, 168, 1, 20), 9, &[], b"hello");
        let dgram = decode(&pkt).unwrap();

        assert_eq!(dgram.ip.version, 4);
        assert_eq!(dgram.ip.header_len_words, 5);
        assert_eq!(dgram.ip.source_addr(), Ipv4Addr::new(192, 168, 1, 20));
        assert_eq!(dgram.ip.source, 0xc0a8_0114);
        assert_eq!(dgram.udp.source_port, 40000);
        assert_eq!(dgram.udp.destination_port, 9);
        assert_eq!(dgram.udp.length, 13);
        assert_eq!(dgram.payload, b"hello");
    }

    #[test]
    fn test_decode_skips_ip_options() {
        let options = [0x94, 0x04, 0x00, 0x00, 0x01, 0x01, 0x01, 0x00];
        let pkt = build_datagram(Ipv4Addr::new(10, 0, 0, 1), 7, &options, b"abc");
        let dgram = decode(&pkt).unwrap();

        assert_eq!(dgram.ip.header_len(), 28);
        assert_eq!(dgram.udp.destination_port, 7);
        assert_eq!(dgram.payload, b"abc");
    }

    #[test]
    fn test_decode_short_buffers_are_truncated() {
        let pkt = build_datagram(Ipv4Addr::new(10, 0, 0, 1), 9, &[], &[]);
        assert_eq!(pkt.len(), 28);
        for len in 0..28 {
            assert_eq!(decode(&pkt[..len]).unwrap_err(), DecodeError::Truncated, "len {}", len);
        }
        assert!(decode(&pkt).is_ok());
    }

    #[test]
    fn test_decode_udp_header_past_options_truncated() {
        let options = [0u8; 12];
        let pkt = build_datagram(Ipv4Addr::new(10, 0, 0, 1), 9, &options, &[]);
        assert_eq!(decode(&pkt[..30]).unwrap_err(), DecodeError::Truncated);
    }

    #[test]
    fn test_decode_rejects_short_ihl() {
        let mut pkt = build_datagram(Ipv4Addr::new(10, 0, 0, 1), 9, &[], b"data");
        pkt[0] = 0x44;
        assert_eq!(decode(&pkt).unwrap_err(), DecodeError::HeaderLength(4));
    }

    #[test]
    fn test_decode_rejects_short_udp_length() {
        let mut pkt = build_datagram(Ipv4Addr::new(10, 0, 0, 1), 9, &[], b"data");
        pkt[24..26].copy_from_slice(&7u16.to_be_bytes());
        assert_eq!(decode(&pkt).unwrap_err(), DecodeError::UdpLength(7));
    }

    #[test]
    fn test_decode_declared_payload_past_end() {
        let mut pkt = build_datagram(Ipv4Addr::new(10, 0, 0, 1), 9, &[], b"data");
        pkt[24..26].copy_from_slice(&110u16.to_be_bytes());
        assert_eq!(decode(&pkt).unwrap_err(), DecodeError::Truncated);
    }

    #[test]
    fn test_decode_reports_foreign_version() {
        let mut pkt = build_datagram(Ipv4Addr::new(10, 0, 0, 1), 9, &[], b"data");
        pkt[0] = 0x65;
        assert_eq!(decode(&pkt).unwrap().ip.version, 6);
    }
}
