//! Header layouts for the link, network and transport layers.
//!
//! Only the fields the decoder needs are exposed:
//! ```text
//! Ethernet  ┌──────────┬──────────┬───────────┐
//!           │ Dst MAC  │ Src MAC  │ EtherType │
//!           │ 6 bytes  │ 6 bytes  │ u16 BE    │
//!           └──────────┴──────────┴───────────┘
//! IPv4      version/IHL @0, protocol @9, src @12..16, dst @16..20
//! IPv6      next header @6, src @8..24, dst @24..40
//! ```
//!
//! All multi-byte integers are Big Endian.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Maximum captured frame size in bytes.
pub const MAX_FRAME_LEN: usize = 65_536;

/// Ethernet II header size.
pub const ETH_HEADER_LEN: usize = 14;

/// IPv4 header size without options.
pub const IPV4_MIN_HEADER_LEN: usize = 20;

/// Fixed IPv6 header size.
pub const IPV6_HEADER_LEN: usize = 40;

/// TCP header size without options.
pub const TCP_MIN_HEADER_LEN: usize = 20;

/// UDP header size.
pub const UDP_HEADER_LEN: usize = 8;

/// Offset of the EtherType field inside the Ethernet header.
const ETHER_TYPE_OFFSET: usize = 12;

/// EtherType values understood by the decoder.
pub mod ether_type {
    /// Internet Protocol version 4.
    pub const IPV4: u16 = 0x0800;
    /// Internet Protocol version 6.
    pub const IPV6: u16 = 0x86DD;
}

/// IP protocol numbers understood by the decoder.
pub mod ip_proto {
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;
}

/// Read a Big Endian `u16` at `offset`.
///
/// Returns `None` if the buffer is too short.
#[inline]
pub fn read_u16_be(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes = buf.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// EtherType of an Ethernet header starting at `buf[0]`.
#[inline]
pub fn ether_type_of(buf: &[u8]) -> Option<u16> {
    read_u16_be(buf, ETHER_TYPE_OFFSET)
}

/// IP version nibble of a network header starting at `buf[0]`.
#[inline]
pub fn ip_version(buf: &[u8]) -> Option<u8> {
    buf.first().map(|b| b >> 4)
}

/// IPv4 header length in bytes (IHL × 4).
#[inline]
pub fn ipv4_header_len(buf: &[u8]) -> Option<usize> {
    buf.first().map(|b| usize::from(b & 0x0F) * 4)
}

/// Protocol field of an IPv4 header.
#[inline]
pub fn ipv4_protocol(buf: &[u8]) -> Option<u8> {
    buf.get(9).copied()
}

/// Next-header field of an IPv6 header.
#[inline]
pub fn ipv6_next_header(buf: &[u8]) -> Option<u8> {
    buf.get(6).copied()
}

/// Source and destination of an IPv4 header starting at `buf[0]`.
pub fn ipv4_addrs(buf: &[u8]) -> Option<(Ipv4Addr, Ipv4Addr)> {
    let src: [u8; 4] = buf.get(12..16)?.try_into().ok()?;
    let dst: [u8; 4] = buf.get(16..20)?.try_into().ok()?;
    Some((Ipv4Addr::from(src), Ipv4Addr::from(dst)))
}

/// Source and destination of an IPv6 header starting at `buf[0]`.
pub fn ipv6_addrs(buf: &[u8]) -> Option<(Ipv6Addr, Ipv6Addr)> {
    let src: [u8; 16] = buf.get(8..24)?.try_into().ok()?;
    let dst: [u8; 16] = buf.get(24..40)?.try_into().ok()?;
    Some((Ipv6Addr::from(src), Ipv6Addr::from(dst)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16_be() {
        let buf = [0x86, 0xDD, 0x08];
        assert_eq!(read_u16_be(&buf, 0), Some(0x86DD));
        assert_eq!(read_u16_be(&buf, 1), Some(0xDD08));
        assert_eq!(read_u16_be(&buf, 2), None);
    }

    #[test]
    fn test_ether_type_of() {
        let mut eth = [0u8; ETH_HEADER_LEN];
        eth[12] = 0x08;
        eth[13] = 0x00;
        assert_eq!(ether_type_of(&eth), Some(ether_type::IPV4));
        assert_eq!(ether_type_of(&eth[..13]), None);
    }

    #[test]
    fn test_ipv4_fields() {
        let mut ip = [0u8; IPV4_MIN_HEADER_LEN];
        ip[0] = 0x46;
        ip[9] = ip_proto::UDP;
        ip[12..16].copy_from_slice(&[10, 0, 0, 1]);
        ip[16..20].copy_from_slice(&[10, 0, 0, 2]);

        assert_eq!(ip_version(&ip), Some(4));
        assert_eq!(ipv4_header_len(&ip), Some(24));
        assert_eq!(ipv4_protocol(&ip), Some(ip_proto::UDP));
        assert_eq!(
            ipv4_addrs(&ip),
            Some((Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)))
        );
    }

    #[test]
    fn test_ipv6_addrs_formatting() {
        let mut ip = [0u8; IPV6_HEADER_LEN];
        ip[8] = 0xfe;
        ip[9] = 0x80;
        ip[23] = 0x01;
        ip[39] = 0x02;

        let (src, dst) = ipv6_addrs(&ip).unwrap();
        assert_eq!(src.to_string(), "fe80::1");
        assert_eq!(dst.to_string(), "::2");
        assert!(ipv6_addrs(&ip[..39]).is_none());
    }
}
