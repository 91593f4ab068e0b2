//! Protocol module - header layouts, frames and the layer decoder.
//!
//! This module covers everything that looks inside a captured frame:
//! - Ethernet / IPv4 / IPv6 / TCP / UDP header field access
//! - Frame struct owning the captured bytes and pipeline metadata
//! - Layer decoder state machine

mod decoder;
mod frame;
mod wire_format;

pub use decoder::{
    decode, resolve_endpoints, Decoded, Endpoints, Layer, LayerDecoder, LayerKind, Transition,
    MAX_TRANSITIONS,
};
pub use frame::Frame;
pub use wire_format::{
    ether_type, ip_proto, ETH_HEADER_LEN, IPV4_MIN_HEADER_LEN, IPV6_HEADER_LEN, MAX_FRAME_LEN,
    TCP_MIN_HEADER_LEN, UDP_HEADER_LEN,
};
