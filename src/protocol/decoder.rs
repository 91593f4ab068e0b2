//! Layer-by-layer frame decoder.
//!
//! Implements a state machine walking the protocol headers of one frame:
//! - `Ethernet` → `Ipv4` | `Ipv6`
//! - `Ipv4` | `Ipv6` → `Tcp` | `Udp`
//! - anything else → terminal
//!
//! Each transition checks the remaining length before reading a field, so
//! short or malformed frames simply stop early. The walk is capped at
//! [`MAX_TRANSITIONS`] regardless of input.
//!
//! IPv6 extension headers are not followed: the fixed header's next-header
//! field is taken as the upper-layer protocol.
//!
//! # Example
//!
//! ```
//! use packet_monitor::protocol::{decode, LayerKind};
//!
//! let mut frame = vec![0u8; 54];
//! frame[12] = 0x08;          // EtherType IPv4
//! frame[14] = 0x45;          // version 4, IHL 5
//! frame[14 + 9] = 6;         // TCP
//!
//! let decoded = decode(&frame);
//! let kinds: Vec<LayerKind> = decoded.layers.iter().map(|l| l.kind).collect();
//! assert_eq!(kinds, [LayerKind::Ethernet, LayerKind::Ipv4, LayerKind::Tcp]);
//! ```

use std::fmt;
use std::net::IpAddr;

use serde::Serialize;

use super::wire_format::{
    ether_type, ether_type_of, ip_proto, ipv4_addrs, ipv4_header_len, ipv4_protocol, ipv6_addrs,
    ipv6_next_header, ETH_HEADER_LEN, IPV4_MIN_HEADER_LEN, IPV6_HEADER_LEN, TCP_MIN_HEADER_LEN,
    UDP_HEADER_LEN,
};

/// Upper bound on transitions performed for a single frame.
pub const MAX_TRANSITIONS: usize = 5;

/// Protocol identified for one header level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LayerKind {
    Ethernet,
    Ipv4,
    Ipv6,
    Tcp,
    Udp,
    Unrecognized,
}

impl LayerKind {
    pub fn name(&self) -> &'static str {
        match self {
            LayerKind::Ethernet => "Ethernet",
            LayerKind::Ipv4 => "IPv4",
            LayerKind::Ipv6 => "IPv6",
            LayerKind::Tcp => "TCP",
            LayerKind::Udp => "UDP",
            LayerKind::Unrecognized => "Unknown",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One decoded layer: a kind plus a view into the frame buffer.
///
/// The view starts at the layer's header and runs to the end of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layer {
    pub kind: LayerKind,
    pub offset: usize,
    pub len: usize,
}

impl Layer {
    /// Placeholder reported when no layer could be identified.
    pub const fn unrecognized() -> Self {
        Self {
            kind: LayerKind::Unrecognized,
            offset: 0,
            len: 0,
        }
    }

    /// Resolve this view against the frame it was decoded from.
    ///
    /// Returns an empty slice if `frame` is not the decoded buffer.
    pub fn bytes<'a>(&self, frame: &'a [u8]) -> &'a [u8] {
        frame.get(self.offset..self.offset + self.len).unwrap_or(&[])
    }

    /// Layer starting `header_len` bytes into this one.
    fn child(&self, kind: LayerKind, header_len: usize) -> Self {
        Self {
            kind,
            offset: self.offset + header_len,
            len: self.len - header_len,
        }
    }
}

/// Network-layer endpoints resolved while walking the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub source: IpAddr,
    pub destination: IpAddr,
}

/// Result of a single [`LayerDecoder::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Moved to a new layer, which is now current.
    Advanced(Layer),
    /// No further layer can be decoded.
    Terminal,
}

#[derive(Debug, Clone, Copy)]
enum State {
    /// Frame too short for an Ethernet header.
    Empty,
    /// Positioned on a layer that may still have a successor.
    At(Layer),
    /// Walk finished on this layer.
    Done(Layer),
}

/// Decoder over a single frame buffer.
///
/// Iterating yields the initial layer followed by every layer reached by
/// [`step`](Self::step).
#[derive(Debug)]
pub struct LayerDecoder<'a> {
    buf: &'a [u8],
    state: State,
    transitions: usize,
    endpoints: Option<Endpoints>,
    yielded_initial: bool,
}

impl<'a> LayerDecoder<'a> {
    /// Load a frame. Buffers shorter than an Ethernet header have no layers.
    pub fn load(buf: &'a [u8]) -> Self {
        let state = if buf.len() >= ETH_HEADER_LEN {
            State::At(Layer {
                kind: LayerKind::Ethernet,
                offset: 0,
                len: buf.len(),
            })
        } else {
            State::Empty
        };

        Self {
            buf,
            state,
            transitions: 0,
            endpoints: None,
            yielded_initial: false,
        }
    }

    /// Peek at the current layer without advancing.
    pub fn current(&self) -> Layer {
        match self.state {
            State::Empty => Layer::unrecognized(),
            State::At(layer) | State::Done(layer) => layer,
        }
    }

    /// Whether the walk has finished.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.state, State::At(_))
    }

    /// Transitions performed so far.
    pub fn transitions(&self) -> usize {
        self.transitions
    }

    /// Endpoints resolved by the network layer, if it was reached.
    pub fn endpoints(&self) -> Option<Endpoints> {
        self.endpoints
    }

    /// Advance to the next layer.
    pub fn step(&mut self) -> Transition {
        let layer = match self.state {
            State::At(layer) => layer,
            State::Empty | State::Done(_) => return Transition::Terminal,
        };

        if self.transitions >= MAX_TRANSITIONS {
            self.state = State::Done(layer);
            return Transition::Terminal;
        }

        match self.next_layer(layer) {
            Some(next) => {
                self.transitions += 1;
                self.state = State::At(next);
                Transition::Advanced(next)
            }
            None => {
                self.state = State::Done(layer);
                Transition::Terminal
            }
        }
    }

    fn next_layer(&mut self, layer: Layer) -> Option<Layer> {
        let view = layer.bytes(self.buf);

        match layer.kind {
            LayerKind::Ethernet => self.from_ethernet(layer, view),
            LayerKind::Ipv4 => from_ipv4(layer, view),
            LayerKind::Ipv6 => from_ipv6(layer, view),
            LayerKind::Tcp | LayerKind::Udp | LayerKind::Unrecognized => None,
        }
    }

    fn from_ethernet(&mut self, layer: Layer, view: &[u8]) -> Option<Layer> {
        if view.len() < ETH_HEADER_LEN {
            return None;
        }
        let network = &view[ETH_HEADER_LEN..];

        match ether_type_of(view)? {
            ether_type::IPV4 if view.len() >= ETH_HEADER_LEN + IPV4_MIN_HEADER_LEN => {
                let (src, dst) = ipv4_addrs(network)?;
                self.endpoints = Some(Endpoints {
                    source: src.into(),
                    destination: dst.into(),
                });
                Some(layer.child(LayerKind::Ipv4, ETH_HEADER_LEN))
            }
            ether_type::IPV6 if view.len() >= ETH_HEADER_LEN + IPV6_HEADER_LEN => {
                let (src, dst) = ipv6_addrs(network)?;
                self.endpoints = Some(Endpoints {
                    source: src.into(),
                    destination: dst.into(),
                });
                Some(layer.child(LayerKind::Ipv6, ETH_HEADER_LEN))
            }
            _ => None,
        }
    }
}

fn from_ipv4(layer: Layer, view: &[u8]) -> Option<Layer> {
    if view.len() < IPV4_MIN_HEADER_LEN {
        return None;
    }
    let header_len = ipv4_header_len(view)?;
    if header_len < IPV4_MIN_HEADER_LEN {
        return None;
    }

    match ipv4_protocol(view)? {
        ip_proto::TCP if view.len() >= header_len + TCP_MIN_HEADER_LEN => {
            Some(layer.child(LayerKind::Tcp, header_len))
        }
        ip_proto::UDP if view.len() >= header_len + UDP_HEADER_LEN => {
            Some(layer.child(LayerKind::Udp, header_len))
        }
        _ => None,
    }
}

fn from_ipv6(layer: Layer, view: &[u8]) -> Option<Layer> {
    if view.len() < IPV6_HEADER_LEN {
        return None;
    }

    match ipv6_next_header(view)? {
        ip_proto::TCP if view.len() >= IPV6_HEADER_LEN + TCP_MIN_HEADER_LEN => {
            Some(layer.child(LayerKind::Tcp, IPV6_HEADER_LEN))
        }
        ip_proto::UDP if view.len() >= IPV6_HEADER_LEN + UDP_HEADER_LEN => {
            Some(layer.child(LayerKind::Udp, IPV6_HEADER_LEN))
        }
        _ => None,
    }
}

impl Iterator for LayerDecoder<'_> {
    type Item = Layer;

    fn next(&mut self) -> Option<Layer> {
        if !self.yielded_initial {
            self.yielded_initial = true;
            return match self.state {
                State::Empty => None,
                State::At(layer) | State::Done(layer) => Some(layer),
            };
        }

        match self.step() {
            Transition::Advanced(layer) => Some(layer),
            Transition::Terminal => None,
        }
    }
}

/// Full decode of one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Layers in header order, outermost first.
    pub layers: Vec<Layer>,
    pub endpoints: Option<Endpoints>,
}

/// Walk a frame to completion.
pub fn decode(buf: &[u8]) -> Decoded {
    let mut decoder = LayerDecoder::load(buf);
    let layers = decoder.by_ref().collect();

    Decoded {
        layers,
        endpoints: decoder.endpoints(),
    }
}

/// Resolve only the network-layer endpoints (a single Ethernet step).
pub fn resolve_endpoints(buf: &[u8]) -> Option<Endpoints> {
    let mut decoder = LayerDecoder::load(buf);
    decoder.step();
    decoder.endpoints()
}
