//! Endpoint-pair filtering.
//!
//! [`select`] splits the primary queue into frames exchanged between two
//! endpoints (in either direction) and everything else. Within a single pass,
//! matching frames larger than [`OVERSIZE_LEN`] are counted; once more than
//! [`OVERSIZE_PASS_LIMIT`] of them have been seen, further oversized matches
//! are diverted to the retry backlog instead of the matched queue.
//!
//! # Example
//!
//! ```
//! use packet_monitor::filter::{select, EndpointPair};
//! use packet_monitor::protocol::Frame;
//! use packet_monitor::queue::FrameQueue;
//!
//! let mut primary = FrameQueue::new();
//! primary.enqueue(Frame::from_slice(1, b"ping").unwrap().with_endpoints("10.0.0.1", "10.0.0.2"));
//! primary.enqueue(Frame::from_slice(2, b"pong").unwrap().with_endpoints("10.0.0.2", "10.0.0.1"));
//! primary.enqueue(Frame::from_slice(3, b"noise").unwrap().with_endpoints("10.0.0.1", "10.0.0.9"));
//!
//! let selection = select(primary, &EndpointPair::new("10.0.0.1", "10.0.0.2"));
//! assert_eq!(selection.matched.len(), 2);
//! assert_eq!(selection.retained.len(), 1);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::protocol::Frame;
use crate::queue::FrameQueue;

/// Frames longer than this many bytes count as oversized.
pub const OVERSIZE_LEN: usize = 1500;

/// Oversized matches accepted per pass before diversion starts.
pub const OVERSIZE_PASS_LIMIT: usize = 10;

/// Unordered pair of endpoint address strings.
///
/// Comparison is exact string equality; no address normalization happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPair {
    pub a: String,
    pub b: String,
}

impl EndpointPair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }

    /// Whether a frame travelled between the two endpoints, either way.
    ///
    /// Frames without resolved endpoints never match.
    pub fn matches(&self, frame: &Frame) -> bool {
        match (frame.source(), frame.destination()) {
            (Some(src), Some(dst)) => {
                (src == self.a && dst == self.b) || (src == self.b && dst == self.a)
            }
            _ => false,
        }
    }
}

impl fmt::Display for EndpointPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.a, self.b)
    }
}

/// Output of one filter pass.
#[derive(Debug, Default)]
pub struct Selection {
    /// Matching frames to hand to replay.
    pub matched: FrameQueue,
    /// Oversized matches beyond the per-pass limit.
    pub diverted: FrameQueue,
    /// Non-matching frames, in their original order.
    pub retained: FrameQueue,
    /// Oversized matches seen during the pass (diverted ones included).
    pub oversized: usize,
}

/// Partition `primary` by `pair`.
///
/// The oversize counter lives only for this call.
pub fn select(mut primary: FrameQueue, pair: &EndpointPair) -> Selection {
    let mut selection = Selection::default();

    while let Ok(frame) = primary.dequeue() {
        if !pair.matches(&frame) {
            selection.retained.enqueue(frame);
            continue;
        }

        if frame.len() > OVERSIZE_LEN {
            selection.oversized += 1;
            if selection.oversized > OVERSIZE_PASS_LIMIT {
                tracing::debug!(
                    "Frame #{} exceeds size limit ({}B), diverting to retry",
                    frame.id(),
                    frame.len()
                );
                selection.diverted.enqueue(frame);
                continue;
            }
        }

        tracing::trace!(
            "Frame #{} matched, estimated delay {}ms",
            frame.id(),
            frame.estimated_delay_ms()
        );
        selection.matched.enqueue(frame);
    }

    selection
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "192.168.1.100";
    const B: &str = "192.168.1.1";
    const C: &str = "10.0.0.7";

    fn frame(id: u64, len: usize, src: &str, dst: &str) -> Frame {
        Frame::from_slice(id, &vec![0u8; len])
            .unwrap()
            .with_endpoints(src, dst)
    }

    fn ids(queue: &FrameQueue) -> Vec<u64> {
        queue.iter().map(Frame::id).collect()
    }

    #[test]
    fn test_match_is_symmetric() {
        let pair = EndpointPair::new(A, B);

        assert!(pair.matches(&frame(1, 60, A, B)));
        assert!(pair.matches(&frame(2, 60, B, A)));
        assert!(!pair.matches(&frame(3, 60, A, C)));
        assert!(!pair.matches(&frame(4, 60, C, B)));
        assert!(!pair.matches(&frame(5, 60, A, A)));
    }

    #[test]
    fn test_match_requires_resolved_endpoints() {
        let pair = EndpointPair::new("", "");
        let unresolved = Frame::from_slice(1, &[0u8; 10]).unwrap();
        assert!(!pair.matches(&unresolved));
    }

    #[test]
    fn test_match_is_exact_string() {
        let pair = EndpointPair::new("::1", "2001:db8::1");
        let expanded = frame(1, 60, "0:0:0:0:0:0:0:1", "2001:db8::1");
        assert!(!pair.matches(&expanded));
        assert!(pair.matches(&frame(2, 60, "2001:db8::1", "::1")));
    }

    #[test]
    fn test_select_partitions_and_preserves_order() {
        let primary: FrameQueue = vec![
            frame(1, 60, A, B),
            frame(2, 60, A, C),
            frame(3, 60, B, A),
            frame(4, 60, C, A),
            frame(5, 60, A, B),
        ]
        .into_iter()
        .collect();

        let selection = select(primary, &EndpointPair::new(A, B));

        assert_eq!(ids(&selection.matched), [1, 3, 5]);
        assert_eq!(ids(&selection.retained), [2, 4]);
        assert!(selection.diverted.is_empty());
        assert_eq!(selection.oversized, 0);
    }

    #[test]
    fn test_oversize_limit_diverts_after_ten() {
        let primary: FrameQueue = (1..=15).map(|id| frame(id, 1501, A, B)).collect();

        let selection = select(primary, &EndpointPair::new(A, B));

        assert_eq!(ids(&selection.matched), (1..=10).collect::<Vec<_>>());
        assert_eq!(ids(&selection.diverted), (11..=15).collect::<Vec<_>>());
        assert_eq!(selection.oversized, 15);
    }

    #[test]
    fn test_exactly_mtu_is_not_oversized() {
        let primary: FrameQueue = (1..=12).map(|id| frame(id, OVERSIZE_LEN, A, B)).collect();

        let selection = select(primary, &EndpointPair::new(A, B));
        assert_eq!(selection.matched.len(), 12);
        assert!(selection.diverted.is_empty());
    }

    #[test]
    fn test_oversize_counter_ignores_non_matching() {
        let mut frames: Vec<Frame> = (1..=20).map(|id| frame(id, 3000, A, C)).collect();
        frames.extend((21..=30).map(|id| frame(id, 3000, A, B)));

        let selection = select(frames.into_iter().collect(), &EndpointPair::new(A, B));
        assert_eq!(selection.matched.len(), 10);
        assert!(selection.diverted.is_empty());
        assert_eq!(selection.retained.len(), 20);
    }

    #[test]
    fn test_small_matches_after_limit_still_match() {
        let mut frames: Vec<Frame> = (1..=11).map(|id| frame(id, 2000, A, B)).collect();
        frames.push(frame(12, 100, B, A));

        let selection = select(frames.into_iter().collect(), &EndpointPair::new(A, B));
        assert_eq!(ids(&selection.diverted), [11]);
        assert_eq!(selection.matched.len(), 11);
        assert_eq!(selection.matched.iter().last().map(Frame::id), Some(12));
    }

    #[test]
    fn test_counter_resets_between_passes() {
        let pair = EndpointPair::new(A, B);

        let first = select((1..=10).map(|id| frame(id, 2000, A, B)).collect(), &pair);
        assert!(first.diverted.is_empty());

        let second = select((11..=20).map(|id| frame(id, 2000, A, B)).collect(), &pair);
        assert!(second.diverted.is_empty());
        assert_eq!(second.matched.len(), 10);
    }

    #[test]
    fn test_endpoint_pair_display() {
        assert_eq!(
            EndpointPair::new(A, B).to_string(),
            "192.168.1.100 <-> 192.168.1.1"
        );
    }
}
