//! Bounded-retry replay of matched frames.
//!
//! Each frame goes through up to [`ATTEMPTS_PER_CYCLE`] transmission
//! attempts:
//!
//! ```text
//! NotSent ─► Attempt(1) ─► Attempt(2) ─► Attempt(3) ─► Exhausted
//!                │              │              │
//!                └──────────────┴──────────────┴──► Sent
//! ```
//!
//! A failed attempt is followed by a fixed delay when attempts remain. An
//! exhausted frame records one more failed cycle; it is handed back for retry
//! while it has fewer than [`MAX_REQUEUE_CYCLES`] failed cycles and dropped
//! otherwise. Sent frames are discarded.

use std::time::Duration;

use crate::error::Result;
use crate::protocol::Frame;
use crate::queue::FrameQueue;
use crate::transport::Transport;

/// Transmission attempts per frame per replay cycle.
pub const ATTEMPTS_PER_CYCLE: u32 = 3;

/// Failed cycles after which a frame is dropped instead of requeued.
pub const MAX_REQUEUE_CYCLES: u32 = 2;

/// Largest frame the replay path will transmit.
pub const MAX_REPLAY_LEN: usize = 1500;

/// Default pause between a failed attempt and the next one.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Result of replaying a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Accepted on the given attempt (1-based).
    Sent { attempt: u32 },
    /// Every attempt of the cycle failed.
    Exhausted,
}

/// Tally of one replay cycle.
#[derive(Debug, Default)]
pub struct ReplayOutcome {
    pub sent: usize,
    /// Exhausted frames, requeued or dropped.
    pub failed: usize,
    pub requeued: usize,
    pub dropped: usize,
    /// Frames to append to the retry backlog.
    pub retry: FrameQueue,
}

/// Replay state machine over a pluggable transport.
pub struct ReplayEngine<T> {
    transport: T,
    retry_delay: Duration,
}

impl<T: Transport> ReplayEngine<T> {
    /// Create an engine with the default retry delay.
    pub fn new(transport: T) -> Self {
        Self::with_retry_delay(transport, DEFAULT_RETRY_DELAY)
    }

    pub fn with_retry_delay(transport: T, retry_delay: Duration) -> Self {
        Self {
            transport,
            retry_delay,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Run one cycle of attempts for a single frame.
    pub async fn deliver(&mut self, frame: &Frame) -> Delivery {
        for attempt in 1..=ATTEMPTS_PER_CYCLE {
            if self.attempt(frame) {
                tracing::debug!("Frame #{} sent on attempt {}", frame.id(), attempt);
                return Delivery::Sent { attempt };
            }

            tracing::debug!(
                "Frame #{} attempt {}/{} failed",
                frame.id(),
                attempt,
                ATTEMPTS_PER_CYCLE
            );

            if attempt < ATTEMPTS_PER_CYCLE {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Delivery::Exhausted
    }

    /// Oversized and empty frames fail without reaching the transport.
    fn attempt(&mut self, frame: &Frame) -> bool {
        (1..=MAX_REPLAY_LEN).contains(&frame.len()) && self.transport.send(frame.data())
    }

    /// Drain `matched`, replaying every frame once.
    ///
    /// `matched` is empty afterwards. Frames that keep failing come back in
    /// [`ReplayOutcome::retry`]; the attempt count travels with the frame,
    /// so calling this again on requeued frames continues their history.
    pub async fn replay_all(&mut self, matched: &mut FrameQueue) -> Result<ReplayOutcome> {
        let mut outcome = ReplayOutcome::default();

        while !matched.is_empty() {
            let mut frame = matched.dequeue()?;

            match self.deliver(&frame).await {
                Delivery::Sent { .. } => outcome.sent += 1,
                Delivery::Exhausted => {
                    outcome.failed += 1;
                    let cycles = frame.record_exhausted_cycle();

                    if cycles < MAX_REQUEUE_CYCLES {
                        tracing::debug!(
                            "Frame #{} moved to retry queue (attempts: {})",
                            frame.id(),
                            cycles
                        );
                        outcome.requeued += 1;
                        outcome.retry.enqueue(frame);
                    } else {
                        tracing::warn!(
                            "Frame #{} dropped after {} failed replay cycles",
                            frame.id(),
                            cycles
                        );
                        outcome.dropped += 1;
                    }
                }
            }
        }

        tracing::info!(
            sent = outcome.sent,
            failed = outcome.failed,
            requeued = outcome.requeued,
            dropped = outcome.dropped,
            "Replay cycle complete"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{from_fn, ScriptedTransport};
    use tokio::time::Instant;

    fn frame(id: u64, len: usize) -> Frame {
        Frame::from_slice(id, &vec![0u8; len]).unwrap()
    }

    fn engine(transport: ScriptedTransport) -> ReplayEngine<ScriptedTransport> {
        ReplayEngine::with_retry_delay(transport, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_sent_on_first_attempt() {
        let mut engine = engine(ScriptedTransport::always(true));
        assert_eq!(
            engine.deliver(&frame(1, 60)).await,
            Delivery::Sent { attempt: 1 }
        );
        assert_eq!(engine.transport().calls(), 1);
    }

    #[tokio::test]
    async fn test_sent_on_third_attempt() {
        let mut engine = engine(ScriptedTransport::new([false, false, true]));
        assert_eq!(
            engine.deliver(&frame(1, 60)).await,
            Delivery::Sent { attempt: 3 }
        );
    }

    #[tokio::test]
    async fn test_at_most_three_attempts() {
        let mut engine = engine(ScriptedTransport::always(false));
        assert_eq!(engine.deliver(&frame(1, 60)).await, Delivery::Exhausted);
        assert_eq!(engine.transport().calls(), ATTEMPTS_PER_CYCLE as usize);
    }

    #[tokio::test]
    async fn test_length_bounds_gate_transport() {
        let mut engine = engine(ScriptedTransport::always(true));

        assert_eq!(engine.deliver(&frame(1, 0)).await, Delivery::Exhausted);
        assert_eq!(
            engine.deliver(&frame(2, MAX_REPLAY_LEN + 1)).await,
            Delivery::Exhausted
        );
        assert_eq!(engine.transport().calls(), 0);

        assert_eq!(
            engine.deliver(&frame(3, MAX_REPLAY_LEN)).await,
            Delivery::Sent { attempt: 1 }
        );
        assert_eq!(
            engine.deliver(&frame(4, 1)).await,
            Delivery::Sent { attempt: 1 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_only_between_attempts() {
        let mut engine = ReplayEngine::with_retry_delay(
            ScriptedTransport::always(false),
            Duration::from_millis(50),
        );

        let start = Instant::now();
        engine.deliver(&frame(1, 60)).await;

        // Two pauses for three attempts.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(150));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_delay_after_success() {
        let mut engine = ReplayEngine::with_retry_delay(
            ScriptedTransport::always(true),
            Duration::from_secs(1),
        );

        let start = Instant::now();
        engine.deliver(&frame(1, 60)).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_replay_all_tally() {
        // frame 1: sent first try; frame 2: fails 3x; frame 3: sent second try
        let mut engine = engine(ScriptedTransport::new([
            true, false, false, false, false, true,
        ]));
        let mut matched: FrameQueue = (1..=3).map(|id| frame(id, 100)).collect();

        let outcome = engine.replay_all(&mut matched).await.unwrap();

        assert!(matched.is_empty());
        assert_eq!(outcome.sent, 2);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.requeued, 1);
        assert_eq!(outcome.dropped, 0);

        let retried: Vec<&Frame> = outcome.retry.iter().collect();
        assert_eq!(retried.len(), 1);
        assert_eq!(retried[0].id(), 2);
        assert_eq!(retried[0].attempts_made(), 1);
    }

    #[tokio::test]
    async fn test_second_exhaustion_drops() {
        let mut engine = engine(ScriptedTransport::always(false));
        let mut matched: FrameQueue = std::iter::once(frame(1, 100)).collect();

        let first = engine.replay_all(&mut matched).await.unwrap();
        assert_eq!(first.requeued, 1);

        let mut again = first.retry;
        let second = engine.replay_all(&mut again).await.unwrap();
        assert_eq!(second.failed, 1);
        assert_eq!(second.dropped, 1);
        assert_eq!(second.requeued, 0);
        assert!(second.retry.is_empty());
        assert_eq!(engine.transport().calls(), 6);
    }

    #[tokio::test]
    async fn test_retry_order_preserved() {
        let mut engine = engine(ScriptedTransport::always(false));
        let mut matched: FrameQueue = (1..=4).map(|id| frame(id, 100)).collect();

        let outcome = engine.replay_all(&mut matched).await.unwrap();
        let ids: Vec<u64> = outcome.retry.iter().map(Frame::id).collect();
        assert_eq!(ids, [1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_replay_all_empty() {
        let mut engine = engine(ScriptedTransport::always(true));
        let outcome = engine.replay_all(&mut FrameQueue::new()).await.unwrap();
        assert_eq!(outcome.sent + outcome.failed, 0);
    }

    #[tokio::test]
    async fn test_transport_sees_frame_bytes() {
        let mut engine = ReplayEngine::with_retry_delay(
            from_fn(|bytes: &[u8]| bytes.first() == Some(&0xAB)),
            Duration::ZERO,
        );

        let good = Frame::from_slice(1, &[0xAB, 0x01]).unwrap();
        let bad = Frame::from_slice(2, &[0x00, 0x01]).unwrap();
        assert_eq!(engine.deliver(&good).await, Delivery::Sent { attempt: 1 });
        assert_eq!(engine.deliver(&bad).await, Delivery::Exhausted);
    }
}
