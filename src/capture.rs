//! Capture stage - pulling raw frames from an external source.
//!
//! Frame acquisition itself (raw sockets, pcap, taps) lives outside this
//! crate behind the [`FrameSource`] trait. [`drive`] runs a source until one
//! of three things happens:
//! - the time budget elapses
//! - the [`StopSignal`] fires
//! - the source reports it has no more frames
//!
//! Every frame handed to the ingest callback before that point is kept, even
//! when the capture is stopped in the middle of waiting for the next one.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use bytes::Bytes;
//! use packet_monitor::capture::{drive, Ingest, MemorySource, StopSignal};
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let mut source = MemorySource::new([Bytes::from_static(b"one"), Bytes::from_static(b"two")]);
//! let mut seen = Vec::new();
//!
//! let report = drive(&mut source, Duration::from_secs(1), &mut StopSignal::never(), |bytes| {
//!     seen.push(bytes);
//!     Ingest::Accepted
//! })
//! .await
//! .unwrap();
//!
//! assert_eq!(report.ingested, 2);
//! assert_eq!(seen.len(), 2);
//! # });
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use crate::error::Result;

/// Producer of raw frames.
pub trait FrameSource {
    /// Prepare the source for reading.
    ///
    /// # Errors
    ///
    /// Implementations return `SourceInit` when the source cannot be used
    /// (missing privileges, absent interface). The capture is abandoned
    /// without touching any queue.
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// Wait for the next frame. `None` means the source is exhausted.
    ///
    /// Must be cancel-safe: dropping the future loses no frame.
    fn receive(&mut self) -> impl Future<Output = Option<Bytes>>;
}

/// Source fed through a tokio mpsc channel.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<Bytes>,
}

impl ChannelSource {
    pub fn new(rx: mpsc::Receiver<Bytes>) -> Self {
        Self { rx }
    }

    /// Create a bounded channel and the source reading from it.
    pub fn channel(capacity: usize) -> (mpsc::Sender<Bytes>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }
}

impl FrameSource for ChannelSource {
    async fn receive(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }
}

/// Source replaying frames held in memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: VecDeque<Bytes>,
}

impl MemorySource {
    pub fn new(frames: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn push(&mut self, frame: Bytes) {
        self.frames.push_back(frame);
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for MemorySource {
    async fn receive(&mut self) -> Option<Bytes> {
        self.frames.pop_front()
    }
}

/// Create a linked stop handle and signal.
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

/// Requests an in-progress capture to end.
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    pub fn stop(&self) {
        // No receivers left means nothing is capturing.
        let _ = self.tx.send(true);
    }
}

/// Observed by a capture to learn it should end.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once a stop has been requested.
    pub async fn stopped(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // Handle dropped without stopping: wait forever.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// What the ingest callback did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingest {
    Accepted,
    /// Refused (e.g. larger than the frame limit).
    Rejected,
    /// Silently skipped (e.g. zero-length read).
    Ignored,
}

/// Why a capture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureEnd {
    BudgetElapsed,
    Stopped,
    SourceClosed,
}

/// Summary of one capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaptureReport {
    pub ingested: usize,
    pub rejected: usize,
    pub end: CaptureEnd,
}

/// Pull frames from `source` into `ingest` for at most `budget`.
///
/// # Errors
///
/// Propagates the source's `open()` failure; `ingest` is never called in
/// that case.
pub async fn drive<S, F>(
    source: &mut S,
    budget: Duration,
    stop: &mut StopSignal,
    mut ingest: F,
) -> Result<CaptureReport>
where
    S: FrameSource,
    F: FnMut(Bytes) -> Ingest,
{
    source.open()?;

    let deadline = Instant::now() + budget;
    let mut ingested = 0;
    let mut rejected = 0;

    let end = loop {
        tokio::select! {
            biased;

            _ = stop.stopped() => break CaptureEnd::Stopped,
            _ = tokio::time::sleep_until(deadline) => break CaptureEnd::BudgetElapsed,
            next = source.receive() => match next {
                Some(bytes) => match ingest(bytes) {
                    Ingest::Accepted => ingested += 1,
                    Ingest::Rejected => rejected += 1,
                    Ingest::Ignored => {}
                },
                None => break CaptureEnd::SourceClosed,
            },
        }
    };

    Ok(CaptureReport {
        ingested,
        rejected,
        end,
    })
}
