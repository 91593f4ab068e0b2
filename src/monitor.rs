//! Monitor builder and pipeline context.
//!
//! The [`MonitorBuilder`] provides a fluent API for configuring the replay
//! transport and timings. The [`Monitor`] owns the three queues and runs the
//! pipeline stages in turn:
//! 1. Capture frames into the primary queue
//! 2. Inspect and decode the primary queue in place
//! 3. Filter matching frames into the matched queue
//! 4. Replay the matched queue, feeding failures to the retry backlog
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use bytes::Bytes;
//! use packet_monitor::capture::{MemorySource, StopSignal};
//! use packet_monitor::transport::ScriptedTransport;
//! use packet_monitor::Monitor;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let mut monitor = Monitor::builder()
//!     .transport(ScriptedTransport::always(true))
//!     .retry_delay(Duration::ZERO)
//!     .build()
//!     .unwrap();
//!
//! let mut source = MemorySource::new([Bytes::from_static(&[0u8; 60])]);
//! let report = monitor
//!     .start_capture(&mut source, Duration::from_secs(1), &mut StopSignal::never())
//!     .await
//!     .unwrap();
//!
//! assert_eq!(report.ingested, 1);
//! assert_eq!(monitor.stats().total_ingested, 1);
//! # });
//! ```

use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;

use crate::capture::{drive, CaptureReport, FrameSource, Ingest, StopSignal};
use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use crate::filter::{select, EndpointPair};
use crate::protocol::{decode, resolve_endpoints, Frame, MAX_FRAME_LEN};
use crate::queue::FrameQueue;
use crate::replay::ReplayEngine;
use crate::report::{FrameAnalysis, FrameSummary};
use crate::stats::{self, StatsSnapshot};
use crate::transport::{LossyTransport, Transport};

/// Transport object owned by a monitor.
pub type BoxTransport = Box<dyn Transport + Send>;

/// Builder for configuring and creating a [`Monitor`].
pub struct MonitorBuilder {
    config: MonitorConfig,
    transport: Option<BoxTransport>,
    retry_delay: Option<Duration>,
    capture_budget: Option<Duration>,
}

impl MonitorBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: MonitorConfig::default(),
            transport: None,
            retry_delay: None,
            capture_budget: None,
        }
    }

    /// Replace the whole configuration.
    ///
    /// Setters called afterwards still take precedence.
    pub fn config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the replay transport.
    ///
    /// Default: [`LossyTransport`] built from the configured rate and seed.
    pub fn transport<T>(mut self, transport: T) -> Self
    where
        T: Transport + Send + 'static,
    {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Set the pause between failed replay attempts.
    ///
    /// Default: 50ms
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Set the capture budget used when `start_capture` gets a zero budget.
    ///
    /// Default: 60 seconds
    pub fn capture_budget(mut self, budget: Duration) -> Self {
        self.capture_budget = Some(budget);
        self
    }

    /// Validate the configuration and build the monitor.
    pub fn build(self) -> Result<Monitor> {
        self.config.validate()?;

        let capture_budget = self
            .capture_budget
            .unwrap_or_else(|| self.config.capture_budget());
        if capture_budget.is_zero() {
            return Err(MonitorError::Config(
                "capture budget must be greater than zero".to_string(),
            ));
        }

        let transport = match self.transport {
            Some(transport) => transport,
            None => Box::new(lossy_from(&self.config)) as BoxTransport,
        };
        let retry_delay = self.retry_delay.unwrap_or_else(|| self.config.retry_delay());

        tracing::debug!(
            "Monitor built (capture budget {:?}, retry delay {:?}, default filter {})",
            capture_budget,
            retry_delay,
            self.config.default_filter
        );

        Ok(Monitor {
            primary: FrameQueue::new(),
            matched: FrameQueue::new(),
            retry: FrameQueue::new(),
            next_id: 0,
            replay: ReplayEngine::with_retry_delay(transport, retry_delay),
            capture_budget,
            config: self.config,
        })
    }
}

impl Default for MonitorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn lossy_from(config: &MonitorConfig) -> LossyTransport {
    match config.lossy_seed {
        Some(seed) => LossyTransport::with_seed(config.lossy_success_percent, seed),
        None => LossyTransport::new(config.lossy_success_percent),
    }
}

/// Counts from one filter pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterSummary {
    pub matched: usize,
    pub diverted: usize,
    pub retained: usize,
    pub oversized: usize,
}

/// Counts from one replay cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub sent: usize,
    pub failed: usize,
    pub requeued: usize,
    pub dropped: usize,
}

/// Pipeline context.
///
/// Every frame lives in exactly one of the three queues until it is sent or
/// dropped. Stages borrow the monitor mutably, so they never overlap.
pub struct Monitor {
    primary: FrameQueue,
    matched: FrameQueue,
    retry: FrameQueue,
    /// Last identifier handed out.
    next_id: u64,
    replay: ReplayEngine<BoxTransport>,
    /// Used when `start_capture` is given a zero budget. Never zero.
    capture_budget: Duration,
    config: MonitorConfig,
}

impl Monitor {
    /// Create a new monitor builder.
    pub fn builder() -> MonitorBuilder {
        MonitorBuilder::new()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn capture_budget(&self) -> Duration {
        self.capture_budget
    }

    pub fn primary(&self) -> &FrameQueue {
        &self.primary
    }

    pub fn matched(&self) -> &FrameQueue {
        &self.matched
    }

    pub fn retry(&self) -> &FrameQueue {
        &self.retry
    }

    /// Capture frames from `source` into the primary queue.
    ///
    /// A zero `budget` falls back to the configured capture budget. Frames
    /// ingested before a stop request are kept.
    ///
    /// # Errors
    ///
    /// Returns `SourceInit` when the source cannot be opened; no queue is
    /// touched in that case.
    pub async fn start_capture<S: FrameSource>(
        &mut self,
        source: &mut S,
        budget: Duration,
        stop: &mut StopSignal,
    ) -> Result<CaptureReport> {
        let budget = if budget.is_zero() {
            self.capture_budget
        } else {
            budget
        };

        tracing::info!("Capture started (budget {:?})", budget);

        let primary = &mut self.primary;
        let next_id = &mut self.next_id;
        let report = drive(source, budget, stop, |bytes| {
            ingest_into(primary, next_id, bytes)
        })
        .await
        .map_err(|e| {
            tracing::error!("Capture failed: {}", e);
            e
        })?;

        tracing::info!(
            ingested = report.ingested,
            rejected = report.rejected,
            "Capture ended: {:?}",
            report.end
        );

        Ok(report)
    }

    /// Ingest one raw buffer directly into the primary queue.
    pub fn ingest(&mut self, bytes: Bytes) -> Ingest {
        ingest_into(&mut self.primary, &mut self.next_id, bytes)
    }

    pub fn list_primary(&self) -> Vec<FrameSummary> {
        self.primary.iter().map(FrameSummary::of).collect()
    }

    /// Decode every frame of the primary queue without reordering it.
    ///
    /// Resolved endpoints are written back to the frames.
    pub fn decode_all(&mut self) -> Vec<FrameAnalysis> {
        self.primary.inspect(|frame| {
            let decoded = decode(frame.data());
            if let Some(endpoints) = &decoded.endpoints {
                frame.resolve(endpoints);
            }

            tracing::debug!(
                "Frame #{} decoded into {} layers",
                frame.id(),
                decoded.layers.len()
            );
            FrameAnalysis::of(frame, &decoded)
        })
    }

    /// Move frames exchanged between `a` and `b` to the matched queue.
    ///
    /// Oversized matches past the per-pass limit go to the retry backlog.
    pub fn filter(&mut self, a: &str, b: &str) -> FilterSummary {
        self.filter_pair(&EndpointPair::new(a, b))
    }

    /// Filter on the configured default endpoint pair.
    pub fn filter_default(&mut self) -> FilterSummary {
        let pair = self.config.default_filter.clone();
        self.filter_pair(&pair)
    }

    fn filter_pair(&mut self, pair: &EndpointPair) -> FilterSummary {
        let selection = select(std::mem::take(&mut self.primary), pair);

        let summary = FilterSummary {
            matched: selection.matched.len(),
            diverted: selection.diverted.len(),
            retained: selection.retained.len(),
            oversized: selection.oversized,
        };

        self.matched.append(selection.matched);
        self.retry.append(selection.diverted);
        self.primary = selection.retained;

        if summary.diverted > 0 {
            tracing::warn!(
                "{} oversized frames between {} diverted to retry queue",
                summary.diverted,
                pair
            );
        }
        tracing::info!(
            matched = summary.matched,
            retained = summary.retained,
            "Filtered {}",
            pair
        );

        summary
    }

    pub fn list_matched(&self) -> Vec<FrameSummary> {
        self.matched.iter().map(FrameSummary::of).collect()
    }

    /// Replay the whole matched queue once.
    ///
    /// The matched queue is empty afterwards; exhausted frames still under
    /// the cycle limit join the retry backlog.
    pub async fn replay(&mut self) -> Result<ReplaySummary> {
        let outcome = self.replay.replay_all(&mut self.matched).await?;

        let summary = ReplaySummary {
            sent: outcome.sent,
            failed: outcome.failed,
            requeued: outcome.requeued,
            dropped: outcome.dropped,
        };
        self.retry.append(outcome.retry);

        Ok(summary)
    }

    pub fn list_retry(&self) -> Vec<FrameSummary> {
        self.retry.iter().map(FrameSummary::of).collect()
    }

    /// Move the retry backlog, in order, to the tail of the matched queue.
    ///
    /// Returns the number of frames moved.
    pub fn requeue_retries(&mut self) -> usize {
        let moved = self.retry.len();
        self.matched.append(std::mem::take(&mut self.retry));

        if moved > 0 {
            tracing::info!("Requeued {} frames from retry queue", moved);
        }
        moved
    }

    pub fn stats(&self) -> StatsSnapshot {
        stats::snapshot(&self.primary, &self.matched, &self.retry, self.next_id)
    }
}

/// Append one raw buffer to `primary` under the next identifier.
///
/// The identifier is only consumed when the frame is accepted.
fn ingest_into(primary: &mut FrameQueue, next_id: &mut u64, bytes: Bytes) -> Ingest {
    if bytes.is_empty() {
        return Ingest::Ignored;
    }
    if bytes.len() > MAX_FRAME_LEN {
        tracing::warn!(
            "Dropping captured frame of {} bytes (limit {})",
            bytes.len(),
            MAX_FRAME_LEN
        );
        return Ingest::Rejected;
    }

    let endpoints = resolve_endpoints(&bytes);
    let mut frame = match Frame::new(*next_id + 1, bytes) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("Dropping captured frame: {}", e);
            return Ingest::Rejected;
        }
    };
    if let Some(endpoints) = &endpoints {
        frame.resolve(endpoints);
    }

    *next_id = frame.id();
    tracing::trace!("Captured frame #{} ({}B)", frame.id(), frame.len());
    primary.enqueue(frame);
    Ingest::Accepted
}
