//! Captured frame with pipeline metadata.
//!
//! A [`Frame`] owns its bytes through `bytes::Bytes` and moves by value
//! between the pipeline queues. Only the resolved endpoints and the attempt
//! counter change after ingest; the buffer itself is never touched again.
//!
//! # Example
//!
//! ```
//! use packet_monitor::protocol::Frame;
//! use bytes::Bytes;
//!
//! let frame = Frame::new(1, Bytes::from_static(b"\x00\x01\x02")).unwrap();
//!
//! assert_eq!(frame.id(), 1);
//! assert_eq!(frame.len(), 3);
//! assert_eq!(frame.attempts_made(), 0);
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use super::decoder::Endpoints;
use super::wire_format::MAX_FRAME_LEN;
use crate::error::{MonitorError, Result};

/// A captured frame.
#[derive(Debug)]
pub struct Frame {
    id: u64,
    captured_at: SystemTime,
    data: Bytes,
    source: Option<String>,
    destination: Option<String>,
    attempts_made: u32,
}

impl Frame {
    /// Create a frame stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `FrameTooLarge` if `data` exceeds [`MAX_FRAME_LEN`].
    pub fn new(id: u64, data: Bytes) -> Result<Self> {
        Self::with_timestamp(id, data, SystemTime::now())
    }

    /// Create a frame with an explicit capture timestamp.
    pub fn with_timestamp(id: u64, data: Bytes, captured_at: SystemTime) -> Result<Self> {
        if data.len() > MAX_FRAME_LEN {
            return Err(MonitorError::FrameTooLarge {
                len: data.len(),
                max: MAX_FRAME_LEN,
            });
        }

        Ok(Self {
            id,
            captured_at,
            data,
            source: None,
            destination: None,
            attempts_made: 0,
        })
    }

    /// Create a frame from raw bytes (copies data).
    pub fn from_slice(id: u64, data: &[u8]) -> Result<Self> {
        Self::new(id, Bytes::copy_from_slice(data))
    }

    /// Attach endpoint strings directly.
    ///
    /// Useful when addresses come from an out-of-band source rather than
    /// the frame headers.
    pub fn with_endpoints(
        mut self,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        self.source = Some(source.into());
        self.destination = Some(destination.into());
        self
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn captured_at(&self) -> SystemTime {
        self.captured_at
    }

    /// Capture time as whole seconds since the Unix epoch.
    pub fn captured_at_secs(&self) -> u64 {
        self.captured_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Get a reference to the frame bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Resolved source address, if the headers carried one.
    #[inline]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Resolved destination address, if the headers carried one.
    #[inline]
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    /// Number of exhausted replay cycles.
    #[inline]
    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    /// Store endpoints resolved by the decoder.
    pub fn resolve(&mut self, endpoints: &Endpoints) {
        self.source = Some(endpoints.source.to_string());
        self.destination = Some(endpoints.destination.to_string());
    }

    /// Record one exhausted replay cycle and return the new count.
    pub(crate) fn record_exhausted_cycle(&mut self) -> u32 {
        self.attempts_made = self.attempts_made.saturating_add(1);
        self.attempts_made
    }

    /// Transmission delay estimate used in listings (1 µs per byte).
    #[inline]
    pub fn estimated_delay_ms(&self) -> f64 {
        self.data.len() as f64 / 1000.0
    }
}
