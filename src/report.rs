//! Machine-readable reports.
//!
//! Listings, analyses and statistics are plain serde values. This module
//! adds the row types and writes values as single JSON lines, so a caller
//! can pipe monitor output into other tools.
//!
//! # Important
//!
//! - **stdout**: one JSON document per line
//! - **stderr**: logs (tracing), never parsed
//!
//! # Example
//!
//! ```
//! use packet_monitor::report::write_json_line;
//! use packet_monitor::stats::StatsSnapshot;
//!
//! let mut out = Vec::new();
//! let stats = StatsSnapshot { primary: 1, matched: 0, retry: 0, total_ingested: 1 };
//! write_json_line(&mut out, &stats).unwrap();
//! assert!(out.ends_with(b"}\n"));
//! ```

use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::protocol::{Decoded, Frame, LayerKind};

/// One row of a queue listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSummary {
    pub id: u64,
    /// Seconds since the Unix epoch.
    pub captured_at: u64,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub len: usize,
    pub attempts_made: u32,
    pub estimated_delay_ms: f64,
}

impl FrameSummary {
    pub fn of(frame: &Frame) -> Self {
        Self {
            id: frame.id(),
            captured_at: frame.captured_at_secs(),
            source: frame.source().map(str::to_owned),
            destination: frame.destination().map(str::to_owned),
            len: frame.len(),
            attempts_made: frame.attempts_made(),
            estimated_delay_ms: frame.estimated_delay_ms(),
        }
    }
}

/// Layer breakdown of one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameAnalysis {
    pub id: u64,
    pub source: Option<String>,
    pub destination: Option<String>,
    pub len: usize,
    /// Layers in header order, outermost first.
    pub layers: Vec<LayerKind>,
}

impl FrameAnalysis {
    pub fn of(frame: &Frame, decoded: &Decoded) -> Self {
        Self {
            id: frame.id(),
            source: frame.source().map(str::to_owned),
            destination: frame.destination().map(str::to_owned),
            len: frame.len(),
            layers: decoded.layers.iter().map(|l| l.kind).collect(),
        }
    }
}

/// Serialize `value` as one line of JSON followed by `\n`.
///
/// Uses an explicit `\n` and flushes, so a reader waiting on the line sees
/// it immediately.
pub fn write_json_line<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: Write,
    T: Serialize + ?Sized,
{
    serde_json::to_writer(&mut *writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write each item as its own JSON line.
pub fn write_json_lines<'a, W, T, I>(writer: &mut W, items: I) -> Result<()>
where
    W: Write,
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    for item in items {
        write_json_line(writer, item)?;
    }
    Ok(())
}

/// Write a JSON line to stdout.
pub fn write_stdout_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write_json_line(&mut handle, value)
}
