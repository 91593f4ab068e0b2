//! Queue statistics.

use std::fmt;

use serde::Serialize;

use crate::queue::FrameQueue;

/// Point-in-time view of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub primary: usize,
    pub matched: usize,
    pub retry: usize,
    /// Identifiers handed out since the monitor was created.
    pub total_ingested: u64,
}

/// Project queue sizes into a snapshot. Touches nothing.
pub fn snapshot(
    primary: &FrameQueue,
    matched: &FrameQueue,
    retry: &FrameQueue,
    total_ingested: u64,
) -> StatsSnapshot {
    StatsSnapshot {
        primary: primary.len(),
        matched: matched.len(),
        retry: retry.len(),
        total_ingested,
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Main Queue ............... {} packets", self.primary)?;
        writeln!(f, "Filtered Queue ........... {} packets", self.matched)?;
        writeln!(f, "Retry Queue .............. {} packets", self.retry)?;
        write!(f, "Total Packets Captured ... {}", self.total_ingested)
    }
}
