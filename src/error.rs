//! Error types for packet-monitor.

use thiserror::Error;

/// Main error type for all monitor operations.
///
/// Expected pipeline outcomes (no match, truncated frame, exhausted replay)
/// are reported through return values, never through this type.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// I/O error while writing reports or reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error (config and reports).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The frame source could not be initialized (e.g. missing privileges).
    #[error("Frame source initialization failed: {0}")]
    SourceInit(String),

    /// Dequeue attempted on an empty queue.
    #[error("Dequeue from empty queue")]
    EmptyQueue,

    /// Frame buffer exceeds the capture limit.
    #[error("Frame of {len} bytes exceeds maximum {max}")]
    FrameTooLarge { len: usize, max: usize },

    /// Invalid configuration value.
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using MonitorError.
pub type Result<T> = std::result::Result<T, MonitorError>;
