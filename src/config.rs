//! Runtime configuration.
//!
//! Every field has a default, so a partial JSON document (or none at all)
//! is enough:
//!
//! ```
//! use packet_monitor::config::MonitorConfig;
//!
//! let config = MonitorConfig::from_json(r#"{ "retry_delay_ms": 5 }"#).unwrap();
//! assert_eq!(config.retry_delay_ms, 5);
//! assert_eq!(config.capture_budget_ms, 60_000);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};
use crate::filter::EndpointPair;
use crate::transport::DEFAULT_SUCCESS_PERCENT;

/// Default capture duration in milliseconds.
pub const DEFAULT_CAPTURE_BUDGET_MS: u64 = 60_000;

/// Default delay between replay attempts in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 50;

/// Monitor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Capture duration used when the caller gives none (or zero).
    pub capture_budget_ms: u64,
    /// Pause between a failed replay attempt and the next one.
    pub retry_delay_ms: u64,
    /// Acceptance rate of the simulated lossy link, in percent.
    pub lossy_success_percent: u8,
    /// Fixed seed for the simulated link; random when absent.
    pub lossy_seed: Option<u64>,
    /// Endpoint pair used by unattended runs.
    pub default_filter: EndpointPair,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            capture_budget_ms: DEFAULT_CAPTURE_BUDGET_MS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            lossy_success_percent: DEFAULT_SUCCESS_PERCENT,
            lossy_seed: None,
            default_filter: EndpointPair::new("192.168.1.100", "192.168.1.1"),
        }
    }
}

impl MonitorConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.capture_budget_ms == 0 {
            return Err(MonitorError::Config(
                "capture_budget_ms must be greater than zero".to_string(),
            ));
        }
        if self.lossy_success_percent > 100 {
            return Err(MonitorError::Config(format!(
                "lossy_success_percent must be 0-100, got {}",
                self.lossy_success_percent
            )));
        }
        if self.default_filter.a.is_empty() || self.default_filter.b.is_empty() {
            return Err(MonitorError::Config(
                "default_filter endpoints must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn capture_budget(&self) -> Duration {
        Duration::from_millis(self.capture_budget_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
