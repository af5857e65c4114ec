//! # Pipeline Configuration
//!
//! Explicit configuration with sane defaults and `LEAD_RELAY_*` environment
//! overrides. The defaults encode the caller policy from the submission
//! design: 3 attempts with a 1 second base delay, a 5 second submission
//! timer, and a short settle delay before the startup reconciliation pass.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{LeadRelayError, Result};
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Total remote insert attempts per submission, including the first
    pub max_attempts: u32,
    /// Base backoff delay between retry attempts
    pub base_delay_ms: u64,
    /// Wall-clock budget for the submitting race
    pub submit_timeout_ms: u64,
    /// Delay before the startup reconciliation pass
    pub reconcile_settle_ms: u64,
    /// Backing file for the durable fallback queue
    pub queue_storage_path: PathBuf,
    /// Legacy storage bucket drained once at startup, if present
    pub legacy_storage_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            submit_timeout_ms: 5000,
            reconcile_settle_ms: 2000,
            queue_storage_path: PathBuf::from("data/lead_fallback_queue.json"),
            legacy_storage_path: None,
        }
    }
}

impl PipelineConfig {
    /// Build configuration from defaults plus environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("LEAD_RELAY_MAX_ATTEMPTS") {
            config.max_attempts = value.parse().map_err(|e| {
                LeadRelayError::configuration(format!("Invalid max_attempts: {e}"))
            })?;
        }

        if let Ok(value) = std::env::var("LEAD_RELAY_BASE_DELAY_MS") {
            config.base_delay_ms = value.parse().map_err(|e| {
                LeadRelayError::configuration(format!("Invalid base_delay_ms: {e}"))
            })?;
        }

        if let Ok(value) = std::env::var("LEAD_RELAY_SUBMIT_TIMEOUT_MS") {
            config.submit_timeout_ms = value.parse().map_err(|e| {
                LeadRelayError::configuration(format!("Invalid submit_timeout_ms: {e}"))
            })?;
        }

        if let Ok(value) = std::env::var("LEAD_RELAY_RECONCILE_SETTLE_MS") {
            config.reconcile_settle_ms = value.parse().map_err(|e| {
                LeadRelayError::configuration(format!("Invalid reconcile_settle_ms: {e}"))
            })?;
        }

        if let Ok(value) = std::env::var("LEAD_RELAY_QUEUE_PATH") {
            config.queue_storage_path = PathBuf::from(value);
        }

        if let Ok(value) = std::env::var("LEAD_RELAY_LEGACY_QUEUE_PATH") {
            config.legacy_storage_path = Some(PathBuf::from(value));
        }

        Ok(config)
    }

    /// Retry policy derived from this configuration
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }

    /// Wall-clock budget for the submitting race
    pub fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }

    /// Settle delay before the startup reconciliation pass
    pub fn reconcile_settle(&self) -> Duration {
        Duration::from_millis(self.reconcile_settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_caller_policy() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_policy().base_delay, Duration::from_secs(1));
        assert_eq!(config.submit_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("LEAD_RELAY_MAX_ATTEMPTS", "5");
        let config = PipelineConfig::from_env().unwrap();
        assert_eq!(config.max_attempts, 5);
        std::env::remove_var("LEAD_RELAY_MAX_ATTEMPTS");
    }

    #[test]
    fn test_invalid_env_value_rejected() {
        std::env::set_var("LEAD_RELAY_SUBMIT_TIMEOUT_MS", "soon");
        let result = PipelineConfig::from_env();
        assert!(result.is_err());
        std::env::remove_var("LEAD_RELAY_SUBMIT_TIMEOUT_MS");
    }
}
