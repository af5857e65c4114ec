//! # Connection Health Monitor
//!
//! Tracks whether the remote service appears reachable based purely on
//! locally observed outcomes. The monitor is an explicitly constructed
//! service object, one per pipeline, injected wherever it is needed, so
//! tests can run independent instances without cross-talk.
//!
//! A `tokio::sync::watch` channel publishes the healthy flag; the
//! reconciliation engine subscribes to it and reacts to unhealthy→healthy
//! edges. State mutation itself is synchronous and never blocks or fails.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::remote::RemoteDataService;

/// Point-in-time view of perceived remote-service health
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthState {
    pub is_healthy: bool,
    pub last_checked_at: DateTime<Utc>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            is_healthy: true,
            last_checked_at: Utc::now(),
            consecutive_failures: 0,
            last_error: None,
        }
    }
}

/// Process-scoped tracker of remote-service reachability
#[derive(Debug)]
pub struct HealthMonitor {
    state: RwLock<HealthState>,
    healthy_tx: watch::Sender<bool>,
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthMonitor {
    /// Create a monitor that starts out optimistic (healthy, zero failures)
    pub fn new() -> Self {
        let (healthy_tx, _) = watch::channel(true);
        Self {
            state: RwLock::new(HealthState::default()),
            healthy_tx,
        }
    }

    /// Record an observed success against the remote service
    ///
    /// Resets the consecutive failure count to zero and clears the last
    /// error. An unhealthy→healthy edge is published to watchers.
    pub fn record_success(&self) {
        let recovered = {
            let mut state = self.state.write();
            let recovered = !state.is_healthy;
            state.is_healthy = true;
            state.consecutive_failures = 0;
            state.last_error = None;
            state.last_checked_at = Utc::now();
            recovered
        };

        if recovered {
            info!("🟢 Remote service recovered");
        }
        // Watchers only see actual flips, not every recorded success
        self.healthy_tx.send_if_modified(|healthy| {
            let flipped = !*healthy;
            *healthy = true;
            flipped
        });
    }

    /// Record an observed failure against the remote service
    pub fn record_failure(&self, error_description: impl Into<String>) {
        let error_description = error_description.into();
        let consecutive_failures = {
            let mut state = self.state.write();
            state.is_healthy = false;
            state.consecutive_failures += 1;
            state.last_error = Some(error_description.clone());
            state.last_checked_at = Utc::now();
            state.consecutive_failures
        };

        warn!(
            consecutive_failures,
            error = %error_description,
            "🔴 Remote service failure observed"
        );
        self.healthy_tx.send_if_modified(|healthy| {
            let flipped = *healthy;
            *healthy = false;
            flipped
        });
    }

    /// Whether the remote service currently appears reachable
    pub fn is_healthy(&self) -> bool {
        self.state.read().is_healthy
    }

    /// Clone the current health state
    pub fn snapshot(&self) -> HealthState {
        self.state.read().clone()
    }

    /// Subscribe to healthy-flag changes
    ///
    /// The channel carries the current flag; receivers see an edge whenever
    /// the flag flips in either direction.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.healthy_tx.subscribe()
    }

    /// Seed health state from the optional remote probe
    pub async fn probe(&self, remote: &dyn RemoteDataService) {
        match remote.probe().await {
            Ok(()) => {
                debug!("Health probe succeeded");
                self.record_success();
            }
            Err(err) => {
                debug!(error = %err, "Health probe failed");
                self.record_failure(err.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starts_healthy() {
        let monitor = HealthMonitor::new();
        assert!(monitor.is_healthy());
        assert_eq!(monitor.snapshot().consecutive_failures, 0);
    }

    #[test]
    fn test_failure_then_success_resets_count() {
        let monitor = HealthMonitor::new();
        monitor.record_failure("connection refused");
        monitor.record_failure("connection refused");
        assert!(!monitor.is_healthy());
        assert_eq!(monitor.snapshot().consecutive_failures, 2);
        assert_eq!(
            monitor.snapshot().last_error.as_deref(),
            Some("connection refused")
        );

        monitor.record_success();
        let state = monitor.snapshot();
        assert!(state.is_healthy);
        assert_eq!(state.consecutive_failures, 0);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_watch_publishes_edges() {
        let monitor = HealthMonitor::new();
        let rx = monitor.subscribe();
        assert!(*rx.borrow());

        monitor.record_failure("down");
        assert!(!*rx.borrow());

        monitor.record_success();
        assert!(*rx.borrow());
    }

    proptest! {
        /// N failures leave the monitor unhealthy with an exact count; one
        /// success restores health and zeroes the count.
        #[test]
        fn prop_failure_runs_reset_on_success(n in 1u32..50) {
            let monitor = HealthMonitor::new();
            for i in 0..n {
                monitor.record_failure(format!("failure {i}"));
                prop_assert!(!monitor.is_healthy());
                prop_assert_eq!(monitor.snapshot().consecutive_failures, i + 1);
            }
            monitor.record_success();
            prop_assert!(monitor.is_healthy());
            prop_assert_eq!(monitor.snapshot().consecutive_failures, 0);
        }
    }

    #[tokio::test]
    async fn test_probe_seeds_state() {
        use crate::model::SubmissionRecord;
        use crate::remote::{RemoteError, StoredLead};
        use async_trait::async_trait;

        struct DownRemote;

        #[async_trait]
        impl RemoteDataService for DownRemote {
            async fn insert_lead(
                &self,
                _record: &SubmissionRecord,
            ) -> Result<StoredLead, RemoteError> {
                Err(RemoteError::network("unreachable"))
            }

            async fn probe(&self) -> Result<(), RemoteError> {
                Err(RemoteError::network("unreachable"))
            }
        }

        let monitor = HealthMonitor::new();
        monitor.probe(&DownRemote).await;
        assert!(!monitor.is_healthy());
        assert_eq!(monitor.snapshot().consecutive_failures, 1);
    }
}
