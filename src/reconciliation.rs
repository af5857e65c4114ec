//! # Reconciliation Engine
//!
//! Drains the durable fallback queue into the remote service once it looks
//! reachable again. Runs independently of the submission path: once on
//! startup after a short settle delay, and again on every unhealthy→healthy
//! edge published by the health monitor.
//!
//! Entries are processed strictly in capture order through the same retried
//! insert used by direct submission. A failed sync leaves the entry
//! untouched for the next pass; an entry is retained indefinitely until it
//! syncs or an operator purges it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::health::HealthMonitor;
use crate::queue::FallbackQueue;
use crate::remote::RemoteDataService;
use crate::retry::{RetryExecutor, RetryOutcome, RetryPolicy};

/// Tally of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationReport {
    pub synced: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Delivers queued submissions once the remote service recovers
pub struct ReconciliationEngine {
    remote: Arc<dyn RemoteDataService>,
    queue: Arc<FallbackQueue>,
    retry: RetryExecutor,
    policy: RetryPolicy,
}

impl fmt::Debug for ReconciliationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconciliationEngine")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ReconciliationEngine {
    pub fn new(
        remote: Arc<dyn RemoteDataService>,
        health: Arc<HealthMonitor>,
        queue: Arc<FallbackQueue>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            remote,
            queue,
            retry: RetryExecutor::new(health),
            policy,
        }
    }

    /// Attempt to deliver every unsynced queue entry, in capture order
    ///
    /// A duplicate-key conflict means the record already landed remotely
    /// (the insert carries the record id as an idempotency key), so the
    /// entry is marked synced rather than retried forever.
    pub async fn reconcile_once(&self) -> ReconciliationReport {
        let mut report = ReconciliationReport::default();

        let entries = match self.queue.list_unsynced() {
            Ok(entries) => entries,
            Err(err) => {
                error!(error = %err, "Reconciliation could not read the fallback queue");
                report.errors.push(err.to_string());
                return report;
            }
        };

        if entries.is_empty() {
            debug!("Fallback queue empty, nothing to reconcile");
            return report;
        }

        info!(pending = entries.len(), "🔄 Reconciliation pass starting");

        for entry in entries {
            let record_id = entry.record.id;
            let remote = Arc::clone(&self.remote);
            let record = entry.record.clone();

            let outcome = self
                .retry
                .execute_with_retry(self.policy, move |_| {
                    let remote = Arc::clone(&remote);
                    let record = record.clone();
                    async move { remote.insert_lead(&record).await }
                })
                .await;

            let delivered = match outcome {
                RetryOutcome::Success { .. } => true,
                RetryOutcome::Failure { error, .. } if error.is_conflict() => {
                    debug!(record_id = %record_id, "Entry already present remotely, marking synced");
                    true
                }
                RetryOutcome::Failure { error, .. } => {
                    warn!(record_id = %record_id, error = %error, "Entry left queued for next pass");
                    report.failed += 1;
                    report.errors.push(format!("{record_id}: {error}"));
                    false
                }
            };

            if delivered {
                match self.queue.mark_synced(record_id) {
                    Ok(_) => report.synced += 1,
                    Err(err) => {
                        // Delivered but not flagged locally; the idempotency
                        // key turns the eventual replay into a conflict.
                        error!(record_id = %record_id, error = %err, "Failed to mark entry synced");
                        report.failed += 1;
                        report.errors.push(format!("{record_id}: {err}"));
                    }
                }
            }
        }

        info!(
            synced = report.synced,
            failed = report.failed,
            "🔄 Reconciliation pass finished"
        );
        report
    }

    /// Run the engine's trigger loop
    ///
    /// One startup pass after `settle_delay` (avoiding a race with initial
    /// health probes), then a pass on every unhealthy→healthy edge. Returns
    /// when the health monitor is dropped.
    pub async fn run(self: Arc<Self>, health: Arc<HealthMonitor>, settle_delay: Duration) {
        let mut healthy_rx = health.subscribe();

        tokio::time::sleep(settle_delay).await;
        self.reconcile_once().await;

        let mut was_healthy = *healthy_rx.borrow();
        while healthy_rx.changed().await.is_ok() {
            let is_healthy = *healthy_rx.borrow();
            if is_healthy && !was_healthy {
                info!("Health recovered, draining fallback queue");
                self.reconcile_once().await;
            }
            was_healthy = is_healthy;
        }
    }
}
