//! # Submission Orchestrator
//!
//! The per-form-submit state machine. After boundary validation passes, the
//! remote insert (under retry) races a fixed wall-clock timer; whichever
//! settles first decides the outcome. A lost race or exhausted retries never
//! surfaces as a hard failure: the record goes to the durable fallback
//! queue and the caller sees a degraded acceptance.
//!
//! The race is settled with `tokio::select!`, so the losing branch is
//! dropped rather than left running. That removes the in-process half of the
//! duplicate-delivery window; a request already on the wire may still land,
//! which is why every insert carries the record id as an idempotency key.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::health::HealthMonitor;
use crate::model::{FieldError, LeadFields, SubmissionRecord, SubmissionSource};
use crate::queue::FallbackQueue;
use crate::remote::RemoteDataService;
use crate::retry::{RetryExecutor, RetryOutcome};

/// States of the per-submission lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    /// Waiting for a submit event
    Idle,
    /// Running synchronous field-level checks
    Validating,
    /// Racing the retried remote insert against the submission timer
    Submitting,
    /// Remote insert confirmed
    Success,
    /// Accepted locally; delivery deferred to reconciliation
    DegradedSuccess,
    /// Input validation failed; the only hard failure the caller sees
    RejectedInput,
}

impl SubmissionState {
    /// Check if this is a terminal state for the submission
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::DegradedSuccess)
    }

    /// Check if this state reports acceptance to the user
    pub fn is_accepting(&self) -> bool {
        matches!(self, Self::Success | Self::DegradedSuccess)
    }

    /// Whether the machine may move from this state to `target`
    pub fn can_transition_to(&self, target: SubmissionState) -> bool {
        matches!(
            (self, target),
            (Self::Idle, Self::Validating)
                | (Self::Validating, Self::Submitting)
                | (Self::Validating, Self::RejectedInput)
                | (Self::Submitting, Self::Success)
                | (Self::Submitting, Self::DegradedSuccess)
                | (Self::RejectedInput, Self::Idle)
        )
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Validating => write!(f, "validating"),
            Self::Submitting => write!(f, "submitting"),
            Self::Success => write!(f, "success"),
            Self::DegradedSuccess => write!(f, "degraded_success"),
            Self::RejectedInput => write!(f, "rejected_input"),
        }
    }
}

/// Caller-facing result of one submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub status: SubmissionState,
    pub field_errors: Vec<FieldError>,
    pub user_message: String,
    /// Identifier of the captured record, absent when input was rejected
    pub record_id: Option<Uuid>,
}

impl SubmissionOutcome {
    fn rejected(field_errors: Vec<FieldError>) -> Self {
        Self {
            status: SubmissionState::RejectedInput,
            field_errors,
            user_message: "Please correct the highlighted fields.".to_string(),
            record_id: None,
        }
    }

    fn accepted(status: SubmissionState, record_id: Uuid) -> Self {
        let user_message = match status {
            SubmissionState::Success => "Thanks! We'll be in touch shortly.".to_string(),
            _ => "Thanks! We may be experiencing a delay, but your request was recorded."
                .to_string(),
        };
        Self {
            status,
            field_errors: Vec::new(),
            user_message,
            record_id: Some(record_id),
        }
    }
}

/// Orchestrates a single form submission end to end
///
/// Explicitly constructed with its collaborators injected, so tests can
/// substitute fakes and independent instances never share state.
pub struct SubmissionPipeline {
    remote: Arc<dyn RemoteDataService>,
    health: Arc<HealthMonitor>,
    queue: Arc<FallbackQueue>,
    retry: RetryExecutor,
    config: PipelineConfig,
}

impl fmt::Debug for SubmissionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmissionPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SubmissionPipeline {
    pub fn new(
        remote: Arc<dyn RemoteDataService>,
        health: Arc<HealthMonitor>,
        queue: Arc<FallbackQueue>,
        config: PipelineConfig,
    ) -> Self {
        let retry = RetryExecutor::new(Arc::clone(&health));
        Self {
            remote,
            health,
            queue,
            retry,
            config,
        }
    }

    /// The health monitor this pipeline reports to
    pub fn health(&self) -> &Arc<HealthMonitor> {
        &self.health
    }

    /// Handle one submit event
    ///
    /// Exactly one record is captured per validated submission and at most
    /// one queue entry is written. Every post-validation path ends in an
    /// accepting state.
    pub async fn submit(&self, fields: LeadFields) -> SubmissionOutcome {
        let mut state = self.transition(SubmissionState::Idle, SubmissionState::Validating);

        let field_errors = fields.validate();
        if !field_errors.is_empty() {
            self.transition(state, SubmissionState::RejectedInput);
            return SubmissionOutcome::rejected(field_errors);
        }

        let record = SubmissionRecord::capture(fields);
        let record_id = record.id;
        state = self.transition(state, SubmissionState::Submitting);
        info!(record_id = %record_id, "📨 Lead submission started");

        let remote = Arc::clone(&self.remote);
        let attempt_record = record.clone();
        let retry_fut = self
            .retry
            .execute_with_retry(self.config.retry_policy(), move |_| {
                let remote = Arc::clone(&remote);
                let record = attempt_record.clone();
                async move { remote.insert_lead(&record).await }
            });
        tokio::pin!(retry_fut);

        let status = tokio::select! {
            outcome = &mut retry_fut => match outcome {
                RetryOutcome::Success { attempts, .. } => {
                    info!(record_id = %record_id, attempts, "✅ Lead delivered directly");
                    self.transition(state, SubmissionState::Success)
                }
                RetryOutcome::Failure { error, attempts } => {
                    warn!(
                        record_id = %record_id,
                        attempts,
                        error = %error,
                        "Remote insert failed, falling back to local queue"
                    );
                    self.queue_fallback(record, SubmissionSource::RetryExhaustedFallback);
                    self.transition(state, SubmissionState::DegradedSuccess)
                }
            },
            _ = tokio::time::sleep(self.config.submit_timeout()) => {
                warn!(
                    record_id = %record_id,
                    timeout_ms = self.config.submit_timeout_ms,
                    "Submission timer fired, falling back to local queue"
                );
                self.queue_fallback(record, SubmissionSource::TimeoutFallback);
                self.transition(state, SubmissionState::DegradedSuccess)
            }
        };

        SubmissionOutcome::accepted(status, record_id)
    }

    /// Write the record to the fallback queue, absorbing queue I/O failures
    ///
    /// Blocking the user on a local storage failure is judged worse than
    /// accepting without a local copy, so the failure is only logged.
    fn queue_fallback(&self, record: SubmissionRecord, source: SubmissionSource) {
        if let Err(err) = self.queue.enqueue(record.with_source(source)) {
            error!(
                source = %source,
                error = %err,
                "⚠️ Fallback queue write failed; submission accepted without local copy"
            );
        }
    }

    fn transition(&self, from: SubmissionState, to: SubmissionState) -> SubmissionState {
        debug_assert!(from.can_transition_to(to), "invalid transition {from} -> {to}");
        debug!(from = %from, to = %to, "Submission state transition");
        to
    }
}
