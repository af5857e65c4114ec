#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Lead Relay
//!
//! Resilient lead-submission pipeline for a client talking to a remote data
//! service that may be slow, degraded, or temporarily unreachable.
//!
//! ## Overview
//!
//! A form submission must never show the user a hard failure for a transient
//! problem, never silently drop data, never double-submit after recovery,
//! and keep remote load bounded during outages. The pipeline resolves these
//! competing constraints by racing a health-aware retried insert against a
//! wall-clock timer and falling back to a durable local queue, which a
//! reconciliation engine later drains.
//!
//! ## Module Organization
//!
//! - [`model`] - Captured submission records and boundary validation
//! - [`remote`] - The consumed remote-service interface and error taxonomy
//! - [`health`] - Connection health tracking from locally observed outcomes
//! - [`retry`] - Classification-aware retries with exponential backoff
//! - [`queue`] - Durable fallback queue over a read-all/write-all store
//! - [`submission`] - The per-submit state machine and caller-facing API
//! - [`reconciliation`] - Queue draining on startup and health recovery
//! - [`config`] - Configuration with environment overrides
//! - [`logging`] - Structured tracing initialization
//! - [`error`] - Crate-level error types
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lead_relay::{
//!     FallbackQueue, HealthMonitor, JsonFileStore, LeadFields, PipelineConfig,
//!     SubmissionPipeline,
//! };
//! # use lead_relay::RemoteDataService;
//! # async fn example(remote: Arc<dyn RemoteDataService>) {
//! let config = PipelineConfig::default();
//! let health = Arc::new(HealthMonitor::new());
//! let queue = Arc::new(FallbackQueue::new(Box::new(JsonFileStore::new(
//!     config.queue_storage_path.clone(),
//! ))));
//!
//! let pipeline = SubmissionPipeline::new(remote, health, queue, config);
//! let outcome = pipeline
//!     .submit(LeadFields {
//!         email: "a@b.com".to_string(),
//!         company: Some("Acme".to_string()),
//!         ..Default::default()
//!     })
//!     .await;
//! assert!(outcome.status.is_accepting());
//! # }
//! ```

pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod model;
pub mod queue;
pub mod reconciliation;
pub mod remote;
pub mod retry;
pub mod submission;

pub use config::PipelineConfig;
pub use error::{LeadRelayError, Result};
pub use health::{HealthMonitor, HealthState};
pub use model::{FieldError, LeadFields, SubmissionRecord, SubmissionSource};
pub use queue::store::{DurableStore, InMemoryStore, JsonFileStore, StoreError};
pub use queue::{FallbackQueue, QueueEntry, QueueError};
pub use reconciliation::{ReconciliationEngine, ReconciliationReport};
pub use remote::{RemoteDataService, RemoteError, StoredLead};
pub use retry::{RetryExecutor, RetryOutcome, RetryPolicy};
pub use submission::{SubmissionOutcome, SubmissionPipeline, SubmissionState};
