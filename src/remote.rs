//! # Remote Data Service Interface
//!
//! The consumed boundary to the remote lead store. The pipeline only ever
//! needs "insert a record, get success or a classified failure" plus an
//! optional lightweight probe used to seed initial health state.
//!
//! Error classification drives the retry executor: permanent errors
//! (validation, duplicate key, authorization) recur identically on retry and
//! are never retried; everything else is assumed transient.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::SubmissionRecord;

/// Classified failure from the remote data service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("remote validation rejected the record: {message}")]
    Validation { message: String },

    #[error("duplicate record conflict: {message}")]
    Conflict { message: String },

    #[error("authorization failed: {message}")]
    Authorization { message: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("remote call timed out after {timeout_seconds}s")]
    Timeout { timeout_seconds: u64 },

    #[error("remote service error: {message}")]
    Service { message: String },
}

impl RemoteError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a duplicate-key conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create an authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a service (5xx-equivalent) error
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    /// Whether this error will recur identically on retry
    ///
    /// Permanent errors are retried zero additional times; they still count
    /// as failures for health tracking but do not necessarily indicate the
    /// service is unreachable.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::Conflict { .. } | Self::Authorization { .. }
        )
    }

    /// Whether this is a duplicate-key conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Confirmation returned by the remote store on a successful insert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredLead {
    /// Client-generated record identifier echoed back by the store
    pub id: Uuid,
    /// Server-side persistence timestamp
    pub stored_at: DateTime<Utc>,
}

/// The remote lead store, consumed as an opaque insert operation
///
/// The record `id` travels with every insert as a client-generated
/// idempotency key, so a replayed insert surfaces as a [`RemoteError::Conflict`]
/// rather than a silent duplicate.
#[async_trait]
pub trait RemoteDataService: Send + Sync {
    /// Persist one submission record
    async fn insert_lead(&self, record: &SubmissionRecord) -> Result<StoredLead, RemoteError>;

    /// Lightweight existence check used only to seed initial health state
    async fn probe(&self) -> Result<(), RemoteError>;
}
