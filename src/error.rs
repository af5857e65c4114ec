//! # Crate Error Types
//!
//! Top-level error enum for the lead-relay pipeline using thiserror for
//! structured error types instead of `Box<dyn Error>` patterns. Module-level
//! errors (`RemoteError`, `QueueError`, `StoreError`) convert into this type
//! at the crate boundary.

use thiserror::Error;

use crate::queue::store::StoreError;
use crate::queue::QueueError;
use crate::remote::RemoteError;

/// Top-level error type for lead-relay operations
#[derive(Error, Debug)]
pub enum LeadRelayError {
    #[error("remote service error: {0}")]
    Remote(#[from] RemoteError),

    #[error("fallback queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("durable store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl LeadRelayError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Result type alias for lead-relay operations
pub type Result<T> = std::result::Result<T, LeadRelayError>;
