//! # Submission Data Model
//!
//! Captured form payloads and their metadata. The form payload is an explicit
//! structured type with named optional fields, validated once at the boundary,
//! so the retry and queue layers never have to special-case unknown shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum accepted length for free-text fields
const MAX_TEXT_LEN: usize = 5000;

/// How a submission reached (or will reach) the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionSource {
    /// Submitted directly while the remote service was responsive
    Direct,
    /// Queued locally after the submission timer fired first
    TimeoutFallback,
    /// Queued locally after all retry attempts were exhausted
    RetryExhaustedFallback,
}

impl fmt::Display for SubmissionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::TimeoutFallback => write!(f, "timeout_fallback"),
            Self::RetryExhaustedFallback => write!(f, "retry_exhausted_fallback"),
        }
    }
}

impl std::str::FromStr for SubmissionSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "timeout_fallback" => Ok(Self::TimeoutFallback),
            "retry_exhausted_fallback" => Ok(Self::RetryExhaustedFallback),
            _ => Err(format!("Invalid submission source: {s}")),
        }
    }
}

/// User-entered lead form fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFields {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A field-level validation error surfaced to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl LeadFields {
    /// Run boundary validation, returning every failed field
    ///
    /// An empty result means the payload is safe to capture. Validation is
    /// synchronous and never reaches the remote service.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(FieldError::new("email", "email is required"));
        } else if !is_plausible_email(email) {
            errors.push(FieldError::new("email", "email address is not valid"));
        }

        for (field, value) in [
            ("name", &self.name),
            ("company", &self.company),
            ("message", &self.message),
        ] {
            if let Some(text) = value {
                if text.len() > MAX_TEXT_LEN {
                    errors.push(FieldError::new(
                        field,
                        format!("{field} exceeds {MAX_TEXT_LEN} characters"),
                    ));
                }
            }
        }

        errors
    }
}

/// Minimal structural check: local part, one '@', and a dotted domain
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

/// A captured form payload plus metadata
///
/// The identifier is assigned once at capture time and never changes; it is
/// the sole key used to detect duplicates during reconciliation and doubles
/// as the idempotency key sent with every remote insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub source: SubmissionSource,
    pub fields: LeadFields,
}

impl SubmissionRecord {
    /// Capture a validated form payload as a new record
    pub fn capture(fields: LeadFields) -> Self {
        Self {
            id: Uuid::new_v4(),
            captured_at: Utc::now(),
            source: SubmissionSource::Direct,
            fields,
        }
    }

    /// Retag the record with the path it actually took
    ///
    /// The identifier and payload are untouched; only the source tag moves.
    pub fn with_source(mut self, source: SubmissionSource) -> Self {
        self.source = source;
        self
    }
}
