//! # Durable Store Seam
//!
//! The fallback queue persists through a minimal key/value surface: read the
//! whole serialized list, write the whole serialized list. No partial-write
//! or transaction guarantee is assumed of any implementation.

use parking_lot::Mutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure reading or writing a durable store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    /// Create an unavailable-store error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Read-all / write-all pair over one serialized payload
pub trait DurableStore: Send + Sync {
    /// Read the entire stored payload, `None` if nothing was ever written
    fn read_all(&self) -> Result<Option<String>, StoreError>;

    /// Replace the entire stored payload
    fn write_all(&self, payload: &str) -> Result<(), StoreError>;
}

/// File-backed store holding one JSON document
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DurableStore for JsonFileStore {
    fn read_all(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_all(&self, payload: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, payload)?;
        Ok(())
    }
}

/// In-memory store for ephemeral use and tests
#[derive(Debug, Default)]
pub struct InMemoryStore {
    payload: Mutex<Option<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store with a payload
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: Mutex::new(Some(payload.into())),
        }
    }
}

impl DurableStore for InMemoryStore {
    fn read_all(&self) -> Result<Option<String>, StoreError> {
        Ok(self.payload.lock().clone())
    }

    fn write_all(&self, payload: &str) -> Result<(), StoreError> {
        *self.payload.lock() = Some(payload.to_string());
        Ok(())
    }
}
