//! # Durable Fallback Queue
//!
//! An append-mostly local store of submissions that could not be confirmed
//! against the remote service. The backing store exposes only read-all and
//! write-all, so every mutation is a whole-list read-modify-write; capture
//! order is preserved and entries are only ever touched through their
//! `synced` flag.
//!
//! Queue operations are synchronous; the single-runtime model means no lock
//! is needed around the read-modify-write cycle within one client instance.

pub mod store;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::model::SubmissionRecord;
use store::{DurableStore, StoreError};

/// A queued submission awaiting delivery confirmation
///
/// `synced` is the only mutable field; once true it never flips back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub record: SubmissionRecord,
    #[serde(default)]
    pub synced: bool,
}

impl QueueEntry {
    fn new(record: SubmissionRecord) -> Self {
        Self {
            record,
            synced: false,
        }
    }
}

/// Failure in a fallback-queue operation
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("backing store failed: {0}")]
    Store(#[from] StoreError),

    #[error("queue payload corrupted: {0}")]
    Corrupted(#[from] serde_json::Error),
}

/// Local durable queue of unconfirmed submissions
pub struct FallbackQueue {
    store: Box<dyn DurableStore>,
}

impl std::fmt::Debug for FallbackQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackQueue").finish_non_exhaustive()
    }
}

impl FallbackQueue {
    pub fn new(store: Box<dyn DurableStore>) -> Self {
        Self { store }
    }

    fn load(&self) -> Result<Vec<QueueEntry>, QueueError> {
        match self.store.read_all()? {
            Some(payload) if !payload.trim().is_empty() => Ok(serde_json::from_str(&payload)?),
            _ => Ok(Vec::new()),
        }
    }

    fn save(&self, entries: &[QueueEntry]) -> Result<(), QueueError> {
        let payload = serde_json::to_string(entries)?;
        self.store.write_all(&payload)?;
        Ok(())
    }

    /// Append a record to the end of the queue, preserving capture order
    pub fn enqueue(&self, record: SubmissionRecord) -> Result<QueueEntry, QueueError> {
        let mut entries = self.load()?;
        let entry = QueueEntry::new(record);
        entries.push(entry.clone());
        self.save(&entries)?;
        debug!(
            record_id = %entry.record.id,
            source = %entry.record.source,
            queued = entries.len(),
            "📥 Submission queued for later delivery"
        );
        Ok(entry)
    }

    /// All entries not yet confirmed against the remote service, FIFO
    pub fn list_unsynced(&self) -> Result<Vec<QueueEntry>, QueueError> {
        Ok(self.load()?.into_iter().filter(|e| !e.synced).collect())
    }

    /// Flip an entry's `synced` flag; marking an already-synced or unknown
    /// id is a no-op. Returns whether the flag was newly set.
    pub fn mark_synced(&self, id: Uuid) -> Result<bool, QueueError> {
        let mut entries = self.load()?;
        let Some(entry) = entries.iter_mut().find(|e| e.record.id == id && !e.synced) else {
            return Ok(false);
        };
        entry.synced = true;
        self.save(&entries)?;
        Ok(true)
    }

    /// Remove entries already confirmed remotely; unsynced entries are kept
    pub fn purge_synced(&self) -> Result<usize, QueueError> {
        let mut entries = self.load()?;
        let before = entries.len();
        entries.retain(|e| !e.synced);
        let removed = before - entries.len();
        if removed > 0 {
            self.save(&entries)?;
            info!(removed, "🧹 Purged synced queue entries");
        }
        Ok(removed)
    }

    /// One-time drain of a legacy storage bucket into this queue
    ///
    /// Entries whose record id is already present are skipped; the legacy
    /// bucket is emptied afterwards so it never acts as a parallel store.
    /// Returns the number of entries migrated.
    pub fn migrate_legacy(&self, legacy: &dyn DurableStore) -> Result<usize, QueueError> {
        let legacy_entries: Vec<QueueEntry> = match legacy.read_all()? {
            Some(payload) if !payload.trim().is_empty() => serde_json::from_str(&payload)?,
            _ => return Ok(0),
        };

        let mut entries = self.load()?;
        let known: std::collections::HashSet<Uuid> =
            entries.iter().map(|e| e.record.id).collect();

        let mut migrated = 0;
        for entry in legacy_entries {
            if !known.contains(&entry.record.id) {
                entries.push(entry);
                migrated += 1;
            }
        }

        if migrated > 0 {
            self.save(&entries)?;
        }
        legacy.write_all("[]")?;

        if migrated > 0 {
            info!(migrated, "📦 Migrated legacy queue bucket");
        }
        Ok(migrated)
    }
}

#[cfg(test)]
mod tests {
    use super::store::InMemoryStore;
    use super::*;
    use crate::model::{LeadFields, SubmissionSource};

    fn record(email: &str) -> SubmissionRecord {
        SubmissionRecord::capture(LeadFields {
            email: email.to_string(),
            ..Default::default()
        })
    }

    fn queue() -> FallbackQueue {
        FallbackQueue::new(Box::new(InMemoryStore::new()))
    }

    #[test]
    fn test_enqueue_preserves_capture_order() {
        let queue = queue();
        let first = queue.enqueue(record("first@x.com")).unwrap();
        let second = queue.enqueue(record("second@x.com")).unwrap();
        let third = queue.enqueue(record("third@x.com")).unwrap();

        let ids: Vec<_> = queue
            .list_unsynced()
            .unwrap()
            .iter()
            .map(|e| e.record.id)
            .collect();
        assert_eq!(ids, vec![first.record.id, second.record.id, third.record.id]);
    }

    #[test]
    fn test_enqueue_then_list_contains_id_once() {
        let queue = queue();
        let entry = queue.enqueue(record("a@b.com")).unwrap();
        let matches = queue
            .list_unsynced()
            .unwrap()
            .iter()
            .filter(|e| e.record.id == entry.record.id)
            .count();
        assert_eq!(matches, 1);
    }

    #[test]
    fn test_mark_synced_is_idempotent() {
        let queue = queue();
        let entry = queue.enqueue(record("a@b.com")).unwrap();

        assert!(queue.mark_synced(entry.record.id).unwrap());
        let after_first = queue.list_unsynced().unwrap();

        assert!(!queue.mark_synced(entry.record.id).unwrap());
        let after_second = queue.list_unsynced().unwrap();

        assert_eq!(after_first, after_second);
        assert!(after_first.is_empty());
    }

    #[test]
    fn test_mark_synced_unknown_id_is_noop() {
        let queue = queue();
        queue.enqueue(record("a@b.com")).unwrap();
        assert!(!queue.mark_synced(Uuid::new_v4()).unwrap());
        assert_eq!(queue.list_unsynced().unwrap().len(), 1);
    }

    #[test]
    fn test_purge_removes_only_synced() {
        let queue = queue();
        let synced = queue.enqueue(record("synced@x.com")).unwrap();
        let kept = queue.enqueue(record("kept@x.com")).unwrap();
        queue.mark_synced(synced.record.id).unwrap();

        assert_eq!(queue.purge_synced().unwrap(), 1);
        let remaining = queue.list_unsynced().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].record.id, kept.record.id);

        // Safe to call again with nothing to purge
        assert_eq!(queue.purge_synced().unwrap(), 0);
    }

    #[test]
    fn test_empty_store_reads_as_empty_queue() {
        let queue = FallbackQueue::new(Box::new(InMemoryStore::with_payload("")));
        assert!(queue.list_unsynced().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_payload_surfaces_error() {
        let queue = FallbackQueue::new(Box::new(InMemoryStore::with_payload("{not json")));
        assert!(matches!(
            queue.list_unsynced(),
            Err(QueueError::Corrupted(_))
        ));
    }

    #[test]
    fn test_legacy_migration_deduplicates_and_empties_bucket() {
        let queue = queue();
        let shared = record("shared@x.com");
        queue.enqueue(shared.clone()).unwrap();

        let legacy_only = QueueEntry::new(
            record("legacy@x.com").with_source(SubmissionSource::TimeoutFallback),
        );
        let legacy_entries = vec![QueueEntry::new(shared), legacy_only.clone()];
        let legacy = InMemoryStore::with_payload(serde_json::to_string(&legacy_entries).unwrap());

        assert_eq!(queue.migrate_legacy(&legacy).unwrap(), 1);
        let ids: Vec<_> = queue
            .list_unsynced()
            .unwrap()
            .iter()
            .map(|e| e.record.id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&legacy_only.record.id));

        // Legacy bucket is emptied, second migration is a no-op
        assert_eq!(legacy.read_all().unwrap().as_deref(), Some("[]"));
        assert_eq!(queue.migrate_legacy(&legacy).unwrap(), 0);
    }
}
