//! Shared test doubles for the pipeline integration tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use lead_relay::queue::store::{DurableStore, StoreError};
use lead_relay::{
    FallbackQueue, HealthMonitor, InMemoryStore, LeadFields, PipelineConfig, RemoteDataService,
    RemoteError, StoredLead, SubmissionPipeline, SubmissionRecord,
};

/// How the mock remote answers each insert
#[derive(Debug, Clone)]
pub enum RemoteBehavior {
    /// Every insert succeeds immediately
    Succeed,
    /// Every insert fails with a transient network error
    FailTransient,
    /// Every insert fails with the given permanent error
    FailPermanent(RemoteError),
    /// Inserts never resolve
    Hang,
}

/// Remote double with switchable behavior and an insert log
pub struct MockRemote {
    behavior: Mutex<RemoteBehavior>,
    inserted: Mutex<Vec<Uuid>>,
    attempts: Mutex<u32>,
}

impl MockRemote {
    pub fn new(behavior: RemoteBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(behavior),
            inserted: Mutex::new(Vec::new()),
            attempts: Mutex::new(0),
        })
    }

    pub fn set_behavior(&self, behavior: RemoteBehavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn inserted_ids(&self) -> Vec<Uuid> {
        self.inserted.lock().clone()
    }

    pub fn attempt_count(&self) -> u32 {
        *self.attempts.lock()
    }
}

#[async_trait]
impl RemoteDataService for MockRemote {
    async fn insert_lead(&self, record: &SubmissionRecord) -> Result<StoredLead, RemoteError> {
        *self.attempts.lock() += 1;
        let behavior = self.behavior.lock().clone();
        match behavior {
            RemoteBehavior::Succeed => {
                if self.inserted.lock().contains(&record.id) {
                    return Err(RemoteError::conflict("idempotency key already stored"));
                }
                self.inserted.lock().push(record.id);
                Ok(StoredLead {
                    id: record.id,
                    stored_at: Utc::now(),
                })
            }
            RemoteBehavior::FailTransient => Err(RemoteError::network("connection reset")),
            RemoteBehavior::FailPermanent(err) => Err(err),
            RemoteBehavior::Hang => std::future::pending().await,
        }
    }

    async fn probe(&self) -> Result<(), RemoteError> {
        match self.behavior.lock().clone() {
            RemoteBehavior::Succeed => Ok(()),
            _ => Err(RemoteError::network("probe failed")),
        }
    }
}

/// Store double whose writes always fail, for queue-absorption tests
pub struct FailingStore;

impl DurableStore for FailingStore {
    fn read_all(&self) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn write_all(&self, _payload: &str) -> Result<(), StoreError> {
        Err(StoreError::unavailable("storage disabled"))
    }
}

/// Fully wired pipeline over in-memory storage
pub struct TestHarness {
    pub remote: Arc<MockRemote>,
    pub health: Arc<HealthMonitor>,
    pub queue: Arc<FallbackQueue>,
    pub pipeline: SubmissionPipeline,
}

pub fn harness(behavior: RemoteBehavior) -> TestHarness {
    harness_with_store(behavior, Box::new(InMemoryStore::new()))
}

pub fn harness_with_store(behavior: RemoteBehavior, store: Box<dyn DurableStore>) -> TestHarness {
    let remote = MockRemote::new(behavior);
    let health = Arc::new(HealthMonitor::new());
    let queue = Arc::new(FallbackQueue::new(store));
    let pipeline = SubmissionPipeline::new(
        Arc::clone(&remote) as Arc<dyn RemoteDataService>,
        Arc::clone(&health),
        Arc::clone(&queue),
        PipelineConfig::default(),
    );
    TestHarness {
        remote,
        health,
        queue,
        pipeline,
    }
}

pub fn lead(email: &str) -> LeadFields {
    LeadFields {
        email: email.to_string(),
        name: Some("Test Lead".to_string()),
        company: Some("Acme".to_string()),
        ..Default::default()
    }
}
