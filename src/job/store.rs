//! Process-wide job registry.
//!
//! One writer per job (the task driving it), arbitrarily many concurrent
//! readers (status pollers). All mutation happens under the write lock and
//! readers receive whole-record clones, so a reader that observes a
//! terminal status also observes every field written before it.

use crate::error::{Result, ShortsmithError};
use crate::job::types::Job;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Shared registry of jobs, keyed by job id.
///
/// Cloning the store is cheap and shares the underlying map. Jobs are
/// retained for the process lifetime; there is no eviction.
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    inner: Arc<RwLock<HashMap<Uuid, Job>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job. Ids are random v4 uuids and never reused.
    pub fn insert(&self, job: Job) {
        let mut map = self.inner.write().expect("job store lock poisoned");
        map.insert(job.id, job);
    }

    /// Snapshot of one job.
    pub fn get(&self, id: Uuid) -> Result<Job> {
        let map = self.inner.read().expect("job store lock poisoned");
        map.get(&id)
            .cloned()
            .ok_or_else(|| ShortsmithError::NotFound { id: id.to_string() })
    }

    /// Snapshots of all jobs, newest first by creation time.
    pub fn list(&self) -> Vec<Job> {
        let map = self.inner.read().expect("job store lock poisoned");
        let mut jobs: Vec<Job> = map.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Apply a mutation to one job under the write lock.
    ///
    /// The closure runs while the lock is held, which is what publishes
    /// the update atomically to concurrent readers.
    pub fn update(&self, id: Uuid, f: impl FnOnce(&mut Job)) -> Result<()> {
        let mut map = self.inner.write().expect("job store lock poisoned");
        let job = map
            .get_mut(&id)
            .ok_or_else(|| ShortsmithError::NotFound { id: id.to_string() })?;
        f(job);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("job store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
