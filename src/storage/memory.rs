// Copyright 2024 Calc Engine Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! In-process job store

use super::JobStore;
use crate::error::{StorageError, StorageResult};
use crate::job::{Job, JobId, JobStatus, OwnerKey};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Job store backed by a concurrent map
///
/// Each record is guarded by its shard lock, so updates to one id are
/// serialized while different ids proceed in parallel.
#[derive(Debug)]
pub struct InMemoryJobStore {
    jobs: DashMap<JobId, Job>,
    next_id: AtomicU64,
}

impl InMemoryJobStore {
    /// Create an empty store; the first id handed out is 1
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of stored jobs
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Check if no job was ever stored
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create_job(&self, expression: &str, owner: &OwnerKey) -> StorageResult<JobId> {
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.jobs.insert(id, Job::new(id, expression, owner.clone()));
        Ok(id)
    }

    async fn update_job(&self, id: JobId, status: JobStatus) -> StorageResult<()> {
        let mut job = self.jobs.get_mut(&id).ok_or(StorageError::NotFound(id))?;
        job.transition(status)
    }

    async fn get_job(&self, id: JobId) -> Option<Job> {
        self.jobs.get(&id).map(|job| job.clone())
    }

    async fn list_jobs(&self, owner: &OwnerKey) -> StorageResult<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .jobs
            .iter()
            .filter(|entry| &entry.owner == owner)
            .map(|entry| entry.value().clone())
            .collect();
        jobs.sort_by_key(|job| job.id);
        Ok(jobs)
    }
}
