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

//! Job storage port
//!
//! The worker pool only needs four operations from storage. Writes must be
//! linearizable per job id; how a backend achieves that is its own concern.

pub mod memory;

pub use memory::InMemoryJobStore;

use crate::error::StorageResult;
use crate::job::{Job, JobId, JobStatus, OwnerKey};
use async_trait::async_trait;

/// Persistence for job records
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new `Pending` job and return its id
    async fn create_job(&self, expression: &str, owner: &OwnerKey) -> StorageResult<JobId>;

    /// Write the terminal status of a job
    ///
    /// Backends reject a second terminal write for the same id.
    async fn update_job(&self, id: JobId, status: JobStatus) -> StorageResult<()>;

    /// Look up a job by id
    async fn get_job(&self, id: JobId) -> Option<Job>;

    /// All jobs of an owner, ordered by ascending id
    async fn list_jobs(&self, owner: &OwnerKey) -> StorageResult<Vec<Job>>;
}
