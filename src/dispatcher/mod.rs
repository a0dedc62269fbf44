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

//! Worker pool dispatcher
//!
//! A fixed number of tokio tasks drain one bounded submission queue. Each
//! job is evaluated by exactly one worker and its terminal status written
//! back through the [`JobStore`]. Evaluation errors become `Failed` jobs;
//! storage errors are logged and recorded in [`PoolStats`]. Neither stops
//! the worker.
//!
//! [`WorkerPool::join`] waits until every [`JobSubmitter`] is dropped and
//! the queue is drained. [`WorkerPool::shutdown`] stops the workers after
//! their in-flight job and leaves queued jobs `Pending`.

mod worker;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, StorageError};
use crate::evaluator::Evaluator;
use crate::job::{Job, JobId, OwnerKey};
use crate::storage::JobStore;
use parking_lot::Mutex as SyncMutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use worker::Worker;

/// Receiving half of the submission queue, shared by all workers
type SharedQueue = Arc<Mutex<mpsc::Receiver<Job>>>;

/// Storage errors kept for inspection; older ones are only counted
pub const RECENT_STORAGE_ERRORS: usize = 32;

/// Counters describing what the pool has done so far
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoolStats {
    /// Jobs picked up by a worker
    pub processed: u64,
    /// Jobs stored as `Completed`
    pub completed: u64,
    /// Jobs stored as `Failed`
    pub failed: u64,
    /// Terminal writes rejected by storage
    pub storage_failures: u64,
    /// The last [`RECENT_STORAGE_ERRORS`] storage errors, oldest first
    #[serde(skip)]
    pub storage_errors: Vec<(JobId, StorageError)>,
}

#[derive(Debug, Default)]
struct PoolCounters {
    processed: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    storage_failures: AtomicU64,
    recent_storage_errors: SyncMutex<VecDeque<(JobId, StorageError)>>,
}

impl PoolCounters {
    fn record_storage_error(&self, id: JobId, err: StorageError) {
        self.storage_failures.fetch_add(1, Ordering::AcqRel);
        let mut recent = self.recent_storage_errors.lock();
        if recent.len() == RECENT_STORAGE_ERRORS {
            recent.pop_front();
        }
        recent.push_back((id, err));
    }

    fn snapshot(&self) -> PoolStats {
        PoolStats {
            processed: self.processed.load(Ordering::Acquire),
            completed: self.completed.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            storage_failures: self.storage_failures.load(Ordering::Acquire),
            storage_errors: self.recent_storage_errors.lock().iter().cloned().collect(),
        }
    }
}

/// Handle owning the pool's worker tasks
#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
    queue: SharedQueue,
    cancel: CancellationToken,
    counters: Arc<PoolCounters>,
}

impl WorkerPool {
    /// Spawn the workers and return the pool with a submitter for it
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: &EngineConfig,
        store: Arc<dyn JobStore>,
    ) -> EngineResult<(Self, JobSubmitter)> {
        config.validate()?;

        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let queue: SharedQueue = Arc::new(Mutex::new(receiver));
        let evaluator = Arc::new(Evaluator::new(config.delays));
        let cancel = CancellationToken::new();
        let counters = Arc::new(PoolCounters::default());

        let workers = (0..config.worker_count)
            .map(|index| {
                let worker = Worker {
                    index,
                    queue: Arc::clone(&queue),
                    store: Arc::clone(&store),
                    evaluator: Arc::clone(&evaluator),
                    cancel: cancel.clone(),
                    counters: Arc::clone(&counters),
                };
                tokio::spawn(worker.run())
            })
            .collect();

        log::info!(
            "Started worker pool with {} worker(s), queue capacity {}, delays {:?}",
            config.worker_count,
            config.queue_capacity,
            evaluator.delays()
        );

        let submitter = JobSubmitter {
            queue: sender,
            store,
            cancel: cancel.clone(),
        };
        let pool = Self {
            workers,
            queue,
            cancel,
            counters,
        };
        Ok((pool, submitter))
    }

    /// Number of workers
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Current statistics
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }

    /// Wait for the workers to finish
    ///
    /// Without a prior cancellation this returns once all submitters are
    /// dropped and every queued job has been processed.
    pub async fn join(self) -> PoolStats {
        for handle in self.workers {
            if let Err(err) = handle.await {
                log::error!("Worker task ended abnormally: {err}");
            }
        }

        let mut queue = self.queue.lock().await;
        queue.close();
        let mut abandoned = 0usize;
        while let Ok(job) = queue.try_recv() {
            log::warn!("Job {} left pending at shutdown", job.id);
            abandoned += 1;
        }

        let stats = self.counters.snapshot();
        log::info!(
            "Worker pool stopped: {} processed, {} completed, {} failed, {} storage failure(s), {} abandoned",
            stats.processed,
            stats.completed,
            stats.failed,
            stats.storage_failures,
            abandoned
        );
        stats
    }

    /// Stop the workers after their current job and wait for them
    pub async fn shutdown(self) -> PoolStats {
        self.cancel.cancel();
        self.join().await
    }
}

/// Submission boundary: records a job, then queues it
#[derive(Clone)]
pub struct JobSubmitter {
    queue: mpsc::Sender<Job>,
    store: Arc<dyn JobStore>,
    cancel: CancellationToken,
}

impl JobSubmitter {
    /// Create a `Pending` job in storage and queue it for evaluation
    ///
    /// The job is queued only after storage accepted it, so a worker never
    /// finishes a job that lookups cannot see yet. Waits while the queue is
    /// full.
    pub async fn submit(
        &self,
        expression: impl Into<String>,
        owner: impl Into<OwnerKey>,
    ) -> EngineResult<JobId> {
        if self.cancel.is_cancelled() {
            return Err(EngineError::PoolClosed);
        }

        let expression = expression.into();
        let owner = owner.into();
        let id = self.store.create_job(&expression, &owner).await?;

        if self.queue.send(Job::new(id, expression, owner)).await.is_err() {
            log::warn!("Job {id} was stored but the pool closed before it could be queued");
            return Err(EngineError::PoolClosed);
        }

        log::debug!("Queued job {id}");
        Ok(id)
    }

    /// Check if the pool stopped accepting jobs
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.queue.is_closed()
    }
}

impl std::fmt::Debug for JobSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobSubmitter")
            .field("capacity", &self.queue.capacity())
            .field("closed", &self.is_closed())
            .finish()
    }
}
