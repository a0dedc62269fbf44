//! Single worker loop

use super::{PoolCounters, SharedQueue};
use crate::evaluator::Evaluator;
use crate::job::{Job, JobStatus};
use crate::storage::JobStore;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

pub(super) struct Worker {
    pub(super) index: usize,
    pub(super) queue: SharedQueue,
    pub(super) store: Arc<dyn JobStore>,
    pub(super) evaluator: Arc<Evaluator>,
    pub(super) cancel: CancellationToken,
    pub(super) counters: Arc<PoolCounters>,
}

impl Worker {
    /// Process jobs until the queue is closed and empty, or the pool is cancelled
    pub(super) async fn run(self) {
        log::debug!("Worker {} started", self.index);

        while let Some(job) = self.next_job().await {
            self.process(job).await;
        }

        log::debug!("Worker {} stopped", self.index);
    }

    async fn next_job(&self) -> Option<Job> {
        let mut queue = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return None,
            queue = self.queue.lock() => queue,
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            job = queue.recv() => job,
        }
    }

    async fn process(&self, job: Job) {
        let started = Instant::now();
        self.counters.processed.fetch_add(1, Ordering::AcqRel);
        log::debug!("Worker {} picked up job {}: {}", self.index, job.id, job.expression);

        let status = match self.evaluator.evaluate(&job.expression).await {
            Ok(result) => JobStatus::Completed { result },
            Err(err) => {
                log::debug!("Job {} failed: {err}", job.id);
                JobStatus::Failed {
                    reason: err.to_string(),
                }
            }
        };
        let completed = !matches!(status, JobStatus::Failed { .. });

        match self.store.update_job(job.id, status).await {
            Ok(()) => {
                let counter = if completed {
                    &self.counters.completed
                } else {
                    &self.counters.failed
                };
                counter.fetch_add(1, Ordering::AcqRel);
                log::debug!(
                    "Worker {} finished job {} in {:?}",
                    self.index,
                    job.id,
                    started.elapsed()
                );
            }
            Err(err) => {
                log::error!(
                    "Worker {} could not store the result of job {}: {err}",
                    self.index,
                    job.id
                );
                self.counters.record_storage_error(job.id, err);
            }
        }
    }
}
