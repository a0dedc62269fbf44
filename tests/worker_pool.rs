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

//! Integration tests for the worker pool and job lifecycle

use calc_engine::{
    EngineConfig, EngineError, InMemoryJobStore, JobStatus, JobStore, OperatorDelays, OwnerKey,
    WorkerPool,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn expressions(count: usize) -> Vec<(String, f64)> {
    (0..count)
        .map(|i| {
            let n = i as f64;
            (format!("{i}*2+(1-{i})/4"), n * 2.0 + (1.0 - n) / 4.0)
        })
        .collect()
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(4)]
#[case(8)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_pool_size_does_not_affect_results(#[case] workers: usize) {
    let store = Arc::new(InMemoryJobStore::new());
    let config = EngineConfig::new(workers).with_queue_capacity(4);
    let (pool, submitter) = WorkerPool::start(&config, store.clone()).unwrap();
    let owner = OwnerKey::from("tester");

    let cases = expressions(50);
    let mut submitted = Vec::new();
    for (expression, expected) in &cases {
        let id = submitter.submit(expression.clone(), owner.clone()).await.unwrap();
        submitted.push((id, *expected));
    }
    drop(submitter);

    let stats = pool.join().await;
    assert_eq!(stats.processed, 50);
    assert_eq!(stats.completed, 50);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.storage_failures, 0);

    for (id, expected) in submitted {
        let job = store.get_job(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed { result: expected });
    }

    let ids: HashSet<_> = store
        .list_jobs(&owner)
        .await
        .unwrap()
        .into_iter()
        .map(|job| job.id)
        .collect();
    assert_eq!(ids.len(), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submitters() {
    let store = Arc::new(InMemoryJobStore::new());
    let (pool, submitter) = WorkerPool::start(&EngineConfig::new(3), store.clone()).unwrap();

    let mut tasks = Vec::new();
    for user in 0..4 {
        let submitter = submitter.clone();
        tasks.push(tokio::spawn(async move {
            let owner = OwnerKey::new(format!("user-{user}"));
            for i in 0..10 {
                submitter.submit(format!("{user}+{i}"), owner.clone()).await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    drop(submitter);

    let stats = pool.join().await;
    assert_eq!(stats.completed, 40);

    for user in 0..4 {
        let jobs = store.list_jobs(&OwnerKey::new(format!("user-{user}"))).await.unwrap();
        assert_eq!(jobs.len(), 10);
        assert!(jobs.windows(2).all(|pair| pair[0].id < pair[1].id));
        for job in jobs {
            let i: f64 = job.expression.split('+').nth(1).unwrap().parse().unwrap();
            assert_eq!(job.status.result(), Some(user as f64 + i));
        }
    }
}

#[tokio::test]
async fn test_failed_jobs_carry_reason_and_workers_continue() {
    let store = Arc::new(InMemoryJobStore::new());
    let (pool, submitter) = WorkerPool::start(&EngineConfig::new(1), store.clone()).unwrap();

    let bad = [
        ("1/0", "division by zero"),
        ("1&2", "invalid character '&' at position 1"),
        ("(1+2", "unbalanced parentheses at position 0"),
        ("   ", "expression is empty"),
    ];
    let mut failed = Vec::new();
    for (expression, reason) in bad {
        failed.push((submitter.submit(expression, "dave").await.unwrap(), reason));
    }
    let good = submitter.submit("1+1", "dave").await.unwrap();
    drop(submitter);

    let stats = pool.join().await;
    assert_eq!(stats.failed, 4);
    assert_eq!(stats.completed, 1);

    for (id, reason) in failed {
        assert_eq!(
            store.get_job(id).await.unwrap().status,
            JobStatus::Failed {
                reason: reason.to_string()
            }
        );
    }
    assert_eq!(store.get_job(good).await.unwrap().status.result(), Some(2.0));
}

#[tokio::test(start_paused = true)]
async fn test_status_never_regresses() {
    let store = Arc::new(InMemoryJobStore::new());
    let config = EngineConfig::new(2).with_delays(OperatorDelays {
        addition: Duration::from_millis(30),
        subtraction: Duration::from_millis(10),
        multiplication: Duration::from_millis(20),
        division: Duration::from_millis(40),
    });
    let (pool, submitter) = WorkerPool::start(&config, store.clone()).unwrap();

    let mut ids = Vec::new();
    for i in 0..6 {
        ids.push(submitter.submit(format!("{i}+1*2-3/1"), "erin").await.unwrap());
    }
    drop(submitter);

    let watcher = {
        let store = store.clone();
        let ids = ids.clone();
        tokio::spawn(async move {
            let mut terminal = HashSet::new();
            while terminal.len() < ids.len() {
                for id in &ids {
                    let status = store.get_job(*id).await.unwrap().status;
                    if status.is_terminal() {
                        terminal.insert(*id);
                    } else {
                        assert!(!terminal.contains(id), "job {id} went back to pending");
                    }
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
    };

    pool.join().await;
    watcher.await.unwrap();

    for id in ids {
        assert!(store.get_job(id).await.unwrap().status.is_terminal());
    }
}

#[tokio::test(start_paused = true)]
async fn test_operator_delays_run_in_parallel_across_workers() {
    let store = Arc::new(InMemoryJobStore::new());
    let config =
        EngineConfig::new(4).with_delays(OperatorDelays::uniform(Duration::from_secs(1)));
    let (pool, submitter) = WorkerPool::start(&config, store.clone()).unwrap();

    let start = tokio::time::Instant::now();
    for _ in 0..4 {
        submitter.submit("1+1", "frank").await.unwrap();
    }
    drop(submitter);
    let stats = pool.join().await;

    assert_eq!(stats.completed, 4);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_submit_after_shutdown() {
    let store = Arc::new(InMemoryJobStore::new());
    let (pool, submitter) = WorkerPool::start(&EngineConfig::new(2), store.clone()).unwrap();

    pool.shutdown().await;

    assert_eq!(
        submitter.submit("1+1", "gina").await,
        Err(EngineError::PoolClosed)
    );
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_full_queue_blocks_submitter() {
    let store = Arc::new(InMemoryJobStore::new());
    let config = EngineConfig::new(1)
        .with_queue_capacity(1)
        .with_delays(OperatorDelays::uniform(Duration::from_secs(10)));
    let (pool, submitter) = WorkerPool::start(&config, store.clone()).unwrap();

    // One job goes to the worker, the next fills the single queue slot.
    submitter.submit("1+1", "hank").await.unwrap();
    tokio::task::yield_now().await;
    submitter.submit("2+2", "hank").await.unwrap();

    let blocked = tokio::time::timeout(
        Duration::from_secs(1),
        submitter.submit("3+3", "hank"),
    )
    .await;
    assert!(blocked.is_err(), "submit should wait while the queue is full");

    // Once the worker frees a slot the submission goes through.
    let id = submitter.submit("4+4", "hank").await.unwrap();
    drop(submitter);

    pool.join().await;
    assert_eq!(store.get_job(id).await.unwrap().status.result(), Some(8.0));
}

#[tokio::test(start_paused = true)]
async fn test_stats_are_live_while_running() {
    let store = Arc::new(InMemoryJobStore::new());
    let config =
        EngineConfig::new(1).with_delays(OperatorDelays::uniform(Duration::from_millis(100)));
    let (pool, submitter) = WorkerPool::start(&config, store.clone()).unwrap();

    for _ in 0..3 {
        submitter.submit("1+1", "iris").await.unwrap();
    }
    drop(submitter);

    assert_eq!(pool.stats().completed, 0);

    tokio::time::sleep(Duration::from_millis(150)).await;
    let midway = pool.stats();
    assert!(midway.processed >= 1);
    assert!(midway.completed >= 1);
    assert!(midway.completed < 3);

    let stats = pool.join().await;
    assert!(stats.processed > midway.processed);
    assert_eq!(stats.completed, 3);
}
