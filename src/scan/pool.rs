// src/scan/pool.rs
// =============================================================================
// A fixed-size pool of probe workers.
//
// How it works:
// 1. The scheduler pushes candidate ids onto a bounded job channel
// 2. Each worker task pulls the next id, probes it, and pushes a Completion
//    onto a bounded completion channel
// 3. The scheduler drains completions, in whatever order they finish
//
// Both channels are sized to one batch. Since the scheduler never submits a
// new batch before the previous one drained, neither channel can fill up and
// at most one batch worth of work exists at any time.
//
// A panicking probe is caught at the worker boundary and reported as an
// Error, so every submitted id produces exactly one completion.
// =============================================================================

use crate::config::{ProbeSettings, SessionMode};
use crate::error::FetchError;
use crate::probe::{probe, Outcome};
use crate::session::SessionFactory;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One finished probe.
#[derive(Debug)]
pub struct Completion {
    pub id: u64,
    pub outcome: Outcome,
}

pub struct WorkerPool {
    jobs: mpsc::Sender<u64>,
    completions: mpsc::Receiver<Completion>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` workers. Must be called inside a tokio runtime.
    pub fn spawn<F: SessionFactory>(
        factory: Arc<F>,
        settings: Arc<ProbeSettings>,
        size: usize,
        queue: usize,
        mode: SessionMode,
    ) -> Self {
        // tokio panics on a channel larger than its semaphore can count
        let queue = queue.clamp(1, Semaphore::MAX_PERMITS);
        let (jobs_tx, jobs_rx) = mpsc::channel::<u64>(queue);
        let (done_tx, done_rx) = mpsc::channel::<Completion>(queue);
        let jobs_rx = Arc::new(Mutex::new(jobs_rx));

        let workers = (0..size.max(1))
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    Arc::clone(&factory),
                    Arc::clone(&settings),
                    Arc::clone(&jobs_rx),
                    done_tx.clone(),
                    mode,
                ))
            })
            .collect();

        Self {
            jobs: jobs_tx,
            completions: done_rx,
            workers,
        }
    }

    /// Queues one id. Returns false if every worker has gone away.
    pub async fn submit(&self, id: u64) -> bool {
        self.jobs.send(id).await.is_ok()
    }

    /// Next finished probe, or None once every worker has exited.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.completions.recv().await
    }

    /// Closes the job queue and waits for the workers to exit.
    pub async fn shutdown(self) {
        let WorkerPool {
            jobs,
            completions,
            workers,
        } = self;
        drop(jobs);
        // Let workers blocked on a full completion channel finish
        drop(completions);

        for handle in workers {
            if let Err(err) = handle.await {
                warn!(error = %err, "worker exited abnormally");
            }
        }
    }
}

async fn run_worker<F: SessionFactory>(
    worker: usize,
    factory: Arc<F>,
    settings: Arc<ProbeSettings>,
    jobs: Arc<Mutex<mpsc::Receiver<u64>>>,
    done: mpsc::Sender<Completion>,
    mode: SessionMode,
) {
    let session = match mode {
        SessionMode::PerProbe => None,
        SessionMode::PerWorker => match factory.open() {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(worker, error = %err, "could not open worker session, using one per probe");
                None
            }
        },
    };

    loop {
        // Hold the lock only while waiting for the next id
        let next = jobs.lock().await.recv().await;
        let Some(id) = next else {
            break;
        };

        let outcome = AssertUnwindSafe(probe(id, &settings, factory.as_ref(), session.as_ref()))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                warn!(worker, id, "probe panicked");
                Outcome::Error(FetchError::Aborted("probe panicked".to_string()))
            });

        if done.send(Completion { id, outcome }).await.is_err() {
            break;
        }
    }

    debug!(worker, "worker finished");
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a Mutex around the job receiver?
//    - tokio's mpsc has many senders but only one receiver
//    - Wrapping the receiver in Arc<Mutex<..>> lets every worker take turns
//      pulling the next id
//    - The lock is only held while waiting for an id, never during a probe
//
// 2. What does catch_unwind do here?
//    - A panic inside a spawned task would normally just end that task
//    - The scheduler would then wait forever for a completion that never comes
//    - catch_unwind turns the panic into a value we can report as an Error
//
// 3. Why bounded channels?
//    - An unbounded channel would happily queue a million ids in memory
//    - Sizing both channels to one batch keeps memory flat for the whole scan
// -----------------------------------------------------------------------------
