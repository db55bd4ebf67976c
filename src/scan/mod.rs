// src/scan/mod.rs
// =============================================================================
// This module drives the full sweep over the id space.
//
// How it works:
// 1. Cut [start_id, total_ids] into batches of at most batch_size ids
// 2. Submit every id of the current batch to the worker pool
// 3. Drain exactly that many completions into the aggregator
// 4. Only then move on to the next batch
//
// Batches are strictly ordered; inside a batch completions arrive in whatever
// order the probes finish. A failed probe is counted and dropped, it never
// stops the scan.
//
// Submodules:
// - batch: the batch range iterator
// - pool: the worker pool and its channels
// =============================================================================

mod batch;
mod pool;

pub use batch::Batches;
pub use pool::{Completion, WorkerPool};

use crate::aggregate::{Aggregator, ScanReport};
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::session::SessionFactory;
use std::sync::Arc;
use tracing::{debug, info};

pub struct Scanner<F> {
    config: ScanConfig,
    factory: Arc<F>,
}

impl<F: SessionFactory> Scanner<F> {
    pub fn new(config: ScanConfig, factory: F) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self {
            config,
            factory: Arc::new(factory),
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Opens and drops one session, so a transport that cannot be built at
    /// all fails the run before any probing starts.
    pub fn preflight(&self) -> Result<(), ScanError> {
        self.factory.open()?;
        Ok(())
    }

    /// Probes every id in the configured range exactly once.
    pub async fn run(&self) -> Result<ScanReport, ScanError> {
        let config = &self.config;
        let queue = usize::try_from(config.effective_batch()).unwrap_or(usize::MAX);

        let mut pool = WorkerPool::spawn(
            Arc::clone(&self.factory),
            Arc::new(config.probe.clone()),
            config.workers,
            queue,
            config.session_mode,
        );
        let mut aggregator = Aggregator::new(config.progress_every);

        info!(
            start = config.start_id,
            end = config.total_ids,
            workers = config.workers,
            batch_size = config.batch_size,
            "starting scan"
        );

        for batch in Batches::new(config.start_id, config.total_ids, config.batch_size) {
            let submitted = drain_batch(&mut pool, &mut aggregator, batch.clone()).await;
            if let Err(err) = submitted {
                pool.shutdown().await;
                return Err(err);
            }
            debug!(
                from = batch.start,
                to = batch.end - 1,
                checked = aggregator.checked(),
                found = aggregator.found(),
                failed = aggregator.failed(),
                "batch drained"
            );
        }

        pool.shutdown().await;

        let report = aggregator.finish();
        info!(
            checked = report.checked,
            found = report.found,
            failed = report.failed,
            "scan finished"
        );
        Ok(report)
    }
}

// Submits one batch and waits for all of it
async fn drain_batch(
    pool: &mut WorkerPool,
    aggregator: &mut Aggregator,
    batch: std::ops::Range<u64>,
) -> Result<(), ScanError> {
    let expected = batch.end - batch.start;

    for id in batch {
        if !pool.submit(id).await {
            return Err(ScanError::PoolClosed { missing: expected });
        }
    }

    for drained in 0..expected {
        let Some(Completion { id, outcome }) = pool.next_completion().await else {
            return Err(ScanError::PoolClosed {
                missing: expected - drained,
            });
        };
        aggregator.record(id, outcome);
    }

    Ok(())
}
