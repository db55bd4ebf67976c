// src/aggregate.rs
// =============================================================================
// Collects probe outcomes into the result list.
//
// The aggregator is owned by the scheduler's drain loop and only ever touched
// from there, so appends are serialized without any locking.
// =============================================================================

use crate::probe::{Outcome, ProbeResult};
use serde::Serialize;
use tracing::info;

/// Final state of a scan, handed to the exporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub checked: u64,
    pub found: u64,
    pub failed: u64,
    pub results: Vec<ProbeResult>,
    /// Ids whose probe ended in a transport error, in drain order
    pub failed_ids: Vec<u64>,
}

#[derive(Debug)]
pub struct Aggregator {
    results: Vec<ProbeResult>,
    failed_ids: Vec<u64>,
    checked: u64,
    found: u64,
    progress_every: u64,
}

impl Aggregator {
    pub fn new(progress_every: u64) -> Self {
        Self {
            results: Vec::new(),
            failed_ids: Vec::new(),
            checked: 0,
            found: 0,
            progress_every: progress_every.max(1),
        }
    }

    pub fn record(&mut self, id: u64, outcome: Outcome) {
        self.checked += 1;

        match outcome {
            Outcome::Found(result) => {
                self.found += 1;
                self.results.push(result);
            }
            Outcome::NotFound => {}
            Outcome::Error(_) => self.failed_ids.push(id),
        }

        if self.checked % self.progress_every == 0 {
            info!(
                checked = self.checked,
                found = self.found,
                failed = self.failed_ids.len(),
                "progress"
            );
        }
    }

    pub fn checked(&self) -> u64 {
        self.checked
    }

    pub fn found(&self) -> u64 {
        self.found
    }

    pub fn failed(&self) -> u64 {
        self.failed_ids.len() as u64
    }

    pub fn finish(self) -> ScanReport {
        ScanReport {
            checked: self.checked,
            found: self.found,
            failed: self.failed_ids.len() as u64,
            results: self.results,
            failed_ids: self.failed_ids,
        }
    }
}
