// src/scan/batch.rs
// =============================================================================
// Splits the id space into contiguous batches.
//
// Batches are half-open ranges walked in ascending order:
//   start=1, total=5, size=2  ->  1..3, 3..5, 5..6
// =============================================================================

use std::ops::Range;

#[derive(Debug, Clone)]
pub struct Batches {
    cursor: u64,
    last: u64,
    size: u64,
}

impl Batches {
    /// Batches covering `start..=last`. `size` is clamped to at least 1.
    pub fn new(start: u64, last: u64, size: u64) -> Self {
        Self {
            cursor: start,
            last,
            size: size.max(1),
        }
    }
}

impl Iterator for Batches {
    type Item = Range<u64>;

    fn next(&mut self) -> Option<Range<u64>> {
        if self.cursor > self.last || self.cursor == u64::MAX {
            return None;
        }

        let batch_end = self
            .cursor
            .saturating_add(self.size - 1)
            .min(self.last)
            .saturating_add(1);
        let batch = self.cursor..batch_end;
        self.cursor = batch_end;
        Some(batch)
    }
}
