//! Splitting a 1-based index range into contiguous per-worker blocks.
//!
//! Block `i` of `W` over `N` elements starts at `floor(i * N / W) + 1` and
//! ends one before the next block starts. The last block always ends at `N`,
//! absorbing whatever the floating-point split leaves over.
//!
//! When `N < W` some blocks collapse onto the same single index; that
//! overlap is kept as-is rather than rejected.

use crate::error::{Error, Result};
use std::fmt;

/// Inclusive, 1-based index range assigned to one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexRange {
    pub first: u64,
    pub last: u64,
}

impl IndexRange {
    pub fn new(first: u64, last: u64) -> Self {
        Self { first, last }
    }

    /// Number of indices covered, 0 for a degenerate range.
    pub fn len(&self) -> u64 {
        if self.last < self.first {
            0
        } else {
            self.last - self.first + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, index: u64) -> bool {
        self.first <= index && index <= self.last
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.first, self.last)
    }
}

/// Receives each block as it is computed.
pub trait PartitionObserver {
    fn on_block(&self, index: usize, num_workers: usize, num_elements: u64, range: IndexRange);
}

impl<F> PartitionObserver for F
where
    F: Fn(usize, IndexRange),
{
    fn on_block(&self, index: usize, _num_workers: usize, _num_elements: u64, range: IndexRange) {
        self(index, range)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PartitionObserver for NoopObserver {
    fn on_block(&self, _: usize, _: usize, _: u64, _: IndexRange) {}
}

/// Emits one `info` event per block.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PartitionObserver for TracingObserver {
    fn on_block(&self, index: usize, num_workers: usize, num_elements: u64, range: IndexRange) {
        tracing::info!(
            num_elements,
            num_workers,
            block = index,
            first = range.first,
            last = range.last,
            "For {} elements spread over {} workers, block {} starts at {} and finishes at {}",
            num_elements,
            num_workers,
            index,
            range.first,
            range.last
        );
    }
}

pub fn partition(num_workers: usize, num_elements: u64) -> Result<Vec<IndexRange>> {
    partition_observed(num_workers, num_elements, &NoopObserver)
}

pub fn partition_observed(
    num_workers: usize,
    num_elements: u64,
    observer: &dyn PartitionObserver,
) -> Result<Vec<IndexRange>> {
    if num_workers == 0 {
        return Err(Error::config("cannot partition over 0 workers"));
    }

    let per_worker = num_elements as f64 / num_workers as f64;

    let ranges = (0..num_workers)
        .map(|i| {
            let range = block_bounds(i, num_workers, per_worker, num_elements);
            observer.on_block(i, num_workers, num_elements, range);
            range
        })
        .collect();

    Ok(ranges)
}

fn block_bounds(i: usize, num_workers: usize, per_worker: f64, num_elements: u64) -> IndexRange {
    let first = (i as f64 * per_worker) as u64 + 1;
    let mut last = ((i + 1) as f64 * per_worker) as u64;

    if last < first {
        last = first;
    }
    if last > num_elements {
        last = num_elements;
    }
    if i + 1 == num_workers {
        last = num_elements;
    }

    IndexRange { first, last }
}
