//! Approximating π by splitting the Gregory–Leibniz series across the pool.
//!
//! Each worker sums one contiguous block of terms; the partial sums are
//! combined and multiplied by 4. Convergence is O(1/n) in the term count.

use crate::config::ReductionStrategy;
use crate::error::{Error, Result};
use crate::leibniz::evaluate_gregory_leibniz;
use crate::partition::{partition_observed, IndexRange, NoopObserver, TracingObserver};
use crate::runtime::Runtime;
use crate::util::AtomicF64;
use std::sync::atomic::Ordering;

/// Result of one parallel evaluation, with the per-worker breakdown.
#[derive(Debug, Clone)]
pub struct PiEstimate {
    pub value: f64,
    pub ranges: Vec<IndexRange>,
    pub partials: Vec<f64>,
}

impl PiEstimate {
    pub fn abs_error(&self) -> f64 {
        (self.value - std::f64::consts::PI).abs()
    }
}

/// π from the first `num_elements` series terms, evaluated on `runtime`'s pool.
///
/// At most `num_elements` workers take part; with more workers than terms the
/// extra ones sit out and every term is still counted exactly once.
pub fn approximate_pi(runtime: &Runtime, num_elements: u64) -> Result<f64> {
    match runtime.config().reduction {
        ReductionStrategy::JoinPartials => estimate_pi(runtime, num_elements).map(|e| e.value),
        ReductionStrategy::AtomicAccumulator => approximate_pi_atomic(runtime, num_elements),
    }
}

/// Like [`approximate_pi`] with partials joined, keeping every worker's share.
///
/// `ranges` holds `min(num_workers, num_elements)` blocks, which is fewer
/// than [`Runtime::num_workers`] when the term count is smaller.
pub fn estimate_pi(runtime: &Runtime, num_elements: u64) -> Result<PiEstimate> {
    let ranges = worker_ranges(runtime, num_elements)?;
    let mut partials = vec![0.0f64; ranges.len()];
    let mut failures: Vec<Option<Error>> = (0..ranges.len()).map(|_| None).collect();

    runtime.scope(|s| {
        let slots = partials.iter_mut().zip(failures.iter_mut());
        for (range, (slot, failure)) in ranges.iter().zip(slots) {
            s.spawn(move || match evaluate_gregory_leibniz(range.first, range.last) {
                Ok(sum) => *slot = sum,
                Err(e) => *failure = Some(e),
            });
        }
    })?;

    if let Some(err) = failures.into_iter().flatten().next() {
        return Err(err);
    }

    // summed in worker order so repeated runs agree bit for bit
    let total: f64 = partials.iter().sum();
    let value = 4.0 * total;
    tracing::debug!(num_elements, workers = ranges.len(), value, "pi estimate");

    Ok(PiEstimate {
        value,
        ranges,
        partials,
    })
}

fn approximate_pi_atomic(runtime: &Runtime, num_elements: u64) -> Result<f64> {
    let ranges = worker_ranges(runtime, num_elements)?;
    let total = AtomicF64::new(0.0);
    let mut failures: Vec<Option<Error>> = (0..ranges.len()).map(|_| None).collect();

    runtime.scope(|s| {
        for (range, failure) in ranges.iter().zip(failures.iter_mut()) {
            let total = &total;
            s.spawn(move || match evaluate_gregory_leibniz(range.first, range.last) {
                Ok(sum) => {
                    total.fetch_add(sum, Ordering::AcqRel);
                }
                Err(e) => *failure = Some(e),
            });
        }
    })?;

    if let Some(err) = failures.into_iter().flatten().next() {
        return Err(err);
    }

    let value = 4.0 * total.into_inner();
    tracing::debug!(num_elements, workers = ranges.len(), value, "pi estimate (atomic)");
    Ok(value)
}

/// Single-threaded reference over the same term count.
pub fn approximate_pi_sequential(num_elements: u64) -> Result<f64> {
    if num_elements == 0 {
        return Err(Error::config("need at least 1 series term"));
    }
    Ok(4.0 * evaluate_gregory_leibniz(1, num_elements)?)
}

fn worker_ranges(runtime: &Runtime, num_elements: u64) -> Result<Vec<IndexRange>> {
    if num_elements == 0 {
        return Err(Error::config("need at least 1 series term"));
    }

    // More workers than terms would hand several workers the same index.
    let workers = usize::try_from(num_elements)
        .map_or(runtime.num_workers(), |n| runtime.num_workers().min(n));
    if runtime.config().log_partitions {
        partition_observed(workers, num_elements, &TracingObserver)
    } else {
        partition_observed(workers, num_elements, &NoopObserver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::f64::consts::PI;

    fn runtime(workers: usize, reduction: ReductionStrategy) -> Runtime {
        let config = Config::builder()
            .num_threads(workers)
            .reduction(reduction)
            .build()
            .unwrap();
        Runtime::new(config).unwrap()
    }

    #[test]
    fn test_matches_sequential() {
        let rt = runtime(4, ReductionStrategy::JoinPartials);
        let parallel = approximate_pi(&rt, 100_000).unwrap();
        let sequential = approximate_pi_sequential(100_000).unwrap();
        assert!((parallel - sequential).abs() < 1e-9);
    }

    #[test]
    fn test_strategies_agree() {
        let joined = approximate_pi(&runtime(3, ReductionStrategy::JoinPartials), 30_001).unwrap();
        let atomic = approximate_pi(&runtime(3, ReductionStrategy::AtomicAccumulator), 30_001).unwrap();
        assert!((joined - atomic).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_breakdown() {
        let rt = runtime(4, ReductionStrategy::JoinPartials);
        let estimate = estimate_pi(&rt, 1_000).unwrap();

        assert_eq!(estimate.ranges.len(), 4);
        assert_eq!(estimate.partials.len(), 4);
        assert_eq!(estimate.ranges[0], IndexRange::new(1, 250));
        assert_eq!(estimate.ranges[3].last, 1_000);
        assert!((estimate.value - 4.0 * estimate.partials.iter().sum::<f64>()).abs() < 1e-15);
        assert!(estimate.abs_error() < 1e-2);
    }

    #[test]
    fn test_zero_terms_rejected() {
        let rt = runtime(2, ReductionStrategy::JoinPartials);
        assert!(matches!(approximate_pi(&rt, 0), Err(Error::Config(_))));
        assert!(approximate_pi_sequential(0).is_err());
    }

    #[test]
    fn test_single_term() {
        let rt = runtime(1, ReductionStrategy::JoinPartials);
        assert_eq!(approximate_pi(&rt, 1).unwrap(), 4.0);
    }

    #[test]
    fn test_more_workers_than_terms() {
        let rt = runtime(4, ReductionStrategy::JoinPartials);
        let estimate = estimate_pi(&rt, 2).unwrap();
        assert_eq!(estimate.ranges, vec![IndexRange::new(1, 1), IndexRange::new(2, 2)]);
        assert!((estimate.value - 4.0 * (1.0 - 1.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_converges() {
        let rt = runtime(4, ReductionStrategy::JoinPartials);
        let value = approximate_pi(&rt, 1_000_000).unwrap();
        assert!((value - PI).abs() < 1e-5);
    }
}
