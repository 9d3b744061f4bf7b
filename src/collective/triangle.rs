//! Triangular-number check across a rank group.
//!
//! The root fills `1..=N`, scatters equal blocks to every rank (itself
//! included), each rank sums its block, the sums are reduced on the root and
//! the blocks gathered back. The root then confirms the original buffer, the
//! reduced sum and the reassembled buffer all total `N(N+1)/2`.

use super::{Communicator, ReduceOp, ROOT};
use crate::error::{Error, Result};
use crate::partition::{partition_observed, IndexRange, PartitionObserver, TracingObserver};
use crate::series::{fill_series, sum_series, triangular_number};

/// Totals seen by the root after a successful check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriangleReport {
    pub num_elements: usize,
    pub ranks: usize,
    pub expected: u64,
    pub root_sum: u64,
    pub reduced_sum: u64,
    pub gathered_sum: u64,
}

/// Runs the check on one rank; `Some(report)` on the root, `None` elsewhere.
///
/// `num_elements` must divide evenly by the group size. That is checked
/// before any communication, so every rank fails the same way.
pub fn validate_triangle_series<C>(comm: &C, num_elements: usize) -> Result<Option<TriangleReport>>
where
    C: Communicator + ?Sized,
{
    let size = comm.size();
    let rank = comm.rank();

    if num_elements % size != 0 {
        return Err(Error::config(format!(
            "number of elements ({}) is not divisible by the number of processes ({})",
            num_elements, size
        )));
    }

    let expected = triangular_number(num_elements as u64)?;
    let block_len = num_elements / size;

    // only the root narrates the layout
    let ranges = if comm.is_root() {
        partition_observed(size, num_elements as u64, &TracingObserver)?
    } else {
        partition_observed(size, num_elements as u64, &Quiet)?
    };
    debug_assert_eq!(ranges[rank].len(), block_len as u64);

    let original = if comm.is_root() {
        let values = fill_series(num_elements);
        let root_sum = sum_series(&values, num_elements)?;
        tracing::info!(root_sum, expected, "root series sum");
        check("root sum", expected, root_sum)?;
        Some((values, root_sum))
    } else {
        None
    };

    let send = original.as_ref().map(|(values, _)| values.as_slice());
    let block = comm.scatter(ROOT, send, block_len)?;
    let local_sum = sum_series(&block, block_len)?;
    tracing::info!(
        rank,
        local_sum,
        first = ranges[rank].first,
        last = ranges[rank].last,
        "local block sum"
    );

    let reduced = comm.reduce(ROOT, local_sum, ReduceOp::Sum)?;
    let gathered = comm.gather(ROOT, &block)?;

    let (Some((original, root_sum)), Some(reduced), Some(gathered)) = (original, reduced, gathered)
    else {
        return Ok(None);
    };

    let gathered_sum = sum_series(&gathered, num_elements)?;
    tracing::info!(reduced, gathered_sum, expected, "root totals");

    check("reduced sum", expected, reduced)?;
    check("gathered sum", expected, gathered_sum)?;
    if gathered != original {
        let mismatch = gathered
            .iter()
            .zip(&original)
            .position(|(a, b)| a != b)
            .unwrap_or(0);
        return Err(Error::Validation {
            what: "gathered buffer",
            expected: original[mismatch],
            actual: gathered[mismatch],
        });
    }

    Ok(Some(TriangleReport {
        num_elements,
        ranks: size,
        expected,
        root_sum,
        reduced_sum: reduced,
        gathered_sum,
    }))
}

fn check(what: &'static str, expected: u64, actual: u64) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::Validation {
            what,
            expected,
            actual,
        })
    }
}

struct Quiet;

impl PartitionObserver for Quiet {
    fn on_block(&self, index: usize, _: usize, _: u64, range: IndexRange) {
        tracing::trace!(block = index, %range, "block assigned");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collective::LocalGroup;

    #[test]
    fn test_thousand_elements_over_four_ranks() {
        let group = LocalGroup::new(4).unwrap();
        let results = group.run(|comm| validate_triangle_series(comm, 1000)).unwrap();

        let report = results[ROOT].as_ref().unwrap().clone().unwrap();
        assert_eq!(report.expected, 500_500);
        assert_eq!(report.root_sum, 500_500);
        assert_eq!(report.reduced_sum, 500_500);
        assert_eq!(report.gathered_sum, 500_500);
        assert_eq!(report.ranks, 4);

        for result in &results[1..] {
            assert_eq!(result.as_ref().unwrap(), &None);
        }
    }

    #[test]
    fn test_indivisible_count_fails_on_every_rank() {
        let group = LocalGroup::new(3).unwrap();
        let results = group.run(|comm| validate_triangle_series(comm, 1000)).unwrap();
        assert!(results.iter().all(|r| matches!(r, Err(Error::Config(_)))));
    }

    #[test]
    fn test_single_rank() {
        let group = LocalGroup::new(1).unwrap();
        let results = group.run(|comm| validate_triangle_series(comm, 10)).unwrap();
        let report = results[0].as_ref().unwrap().as_ref().unwrap();
        assert_eq!(report.reduced_sum, 55);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_oversized_series_overflows_before_allocating() {
        let group = LocalGroup::new(2).unwrap();
        let results = group
            .run(|comm| validate_triangle_series(comm, 7_000_000_000))
            .unwrap();
        assert!(results.iter().all(|r| matches!(r, Err(Error::Overflow))));
    }

    /// Root-only communicator that corrupts reductions.
    struct LossyReduce;

    impl Communicator for LossyReduce {
        fn rank(&self) -> usize {
            0
        }

        fn size(&self) -> usize {
            1
        }

        fn scatter(&self, _: usize, send: Option<&[u64]>, _: usize) -> Result<Vec<u64>> {
            Ok(send.unwrap_or_default().to_vec())
        }

        fn gather(&self, _: usize, send: &[u64]) -> Result<Option<Vec<u64>>> {
            Ok(Some(send.to_vec()))
        }

        fn reduce(&self, _: usize, value: u64, _: ReduceOp) -> Result<Option<u64>> {
            Ok(Some(value - 1))
        }
    }

    #[test]
    fn test_mismatch_is_reported() {
        let err = validate_triangle_series(&LossyReduce, 10).unwrap_err();
        match err {
            Error::Validation {
                what,
                expected,
                actual,
            } => {
                assert_eq!(what, "reduced sum");
                assert_eq!(expected, 55);
                assert_eq!(actual, 54);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
