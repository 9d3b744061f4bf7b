//! Consecutive integer series and prefix sums over them.

use crate::error::{Error, Result};

/// Buffer of `len` values where position `i` holds `i + 1`.
pub fn fill_series(len: usize) -> Vec<u64> {
    (1..=len as u64).collect()
}

pub fn fill_series_into(values: &mut [u64]) {
    for (slot, value) in values.iter_mut().zip(1u64..) {
        *slot = value;
    }
}

/// Sum of the first `count` values.
pub fn sum_series(values: &[u64], count: usize) -> Result<u64> {
    let head = values.get(..count).ok_or(Error::OutOfRange {
        requested: count,
        available: values.len(),
    })?;

    head.iter()
        .try_fold(0u64, |acc, &v| acc.checked_add(v))
        .ok_or(Error::Overflow)
}

/// `1 + 2 + ... + n`, or `Error::Overflow` once that no longer fits a `u64`.
pub fn triangular_number(n: u64) -> Result<u64> {
    let (a, b) = if n % 2 == 0 {
        (n / 2, n + 1)
    } else {
        (n, n / 2 + 1)
    };
    a.checked_mul(b).ok_or(Error::Overflow)
}
