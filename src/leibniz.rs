//! Partial sums of the Gregory–Leibniz series `1 - 1/3 + 1/5 - ...`.
//!
//! The full series converges to π/4, slowly: the error after `n` terms is
//! on the order of `1/n`, and accuracy is bounded by `f64` rounding.

use crate::error::{Error, Result};

/// Sign of term `i`, indexed by `i % 2`: odd terms add, even terms subtract.
const SIGN: [f64; 2] = [-1.0, 1.0];

/// Sum of terms `start..=end`, where term `i` is `±1 / (2i - 1)`.
pub fn evaluate_gregory_leibniz(start: u64, end: u64) -> Result<f64> {
    if start == 0 || end < start {
        return Err(Error::InvalidTermRange { start, end });
    }

    let mut sum = 0.0;
    for i in start..=end {
        let denominator = 2.0 * i as f64 - 1.0;
        sum += SIGN[(i % 2) as usize] / denominator;
    }

    Ok(sum)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-4;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < TOLERANCE,
            "expected {} got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_leading_terms() {
        assert_close(evaluate_gregory_leibniz(1, 1).unwrap(), 1.0);
        assert_close(evaluate_gregory_leibniz(1, 2).unwrap(), 0.6666667);
        assert_close(evaluate_gregory_leibniz(1, 3).unwrap(), 0.8666667);
    }

    #[test]
    fn test_interior_ranges() {
        assert_close(evaluate_gregory_leibniz(2, 5).unwrap(), -0.1650794);
        assert_close(evaluate_gregory_leibniz(5, 5).unwrap(), 0.1111111);
        assert_close(evaluate_gregory_leibniz(10, 20).unwrap(), -0.0401853);
    }

    #[test]
    fn test_ranges_are_additive() {
        let whole = evaluate_gregory_leibniz(1, 1000).unwrap();
        let left = evaluate_gregory_leibniz(1, 400).unwrap();
        let right = evaluate_gregory_leibniz(401, 1000).unwrap();
        assert!((whole - (left + right)).abs() < 1e-12);
    }

    #[test]
    fn test_reversed_range_rejected() {
        assert!(matches!(
            evaluate_gregory_leibniz(5, 4),
            Err(Error::InvalidTermRange { start: 5, end: 4 })
        ));
    }

    #[test]
    fn test_zero_start_rejected() {
        assert!(evaluate_gregory_leibniz(0, 3).is_err());
    }

    #[test]
    fn test_approaches_quarter_pi() {
        let sum = evaluate_gregory_leibniz(1, 1_000_000).unwrap();
        assert!((4.0 * sum - std::f64::consts::PI).abs() < 1e-5);
    }
}
