//! Aggregates over lists of decimals.
//!
//! Used for historic median stamps and deviation bands. All results follow
//! the same truncation rule as [`Dec`] itself.

use crate::{Dec, MathError, Result};

/// Median of `values`. For an even count, the truncated mean of the two
/// middle values.
///
/// # Errors
///
/// - [`MathError::EmptyList`] if `values` is empty
pub fn median(values: &[Dec]) -> Result<Dec> {
    if values.is_empty() {
        return Err(MathError::EmptyList);
    }
    let mut sorted = values.to_vec();
    sorted.sort();

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        sorted[mid - 1].checked_add(sorted[mid])?.checked_quo_int(2)
    } else {
        Ok(sorted[mid])
    }
}

/// Arithmetic mean of `values`, truncated.
pub fn average(values: &[Dec]) -> Result<Dec> {
    if values.is_empty() {
        return Err(MathError::EmptyList);
    }
    let sum = values
        .iter()
        .try_fold(Dec::zero(), |acc, v| acc.checked_add(*v))?;
    sum.checked_quo_int(values.len() as u128)
}

/// Largest of `values`.
pub fn max(values: &[Dec]) -> Result<Dec> {
    values.iter().copied().max().ok_or(MathError::EmptyList)
}

/// Smallest of `values`.
pub fn min(values: &[Dec]) -> Result<Dec> {
    values.iter().copied().min().ok_or(MathError::EmptyList)
}

/// Standard deviation of `values` around `median`:
///
/// ```text
/// sqrt( Σ (v - median)² / n )
/// ```
///
/// Each term is divided by `n` before summing, matching the stamped values
/// other validators compute.
pub fn median_deviation(median: Dec, values: &[Dec]) -> Result<Dec> {
    if values.is_empty() {
        return Err(MathError::EmptyList);
    }
    let n = values.len() as u128;
    let mut variance = Dec::zero();
    for v in values {
        let diff = v.abs_diff(median);
        let term = diff.checked_mul(diff)?.checked_quo_int(n)?;
        variance = variance.checked_add(term)?;
    }
    variance.approx_sqrt()
}
