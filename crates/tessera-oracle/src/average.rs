//! Moving averages over a stamp window.
//!
//! All strategies consume stamps oldest first and truncate exactly where
//! [`Dec`] arithmetic truncates, so every validator derives the same price
//! from the same window.
//!
//! ```text
//! SMA = Σ p_i / n
//! EMA = p_i · α + EMA_{i-1} · (1 − α),   EMA_0 = p_0,   α = 2 / (N + 1)
//! WMA = Σ (p_i · w_i) / Σ w_i
//! ```

use tessera_math::Dec;
use tracing::debug;

use crate::stamp::PriceStamp;
use crate::strategy::{MaStrategy, WmaKind};
use crate::{OracleError, Result};

/// Smoothing period `N` of the exponential moving average.
pub const EMA_SMOOTHING_PERIOD: u128 = 10;

/// Combine a stamp window into one price.
///
/// `stamps` must belong to one denom, oldest first, with strictly
/// increasing heights.
///
/// # Errors
///
/// - [`OracleError::PriceUnavailable`] if `stamps` is empty
/// - [`OracleError::NonMonotonicHeight`] if heights do not increase
/// - [`OracleError::InvalidWeightsLength`] / [`OracleError::InvalidWeights`]
///   for bad custom weights
pub fn compute(stamps: &[PriceStamp], strategy: &MaStrategy) -> Result<Dec> {
    let first = stamps
        .first()
        .ok_or_else(|| OracleError::PriceUnavailable("empty stamp window".into()))?;

    for pair in stamps.windows(2) {
        if pair[1].height <= pair[0].height {
            return Err(OracleError::NonMonotonicHeight {
                denom: pair[1].denom.clone(),
                new: pair[1].height,
                last: pair[0].height,
            });
        }
    }

    let prices: Vec<Dec> = stamps.iter().map(|s| s.price).collect();
    let price = match strategy {
        MaStrategy::Sma => sma(&prices)?,
        MaStrategy::Ema => ema(&prices)?,
        MaStrategy::Wma(kind) => wma(&prices, &wma_weights(kind, prices.len())?)?,
    };

    debug!(
        denom = %first.denom,
        strategy = %strategy,
        stamps = prices.len(),
        %price,
        "computed moving average"
    );
    Ok(price)
}

/// Arithmetic mean of `prices`.
pub fn sma(prices: &[Dec]) -> Result<Dec> {
    Ok(tessera_math::stats::average(prices)?)
}

/// Exponential moving average seeded with the oldest price.
pub fn ema(prices: &[Dec]) -> Result<Dec> {
    let (&seed, rest) = prices
        .split_first()
        .ok_or_else(|| OracleError::PriceUnavailable("empty stamp window".into()))?;
    let alpha = Dec::from_ratio(2, EMA_SMOOTHING_PERIOD + 1)?;
    let keep = Dec::one().checked_sub(alpha)?;

    let mut acc = seed;
    for &p in rest {
        acc = p.checked_mul(alpha)?.checked_add(acc.checked_mul(keep)?)?;
    }
    Ok(acc)
}

/// Weighted mean of `prices`. The only truncation is the final division.
///
/// # Errors
///
/// - [`OracleError::InvalidWeightsLength`] if lengths differ
/// - [`OracleError::InvalidWeights`] if the weights sum to zero
pub fn wma(prices: &[Dec], weights: &[u64]) -> Result<Dec> {
    if prices.len() != weights.len() {
        return Err(OracleError::InvalidWeightsLength {
            expected: prices.len(),
            actual: weights.len(),
        });
    }
    let total: u128 = weights.iter().map(|&w| u128::from(w)).sum();
    if total == 0 {
        return Err(OracleError::InvalidWeights);
    }

    let mut weighted = Dec::zero();
    for (price, &weight) in prices.iter().zip(weights) {
        weighted = weighted.checked_add(price.checked_mul_int(u128::from(weight))?)?;
    }
    Ok(weighted.checked_quo_int(total)?)
}

/// Weights for a window of `n` stamps, oldest first.
///
/// ```text
/// Recent:    1, 2, …, n
/// Oldest:    n, …, 2, 1
/// Balanced:  min(i + 1, n − i)      e.g. 1,2,3,2,1
/// ```
pub fn wma_weights(kind: &WmaKind, n: usize) -> Result<Vec<u64>> {
    let weights = match kind {
        WmaKind::Recent => (1..=n as u64).collect(),
        WmaKind::Oldest => (1..=n as u64).rev().collect(),
        WmaKind::Balanced => (0..n)
            .map(|i| (i + 1).min(n - i) as u64)
            .collect(),
        WmaKind::Custom(weights) => {
            if weights.len() != n {
                return Err(OracleError::InvalidWeightsLength {
                    expected: n,
                    actual: weights.len(),
                });
            }
            weights.clone()
        }
    };
    Ok(weights)
}
