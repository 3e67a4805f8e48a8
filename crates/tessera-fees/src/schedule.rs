//! Resolving a fee schedule to native-denom bounds.
//!
//! The USD range is converted at the current price and clamped into the
//! native range, which always wins:
//!
//! ```text
//! floor   = min(max(native.min, usd_to_native(usd.min)), native.max)
//! ceiling = max(min(native.max, usd_to_native(usd.max)), floor)   (absent = unbounded)
//! ```
//!
//! Both bounds are non-increasing in the price. When the converted range
//! misses the native range, the bounds pin to the nearer native edge.

use serde::{Deserialize, Serialize};
use tessera_math::{Dec, MathError};
use tessera_oracle::convert::usd_to_native;
use tessera_types::{Coin, USD_DENOM};
use tracing::{debug, warn};

use crate::params::FeeRange;
use crate::{FeeError, Result};

/// Native-denom floor and optional ceiling of a tax.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBounds {
    pub floor: u128,
    pub ceiling: Option<u128>,
}

impl FeeBounds {
    fn from_range(range: &FeeRange) -> Self {
        Self {
            floor: range.min_amount,
            ceiling: range.max_amount,
        }
    }

    /// Sum the bounds of several taxable messages in one transaction.
    ///
    /// Floors add, ceilings add, and the result is unbounded if any part
    /// is unbounded.
    pub fn combine<'a>(bounds: impl IntoIterator<Item = &'a FeeBounds>) -> Result<Self> {
        let mut total = FeeBounds {
            floor: 0,
            ceiling: Some(0),
        };
        for b in bounds {
            total.floor = total
                .floor
                .checked_add(b.floor)
                .ok_or(MathError::Overflow)?;
            total.ceiling = match (total.ceiling, b.ceiling) {
                (Some(acc), Some(c)) => Some(acc.checked_add(c).ok_or(MathError::Overflow)?),
                _ => None,
            };
        }
        Ok(total)
    }

    /// Charge an offered fee against these bounds.
    ///
    /// Returns the required tax: the offered amount, capped at the ceiling.
    ///
    /// # Errors
    ///
    /// - [`FeeError::InvalidDenom`] if `offered` is not in `native_denom`
    /// - [`FeeError::InsufficientFee`] if `offered` is below the floor
    pub fn charge(&self, offered: &Coin, native_denom: &str) -> Result<Coin> {
        if offered.denom != native_denom {
            return Err(FeeError::InvalidDenom {
                expected: native_denom.to_string(),
                actual: offered.denom.clone(),
            });
        }
        if offered.amount < self.floor {
            return Err(FeeError::InsufficientFee {
                denom: native_denom.to_string(),
                required: self.floor,
                offered: offered.amount,
            });
        }
        let amount = match self.ceiling {
            Some(ceiling) => offered.amount.min(ceiling),
            None => offered.amount,
        };
        Ok(Coin::new(native_denom, amount))
    }
}

/// Resolve a schedule to native bounds at `price` (USD per whole token).
///
/// `native_exponent` is the number of decimals from the native base denom
/// to one whole token.
///
/// # Errors
///
/// - [`FeeError::InvalidFeeRange`] if `ranges` holds neither a native nor
///   a USD range
/// - [`FeeError::Oracle`] wrapping `PriceUnavailable` if a USD range must
///   be converted at a zero price
pub fn resolve_bounds(
    ranges: &[FeeRange],
    price: Dec,
    native_denom: &str,
    native_exponent: u32,
) -> Result<FeeBounds> {
    let native = ranges.iter().find(|r| r.denom == native_denom);
    let usd = ranges.iter().find(|r| r.denom == USD_DENOM);

    let converted = match usd {
        Some(range) => Some(FeeBounds {
            floor: usd_to_native(range.min_amount, price, native_exponent)?,
            ceiling: range
                .max_amount
                .map(|max| usd_to_native(max, price, native_exponent))
                .transpose()?,
        }),
        None => None,
    };

    let bounds = match (native, converted) {
        (Some(native), Some(converted)) => {
            clamp_to_native(converted, FeeBounds::from_range(native), price)
        }
        (Some(native), None) => FeeBounds::from_range(native),
        (None, Some(converted)) => converted,
        (None, None) => {
            return Err(FeeError::InvalidFeeRange(format!(
                "no {native_denom} or {USD_DENOM} range"
            )));
        }
    };

    debug!(%price, floor = bounds.floor, ceiling = ?bounds.ceiling, "resolved fee bounds");
    Ok(bounds)
}

/// Clamp USD-derived bounds into the native range.
fn clamp_to_native(converted: FeeBounds, native: FeeBounds, price: Dec) -> FeeBounds {
    let cap = |amount: u128| native.ceiling.map_or(amount, |max| amount.min(max));

    let floor = cap(converted.floor.max(native.floor));
    let ceiling = match converted.ceiling {
        Some(usd_max) => Some(cap(usd_max).max(floor)),
        None => native.ceiling,
    };

    let above = native.ceiling.is_some_and(|max| converted.floor > max);
    let below = converted.ceiling.is_some_and(|max| max < native.floor);
    if above || below {
        warn!(
            %price,
            usd_floor = converted.floor,
            usd_ceiling = ?converted.ceiling,
            native_floor = native.floor,
            native_ceiling = ?native.ceiling,
            "usd fee range disjoint from native range; pinned to native edge"
        );
    }
    FeeBounds { floor, ceiling }
}

/// Resolve a schedule and charge `offered` against it.
pub fn resolve(
    ranges: &[FeeRange],
    price: Dec,
    offered: &Coin,
    native_denom: &str,
    native_exponent: u32,
) -> Result<Coin> {
    resolve_bounds(ranges, price, native_denom, native_exponent)?.charge(offered, native_denom)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tessera_oracle::OracleError;
    use tessera_types::{NATIVE_DENOM, NATIVE_EXPONENT};

    use super::*;

    const CHEQ: u128 = 1_000_000_000;
    const USD: u128 = 1_000_000_000_000_000_000;

    fn dec(s: &str) -> Dec {
        s.parse().expect("dec")
    }

    fn create_did() -> Vec<FeeRange> {
        vec![
            FeeRange::native(50 * CHEQ, Some(100 * CHEQ)),
            FeeRange::usd(5 * USD, Some(10 * USD)),
        ]
    }

    #[test]
    fn test_resolve_at_ten_cents() {
        let bounds = resolve_bounds(&create_did(), dec("0.1"), NATIVE_DENOM, NATIVE_EXPONENT).expect("bounds");
        assert_eq!(bounds, FeeBounds { floor: 50 * CHEQ, ceiling: Some(100 * CHEQ) });

        let offered = Coin::new(NATIVE_DENOM, 50 * CHEQ);
        let tax = resolve(&create_did(), dec("0.1"), &offered, NATIVE_DENOM, NATIVE_EXPONENT).expect("tax");
        assert_eq!(tax, offered);
    }

    #[test]
    fn test_cheap_token_raises_floor() {
        // $5 at $0.05 is 100 CHEQ, above the native floor.
        let bounds = resolve_bounds(&create_did(), dec("0.05"), NATIVE_DENOM, NATIVE_EXPONENT).expect("bounds");
        assert_eq!(bounds.floor, 100 * CHEQ);
        assert_eq!(bounds.ceiling, Some(100 * CHEQ));
    }

    #[test]
    fn test_disjoint_ranges_pin_to_native_edge() {
        // $5 at $0.01 is 500 CHEQ, past the 100 CHEQ native ceiling.
        let bounds = resolve_bounds(&create_did(), dec("0.01"), NATIVE_DENOM, NATIVE_EXPONENT).expect("bounds");
        assert_eq!(bounds, FeeBounds { floor: 100 * CHEQ, ceiling: Some(100 * CHEQ) });

        // $10 at $1 is 10 CHEQ, below the 50 CHEQ native floor.
        let bounds = resolve_bounds(&create_did(), dec("1"), NATIVE_DENOM, NATIVE_EXPONENT).expect("bounds");
        assert_eq!(bounds, FeeBounds { floor: 50 * CHEQ, ceiling: Some(50 * CHEQ) });
    }

    #[test]
    fn test_native_exponent_scales_conversion() {
        let ranges = vec![
            FeeRange::native(50_000_000, Some(100_000_000)),
            FeeRange::usd(5 * USD, Some(10 * USD)),
        ];
        let bounds = resolve_bounds(&ranges, dec("0.05"), "ucheq", 6).expect("bounds");
        assert_eq!(bounds, FeeBounds { floor: 100_000_000, ceiling: Some(100_000_000) });

        let bounds = resolve_bounds(&ranges, dec("0.1"), "ucheq", 6).expect("bounds");
        assert_eq!(bounds, FeeBounds { floor: 50_000_000, ceiling: Some(100_000_000) });
    }

    #[test]
    fn test_offer_above_ceiling_is_capped() {
        let offered = Coin::new(NATIVE_DENOM, 150 * CHEQ);
        let tax = resolve(&create_did(), dec("0.1"), &offered, NATIVE_DENOM, NATIVE_EXPONENT).expect("tax");
        assert_eq!(tax.amount, 100 * CHEQ);
    }

    #[test]
    fn test_offer_below_floor() {
        let offered = Coin::new(NATIVE_DENOM, 50 * CHEQ - 1);
        let err = resolve(&create_did(), dec("0.1"), &offered, NATIVE_DENOM, NATIVE_EXPONENT).unwrap_err();
        assert_eq!(
            err,
            FeeError::InsufficientFee {
                denom: NATIVE_DENOM.into(),
                required: 50 * CHEQ,
                offered: 50 * CHEQ - 1,
            }
        );
    }

    #[test]
    fn test_wrong_denom() {
        let offered = Coin::new("uatom", 100 * CHEQ);
        let err = resolve(&create_did(), dec("0.1"), &offered, NATIVE_DENOM, NATIVE_EXPONENT).unwrap_err();
        assert!(matches!(err, FeeError::InvalidDenom { .. }));
    }

    #[test]
    fn test_zero_price_with_usd_range() {
        let err = resolve_bounds(&create_did(), Dec::zero(), NATIVE_DENOM, NATIVE_EXPONENT).unwrap_err();
        assert!(matches!(err, FeeError::Oracle(OracleError::PriceUnavailable(_))));

        // A native-only schedule never needs the price.
        let native_only = vec![FeeRange::native(CHEQ, None)];
        resolve_bounds(&native_only, Dec::zero(), NATIVE_DENOM, NATIVE_EXPONENT).expect("native only");
    }

    #[test]
    fn test_usd_only_and_empty_schedules() {
        let usd_only = vec![FeeRange::usd(USD, None)];
        let bounds = resolve_bounds(&usd_only, dec("0.5"), NATIVE_DENOM, NATIVE_EXPONENT).expect("bounds");
        assert_eq!(bounds, FeeBounds { floor: 2 * CHEQ, ceiling: None });

        let err = resolve_bounds(&[], dec("0.5"), NATIVE_DENOM, NATIVE_EXPONENT).unwrap_err();
        assert!(matches!(err, FeeError::InvalidFeeRange(_)));
    }

    #[test]
    fn test_combine_bounds() {
        let a = FeeBounds { floor: 10, ceiling: Some(20) };
        let b = FeeBounds { floor: 5, ceiling: Some(7) };
        let unbounded = FeeBounds { floor: 1, ceiling: None };

        assert_eq!(
            FeeBounds::combine([&a, &b]).expect("combine"),
            FeeBounds { floor: 15, ceiling: Some(27) }
        );
        assert_eq!(
            FeeBounds::combine([&a, &unbounded, &b]).expect("combine"),
            FeeBounds { floor: 16, ceiling: None }
        );
        let huge = FeeBounds { floor: u128::MAX, ceiling: None };
        assert!(FeeBounds::combine([&huge, &a]).is_err());
    }

    #[test]
    fn test_floor_non_increasing_in_price() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let usd_min = rng.gen_range(1..=20u128) * USD / 4;
            let native_min = rng.gen_range(1..=200u128) * CHEQ;
            let ranges = vec![
                FeeRange::native(native_min, None),
                FeeRange::usd(usd_min, None),
            ];

            let mut prices: Vec<u128> = (0..20).map(|_| rng.gen_range(1..=100_000u128)).collect();
            prices.sort_unstable();
            let mut last = u128::MAX;
            for micros in prices {
                let price = Dec::from_ratio(micros, 1_000_000).expect("ratio");
                let floor = resolve_bounds(&ranges, price, NATIVE_DENOM, NATIVE_EXPONENT)
                    .expect("bounds")
                    .floor;
                assert!(floor <= last, "floor rose at price {price}");
                last = floor;
            }
        }
    }

    #[test]
    fn test_bounds_monotone_across_disjoint_boundary() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let native_min = rng.gen_range(1..=100u128) * CHEQ;
            let native_max = native_min + rng.gen_range(0..=100u128) * CHEQ;
            let usd_min = rng.gen_range(1..=40u128) * USD / 4;
            let usd_max = usd_min + rng.gen_range(0..=40u128) * USD / 4;
            let ranges = vec![
                FeeRange::native(native_min, Some(native_max)),
                FeeRange::usd(usd_min, Some(usd_max)),
            ];

            // From far below to far above both crossing prices.
            let mut prices: Vec<u128> = (0..40).map(|_| rng.gen_range(100..=10_000_000u128)).collect();
            prices.sort_unstable();
            let mut last = FeeBounds { floor: u128::MAX, ceiling: Some(u128::MAX) };
            for micros in prices {
                let price = Dec::from_ratio(micros, 1_000_000).expect("ratio");
                let bounds = resolve_bounds(&ranges, price, NATIVE_DENOM, NATIVE_EXPONENT).expect("bounds");
                let ceiling = bounds.ceiling.expect("bounded");

                assert!(bounds.floor <= last.floor, "floor rose at price {price}");
                assert!(Some(ceiling) <= last.ceiling, "ceiling rose at price {price}");
                assert!(bounds.floor >= native_min);
                assert!(bounds.floor <= ceiling);
                assert!(ceiling <= native_max);
                last = bounds;
            }
        }
    }
}
