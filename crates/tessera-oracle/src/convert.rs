//! USD to native-token conversion.
//!
//! ```text
//! native = truncate( ((usd / 10^18) / price) × 10^exponent )
//! ```
//!
//! Each step truncates toward zero, so a higher price never yields a
//! larger native amount.

use tessera_math::{Dec, MathError};
use tessera_types::USD_EXPONENT;

use crate::{OracleError, Result};

fn pow10(exponent: u32) -> Result<u128> {
    10u128
        .checked_pow(exponent)
        .ok_or(OracleError::Math(MathError::Overflow))
}

/// Convert `usd_amount` (in 10^-18 USD units) into base units of a token
/// priced at `price` USD per whole token with `native_exponent` decimals.
///
/// # Errors
///
/// - [`OracleError::PriceUnavailable`] if `price` is zero
///
/// # Examples
///
/// ```
/// use tessera_math::Dec;
/// use tessera_oracle::convert::usd_to_native;
///
/// // $5 at $0.10 per CHEQ is 50 CHEQ.
/// let price: Dec = "0.1".parse().unwrap();
/// assert_eq!(usd_to_native(5_000_000_000_000_000_000, price, 9).unwrap(), 50_000_000_000);
/// ```
pub fn usd_to_native(usd_amount: u128, price: Dec, native_exponent: u32) -> Result<u128> {
    if price.is_zero() {
        return Err(OracleError::PriceUnavailable("price is zero".into()));
    }
    let usd = Dec::from_ratio(usd_amount, pow10(USD_EXPONENT)?)?;
    let whole_tokens = usd.checked_quo(price)?;
    Ok(whole_tokens
        .checked_mul_int(pow10(native_exponent)?)?
        .truncate_u128()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const USD: u128 = 1_000_000_000_000_000_000;

    fn dec(s: &str) -> Dec {
        s.parse().expect("dec")
    }

    #[test]
    fn test_whole_amounts() {
        assert_eq!(usd_to_native(5 * USD, dec("0.1"), 9).expect("convert"), 50_000_000_000);
        assert_eq!(usd_to_native(10 * USD, dec("0.1"), 9).expect("convert"), 100_000_000_000);
        assert_eq!(usd_to_native(2 * USD, dec("2"), 9).expect("convert"), 1_000_000_000);
    }

    #[test]
    fn test_truncates() {
        // 1 / 3 CHEQ = 0.333333333333333333 => 333333333 ncheq
        assert_eq!(usd_to_native(USD, dec("3"), 9).expect("convert"), 333_333_333);
        // Dust below one base unit truncates to zero.
        assert_eq!(usd_to_native(1, dec("1"), 9).expect("convert"), 0);
    }

    #[test]
    fn test_zero_price() {
        assert!(matches!(
            usd_to_native(USD, Dec::zero(), 9),
            Err(OracleError::PriceUnavailable(_))
        ));
    }

    #[test]
    fn test_higher_price_never_costs_more() {
        let target = 7 * USD / 3;
        let mut last = u128::MAX;
        for cents in 1..=500u128 {
            let price = Dec::from_ratio(cents, 100).expect("ratio");
            let native = usd_to_native(target, price, 9).expect("convert");
            assert!(native <= last, "price {price} raised the amount");
            last = native;
        }
    }
}
