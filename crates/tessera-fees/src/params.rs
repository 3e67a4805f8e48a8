//! Fee ranges and per-operation fee schedules.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use tessera_math::{Dec, MathError};
use tessera_types::tx::TaxableOperation;
use tessera_types::{NATIVE_DENOM, USD_DENOM, USD_EXPONENT};

use crate::{FeeError, Result};

/// One CHEQ in ncheq.
const CHEQ: u128 = 1_000_000_000;

/// One USD in usd base units.
const USD: u128 = 1_000_000_000_000_000_000;

/// A floor and optional ceiling in one denomination.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRange {
    pub denom: String,
    #[serde_as(as = "DisplayFromStr")]
    pub min_amount: u128,
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub max_amount: Option<u128>,
}

impl FeeRange {
    pub fn new(denom: impl Into<String>, min_amount: u128, max_amount: Option<u128>) -> Self {
        Self {
            denom: denom.into(),
            min_amount,
            max_amount,
        }
    }

    /// A range in the native base denom.
    pub fn native(min_amount: u128, max_amount: Option<u128>) -> Self {
        Self::new(NATIVE_DENOM, min_amount, max_amount)
    }

    /// A USD-pegged range (amounts in 10^-18 USD).
    pub fn usd(min_amount: u128, max_amount: Option<u128>) -> Self {
        Self::new(USD_DENOM, min_amount, max_amount)
    }
}

/// Fee schedules of every taxable operation, plus the burn factor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeParams {
    #[serde(default = "default_create_did")]
    pub create_did: Vec<FeeRange>,
    #[serde(default = "default_update_did")]
    pub update_did: Vec<FeeRange>,
    #[serde(default = "default_deactivate_did")]
    pub deactivate_did: Vec<FeeRange>,
    #[serde(default = "default_create_resource_image")]
    pub create_resource_image: Vec<FeeRange>,
    #[serde(default = "default_create_resource_json")]
    pub create_resource_json: Vec<FeeRange>,
    #[serde(default = "default_create_resource_default")]
    pub create_resource_default: Vec<FeeRange>,
    /// Share of every tax that is burned, in `[0, 1]`.
    #[serde(default = "default_burn_factor")]
    pub burn_factor: Dec,
}

fn default_create_did() -> Vec<FeeRange> {
    vec![
        FeeRange::native(50 * CHEQ, Some(100 * CHEQ)),
        FeeRange::usd(12 * USD / 10, Some(2 * USD)),
    ]
}

fn default_update_did() -> Vec<FeeRange> {
    vec![FeeRange::native(25 * CHEQ, None)]
}

fn default_deactivate_did() -> Vec<FeeRange> {
    vec![FeeRange::native(10 * CHEQ, Some(20 * CHEQ))]
}

fn default_create_resource_image() -> Vec<FeeRange> {
    vec![FeeRange::native(20 * CHEQ, Some(30 * CHEQ))]
}

fn default_create_resource_json() -> Vec<FeeRange> {
    vec![FeeRange::native(35 * CHEQ / 10, Some(60 * CHEQ))]
}

fn default_create_resource_default() -> Vec<FeeRange> {
    vec![FeeRange::native(6 * CHEQ, Some(20 * CHEQ))]
}

fn default_burn_factor() -> Dec {
    Dec::one().checked_quo_int(2).unwrap_or_default()
}

impl Default for FeeParams {
    fn default() -> Self {
        Self {
            create_did: default_create_did(),
            update_did: default_update_did(),
            deactivate_did: default_deactivate_did(),
            create_resource_image: default_create_resource_image(),
            create_resource_json: default_create_resource_json(),
            create_resource_default: default_create_resource_default(),
            burn_factor: default_burn_factor(),
        }
    }
}

impl FeeParams {
    /// The schedule of `op`.
    pub fn ranges(&self, op: TaxableOperation) -> &[FeeRange] {
        match op {
            TaxableOperation::CreateDid => &self.create_did,
            TaxableOperation::UpdateDid => &self.update_did,
            TaxableOperation::DeactivateDid => &self.deactivate_did,
            TaxableOperation::CreateResourceImage => &self.create_resource_image,
            TaxableOperation::CreateResourceJson => &self.create_resource_json,
            TaxableOperation::CreateResourceDefault => &self.create_resource_default,
        }
    }

    /// Structural validation.
    ///
    /// Every range must be in `native_denom` or `usd`, with `min > 0` and
    /// `max >= min`; each schedule holds at most one range per denom and at
    /// least one range; the burn factor lies in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// - [`FeeError::InvalidFeeParams`] naming the offending range
    /// - [`FeeError::InvalidBurnFactor`] if the burn factor exceeds 1
    pub fn validate(&self, native_denom: &str) -> Result<()> {
        for op in TaxableOperation::ALL {
            let ranges = self.ranges(op);
            if ranges.is_empty() {
                return Err(FeeError::InvalidFeeParams(format!("{op}: no fee ranges")));
            }
            for (i, range) in ranges.iter().enumerate() {
                if range.denom != native_denom && range.denom != USD_DENOM {
                    return Err(FeeError::InvalidFeeParams(format!(
                        "{op}[{i}]: invalid denom {}",
                        range.denom
                    )));
                }
                if range.min_amount == 0 {
                    return Err(FeeError::InvalidFeeParams(format!(
                        "{op}[{i}]: min_amount must be positive"
                    )));
                }
                if let Some(max) = range.max_amount {
                    if max < range.min_amount {
                        return Err(FeeError::InvalidFeeParams(format!(
                            "{op}[{i}]: max_amount {max} < min_amount {}",
                            range.min_amount
                        )));
                    }
                }
                if ranges[..i].iter().any(|r| r.denom == range.denom) {
                    return Err(FeeError::InvalidFeeParams(format!(
                        "{op}[{i}]: duplicate {} range",
                        range.denom
                    )));
                }
            }
        }

        if self.burn_factor > Dec::one() {
            return Err(FeeError::InvalidBurnFactor(self.burn_factor.to_string()));
        }
        Ok(())
    }

    /// Check that the native and USD ranges of every operation share a
    /// common value at `price` (USD per whole native token), where a whole
    /// token is `10^native_exponent` of `native_denom`.
    ///
    /// Used to vet a parameter change before it is applied: disjoint ranges
    /// would make the USD range unreachable.
    ///
    /// # Errors
    ///
    /// - [`FeeError::InvalidFeeParams`] naming the first disjoint schedule
    pub fn validate_overlap(
        &self,
        native_denom: &str,
        native_exponent: u32,
        price: Dec,
    ) -> Result<()> {
        let native_unit = 10u128.checked_pow(native_exponent).ok_or(MathError::Overflow)?;
        for op in TaxableOperation::ALL {
            let ranges = self.ranges(op);
            if ranges.len() <= 1 {
                continue;
            }

            let mut low = Dec::zero();
            let mut high: Option<Dec> = None;
            for range in ranges {
                let to_usd = |amount: u128| -> Result<Dec> {
                    if range.denom == native_denom {
                        Ok(Dec::from_ratio(amount, native_unit)?.checked_mul(price)?)
                    } else {
                        Ok(Dec::from_ratio(amount, 10u128.pow(USD_EXPONENT))?)
                    }
                };
                low = low.max(to_usd(range.min_amount)?);
                if let Some(max) = range.max_amount {
                    let max = to_usd(max)?;
                    high = Some(high.map_or(max, |h| h.min(max)));
                }
            }

            if let Some(high) = high {
                if low > high {
                    return Err(FeeError::InvalidFeeParams(format!(
                        "{op}: fee ranges do not overlap at price {price} (usd {low} > {high})"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tessera_types::NATIVE_EXPONENT;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = FeeParams::default();
        params.validate(NATIVE_DENOM).expect("defaults validate");
        assert_eq!(params.create_did[0].min_amount, 50_000_000_000);
        assert_eq!(params.create_did[1].min_amount, 1_200_000_000_000_000_000);
        assert_eq!(params.create_resource_json[0].min_amount, 3_500_000_000);
        assert_eq!(params.burn_factor.to_string(), "0.500000000000000000");
    }

    #[test]
    fn test_ranges_per_operation() {
        let params = FeeParams::default();
        assert_eq!(params.ranges(TaxableOperation::UpdateDid)[0].max_amount, None);
        assert_eq!(
            params.ranges(TaxableOperation::CreateResourceImage)[0].min_amount,
            20_000_000_000
        );
    }

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let mut params = FeeParams::default();
        params.update_did = vec![FeeRange::new("uatom", 1, None)];
        assert!(matches!(
            params.validate(NATIVE_DENOM),
            Err(FeeError::InvalidFeeParams(_))
        ));

        let mut params = FeeParams::default();
        params.deactivate_did = vec![FeeRange::native(0, None)];
        assert!(params.validate(NATIVE_DENOM).is_err());

        let mut params = FeeParams::default();
        params.deactivate_did = vec![FeeRange::native(10, Some(5))];
        assert!(params.validate(NATIVE_DENOM).is_err());

        let mut params = FeeParams::default();
        params.create_resource_default = vec![];
        assert!(params.validate(NATIVE_DENOM).is_err());

        let mut params = FeeParams::default();
        params.create_did.push(FeeRange::native(1, None));
        assert!(params.validate(NATIVE_DENOM).is_err());
    }

    #[test]
    fn test_burn_factor_bounds() {
        let mut params = FeeParams::default();
        params.burn_factor = Dec::one();
        params.validate(NATIVE_DENOM).expect("burn everything is allowed");
        params.burn_factor = Dec::zero();
        params.validate(NATIVE_DENOM).expect("burn nothing is allowed");
        params.burn_factor = "1.000000000000000001".parse().expect("dec");
        assert!(matches!(
            params.validate(NATIVE_DENOM),
            Err(FeeError::InvalidBurnFactor(_))
        ));
    }

    #[test]
    fn test_validate_overlap() {
        let params = FeeParams::default();
        // 50..100 CHEQ at $0.02 is $1..$2, overlapping $1.2..$2.
        params
            .validate_overlap(NATIVE_DENOM, NATIVE_EXPONENT, "0.02".parse().expect("dec"))
            .expect("overlapping");
        // At $1 the native range is $50..$100, above the USD range.
        assert!(matches!(
            params.validate_overlap(NATIVE_DENOM, NATIVE_EXPONENT, Dec::one()),
            Err(FeeError::InvalidFeeParams(_))
        ));
    }

    #[test]
    fn test_validate_overlap_uses_native_exponent() {
        // 50..100 CHEQ as ucheq with six decimals.
        let mut params = FeeParams::default();
        params.create_did = vec![
            FeeRange::new("ucheq", 50_000_000, Some(100_000_000)),
            FeeRange::usd(USD * 6 / 5, Some(2 * USD)),
        ];
        params
            .validate_overlap("ucheq", 6, "0.02".parse().expect("dec"))
            .expect("overlapping with six decimals");
        // Read with nine decimals the same amounts are $0.001..$0.002.
        assert!(params
            .validate_overlap("ucheq", NATIVE_EXPONENT, "0.02".parse().expect("dec"))
            .is_err());
        assert!(matches!(
            params.validate_overlap("ucheq", 40, Dec::one()),
            Err(FeeError::Math(MathError::Overflow))
        ));
    }

    #[test]
    fn test_serde_amounts_as_strings() {
        let range = FeeRange::usd(5_000_000_000_000_000_000, None);
        let json = serde_json::to_value(&range).expect("serialize");
        assert_eq!(json["min_amount"], "5000000000000000000");
        assert!(json["max_amount"].is_null());

        let params: FeeParams =
            serde_json::from_str(r#"{"burn_factor": "0.25"}"#).expect("deserialize");
        assert_eq!(params.create_did, FeeParams::default().create_did);
        assert_eq!(params.burn_factor.to_string(), "0.250000000000000000");
    }
}
