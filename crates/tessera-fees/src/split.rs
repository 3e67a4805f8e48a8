//! Splitting a collected tax.
//!
//! ```text
//! burn             = truncate(tax × burn_factor)
//! reward           = tax − burn
//! feeder_reward    = truncate(reward × ORACLE_SHARE_RATE)
//! collector_reward = reward − feeder_reward
//! ```
//!
//! Truncation remainders always land in the subtracted-from portion, so
//! the parts sum to the tax exactly.

use serde::{Deserialize, Serialize};
use tessera_math::Dec;
use tessera_types::Coin;

use crate::{FeeError, Result};

/// Share of the reward routed to the oracle feeder pool, as `(num, den)`.
pub const ORACLE_SHARE_RATE: (u128, u128) = (5, 1000);

/// [`ORACLE_SHARE_RATE`] as a decimal.
pub fn oracle_share_rate() -> Result<Dec> {
    Ok(Dec::from_ratio(ORACLE_SHARE_RATE.0, ORACLE_SHARE_RATE.1)?)
}

/// Outcome of splitting one tax. All coins share the tax denom.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxResult {
    pub required_tax: Coin,
    pub burn: Coin,
    pub reward: Coin,
    pub feeder_reward: Coin,
    pub collector_reward: Coin,
}

impl TaxResult {
    /// Check that burn, collector and feeder portions add up to the tax.
    ///
    /// # Errors
    ///
    /// - [`FeeError::SplitMismatch`] if they do not
    pub fn verify(&self) -> Result<()> {
        let parts = [&self.burn, &self.collector_reward, &self.feeder_reward]
            .iter()
            .try_fold(0u128, |acc, c| acc.checked_add(c.amount));
        let reward_parts = self
            .collector_reward
            .amount
            .checked_add(self.feeder_reward.amount);
        match parts {
            Some(sum) if sum == self.required_tax.amount && reward_parts == Some(self.reward.amount) => {
                Ok(())
            }
            _ => Err(FeeError::SplitMismatch {
                tax: self.required_tax.amount,
                parts: parts.unwrap_or(u128::MAX),
            }),
        }
    }
}

/// Split `amount` into `truncate(amount × ratio)` and the rest.
///
/// # Errors
///
/// - [`FeeError::InvalidBurnFactor`] if `ratio > 1`
pub fn split_rewards_by_ratio(amount: u128, ratio: Dec) -> Result<(u128, u128)> {
    if ratio > Dec::one() {
        return Err(FeeError::InvalidBurnFactor(ratio.to_string()));
    }
    let portion = Dec::from_int(amount).checked_mul(ratio)?.truncate_u128()?;
    // portion <= amount since ratio <= 1
    Ok((portion, amount - portion))
}

/// Split a tax into burn, collector and feeder portions.
///
/// # Examples
///
/// ```
/// use tessera_fees::split_tax;
/// use tessera_types::Coin;
///
/// let result = split_tax(&Coin::new("ncheq", 50_000_000_000), "0.5".parse().unwrap()).unwrap();
/// assert_eq!(result.burn.amount, 25_000_000_000);
/// assert_eq!(result.feeder_reward.amount, 125_000_000);
/// assert_eq!(result.collector_reward.amount, 24_875_000_000);
/// ```
pub fn split_tax(tax: &Coin, burn_factor: Dec) -> Result<TaxResult> {
    let (burn, reward) = split_rewards_by_ratio(tax.amount, burn_factor)?;
    let (feeder, collector) = split_rewards_by_ratio(reward, oracle_share_rate()?)?;

    let coin = |amount| Coin::new(tax.denom.clone(), amount);
    let result = TaxResult {
        required_tax: tax.clone(),
        burn: coin(burn),
        reward: coin(reward),
        feeder_reward: coin(feeder),
        collector_reward: coin(collector),
    };
    result.verify()?;
    Ok(result)
}
