//! Coins: an amount of a single denomination.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{Result, TypesError};

/// An amount of one denomination.
///
/// Amounts serialize as decimal strings so that config files and JSON
/// payloads can carry values beyond the `i64` range.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde_as(as = "DisplayFromStr")]
    pub amount: u128,
}

impl Coin {
    /// Create a coin.
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// A zero amount of `denom`.
    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, 0)
    }

    /// Whether the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Parses `"<amount><denom>"`, e.g. `"50000000000ncheq"`.
impl FromStr for Coin {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| TypesError::InvalidCoin(s.to_string()))?;
        let (amount, denom) = s.split_at(split);
        if amount.is_empty() || !denom.chars().all(|c| c.is_ascii_alphanumeric() || c == '/') {
            return Err(TypesError::InvalidCoin(s.to_string()));
        }
        let amount = amount
            .parse()
            .map_err(|_| TypesError::InvalidCoin(s.to_string()))?;
        Ok(Self::new(denom, amount))
    }
}
