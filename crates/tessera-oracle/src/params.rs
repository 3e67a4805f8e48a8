//! Oracle parameters.
//!
//! All periods are counted in blocks. A period `p` ends at every height `h`
//! with `(h + 1) % p == 0`, so stamp and median periods must be multiples
//! of the vote period for their boundaries to coincide with a tally.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tessera_math::Dec;
use tessera_types::{NATIVE_DENOM, NATIVE_EXPONENT, NATIVE_SYMBOL};

use crate::{OracleError, Result};

/// Blocks per minute at the target block time of 6 seconds.
pub const BLOCKS_PER_MINUTE: u64 = 10;

/// Blocks per hour at the target block time.
pub const BLOCKS_PER_HOUR: u64 = BLOCKS_PER_MINUTE * 60;

/// Lower bound on the vote threshold.
pub const MIN_VOTE_THRESHOLD: (u128, u128) = (33, 100);

/// Largest exponent an accepted denom may declare.
pub const MAX_EXPONENT: u32 = 18;

/// Whether `height` is the last block of a period of `period` blocks.
///
/// A zero period never ends, and neither does any period at `u64::MAX`.
pub fn is_period_last_block(height: u64, period: u64) -> bool {
    period != 0 && height.checked_add(1).is_some_and(|next| next % period == 0)
}

/// One denom the oracle accepts votes and serves prices for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomEntry {
    /// On-chain base denomination, e.g. `ncheq`.
    pub base_denom: String,
    /// Ticker the feeders quote, e.g. `CHEQ`.
    pub symbol_denom: String,
    /// Decimal exponent from base to symbol units.
    pub exponent: u32,
}

impl DenomEntry {
    /// Whether `denom` names this entry by base denom or (case-insensitive)
    /// symbol.
    pub fn matches(&self, denom: &str) -> bool {
        self.base_denom == denom || self.symbol_denom.eq_ignore_ascii_case(denom)
    }
}

/// Allowed deviation of a feeder's vote from the tallied rate of one
/// symbol before the vote misses the reward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardBand {
    pub symbol_denom: String,
    /// Fraction of the tallied rate, in `[0, 1]`.
    pub reward_band: Dec,
}

/// Oracle parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleParams {
    /// Blocks between vote tallies.
    #[serde(default = "default_vote_period")]
    pub vote_period: u64,

    /// Blocks between committed price stamps.
    #[serde(default = "default_historic_stamp_period")]
    pub historic_stamp_period: u64,

    /// Stamps retained per denom and averaged over.
    #[serde(default = "default_averaging_window")]
    pub averaging_window: u64,

    /// Blocks between historic median stamps.
    #[serde(default = "default_median_stamp_period")]
    pub median_stamp_period: u64,

    /// Historic medians retained per denom.
    #[serde(default = "default_maximum_median_stamps")]
    pub maximum_median_stamps: u64,

    /// Minimum share of bonded power a tallied rate needs to be stamped.
    #[serde(default = "default_vote_threshold")]
    pub vote_threshold: Dec,

    /// Denoms the oracle serves.
    #[serde(default = "default_accept_list")]
    pub accept_list: Vec<DenomEntry>,

    /// Reward band of each voted symbol.
    #[serde(default = "default_reward_bands")]
    pub reward_bands: Vec<RewardBand>,
}

fn default_vote_period() -> u64 {
    10
}

fn default_historic_stamp_period() -> u64 {
    BLOCKS_PER_MINUTE * 3
}

fn default_averaging_window() -> u64 {
    10
}

fn default_median_stamp_period() -> u64 {
    BLOCKS_PER_HOUR * 3
}

fn default_maximum_median_stamps() -> u64 {
    24
}

fn default_vote_threshold() -> Dec {
    Dec::one().checked_quo_int(2).unwrap_or_default()
}

fn default_accept_list() -> Vec<DenomEntry> {
    vec![DenomEntry {
        base_denom: NATIVE_DENOM.to_string(),
        symbol_denom: NATIVE_SYMBOL.to_string(),
        exponent: NATIVE_EXPONENT,
    }]
}

fn default_reward_bands() -> Vec<RewardBand> {
    vec![RewardBand {
        symbol_denom: NATIVE_SYMBOL.to_string(),
        reward_band: Dec::from_ratio(2, 100).unwrap_or_default(),
    }]
}

impl Default for OracleParams {
    fn default() -> Self {
        Self {
            vote_period: default_vote_period(),
            historic_stamp_period: default_historic_stamp_period(),
            averaging_window: default_averaging_window(),
            median_stamp_period: default_median_stamp_period(),
            maximum_median_stamps: default_maximum_median_stamps(),
            vote_threshold: default_vote_threshold(),
            accept_list: default_accept_list(),
            reward_bands: default_reward_bands(),
        }
    }
}

impl OracleParams {
    /// Validate the parameter set.
    ///
    /// # Errors
    ///
    /// - [`OracleError::InvalidParams`] describing the first violation
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(OracleError::InvalidParams(msg));

        if self.vote_period == 0 {
            return invalid("vote_period must be positive".into());
        }
        if self.historic_stamp_period < self.vote_period
            || self.historic_stamp_period % self.vote_period != 0
        {
            return invalid(format!(
                "historic_stamp_period {} must be a multiple of vote_period {}",
                self.historic_stamp_period, self.vote_period
            ));
        }
        if self.median_stamp_period < self.historic_stamp_period
            || self.median_stamp_period % self.historic_stamp_period != 0
        {
            return invalid(format!(
                "median_stamp_period {} must be a multiple of historic_stamp_period {}",
                self.median_stamp_period, self.historic_stamp_period
            ));
        }
        if self.averaging_window == 0 {
            return invalid("averaging_window must be positive".into());
        }
        if self.maximum_median_stamps == 0 {
            return invalid("maximum_median_stamps must be positive".into());
        }

        let min_threshold = Dec::from_ratio(MIN_VOTE_THRESHOLD.0, MIN_VOTE_THRESHOLD.1)?;
        if self.vote_threshold < min_threshold || self.vote_threshold > Dec::one() {
            return invalid(format!(
                "vote_threshold {} must be within [{min_threshold}, 1]",
                self.vote_threshold
            ));
        }

        if self.accept_list.is_empty() {
            return invalid("accept_list must not be empty".into());
        }
        let mut seen = BTreeSet::new();
        for entry in &self.accept_list {
            if entry.base_denom.is_empty() || entry.symbol_denom.is_empty() {
                return invalid("accept_list entries need base and symbol denoms".into());
            }
            if entry.exponent > MAX_EXPONENT {
                return invalid(format!(
                    "exponent {} of {} exceeds {MAX_EXPONENT}",
                    entry.exponent, entry.base_denom
                ));
            }
            if !seen.insert(entry.symbol_denom.to_ascii_uppercase()) {
                return invalid(format!("duplicate accept_list symbol {}", entry.symbol_denom));
            }
        }

        let mut banded = BTreeSet::new();
        for band in &self.reward_bands {
            if band.symbol_denom.is_empty() {
                return invalid("reward_bands entries need a symbol denom".into());
            }
            if band.reward_band > Dec::one() {
                return invalid(format!(
                    "reward_band {} of {} must be within [0, 1]",
                    band.reward_band, band.symbol_denom
                ));
            }
            if !banded.insert(band.symbol_denom.to_ascii_uppercase()) {
                return invalid(format!("duplicate reward_bands symbol {}", band.symbol_denom));
            }
        }
        Ok(())
    }

    /// The accept-list entry for `denom` (base or symbol).
    pub fn find_denom(&self, denom: &str) -> Option<&DenomEntry> {
        self.accept_list.iter().find(|e| e.matches(denom))
    }

    /// Reward band of `symbol` (case-insensitive).
    pub fn reward_band(&self, symbol: &str) -> Option<Dec> {
        self.reward_bands
            .iter()
            .find(|b| b.symbol_denom.eq_ignore_ascii_case(symbol))
            .map(|b| b.reward_band)
    }

    /// Stamp window length as a `usize`.
    pub fn window_len(&self) -> usize {
        usize::try_from(self.averaging_window).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = OracleParams::default();
        params.validate().expect("defaults validate");
        assert_eq!(params.historic_stamp_period, 30);
        assert_eq!(params.median_stamp_period, 1800);
        assert_eq!(params.vote_threshold.to_string(), "0.500000000000000000");
    }

    #[test]
    fn test_period_last_block() {
        assert!(is_period_last_block(9, 10));
        assert!(is_period_last_block(19, 10));
        assert!(!is_period_last_block(10, 10));
        assert!(!is_period_last_block(9, 0));
        assert!(is_period_last_block(0, 1));
        assert!(!is_period_last_block(u64::MAX, 10));
        assert!(!is_period_last_block(u64::MAX, 1));
        assert!(is_period_last_block(u64::MAX - 1, 1));
    }

    #[test]
    fn test_stamp_period_must_align_with_vote_period() {
        let params = OracleParams {
            historic_stamp_period: 25,
            ..OracleParams::default()
        };
        assert!(matches!(params.validate(), Err(OracleError::InvalidParams(_))));
    }

    #[test]
    fn test_vote_threshold_bounds() {
        let low = OracleParams {
            vote_threshold: "0.2".parse().expect("dec"),
            ..OracleParams::default()
        };
        assert!(low.validate().is_err());

        let high = OracleParams {
            vote_threshold: "1.01".parse().expect("dec"),
            ..OracleParams::default()
        };
        assert!(high.validate().is_err());
    }

    #[test]
    fn test_duplicate_symbols_rejected() {
        let mut params = OracleParams::default();
        params.accept_list.push(DenomEntry {
            base_denom: "ucheq".into(),
            symbol_denom: "cheq".into(),
            exponent: 6,
        });
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_find_denom_by_base_or_symbol() {
        let params = OracleParams::default();
        assert!(params.find_denom("ncheq").is_some());
        assert!(params.find_denom("CHEQ").is_some());
        assert!(params.find_denom("cheq").is_some());
        assert!(params.find_denom("uatom").is_none());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let params: OracleParams =
            serde_json::from_str(r#"{"averaging_window": 5}"#).expect("deserialize");
        assert_eq!(params.averaging_window, 5);
        assert_eq!(params.vote_period, 10);
        assert_eq!(params.accept_list.len(), 1);
    }

    #[test]
    fn test_reward_bands() {
        let params = OracleParams::default();
        assert_eq!(params.reward_band("cheq"), Some("0.02".parse().expect("dec")));
        assert_eq!(params.reward_band("ATOM"), None);

        let wide = OracleParams {
            reward_bands: vec![RewardBand {
                symbol_denom: "CHEQ".into(),
                reward_band: "1.5".parse().expect("dec"),
            }],
            ..OracleParams::default()
        };
        assert!(matches!(wide.validate(), Err(OracleError::InvalidParams(_))));

        let mut duplicated = OracleParams::default();
        duplicated.reward_bands.push(RewardBand {
            symbol_denom: "cheq".into(),
            reward_band: Dec::one(),
        });
        assert!(duplicated.validate().is_err());

        let mut unnamed = OracleParams::default();
        unnamed.reward_bands[0].symbol_denom.clear();
        assert!(unnamed.validate().is_err());

        let params: OracleParams = serde_json::from_str(
            r#"{"reward_bands": [{"symbol_denom": "CHEQ", "reward_band": "0.05"}]}"#,
        )
        .expect("deserialize");
        assert_eq!(params.reward_band("CHEQ"), Some("0.05".parse().expect("dec")));
        params.validate().expect("valid bands");
    }
}
