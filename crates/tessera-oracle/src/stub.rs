//! Fixed-rate vote tally.
//!
//! Stands in for the validator vote pipeline on single-node and test
//! networks: every tally returns the configured rates with full support.

use std::collections::BTreeMap;

use tessera_math::Dec;

use crate::aggregator::{ExchangeRate, VoteTally};

/// A tally that returns a hardcoded rate per denom.
#[derive(Debug, Clone, Default)]
pub struct StubTally {
    rates: BTreeMap<String, Dec>,
}

impl StubTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tally with a single rate.
    pub fn with_rate(denom: impl Into<String>, rate: Dec) -> Self {
        let mut tally = Self::new();
        tally.rates.insert(denom.into(), rate);
        tally
    }

    /// Current rate of `denom`.
    pub fn rate(&self, denom: &str) -> Option<Dec> {
        self.rates.get(denom).copied()
    }

    /// Set the rate of `denom` (development/testing only).
    pub fn dev_set_rate(&mut self, denom: impl Into<String>, rate: Dec) {
        let denom = denom.into();
        tracing::warn!(%denom, %rate, "stub tally: rate changed (dev only)");
        self.rates.insert(denom, rate);
    }
}

impl VoteTally for StubTally {
    fn tallied_rates(&self, _height: u64) -> Vec<ExchangeRate> {
        self.rates
            .iter()
            .map(|(denom, rate)| ExchangeRate {
                denom: denom.clone(),
                rate: *rate,
                support: Dec::one(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_support() {
        let tally = StubTally::with_rate("CHEQ", Dec::from_ratio(1, 10).expect("ratio"));
        let rates = tally.tallied_rates(9);
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].support, Dec::one());
    }

    #[test]
    fn test_dev_set_rate() {
        let mut tally = StubTally::new();
        assert!(tally.tallied_rates(0).is_empty());
        tally.dev_set_rate("CHEQ", Dec::from_int(2));
        assert_eq!(tally.rate("CHEQ"), Some(Dec::from_int(2)));
    }
}
