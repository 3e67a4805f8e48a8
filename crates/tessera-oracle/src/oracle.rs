//! Oracle read facade.
//!
//! [`Oracle`] owns the stamp history and historic medians. Everything
//! outside the end-block hook reads it through [`PriceSource`] or the
//! query methods here.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tessera_math::{stats, Dec};
use tessera_types::{Coin, USD_DENOM};
use tracing::info;

use crate::average;
use crate::convert::usd_to_native;
use crate::params::{DenomEntry, OracleParams};
use crate::stamp::{PriceStamp, PriceStampStore};
use crate::strategy::MaStrategy;
use crate::{OracleError, Result};

/// Read access to oracle prices, as consumed by the fee engine.
pub trait PriceSource {
    /// Moving-average price of `denom` (base or symbol) under `strategy`.
    fn get_price(&self, denom: &str, strategy: &MaStrategy) -> Result<Dec>;

    /// Current oracle parameters.
    fn params(&self) -> &OracleParams;

    /// Height of the newest committed stamp, if any.
    fn last_stamp_height(&self) -> Option<u64>;
}

/// Median of a denom's stamp window, with the standard deviation around it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricMedian {
    pub denom: String,
    pub median: Dec,
    pub deviation: Dec,
    pub height: u64,
}

/// The on-chain oracle state.
#[derive(Clone, Debug)]
pub struct Oracle {
    params: OracleParams,
    stamps: PriceStampStore,
    medians: BTreeMap<String, VecDeque<HistoricMedian>>,
}

impl Oracle {
    /// Create an oracle with no stamps.
    ///
    /// # Errors
    ///
    /// - [`OracleError::InvalidParams`] if `params` fail validation
    pub fn new(params: OracleParams) -> Result<Self> {
        params.validate()?;
        let stamps = PriceStampStore::new(params.window_len());
        Ok(Self {
            params,
            stamps,
            medians: BTreeMap::new(),
        })
    }

    /// Create an oracle from genesis stamps.
    ///
    /// Stamps are keyed by the accept-list symbol and must be ordered by
    /// height per denom. Only the newest window is kept.
    pub fn from_genesis(params: OracleParams, genesis: Vec<PriceStamp>) -> Result<Self> {
        let mut oracle = Self::new(params)?;
        for stamp in genesis {
            let symbol = oracle.resolve_denom(&stamp.denom)?.symbol_denom.clone();
            oracle.commit_stamp(PriceStamp::new(symbol, stamp.price, stamp.height))?;
        }
        info!(
            denoms = oracle.stamps.denoms().count(),
            last_height = ?oracle.stamps.last_height(),
            "oracle genesis imported"
        );
        Ok(oracle)
    }

    /// Replace the parameters. A smaller window evicts the oldest stamps.
    pub fn update_params(&mut self, params: OracleParams) -> Result<()> {
        params.validate()?;
        self.stamps.set_window(params.window_len());
        self.params = params;
        Ok(())
    }

    /// The stamp history.
    pub fn stamps(&self) -> &PriceStampStore {
        &self.stamps
    }

    /// The accept-list entry for `denom`.
    ///
    /// # Errors
    ///
    /// - [`OracleError::UnsupportedDenom`] if `denom` is not accepted
    pub fn resolve_denom(&self, denom: &str) -> Result<&DenomEntry> {
        self.params
            .find_denom(denom)
            .ok_or_else(|| OracleError::UnsupportedDenom(denom.to_string()))
    }

    /// Price from text strategy tags, mirroring the external query shape
    /// `GetPrice(denom, ma_type, wma_strategy, weights)`.
    pub fn get_price_with_weights(
        &self,
        denom: &str,
        ma_type: &str,
        wma_strategy: Option<&str>,
        weights: Option<Vec<u64>>,
    ) -> Result<Dec> {
        let strategy = MaStrategy::parse(ma_type, wma_strategy, weights)?;
        self.get_price(denom, &strategy)
    }

    /// Historic medians of `denom`, newest first.
    pub fn historic_medians(&self, denom: &str) -> Result<Vec<HistoricMedian>> {
        let symbol = &self.resolve_denom(denom)?.symbol_denom;
        Ok(self
            .medians
            .get(symbol)
            .map(|q| q.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    /// Whether the newest stamp of `denom` lies within the latest stamped
    /// deviation around the latest median.
    pub fn within_median_deviation(&self, denom: &str) -> Result<bool> {
        let symbol = &self.resolve_denom(denom)?.symbol_denom;
        let median = self
            .medians
            .get(symbol)
            .and_then(|q| q.back())
            .ok_or_else(|| OracleError::PriceUnavailable(format!("no median for {symbol}")))?;
        let latest = self
            .stamps
            .latest(symbol)
            .ok_or_else(|| OracleError::PriceUnavailable(symbol.clone()))?;
        Ok(latest.price.abs_diff(median.median) <= median.deviation)
    }

    /// Quote a USD amount in the base denom of `denom` at the current price.
    ///
    /// # Errors
    ///
    /// - [`OracleError::UnsupportedDenom`] if `usd` is not denominated in `usd`
    /// - [`OracleError::ZeroConversion`] if the amount converts to zero
    pub fn convert_usd_to_native(
        &self,
        usd: &Coin,
        denom: &str,
        strategy: &MaStrategy,
    ) -> Result<Coin> {
        if usd.denom != USD_DENOM {
            return Err(OracleError::UnsupportedDenom(usd.denom.clone()));
        }
        let entry = self.resolve_denom(denom)?;
        let price = self.get_price(denom, strategy)?;
        let amount = usd_to_native(usd.amount, price, entry.exponent)?;
        if amount == 0 {
            return Err(OracleError::ZeroConversion(usd.to_string()));
        }
        Ok(Coin::new(entry.base_denom.clone(), amount))
    }

    pub(crate) fn commit_stamp(&mut self, stamp: PriceStamp) -> Result<()> {
        if let Some(evicted) = self.stamps.push(stamp)? {
            tracing::debug!(denom = %evicted.denom, height = evicted.height, "evicted price stamp");
        }
        Ok(())
    }

    /// Compute and record the median of `symbol`'s window at `height`.
    pub(crate) fn stamp_median(&mut self, symbol: &str, height: u64) -> Result<HistoricMedian> {
        let prices = self.stamps.prices(symbol);
        let median = stats::median(&prices)?;
        let deviation = stats::median_deviation(median, &prices)?;
        let stamp = HistoricMedian {
            denom: symbol.to_string(),
            median,
            deviation,
            height,
        };

        let limit = usize::try_from(self.params.maximum_median_stamps).unwrap_or(usize::MAX);
        let queue = self.medians.entry(symbol.to_string()).or_default();
        queue.push_back(stamp.clone());
        while queue.len() > limit {
            queue.pop_front();
        }
        Ok(stamp)
    }
}

impl PriceSource for Oracle {
    fn get_price(&self, denom: &str, strategy: &MaStrategy) -> Result<Dec> {
        let symbol = &self.resolve_denom(denom)?.symbol_denom;
        let window = self.stamps.stamps(symbol);
        if window.is_empty() {
            return Err(OracleError::PriceUnavailable(symbol.clone()));
        }
        average::compute(&window, strategy)
    }

    fn params(&self) -> &OracleParams {
        &self.params
    }

    fn last_stamp_height(&self) -> Option<u64> {
        self.stamps.last_height()
    }
}
