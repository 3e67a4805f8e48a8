//! End-of-block stamping hook.
//!
//! On the last block of every vote period the aggregator reads the tallied
//! exchange rates and, on stamp-period boundaries, commits them as price
//! stamps. On median-period boundaries it also stamps the window median.
//! This is the only writer of the stamp history.

use serde::Serialize;
use tessera_math::Dec;
use tessera_types::events::{Event, EventType};
use tracing::{info, warn};

use crate::oracle::{Oracle, PriceSource};
use crate::params::is_period_last_block;
use crate::stamp::PriceStamp;
use crate::Result;

/// A rate tallied from validator votes for one denom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeRate {
    /// Denom the rate was voted for (base or symbol).
    pub denom: String,
    /// USD per whole token.
    pub rate: Dec,
    /// Share of bonded power behind the rate, in `[0, 1]`.
    pub support: Dec,
}

/// Source of rates already tallied by consensus.
pub trait VoteTally {
    fn tallied_rates(&self, height: u64) -> Vec<ExchangeRate>;
}

impl<F> VoteTally for F
where
    F: Fn(u64) -> Vec<ExchangeRate>,
{
    fn tallied_rates(&self, height: u64) -> Vec<ExchangeRate> {
        self(height)
    }
}

#[derive(Serialize)]
struct StampPayload<'a> {
    denom: &'a str,
    price: String,
}

#[derive(Serialize)]
struct MedianPayload<'a> {
    denom: &'a str,
    median: String,
    deviation: String,
}

#[derive(Serialize)]
struct DroppedPayload<'a> {
    denom: &'a str,
    reason: &'a str,
}

/// Drives stamping from a [`VoteTally`].
#[derive(Debug, Clone)]
pub struct OracleAggregator<T> {
    tally: T,
}

impl<T: VoteTally> OracleAggregator<T> {
    pub fn new(tally: T) -> Self {
        Self { tally }
    }

    pub fn tally(&self) -> &T {
        &self.tally
    }

    pub fn tally_mut(&mut self) -> &mut T {
        &mut self.tally
    }

    /// Run the end-of-block hook at `height`.
    ///
    /// Rates for denoms off the accept list, with support under the vote
    /// threshold, with a zero rate, or repeated within one tally are
    /// dropped with a warning. Returns the events emitted.
    ///
    /// # Errors
    ///
    /// Propagates stamp-store and median errors; a failed end block leaves
    /// earlier stamps of the same block in place.
    pub fn end_block(&self, oracle: &mut Oracle, height: u64) -> Result<Vec<Event>> {
        let params = oracle.params().clone();
        if !is_period_last_block(height, params.vote_period) {
            return Ok(Vec::new());
        }

        let stamp_block = is_period_last_block(height, params.historic_stamp_period);
        let median_block = is_period_last_block(height, params.median_stamp_period);

        let mut accepted: Vec<(String, Dec)> = Vec::new();
        let mut events = Vec::new();
        let mut drop_rate = |denom: &str, reason: &str| {
            warn!(denom, reason, height, "dropping ballot");
            events.push(Event::new(
                EventType::BallotDropped,
                height,
                DroppedPayload { denom, reason },
            ));
        };

        for rate in self.tally.tallied_rates(height) {
            let Some(entry) = params.find_denom(&rate.denom) else {
                drop_rate(&rate.denom, "unsupported denom");
                continue;
            };
            if rate.support < params.vote_threshold {
                drop_rate(&rate.denom, "support under vote threshold");
                continue;
            }
            if rate.rate.is_zero() {
                drop_rate(&rate.denom, "zero rate");
                continue;
            }
            if accepted.iter().any(|(s, _)| s == &entry.symbol_denom) {
                drop_rate(&rate.denom, "duplicate rate");
                continue;
            }
            accepted.push((entry.symbol_denom.clone(), rate.rate));
        }
        accepted.sort_by(|a, b| a.0.cmp(&b.0));

        if !stamp_block {
            return Ok(events);
        }

        for (symbol, price) in &accepted {
            oracle.commit_stamp(PriceStamp::new(symbol.clone(), *price, height))?;
            info!(denom = %symbol, %price, height, "price stamped");
            events.push(Event::new(
                EventType::PriceStamp,
                height,
                StampPayload {
                    denom: symbol,
                    price: price.to_string(),
                },
            ));

            if median_block {
                let median = oracle.stamp_median(symbol, height)?;
                info!(
                    denom = %symbol,
                    median = %median.median,
                    deviation = %median.deviation,
                    height,
                    "median stamped"
                );
                events.push(Event::new(
                    EventType::MedianStamp,
                    height,
                    MedianPayload {
                        denom: symbol,
                        median: median.median.to_string(),
                        deviation: median.deviation.to_string(),
                    },
                ));
            }
        }
        Ok(events)
    }
}
