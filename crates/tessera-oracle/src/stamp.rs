//! Price stamps and the bounded stamp history.
//!
//! Each denom keeps at most `window` stamps, oldest first. Pushing past
//! the window evicts the oldest stamp.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tessera_math::Dec;

use crate::{OracleError, Result};

/// A committed price for one denom at one height.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceStamp {
    pub denom: String,
    pub price: Dec,
    pub height: u64,
}

impl PriceStamp {
    pub fn new(denom: impl Into<String>, price: Dec, height: u64) -> Self {
        Self {
            denom: denom.into(),
            price,
            height,
        }
    }
}

/// Per-denom FIFO of price stamps, bounded by the averaging window.
#[derive(Clone, Debug, Default)]
pub struct PriceStampStore {
    window: usize,
    stamps: BTreeMap<String, VecDeque<PriceStamp>>,
}

impl PriceStampStore {
    /// Create an empty store retaining `window` stamps per denom.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            stamps: BTreeMap::new(),
        }
    }

    /// Stamps retained per denom.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Append a stamp, returning the evicted stamp if the window was full.
    ///
    /// # Errors
    ///
    /// - [`OracleError::NonMonotonicHeight`] if the stamp is not newer than
    ///   the denom's latest stamp
    pub(crate) fn push(&mut self, stamp: PriceStamp) -> Result<Option<PriceStamp>> {
        let queue = self.stamps.entry(stamp.denom.clone()).or_default();
        if let Some(last) = queue.back() {
            if stamp.height <= last.height {
                return Err(OracleError::NonMonotonicHeight {
                    denom: stamp.denom,
                    new: stamp.height,
                    last: last.height,
                });
            }
        }
        queue.push_back(stamp);
        if queue.len() > self.window {
            Ok(queue.pop_front())
        } else {
            Ok(None)
        }
    }

    /// Shrink or grow the window. Shrinking evicts the oldest stamps.
    pub(crate) fn set_window(&mut self, window: usize) {
        self.window = window;
        for queue in self.stamps.values_mut() {
            while queue.len() > window {
                queue.pop_front();
            }
        }
    }

    /// The retained stamps for `denom`, oldest first.
    pub fn stamps(&self, denom: &str) -> Vec<PriceStamp> {
        self.stamps
            .get(denom)
            .map(|q| q.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The retained prices for `denom`, oldest first.
    pub fn prices(&self, denom: &str) -> Vec<Dec> {
        self.stamps
            .get(denom)
            .map(|q| q.iter().map(|s| s.price).collect())
            .unwrap_or_default()
    }

    /// The newest stamp for `denom`.
    pub fn latest(&self, denom: &str) -> Option<&PriceStamp> {
        self.stamps.get(denom).and_then(|q| q.back())
    }

    /// Number of stamps retained for `denom`.
    pub fn len(&self, denom: &str) -> usize {
        self.stamps.get(denom).map_or(0, VecDeque::len)
    }

    /// Whether no stamps are retained at all.
    pub fn is_empty(&self) -> bool {
        self.stamps.values().all(VecDeque::is_empty)
    }

    /// Denoms with at least one stamp.
    pub fn denoms(&self) -> impl Iterator<Item = &str> {
        self.stamps
            .iter()
            .filter(|(_, q)| !q.is_empty())
            .map(|(d, _)| d.as_str())
    }

    /// Height of the newest stamp across all denoms.
    pub fn last_height(&self) -> Option<u64> {
        self.stamps.values().filter_map(|q| q.back()).map(|s| s.height).max()
    }
}
