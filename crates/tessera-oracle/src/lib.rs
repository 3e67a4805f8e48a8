//! # tessera-oracle
//!
//! On-chain price oracle for the native token.
//!
//! Validators vote exchange rates every vote period. The tallied rates are
//! committed as [`stamp::PriceStamp`]s on stamp-period boundaries, and a
//! moving average over the stamp window becomes the price every fee
//! computation reads.
//!
//! ## Modules
//!
//! - [`params`] — Oracle parameters and the accept list
//! - [`stamp`] — Bounded per-denom price stamp history
//! - [`strategy`] — Moving-average strategy selection
//! - [`average`] — SMA / EMA / WMA over a stamp window
//! - [`convert`] — USD amount to native-token conversion
//! - [`oracle`] — Read facade used by the fee engine
//! - [`aggregator`] — End-of-block stamping hook
//! - [`stub`] — Fixed-rate vote tally for single-node networks

pub mod aggregator;
pub mod average;
pub mod convert;
pub mod oracle;
pub mod params;
pub mod stamp;
pub mod strategy;
pub mod stub;

pub use aggregator::{ExchangeRate, OracleAggregator, VoteTally};
pub use oracle::{Oracle, PriceSource};
pub use params::{OracleParams, RewardBand};
pub use stamp::{PriceStamp, PriceStampStore};
pub use strategy::{MaStrategy, WmaKind};
pub use stub::StubTally;

use tessera_math::MathError;

/// Error types for oracle operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// Moving-average type or WMA strategy tag is not recognized.
    #[error("invalid moving average type: {0}")]
    InvalidMaType(String),

    /// Custom WMA weights do not cover the stamp window.
    #[error("invalid weights length: expected {expected}, got {actual}")]
    InvalidWeightsLength {
        /// Number of stamps in the window.
        expected: usize,
        /// Number of weights supplied.
        actual: usize,
    },

    /// Weights sum to zero.
    #[error("weights must not all be zero")]
    InvalidWeights,

    /// Denom is not on the accept list.
    #[error("unsupported denom: {0}")]
    UnsupportedDenom(String),

    /// No stamps are available to price the denom.
    #[error("price unavailable: {0}")]
    PriceUnavailable(String),

    /// A conversion produced a zero amount.
    #[error("converted amount is zero: {0}")]
    ZeroConversion(String),

    /// Stamp heights must strictly increase per denom.
    #[error("non-monotonic stamp height for {denom}: {new} <= {last}")]
    NonMonotonicHeight {
        /// Denom of the rejected stamp.
        denom: String,
        /// Height of the rejected stamp.
        new: u64,
        /// Height of the newest accepted stamp.
        last: u64,
    },

    /// Oracle parameters failed validation.
    #[error("invalid oracle params: {0}")]
    InvalidParams(String),

    /// Fixed-point arithmetic failed.
    #[error(transparent)]
    Math(#[from] MathError),
}

/// Convenience result type for oracle operations.
pub type Result<T> = std::result::Result<T, OracleError>;
