//! # tessera-fees
//!
//! Fee schedules and tax splitting for identity and resource operations.
//!
//! Each taxable operation carries a short list of fee ranges, normally one
//! in the native denom and one pegged to USD. At the current oracle price
//! the USD range is converted to native units and clamped against the
//! native range; the resulting tax is split into a burned portion and
//! rewards for the fee collector and the oracle feeder pool.
//!
//! ## Modules
//!
//! - [`params`] — Fee ranges, per-operation schedules, validation
//! - [`schedule`] — Resolving a schedule to native-denom bounds
//! - [`split`] — Burn / reward / feeder split of a collected tax

pub mod params;
pub mod schedule;
pub mod split;

pub use params::{FeeParams, FeeRange};
pub use schedule::{resolve, resolve_bounds, FeeBounds};
pub use split::{split_rewards_by_ratio, split_tax, TaxResult};

use tessera_math::MathError;
use tessera_oracle::OracleError;

/// Error types for fee operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeeError {
    /// Offered fee is in the wrong denomination.
    #[error("invalid fee denom: expected {expected}, got {actual}")]
    InvalidDenom {
        /// Denom the schedule is charged in.
        expected: String,
        /// Denom that was offered.
        actual: String,
    },

    /// Offered fee is below the schedule floor.
    #[error("insufficient fee: required at least {required}{denom}, offered {offered}{denom}")]
    InsufficientFee {
        /// Denom of the schedule.
        denom: String,
        /// Floor of the resolved bounds, in base units.
        required: u128,
        /// Offered amount, in base units.
        offered: u128,
    },

    /// A schedule has neither a native nor a USD range.
    #[error("invalid fee range: {0}")]
    InvalidFeeRange(String),

    /// Fee parameters failed validation.
    #[error("invalid fee params: {0}")]
    InvalidFeeParams(String),

    /// Burn factor or split ratio outside `[0, 1]`.
    #[error("invalid burn factor: {0}")]
    InvalidBurnFactor(String),

    /// A split does not add back up to the tax.
    #[error("split of {tax} does not conserve value: parts sum to {parts}")]
    SplitMismatch {
        /// The tax that was split.
        tax: u128,
        /// Sum of burn, collector and feeder portions.
        parts: u128,
    },

    /// Price lookup or conversion failed.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Fixed-point arithmetic failed.
    #[error(transparent)]
    Math(#[from] MathError),
}

/// Convenience result type for fee operations.
pub type Result<T> = std::result::Result<T, FeeError>;
