//! # tessera-settlement
//!
//! Two-phase fee enforcement around transaction execution.
//!
//! The ante stage prices a transaction's taxable messages against the
//! oracle, checks the offered fee and the payer's balance, and pins the
//! result in an immutable [`context::TaxContext`] without mutating state.
//! After message execution the post stage splits and moves the tax using
//! only that pinned context. Execution and settlement share one
//! [`ledger::CacheLedger`] overlay, committed only if both succeed.
//!
//! ## Modules
//!
//! - [`keepers`] — Collaborator traits (bank, fee grants, params, executor)
//! - [`ledger`] — In-memory ledger and write-buffering overlay
//! - [`context`] — Pinned tax context and transaction states
//! - [`ante`] — Pre-execution fee gate
//! - [`post`] — Post-execution tax settlement
//! - [`pipeline`] — Drives a transaction through both stages

pub mod ante;
pub mod context;
pub mod keepers;
pub mod ledger;
pub mod pipeline;
pub mod post;

pub use ante::{AnteFeeGate, FeeConfig};
pub use context::{TaxContext, TxState};
pub use keepers::{BankLedger, FeeGrantKeeper, FeeParamsSource, LedgerError, MsgExecutor, PriceSource};
pub use ledger::{CacheLedger, LedgerOp, MemLedger};
pub use pipeline::{TxOutcome, TxPipeline};
pub use post::PostTaxSettlement;

use std::fmt;

use tessera_fees::FeeError;
use tessera_oracle::OracleError;
use tessera_types::{Address, Coin};

/// Codespace of every [`ErrorCode`].
pub const CODESPACE: &str = "tax";

/// Stable error codes reported on transaction outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    InvalidDenom = 2,
    InsufficientFee = 3,
    InsufficientFunds = 4,
    InvalidMaType = 5,
    InvalidWeightsLength = 6,
    UnsupportedDenom = 7,
    PriceUnavailable = 8,
    FeeGrantDenied = 9,
    FeeGrantsDisabled = 10,
    InvalidFeeParams = 11,
    ExecutionFailed = 12,
    Internal = 13,
    InvalidWeights = 14,
}

impl ErrorCode {
    /// Numeric code within [`CODESPACE`].
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{CODESPACE}:{}", self.code())
    }
}

/// Error types for fee enforcement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TxError {
    /// Fee is missing, split across coins, or in the wrong denom.
    #[error("invalid fee denom: {0}")]
    InvalidDenom(String),

    /// Offered fee is below the required floor.
    #[error("insufficient fee: required at least {required}, offered {offered}")]
    InsufficientFee {
        /// Floor of the combined schedule.
        required: Coin,
        /// Offered fee.
        offered: Coin,
    },

    /// The payer cannot cover the tax.
    #[error("insufficient funds: {payer} has {available}, needs {required}")]
    InsufficientFunds {
        /// Account paying the fee.
        payer: Address,
        /// Required tax.
        required: Coin,
        /// Payer balance in the tax denom.
        available: u128,
    },

    /// Pricing strategy tag not recognized.
    #[error("invalid moving average type: {0}")]
    InvalidMaType(String),

    /// Custom weights do not fit the stamp window.
    #[error("invalid weights length: {0}")]
    InvalidWeightsLength(String),

    /// Custom weights fit the window but are unusable, e.g. all zero.
    #[error("invalid weights: {0}")]
    InvalidWeights(String),

    /// Pricing denom is not on the oracle accept list.
    #[error("unsupported denom: {0}")]
    UnsupportedDenom(String),

    /// No price to convert the USD schedule with.
    #[error("price unavailable: {0}")]
    PriceUnavailable(String),

    /// Fee granter refused the allowance.
    #[error("fee grant denied: {0}")]
    FeeGrantDenied(String),

    /// Transaction names a fee granter but grants are not enabled.
    #[error("fee grants are not enabled")]
    FeeGrantsDisabled,

    /// Fee schedule cannot be resolved.
    #[error("invalid fee params: {0}")]
    InvalidFeeParams(String),

    /// A message failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// An invariant of the fee engine was violated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl TxError {
    /// The stable code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            TxError::InvalidDenom(_) => ErrorCode::InvalidDenom,
            TxError::InsufficientFee { .. } => ErrorCode::InsufficientFee,
            TxError::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
            TxError::InvalidMaType(_) => ErrorCode::InvalidMaType,
            TxError::InvalidWeightsLength(_) => ErrorCode::InvalidWeightsLength,
            TxError::InvalidWeights(_) => ErrorCode::InvalidWeights,
            TxError::UnsupportedDenom(_) => ErrorCode::UnsupportedDenom,
            TxError::PriceUnavailable(_) => ErrorCode::PriceUnavailable,
            TxError::FeeGrantDenied(_) => ErrorCode::FeeGrantDenied,
            TxError::FeeGrantsDisabled => ErrorCode::FeeGrantsDisabled,
            TxError::InvalidFeeParams(_) => ErrorCode::InvalidFeeParams,
            TxError::ExecutionFailed(_) => ErrorCode::ExecutionFailed,
            TxError::Internal(_) => ErrorCode::Internal,
        }
    }
}

impl From<OracleError> for TxError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::InvalidMaType(_) => TxError::InvalidMaType(err.to_string()),
            OracleError::InvalidWeightsLength { .. } => {
                TxError::InvalidWeightsLength(err.to_string())
            }
            OracleError::InvalidWeights => TxError::InvalidWeights(err.to_string()),
            OracleError::UnsupportedDenom(denom) => TxError::UnsupportedDenom(denom),
            OracleError::PriceUnavailable(_) | OracleError::ZeroConversion(_) => {
                TxError::PriceUnavailable(err.to_string())
            }
            OracleError::NonMonotonicHeight { .. }
            | OracleError::InvalidParams(_)
            | OracleError::Math(_) => TxError::Internal(err.to_string()),
        }
    }
}

impl From<FeeError> for TxError {
    fn from(err: FeeError) -> Self {
        match err {
            FeeError::InvalidDenom { .. } => TxError::InvalidDenom(err.to_string()),
            FeeError::InsufficientFee {
                denom,
                required,
                offered,
            } => TxError::InsufficientFee {
                required: Coin::new(denom.clone(), required),
                offered: Coin::new(denom, offered),
            },
            FeeError::InvalidFeeRange(_)
            | FeeError::InvalidFeeParams(_)
            | FeeError::InvalidBurnFactor(_) => TxError::InvalidFeeParams(err.to_string()),
            FeeError::Oracle(inner) => inner.into(),
            FeeError::SplitMismatch { .. } | FeeError::Math(_) => {
                TxError::Internal(err.to_string())
            }
        }
    }
}

/// Convenience result type for fee enforcement.
pub type Result<T> = std::result::Result<T, TxError>;
