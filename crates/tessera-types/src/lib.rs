//! # tessera-types
//!
//! Shared domain types used across the Tessera workspace: account
//! addresses, coins and denominations, transactions and the taxable
//! operations they carry, and the events emitted during settlement.

pub mod address;
pub mod coin;
pub mod events;
pub mod tx;

pub use address::Address;
pub use coin::Coin;

/// Base denomination of the native token (1 CHEQ = 10^9 ncheq).
pub const NATIVE_DENOM: &str = "ncheq";

/// Ticker symbol the oracle quotes the native token under.
pub const NATIVE_SYMBOL: &str = "CHEQ";

/// Decimal exponent of [`NATIVE_DENOM`].
pub const NATIVE_EXPONENT: u32 = 9;

/// Pseudo-denomination of USD-pegged fee ranges.
pub const USD_DENOM: &str = "usd";

/// Decimal exponent of [`USD_DENOM`] amounts (1 USD = 10^18 units).
pub const USD_EXPONENT: u32 = 18;

/// Module account that collects the tax before it is burned or distributed.
pub const TAX_MODULE: &str = "did";

/// Generic fee collector; rewards sent here are distributed to stakers.
pub const FEE_COLLECTOR_MODULE: &str = "fee_collector";

/// Oracle module account holding the feeder incentive pool.
pub const ORACLE_MODULE: &str = "oracle";

/// Error types for parsing shared types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    /// Address is not 20 hex-encoded bytes.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Coin string is not `<amount><denom>`.
    #[error("invalid coin: {0}")]
    InvalidCoin(String),
}

/// Convenience result type for parsing shared types.
pub type Result<T> = std::result::Result<T, TypesError>;
