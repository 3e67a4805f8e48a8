//! Collaborators the fee engine consumes.
//!
//! Balances, fee grants, governance-owned fee parameters and message
//! execution live outside this crate; the gate and settlement reach them
//! only through these traits.

use std::collections::BTreeMap;

use tessera_fees::FeeParams;
use tessera_types::tx::{Msg, Tx};
use tessera_types::{Address, Coin};

use crate::ledger::LedgerOp;

pub use tessera_oracle::PriceSource;

/// Failures reported by collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Account cannot cover a debit.
    #[error("insufficient funds in {account}: have {available}{denom}, need {required}{denom}")]
    InsufficientFunds {
        /// Debited account.
        account: Address,
        /// Denom of the debit.
        denom: String,
        /// Current balance.
        available: u128,
        /// Requested debit.
        required: u128,
    },

    /// A balance or supply would exceed `u128`.
    #[error("balance overflow")]
    Overflow,

    /// A fee allowance does not cover the fee.
    #[error("fee allowance denied: {0}")]
    AllowanceDenied(String),

    /// A message failed to execute.
    #[error("message execution failed: {0}")]
    Execution(String),
}

/// Balance ledger primitives.
pub trait BankLedger {
    /// Balance of `account` in `denom`.
    fn balance(&self, account: &Address, denom: &str) -> u128;

    /// Move `coin` from `from` to `to`.
    fn send_coins(&mut self, from: &Address, to: &Address, coin: &Coin) -> Result<(), LedgerError>;

    /// Remove `coin` from `from` and from the total supply.
    fn burn_coins(&mut self, from: &Address, coin: &Coin) -> Result<(), LedgerError>;

    /// Apply `ops` in order, all or none. On error the ledger is left as
    /// it was before the call.
    fn apply_all(&mut self, ops: &[LedgerOp]) -> Result<(), LedgerError>;
}

/// Fee allowances granted by one account to another.
pub trait FeeGrantKeeper {
    /// Whether `granter`'s allowance to `grantee` covers `fee` for `msgs`.
    /// Must not mutate the allowance.
    fn check_allowance(
        &self,
        granter: &Address,
        grantee: &Address,
        fee: &Coin,
        msgs: &[Msg],
    ) -> Result<(), LedgerError>;

    /// Deduct `fee` from `granter`'s allowance to `grantee`.
    fn use_granted_fees(
        &mut self,
        granter: &Address,
        grantee: &Address,
        fee: &Coin,
        msgs: &[Msg],
    ) -> Result<(), LedgerError>;
}

/// Read access to the governance-owned fee parameters.
pub trait FeeParamsSource {
    fn fee_params(&self) -> &FeeParams;
}

impl FeeParamsSource for FeeParams {
    fn fee_params(&self) -> &FeeParams {
        self
    }
}

/// Executes the messages of a transaction against a ledger.
pub trait MsgExecutor {
    fn execute(&mut self, ledger: &mut dyn BankLedger, tx: &Tx) -> Result<(), LedgerError>;
}

/// Executor for transactions whose messages carry no balance effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExecutor;

impl MsgExecutor for NoopExecutor {
    fn execute(&mut self, _ledger: &mut dyn BankLedger, _tx: &Tx) -> Result<(), LedgerError> {
        Ok(())
    }
}

/// Spend-limited fee allowances kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemFeeGrants {
    allowances: BTreeMap<(Address, Address), Coin>,
}

impl MemFeeGrants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `grantee` up to `limit` in fees paid by `granter`.
    pub fn grant(&mut self, granter: Address, grantee: Address, limit: Coin) {
        self.allowances.insert((granter, grantee), limit);
    }

    /// Remaining allowance, if any.
    pub fn allowance(&self, granter: &Address, grantee: &Address) -> Option<&Coin> {
        self.allowances.get(&(*granter, *grantee))
    }
}

impl FeeGrantKeeper for MemFeeGrants {
    fn check_allowance(
        &self,
        granter: &Address,
        grantee: &Address,
        fee: &Coin,
        _msgs: &[Msg],
    ) -> Result<(), LedgerError> {
        let limit = self.allowance(granter, grantee).ok_or_else(|| {
            LedgerError::AllowanceDenied(format!("no allowance from {granter} to {grantee}"))
        })?;
        if limit.denom != fee.denom || limit.amount < fee.amount {
            return Err(LedgerError::AllowanceDenied(format!(
                "allowance {limit} does not cover {fee}"
            )));
        }
        Ok(())
    }

    fn use_granted_fees(
        &mut self,
        granter: &Address,
        grantee: &Address,
        fee: &Coin,
        msgs: &[Msg],
    ) -> Result<(), LedgerError> {
        self.check_allowance(granter, grantee, fee, msgs)?;
        let key = (*granter, *grantee);
        let exhausted = match self.allowances.get_mut(&key) {
            Some(limit) => {
                limit.amount -= fee.amount;
                limit.is_zero()
            }
            None => false,
        };
        if exhausted {
            self.allowances.remove(&key);
        }
        Ok(())
    }
}
