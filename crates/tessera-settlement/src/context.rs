//! Pinned tax context and transaction states.

use std::fmt;

use serde::Serialize;
use tessera_fees::{FeeBounds, FeeRange};
use tessera_math::Dec;
use tessera_types::tx::{Msg, TaxableOperation};
use tessera_types::{Address, Coin};

/// Lifecycle of a transaction through the fee engine.
///
/// ```text
/// Received ─► AnteChecked ─► Executed ─► Settled
///    │              │             │
///    ▼              ▼             ▼
/// RejectedAtAnte  ExecutionFailed  RevertedAtSettlement
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TxState {
    Received,
    AnteChecked,
    Executed,
    Settled,
    RejectedAtAnte,
    ExecutionFailed,
    RevertedAtSettlement,
}

impl TxState {
    /// Whether the transaction has left the pipeline.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            TxState::Settled
                | TxState::RejectedAtAnte
                | TxState::ExecutionFailed
                | TxState::RevertedAtSettlement
        )
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: TxState) -> bool {
        matches!(
            (self, next),
            (TxState::Received, TxState::AnteChecked)
                | (TxState::Received, TxState::RejectedAtAnte)
                | (TxState::AnteChecked, TxState::Executed)
                | (TxState::AnteChecked, TxState::ExecutionFailed)
                | (TxState::Executed, TxState::Settled)
                | (TxState::Executed, TxState::RevertedAtSettlement)
        )
    }
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Everything the post stage needs, fixed by the ante stage.
///
/// Settlement re-derives the tax from these fields alone and never reads
/// the oracle, so a stamp committed between the two stages cannot change
/// what is charged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaxContext {
    pub(crate) price: Dec,
    pub(crate) oracle_height: Option<u64>,
    pub(crate) native_denom: String,
    pub(crate) native_exponent: u32,
    pub(crate) signer: Address,
    pub(crate) payer: Address,
    pub(crate) fee_granter: Option<Address>,
    pub(crate) msgs: Vec<Msg>,
    pub(crate) offered: Coin,
    pub(crate) schedules: Vec<(TaxableOperation, Vec<FeeRange>)>,
    pub(crate) bounds: FeeBounds,
    pub(crate) required_tax: Coin,
    pub(crate) burn_factor: Dec,
}

impl TaxContext {
    /// Price the tax was resolved at.
    pub fn price(&self) -> Dec {
        self.price
    }

    /// Height of the newest stamp behind [`Self::price`].
    pub fn oracle_height(&self) -> Option<u64> {
        self.oracle_height
    }

    pub fn native_denom(&self) -> &str {
        &self.native_denom
    }

    /// Decimals from [`Self::native_denom`] to one whole token.
    pub fn native_exponent(&self) -> u32 {
        self.native_exponent
    }

    pub fn signer(&self) -> &Address {
        &self.signer
    }

    /// Account debited: the fee granter if present, else the signer.
    pub fn payer(&self) -> &Address {
        &self.payer
    }

    /// Granter whose allowance pays the tax; never the signer.
    pub fn fee_granter(&self) -> Option<&Address> {
        self.fee_granter.as_ref()
    }

    /// Messages of the transaction, passed to the fee grant keeper.
    pub fn msgs(&self) -> &[Msg] {
        &self.msgs
    }

    pub fn offered(&self) -> &Coin {
        &self.offered
    }

    /// Fee schedule of each taxable message, as read at ante time.
    pub fn schedules(&self) -> &[(TaxableOperation, Vec<FeeRange>)] {
        &self.schedules
    }

    /// Combined bounds of all taxable messages.
    pub fn bounds(&self) -> FeeBounds {
        self.bounds
    }

    pub fn required_tax(&self) -> &Coin {
        &self.required_tax
    }

    pub fn burn_factor(&self) -> Dec {
        self.burn_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert!(TxState::Received.can_transition_to(TxState::AnteChecked));
        assert!(TxState::Executed.can_transition_to(TxState::RevertedAtSettlement));
        assert!(!TxState::Received.can_transition_to(TxState::Settled));
        assert!(!TxState::Settled.can_transition_to(TxState::Received));
    }

    #[test]
    fn test_final_states() {
        assert!(TxState::Settled.is_final());
        assert!(TxState::RejectedAtAnte.is_final());
        assert!(!TxState::Executed.is_final());
    }
}
