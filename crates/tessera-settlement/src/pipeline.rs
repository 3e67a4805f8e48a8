//! Drives a transaction through ante, execution and settlement.
//!
//! The ante stage reads the live ledger. Message execution and settlement
//! share one [`CacheLedger`] overlay that is committed only when both
//! succeed, so a failed settlement also undoes the messages' effects.

use serde::Serialize;
use tessera_fees::TaxResult;
use tessera_types::events::{Event, EventType};
use tessera_types::tx::Tx;
use tracing::{debug, info, warn};

use crate::ante::{AnteFeeGate, FeeConfig};
use crate::context::{TaxContext, TxState};
use crate::keepers::{BankLedger, FeeGrantKeeper, FeeParamsSource, MsgExecutor, PriceSource};
use crate::ledger::CacheLedger;
use crate::post::PostTaxSettlement;
use crate::{TxError, CODESPACE};

/// Result of delivering one transaction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TxOutcome {
    pub state: TxState,
    /// `0` on success, otherwise an [`crate::ErrorCode`] in [`Self::codespace`].
    pub code: u32,
    pub codespace: String,
    pub log: String,
    pub events: Vec<Event>,
    pub tax: Option<TaxResult>,
}

impl TxOutcome {
    fn settled(state: TxState, events: Vec<Event>, tax: Option<TaxResult>) -> Self {
        Self {
            state,
            code: 0,
            codespace: String::new(),
            log: String::new(),
            events,
            tax,
        }
    }

    fn failed(state: TxState, err: &TxError) -> Self {
        Self {
            state,
            code: err.code().code(),
            codespace: CODESPACE.to_string(),
            log: err.to_string(),
            events: Vec::new(),
            tax: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

#[derive(Serialize)]
struct FeePayPayload {
    payer: String,
    fee: String,
    price: String,
    oracle_height: Option<u64>,
}

#[derive(Serialize)]
struct AmountPayload {
    amount: String,
}

#[derive(Serialize)]
struct RewardPayload {
    recipient: String,
    amount: String,
}

fn tax_events(
    height: u64,
    ctx: &TaxContext,
    result: &TaxResult,
    settlement: &PostTaxSettlement,
) -> Vec<Event> {
    let mut events = vec![Event::new(
        EventType::FeePay,
        height,
        FeePayPayload {
            payer: ctx.payer().to_string(),
            fee: result.required_tax.to_string(),
            price: ctx.price().to_string(),
            oracle_height: ctx.oracle_height(),
        },
    )];
    if !result.burn.is_zero() {
        events.push(Event::new(
            EventType::TaxBurn,
            height,
            AmountPayload {
                amount: result.burn.to_string(),
            },
        ));
    }
    if !result.collector_reward.is_zero() {
        events.push(Event::new(
            EventType::RewardDistribute,
            height,
            RewardPayload {
                recipient: settlement.fee_collector.to_string(),
                amount: result.collector_reward.to_string(),
            },
        ));
    }
    if !result.feeder_reward.is_zero() {
        events.push(Event::new(
            EventType::FeederReward,
            height,
            RewardPayload {
                recipient: settlement.oracle_module.to_string(),
                amount: result.feeder_reward.to_string(),
            },
        ));
    }
    events
}

/// Per-block transaction driver.
pub struct TxPipeline<'a> {
    pub config: &'a FeeConfig,
    pub oracle: &'a dyn PriceSource,
    pub params: &'a dyn FeeParamsSource,
    pub grants: Option<&'a mut dyn FeeGrantKeeper>,
    pub settlement: PostTaxSettlement,
    pub height: u64,
}

impl<'a> TxPipeline<'a> {
    pub fn new(
        config: &'a FeeConfig,
        oracle: &'a dyn PriceSource,
        params: &'a dyn FeeParamsSource,
        height: u64,
    ) -> Self {
        Self {
            config,
            oracle,
            params,
            grants: None,
            settlement: PostTaxSettlement::default(),
            height,
        }
    }

    /// Enable fee grants backed by `grants`.
    pub fn with_grants(mut self, grants: &'a mut dyn FeeGrantKeeper) -> Self {
        self.grants = Some(grants);
        self
    }

    /// Deliver `tx` against `ledger`.
    ///
    /// Never returns an error: every failure is reported on the outcome
    /// with its stable code, and leaves `ledger` untouched.
    pub fn deliver_tx(
        &mut self,
        ledger: &mut dyn BankLedger,
        tx: &Tx,
        executor: &mut dyn MsgExecutor,
    ) -> TxOutcome {
        let mut state = TxState::Received;

        let gate = AnteFeeGate {
            config: self.config,
            oracle: self.oracle,
            params: self.params,
            grants: self.grants.as_deref(),
        };
        let ctx = match gate.ante_check(ledger, tx) {
            Ok(ctx) => ctx,
            Err(err) => {
                warn!(height = self.height, signer = %tx.signer, error = %err, "tx rejected at ante");
                return TxOutcome::failed(TxState::RejectedAtAnte, &err);
            }
        };
        state = advance(state, TxState::AnteChecked);

        let mut overlay = CacheLedger::new(ledger);
        if let Err(err) = executor.execute(&mut overlay, tx) {
            let err = TxError::ExecutionFailed(err.to_string());
            warn!(height = self.height, signer = %tx.signer, error = %err, "tx execution failed");
            return TxOutcome::failed(advance(state, TxState::ExecutionFailed), &err);
        }
        state = advance(state, TxState::Executed);

        let tax = match &ctx {
            Some(ctx) => {
                let settled = self
                    .settlement
                    .settle(ctx, &mut overlay, self.grants.as_deref_mut());
                match settled {
                    Ok(result) => Some(result),
                    Err(err) => {
                        warn!(
                            height = self.height,
                            signer = %tx.signer,
                            error = %err,
                            "tx reverted at settlement"
                        );
                        let state = advance(state, TxState::RevertedAtSettlement);
                        return TxOutcome::failed(state, &err);
                    }
                }
            }
            None => None,
        };

        if let Err(err) = overlay.commit() {
            let err = TxError::Internal(err.to_string());
            warn!(height = self.height, error = %err, "ledger overlay commit failed");
            return TxOutcome::failed(advance(state, TxState::RevertedAtSettlement), &err);
        }
        let state = advance(state, TxState::Settled);

        let events = match (&ctx, &tax) {
            (Some(ctx), Some(result)) => {
                info!(height = self.height, tax = %result.required_tax, "tx settled");
                tax_events(self.height, ctx, result, &self.settlement)
            }
            _ => {
                debug!(height = self.height, "untaxed tx settled");
                Vec::new()
            }
        };
        TxOutcome::settled(state, events, tax)
    }
}

fn advance(from: TxState, to: TxState) -> TxState {
    debug_assert!(from.can_transition_to(to), "illegal transition {from} -> {to}");
    to
}
