//! Post-execution tax settlement.
//!
//! Works from the pinned [`TaxContext`] alone: the tax is re-derived from
//! the pinned schedules and price, split, and moved. Oracle or parameter
//! changes after the ante stage have no effect here.
//!
//! ```text
//! payer ──tax──► tax module ──burn──► (supply)
//!                    ├──collector_reward──► fee collector
//!                    └──feeder_reward─────► oracle module
//! ```

use tessera_fees::{resolve_bounds, split_tax, FeeBounds, TaxResult};
use tessera_types::{Address, Coin, FEE_COLLECTOR_MODULE, ORACLE_MODULE, TAX_MODULE};
use tracing::{debug, info};

use crate::context::TaxContext;
use crate::keepers::{BankLedger, FeeGrantKeeper, LedgerError};
use crate::{Result, TxError};

/// The post stage, holding the module accounts a tax flows through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostTaxSettlement {
    pub tax_module: Address,
    pub fee_collector: Address,
    pub oracle_module: Address,
}

impl Default for PostTaxSettlement {
    fn default() -> Self {
        Self {
            tax_module: Address::module(TAX_MODULE),
            fee_collector: Address::module(FEE_COLLECTOR_MODULE),
            oracle_module: Address::module(ORACLE_MODULE),
        }
    }
}

impl PostTaxSettlement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect, burn and distribute the tax pinned in `ctx`.
    ///
    /// Grant allowances are consumed last, after every ledger move has
    /// succeeded, since the allowance store is not covered by the ledger
    /// overlay.
    ///
    /// # Errors
    ///
    /// - [`TxError::InsufficientFunds`] if the payer's balance dropped below
    ///   the tax during execution
    /// - [`TxError::FeeGrantsDisabled`] / [`TxError::FeeGrantDenied`] if the
    ///   allowance can no longer be used
    /// - [`TxError::Internal`] if the pinned context is inconsistent or the
    ///   split does not add up
    pub fn settle<'g>(
        &self,
        ctx: &TaxContext,
        ledger: &mut dyn BankLedger,
        grants: Option<&mut (dyn FeeGrantKeeper + 'g)>,
    ) -> Result<TaxResult> {
        let required = rederive_tax(ctx)?;
        if &required != ctx.required_tax() {
            return Err(TxError::Internal(format!(
                "pinned tax {} does not match re-derived {required}",
                ctx.required_tax()
            )));
        }

        let result = split_tax(&required, ctx.burn_factor())?;
        result.verify()?;

        let payer = ctx.payer();
        self.transfer(ledger, payer, &self.tax_module, &result.required_tax)?;
        if !result.burn.is_zero() {
            ledger
                .burn_coins(&self.tax_module, &result.burn)
                .map_err(ledger_error)?;
        }
        self.transfer(ledger, &self.tax_module, &self.fee_collector, &result.collector_reward)?;
        self.transfer(ledger, &self.tax_module, &self.oracle_module, &result.feeder_reward)?;

        if let Some(granter) = ctx.fee_granter().filter(|g| *g != ctx.signer()) {
            let grants = grants.ok_or(TxError::FeeGrantsDisabled)?;
            grants
                .use_granted_fees(granter, ctx.signer(), &required, ctx.msgs())
                .map_err(|e| TxError::FeeGrantDenied(e.to_string()))?;
        }

        info!(
            %payer,
            tax = %result.required_tax,
            burn = %result.burn,
            collector = %result.collector_reward,
            feeder = %result.feeder_reward,
            "tax settled"
        );
        Ok(result)
    }

    fn transfer(
        &self,
        ledger: &mut dyn BankLedger,
        from: &Address,
        to: &Address,
        coin: &Coin,
    ) -> Result<()> {
        if coin.is_zero() {
            return Ok(());
        }
        ledger.send_coins(from, to, coin).map_err(ledger_error)
    }
}

/// Recompute the tax from the schedules and price pinned in `ctx`.
fn rederive_tax(ctx: &TaxContext) -> Result<Coin> {
    let per_op = ctx
        .schedules()
        .iter()
        .map(|(_, ranges)| {
            resolve_bounds(ranges, ctx.price(), ctx.native_denom(), ctx.native_exponent())
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let bounds = FeeBounds::combine(&per_op)?;
    if bounds != ctx.bounds() {
        return Err(TxError::Internal(format!(
            "pinned bounds {:?} do not match re-derived {bounds:?}",
            ctx.bounds()
        )));
    }
    let required = bounds.charge(ctx.offered(), ctx.native_denom())?;
    debug!(required = %required, "tax re-derived from pinned context");
    Ok(required)
}

fn ledger_error(err: LedgerError) -> TxError {
    match err {
        LedgerError::InsufficientFunds {
            account,
            denom,
            available,
            required,
        } => TxError::InsufficientFunds {
            payer: account,
            required: Coin::new(denom, required),
            available,
        },
        other => TxError::Internal(other.to_string()),
    }
}
