//! Pre-execution fee gate.
//!
//! Classifies a transaction's messages, prices the taxable ones once
//! against the oracle, checks the offered fee against the combined
//! schedule, resolves the payer and checks its balance. Nothing is
//! mutated; the outcome is a [`TaxContext`] for the post stage.

use serde::{Deserialize, Serialize};
use tessera_fees::{resolve_bounds, FeeBounds};
use tessera_oracle::MaStrategy;
use tessera_types::tx::Tx;
use tessera_types::{NATIVE_DENOM, NATIVE_EXPONENT, NATIVE_SYMBOL};
use tracing::debug;

use crate::context::TaxContext;
use crate::keepers::{BankLedger, FeeGrantKeeper, FeeParamsSource, PriceSource};
use crate::{Result, TxError};

/// Chain-level settings of the fee engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Denom every tax is charged in.
    pub native_denom: String,
    /// Decimals from `native_denom` to one whole token.
    pub native_exponent: u32,
    /// Denom the oracle is asked to price.
    pub price_denom: String,
    /// Moving average the price is read with.
    pub strategy: MaStrategy,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            native_denom: NATIVE_DENOM.to_string(),
            native_exponent: NATIVE_EXPONENT,
            price_denom: NATIVE_SYMBOL.to_string(),
            strategy: MaStrategy::default(),
        }
    }
}

/// The ante stage.
pub struct AnteFeeGate<'a> {
    pub config: &'a FeeConfig,
    pub oracle: &'a dyn PriceSource,
    pub params: &'a dyn FeeParamsSource,
    /// `None` when fee grants are not enabled.
    pub grants: Option<&'a dyn FeeGrantKeeper>,
}

impl AnteFeeGate<'_> {
    /// Check `tx` against the current fee schedule.
    ///
    /// Returns `None` for transactions without taxable messages. A fee
    /// granter equal to the signer is treated as no granter.
    ///
    /// # Errors
    ///
    /// - [`TxError::InvalidDenom`] unless exactly one native fee coin is offered
    /// - [`TxError::PriceUnavailable`] / [`TxError::UnsupportedDenom`] /
    ///   [`TxError::InvalidMaType`] / [`TxError::InvalidWeightsLength`] /
    ///   [`TxError::InvalidWeights`] from pricing
    /// - [`TxError::InsufficientFee`] if the offer is below the floor
    /// - [`TxError::FeeGrantsDisabled`] / [`TxError::FeeGrantDenied`] for
    ///   granted fees
    /// - [`TxError::InsufficientFunds`] if the payer cannot cover the tax
    pub fn ante_check(&self, ledger: &dyn BankLedger, tx: &Tx) -> Result<Option<TaxContext>> {
        let operations = tx.taxable_operations();
        if operations.is_empty() {
            return Ok(None);
        }

        let offered = match tx.fee.as_slice() {
            [coin] => coin.clone(),
            coins => {
                return Err(TxError::InvalidDenom(format!(
                    "expected exactly one fee coin, got {}",
                    coins.len()
                )));
            }
        };

        let native_denom = &self.config.native_denom;
        let native_exponent = self.config.native_exponent;
        let price = self
            .oracle
            .get_price(&self.config.price_denom, &self.config.strategy)?;
        let oracle_height = self.oracle.last_stamp_height();

        let fee_params = self.params.fee_params();
        let schedules: Vec<_> = operations
            .iter()
            .map(|&op| (op, fee_params.ranges(op).to_vec()))
            .collect();
        let per_op = schedules
            .iter()
            .map(|(_, ranges)| resolve_bounds(ranges, price, native_denom, native_exponent))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let bounds = FeeBounds::combine(&per_op)?;
        let required_tax = bounds.charge(&offered, native_denom)?;

        let fee_granter = tx.fee_granter.filter(|granter| *granter != tx.signer);
        let payer = match fee_granter {
            Some(granter) => {
                let grants = self.grants.ok_or(TxError::FeeGrantsDisabled)?;
                grants
                    .check_allowance(&granter, &tx.signer, &required_tax, &tx.msgs)
                    .map_err(|e| TxError::FeeGrantDenied(e.to_string()))?;
                granter
            }
            None => tx.signer,
        };

        let available = ledger.balance(&payer, native_denom);
        if available < required_tax.amount {
            return Err(TxError::InsufficientFunds {
                payer,
                required: required_tax,
                available,
            });
        }

        debug!(
            %price,
            oracle_height = ?oracle_height,
            operations = operations.len(),
            floor = bounds.floor,
            ceiling = ?bounds.ceiling,
            required = %required_tax,
            %payer,
            "ante fee check passed"
        );

        Ok(Some(TaxContext {
            price,
            oracle_height,
            native_denom: native_denom.clone(),
            native_exponent,
            signer: tx.signer,
            payer,
            fee_granter,
            msgs: tx.msgs.clone(),
            offered,
            schedules,
            bounds,
            required_tax,
            burn_factor: fee_params.burn_factor,
        }))
    }
}
