//! Single-node application state.
//!
//! Wires the ledger, oracle, stub vote tally, fee parameters and fee
//! grants together and advances them block by block.

use anyhow::Context;
use tessera_fees::{resolve_bounds, FeeBounds};
use tessera_math::Dec;
use tessera_oracle::{Oracle, OracleAggregator, PriceSource, StubTally};
use tessera_settlement::keepers::MemFeeGrants;
use tessera_settlement::{FeeConfig, MemLedger, MsgExecutor, TxOutcome, TxPipeline};
use tessera_types::events::Event;
use tessera_types::tx::{TaxableOperation, Tx};
use tessera_types::Address;
use tracing::{debug, info, warn};

use crate::config::NodeConfig;

/// Node-wide state.
pub struct App {
    config: NodeConfig,
    fee_config: FeeConfig,
    ledger: MemLedger,
    oracle: Oracle,
    aggregator: OracleAggregator<StubTally>,
    grants: MemFeeGrants,
    height: u64,
}

impl App {
    /// Build the state from a validated config, applying genesis.
    pub fn new(config: NodeConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let fee_config = config.fee_config()?;

        let oracle = Oracle::from_genesis(config.oracle.clone(), config.genesis.stamps.clone())
            .context("applying genesis stamps")?;

        let mut ledger = MemLedger::new();
        for account in &config.genesis.accounts {
            let address = Address::from_seed(&account.name);
            for coin in &account.coins {
                ledger
                    .mint(&address, coin)
                    .with_context(|| format!("funding genesis account {}", account.name))?;
            }
            debug!(name = %account.name, %address, "genesis account funded");
        }

        let mut tally = StubTally::new();
        for (denom, rate) in &config.feeder {
            tally.dev_set_rate(denom.clone(), *rate);
        }

        let height = oracle.last_stamp_height().map_or(1, |h| h + 1);
        info!(
            height,
            strategy = %fee_config.strategy,
            accounts = config.genesis.accounts.len(),
            "application initialized"
        );

        Ok(Self {
            config,
            fee_config,
            ledger,
            oracle,
            aggregator: OracleAggregator::new(tally),
            grants: MemFeeGrants::new(),
            height,
        })
    }

    /// Height of the block being built.
    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Fee engine settings derived from the config.
    pub fn fee_config(&self) -> &FeeConfig {
        &self.fee_config
    }

    pub fn ledger(&self) -> &MemLedger {
        &self.ledger
    }

    pub fn oracle(&self) -> &Oracle {
        &self.oracle
    }

    pub fn grants_mut(&mut self) -> &mut MemFeeGrants {
        &mut self.grants
    }

    /// Change a feeder rate from the next tally on.
    pub fn set_feeder_rate(&mut self, denom: &str, rate: Dec) {
        self.aggregator.tally_mut().dev_set_rate(denom, rate);
    }

    /// Current native price under the configured strategy.
    pub fn price(&self) -> tessera_oracle::Result<Dec> {
        self.oracle
            .get_price(&self.fee_config.price_denom, &self.fee_config.strategy)
    }

    /// Native bounds of every taxable operation at the current price.
    pub fn fee_schedule(&self) -> anyhow::Result<Vec<(TaxableOperation, FeeBounds)>> {
        let price = self.price()?;
        if let Err(err) = self
            .config
            .fees
            .validate_overlap(
                &self.fee_config.native_denom,
                self.fee_config.native_exponent,
                price,
            )
        {
            warn!(%price, error = %err, "fee ranges disjoint at current price");
        }
        TaxableOperation::ALL
            .into_iter()
            .map(|op| {
                let bounds = resolve_bounds(
                    self.config.fees.ranges(op),
                    price,
                    &self.fee_config.native_denom,
                    self.fee_config.native_exponent,
                )?;
                Ok((op, bounds))
            })
            .collect()
    }

    /// Deliver `tx` in the current block.
    pub fn deliver_tx(&mut self, tx: &Tx, executor: &mut dyn MsgExecutor) -> TxOutcome {
        let mut pipeline = TxPipeline::new(
            &self.fee_config,
            &self.oracle,
            &self.config.fees,
            self.height,
        )
        .with_grants(&mut self.grants);
        pipeline.deliver_tx(&mut self.ledger, tx, executor)
    }

    /// Close the current block and open the next one.
    pub fn end_block(&mut self) -> anyhow::Result<Vec<Event>> {
        let events = self
            .aggregator
            .end_block(&mut self.oracle, self.height)
            .with_context(|| format!("oracle end block at height {}", self.height))?;
        self.height += 1;
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use tessera_oracle::PriceStamp;
    use tessera_settlement::keepers::NoopExecutor;
    use tessera_settlement::{BankLedger, TxState};
    use tessera_types::events::EventType;
    use tessera_types::tx::Msg;
    use tessera_types::{Coin, NATIVE_DENOM};

    use super::*;
    use crate::config::GenesisAccount;

    const CHEQ: u128 = 1_000_000_000;

    fn config() -> NodeConfig {
        let mut config = NodeConfig::default();
        config.genesis.accounts.push(GenesisAccount {
            name: "alice".into(),
            coins: vec![Coin::new(NATIVE_DENOM, 1_000 * CHEQ)],
        });
        config
            .genesis
            .stamps
            .push(PriceStamp::new("CHEQ", "0.02".parse().expect("dec"), 29));
        config.feeder.insert("CHEQ".into(), "0.04".parse().expect("dec"));
        config
    }

    #[test]
    fn test_genesis() {
        let app = App::new(config()).expect("app");
        let alice = Address::from_seed("alice");
        assert_eq!(app.height(), 30);
        assert_eq!(app.ledger().balance(&alice, NATIVE_DENOM), 1_000 * CHEQ);
        assert_eq!(app.price().expect("price"), "0.02".parse().expect("dec"));
    }

    #[test]
    fn test_fee_schedule_uses_price() {
        let app = App::new(config()).expect("app");
        let schedule = app.fee_schedule().expect("schedule");
        assert_eq!(schedule.len(), 6);
        // 1.2 USD at 0.02 USD/CHEQ is 60 CHEQ, inside 50..100 CHEQ.
        let (op, create) = schedule[0];
        assert_eq!(op, TaxableOperation::CreateDid);
        assert_eq!(create.floor, 60 * CHEQ);
        assert_eq!(create.ceiling, Some(100 * CHEQ));
    }

    #[test]
    fn test_end_block_stamps_feeder_rate() {
        let mut app = App::new(config()).expect("app");
        let mut stamped = Vec::new();
        while app.height() < 60 {
            stamped.extend(app.end_block().expect("end block"));
        }
        assert!(stamped.iter().any(|e| e.event_type == EventType::PriceStamp));
        let prices = app.oracle().stamps().prices("CHEQ");
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[1], "0.04".parse().expect("dec"));
    }

    #[test]
    fn test_deliver_tx() {
        let mut app = App::new(config()).expect("app");
        let alice = Address::from_seed("alice");
        let tx = Tx {
            msgs: vec![Msg::CreateDid { id: "did:cheqd:testnet:1".into() }],
            fee: vec![Coin::new(NATIVE_DENOM, 60 * CHEQ)],
            gas_limit: 200_000,
            signer: alice,
            fee_granter: None,
        };
        let outcome = app.deliver_tx(&tx, &mut NoopExecutor);
        assert_eq!(outcome.state, TxState::Settled, "{}", outcome.log);
        assert_eq!(app.ledger().balance(&alice, NATIVE_DENOM), 940 * CHEQ);
    }
}
