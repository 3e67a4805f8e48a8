//! In-memory ledger and the transaction overlay.
//!
//! [`CacheLedger`] buffers every send and burn of one transaction on top
//! of a parent ledger. Reads see the buffered writes. [`CacheLedger::commit`]
//! hands the journal to the parent's [`BankLedger::apply_all`], which lands
//! all of it or none; dropping the overlay discards it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tessera_types::{Address, Coin};
use tracing::debug;

use crate::keepers::{BankLedger, LedgerError};

/// Balances and supply held in memory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemLedger {
    balances: BTreeMap<Address, BTreeMap<String, u128>>,
    supply: BTreeMap<String, u128>,
}

impl MemLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `coin` in `account`. Used for genesis allocations.
    pub fn mint(&mut self, account: &Address, coin: &Coin) -> Result<(), LedgerError> {
        let supply = self.supply.entry(coin.denom.clone()).or_default();
        *supply = supply.checked_add(coin.amount).ok_or(LedgerError::Overflow)?;
        self.credit(account, coin)
    }

    /// Total supply of `denom`.
    pub fn supply(&self, denom: &str) -> u128 {
        self.supply.get(denom).copied().unwrap_or(0)
    }

    fn credit(&mut self, account: &Address, coin: &Coin) -> Result<(), LedgerError> {
        let balance = self
            .balances
            .entry(*account)
            .or_default()
            .entry(coin.denom.clone())
            .or_default();
        *balance = balance.checked_add(coin.amount).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    fn debit(&mut self, account: &Address, coin: &Coin) -> Result<(), LedgerError> {
        let available = self.balance(account, &coin.denom);
        if available < coin.amount {
            return Err(LedgerError::InsufficientFunds {
                account: *account,
                denom: coin.denom.clone(),
                available,
                required: coin.amount,
            });
        }
        if let Some(balance) = self
            .balances
            .get_mut(account)
            .and_then(|b| b.get_mut(&coin.denom))
        {
            *balance = available - coin.amount;
        }
        Ok(())
    }
}

impl BankLedger for MemLedger {
    fn balance(&self, account: &Address, denom: &str) -> u128 {
        self.balances
            .get(account)
            .and_then(|b| b.get(denom))
            .copied()
            .unwrap_or(0)
    }

    fn send_coins(&mut self, from: &Address, to: &Address, coin: &Coin) -> Result<(), LedgerError> {
        self.debit(from, coin)?;
        self.credit(to, coin)
    }

    fn burn_coins(&mut self, from: &Address, coin: &Coin) -> Result<(), LedgerError> {
        self.debit(from, coin)?;
        let supply = self.supply.entry(coin.denom.clone()).or_default();
        *supply = supply.saturating_sub(coin.amount);
        Ok(())
    }

    fn apply_all(&mut self, ops: &[LedgerOp]) -> Result<(), LedgerError> {
        let mut staged = self.clone();
        for op in ops {
            op.apply(&mut staged)?;
        }
        *self = staged;
        Ok(())
    }
}

/// A buffered ledger operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerOp {
    Send { from: Address, to: Address, coin: Coin },
    Burn { from: Address, coin: Coin },
}

impl LedgerOp {
    /// Perform this operation on `ledger`.
    pub fn apply<L: BankLedger + ?Sized>(&self, ledger: &mut L) -> Result<(), LedgerError> {
        match self {
            LedgerOp::Send { from, to, coin } => ledger.send_coins(from, to, coin),
            LedgerOp::Burn { from, coin } => ledger.burn_coins(from, coin),
        }
    }
}

/// Write-buffering overlay over a parent ledger.
pub struct CacheLedger<'a, L: BankLedger + ?Sized> {
    parent: &'a mut L,
    balances: BTreeMap<(Address, String), u128>,
    journal: Vec<LedgerOp>,
}

impl<'a, L: BankLedger + ?Sized> CacheLedger<'a, L> {
    pub fn new(parent: &'a mut L) -> Self {
        Self {
            parent,
            balances: BTreeMap::new(),
            journal: Vec::new(),
        }
    }

    /// Buffered operations, in order.
    pub fn journal(&self) -> &[LedgerOp] {
        &self.journal
    }

    /// Apply the buffered operations to the parent ledger.
    ///
    /// If the parent rejects any operation, none of them are applied.
    pub fn commit(self) -> Result<(), LedgerError> {
        debug!(ops = self.journal.len(), "committing ledger overlay");
        self.parent.apply_all(&self.journal)
    }

    fn set(&mut self, account: &Address, denom: &str, amount: u128) {
        self.balances.insert((*account, denom.to_string()), amount);
    }

    fn debited(&self, account: &Address, coin: &Coin) -> Result<u128, LedgerError> {
        let available = self.balance(account, &coin.denom);
        available
            .checked_sub(coin.amount)
            .ok_or_else(|| LedgerError::InsufficientFunds {
                account: *account,
                denom: coin.denom.clone(),
                available,
                required: coin.amount,
            })
    }
}

impl<L: BankLedger + ?Sized> BankLedger for CacheLedger<'_, L> {
    fn balance(&self, account: &Address, denom: &str) -> u128 {
        match self.balances.get(&(*account, denom.to_string())) {
            Some(amount) => *amount,
            None => self.parent.balance(account, denom),
        }
    }

    fn send_coins(&mut self, from: &Address, to: &Address, coin: &Coin) -> Result<(), LedgerError> {
        let from_after = self.debited(from, coin)?;
        self.set(from, &coin.denom, from_after);
        let to_after = self
            .balance(to, &coin.denom)
            .checked_add(coin.amount)
            .ok_or(LedgerError::Overflow)?;
        self.set(to, &coin.denom, to_after);
        self.journal.push(LedgerOp::Send {
            from: *from,
            to: *to,
            coin: coin.clone(),
        });
        Ok(())
    }

    fn burn_coins(&mut self, from: &Address, coin: &Coin) -> Result<(), LedgerError> {
        let from_after = self.debited(from, coin)?;
        self.set(from, &coin.denom, from_after);
        self.journal.push(LedgerOp::Burn {
            from: *from,
            coin: coin.clone(),
        });
        Ok(())
    }

    fn apply_all(&mut self, ops: &[LedgerOp]) -> Result<(), LedgerError> {
        let balances = self.balances.clone();
        let journaled = self.journal.len();
        for op in ops {
            if let Err(err) = op.apply(self) {
                self.balances = balances;
                self.journal.truncate(journaled);
                return Err(err);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ncheq(amount: u128) -> Coin {
        Coin::new("ncheq", amount)
    }

    fn funded() -> (MemLedger, Address, Address) {
        let alice = Address::from_seed("alice");
        let bob = Address::from_seed("bob");
        let mut ledger = MemLedger::new();
        ledger.mint(&alice, &ncheq(1_000)).expect("mint");
        (ledger, alice, bob)
    }

    #[test]
    fn test_mem_ledger_send_and_burn() {
        let (mut ledger, alice, bob) = funded();
        ledger.send_coins(&alice, &bob, &ncheq(300)).expect("send");
        ledger.burn_coins(&bob, &ncheq(100)).expect("burn");
        assert_eq!(ledger.balance(&alice, "ncheq"), 700);
        assert_eq!(ledger.balance(&bob, "ncheq"), 200);
        assert_eq!(ledger.supply("ncheq"), 900);
    }

    #[test]
    fn test_mem_ledger_insufficient_funds() {
        let (mut ledger, alice, bob) = funded();
        let err = ledger.send_coins(&bob, &alice, &ncheq(1)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientFunds { available: 0, required: 1, .. }));
        assert_eq!(ledger.balance(&alice, "ncheq"), 1_000);
    }

    #[test]
    fn test_overlay_reads_its_writes() {
        let (mut ledger, alice, bob) = funded();
        let mut cache = CacheLedger::new(&mut ledger);
        cache.send_coins(&alice, &bob, &ncheq(400)).expect("send");
        cache.send_coins(&bob, &alice, &ncheq(100)).expect("send back");
        assert_eq!(cache.balance(&alice, "ncheq"), 700);
        assert_eq!(cache.balance(&bob, "ncheq"), 300);
        assert!(cache.send_coins(&bob, &alice, &ncheq(301)).is_err());
        assert_eq!(cache.journal().len(), 2);
    }

    #[test]
    fn test_overlay_commit() {
        let (mut ledger, alice, bob) = funded();
        let mut cache = CacheLedger::new(&mut ledger);
        cache.send_coins(&alice, &bob, &ncheq(400)).expect("send");
        cache.burn_coins(&bob, &ncheq(150)).expect("burn");
        cache.commit().expect("commit");

        assert_eq!(ledger.balance(&alice, "ncheq"), 600);
        assert_eq!(ledger.balance(&bob, "ncheq"), 250);
        assert_eq!(ledger.supply("ncheq"), 850);
    }

    #[test]
    fn test_overlay_drop_discards() {
        let (mut ledger, alice, bob) = funded();
        let before = ledger.clone();
        {
            let mut cache = CacheLedger::new(&mut ledger);
            cache.send_coins(&alice, &bob, &ncheq(999)).expect("send");
            cache.burn_coins(&bob, &ncheq(999)).expect("burn");
        }
        assert_eq!(ledger, before);
    }

    /// Ledger that refuses every burn.
    struct NoBurns(MemLedger);

    impl BankLedger for NoBurns {
        fn balance(&self, account: &Address, denom: &str) -> u128 {
            self.0.balance(account, denom)
        }

        fn send_coins(&mut self, from: &Address, to: &Address, coin: &Coin) -> Result<(), LedgerError> {
            self.0.send_coins(from, to, coin)
        }

        fn burn_coins(&mut self, _from: &Address, _coin: &Coin) -> Result<(), LedgerError> {
            Err(LedgerError::Execution("burns disabled".into()))
        }

        fn apply_all(&mut self, ops: &[LedgerOp]) -> Result<(), LedgerError> {
            let mut staged = NoBurns(self.0.clone());
            for op in ops {
                op.apply(&mut staged)?;
            }
            *self = staged;
            Ok(())
        }
    }

    #[test]
    fn test_apply_all_is_all_or_nothing() {
        let (mut ledger, alice, bob) = funded();
        let before = ledger.clone();
        let ops = [
            LedgerOp::Send { from: alice, to: bob, coin: ncheq(300) },
            LedgerOp::Send { from: bob, to: alice, coin: ncheq(301) },
        ];
        assert!(ledger.apply_all(&ops).is_err());
        assert_eq!(ledger, before);

        ledger.apply_all(&ops[..1]).expect("apply");
        assert_eq!(ledger.balance(&bob, "ncheq"), 300);
    }

    #[test]
    fn test_overlay_apply_all_restores_on_error() {
        let (mut ledger, alice, bob) = funded();
        let mut cache = CacheLedger::new(&mut ledger);
        cache.send_coins(&alice, &bob, &ncheq(100)).expect("send");

        let ops = [
            LedgerOp::Burn { from: bob, coin: ncheq(100) },
            LedgerOp::Burn { from: bob, coin: ncheq(1) },
        ];
        assert!(cache.apply_all(&ops).is_err());
        assert_eq!(cache.balance(&bob, "ncheq"), 100);
        assert_eq!(cache.journal().len(), 1);
    }

    #[test]
    fn test_rejected_commit_leaves_parent_untouched() {
        let (ledger, alice, bob) = funded();
        let mut parent = NoBurns(ledger);
        let before = parent.0.clone();

        let mut cache = CacheLedger::new(&mut parent);
        cache.send_coins(&alice, &bob, &ncheq(400)).expect("send");
        cache.burn_coins(&bob, &ncheq(150)).expect("burn is buffered");
        let err = cache.commit().unwrap_err();

        assert_eq!(err, LedgerError::Execution("burns disabled".into()));
        assert_eq!(parent.0, before);
        assert_eq!(parent.balance(&bob, "ncheq"), 0);
    }

    #[test]
    fn test_nested_overlay_commit_lands_in_outer() {
        let (mut ledger, alice, bob) = funded();
        let before = ledger.clone();
        {
            let mut outer = CacheLedger::new(&mut ledger);
            let mut inner = CacheLedger::new(&mut outer);
            inner.send_coins(&alice, &bob, &ncheq(600)).expect("send");
            inner.commit().expect("inner commit");
            assert_eq!(outer.balance(&bob, "ncheq"), 600);
            // Dropped without commit.
        }
        assert_eq!(ledger, before);
    }
}
