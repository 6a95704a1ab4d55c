//! Ledger Entity Store seam and its in-memory implementation.

use std::{
    collections::HashMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use rust_decimal::Decimal;
use wallet_domain::{Account, AccountId, Transaction, TransactionId};

use crate::{CoreError, CoreResult};

/// Staged view handed to the closure passed to [`LedgerStore::transact`].
///
/// Reads observe committed state plus whatever the unit has staged so far.
pub trait LedgerUnit {
    fn account(&self, id: AccountId) -> CoreResult<Option<Account>>;
    /// Atomically shifts the balance by `delta` once the unit commits.
    fn adjust_balance(&mut self, id: AccountId, delta: Decimal) -> CoreResult<()>;
    fn transaction(&self, id: TransactionId) -> CoreResult<Option<Transaction>>;
    fn put_transaction(&mut self, transaction: Transaction) -> CoreResult<()>;
    fn remove_transaction(&mut self, id: TransactionId) -> CoreResult<Option<Transaction>>;
}

/// Abstraction over the persistence layer that owns accounts and transactions.
pub trait LedgerStore: Send + Sync {
    /// Runs `work` inside one transactional boundary. Staged writes become
    /// visible only if `work` returns `Ok` and the commit succeeds; otherwise
    /// nothing is written.
    fn transact<T, F>(&self, work: F) -> CoreResult<T>
    where
        F: FnOnce(&mut dyn LedgerUnit) -> CoreResult<T>;

    fn account(&self, id: AccountId) -> CoreResult<Option<Account>>;
    fn accounts(&self) -> CoreResult<Vec<Account>>;
    fn transaction(&self, id: TransactionId) -> CoreResult<Option<Transaction>>;
    fn transactions_referencing(&self, id: AccountId) -> CoreResult<Vec<Transaction>>;
}

#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<AccountId, Account>,
    transactions: HashMap<TransactionId, Transaction>,
}

/// Keeps accounts and transactions in process memory.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_account(&self, account: Account) -> CoreResult<AccountId> {
        let id = account.id;
        self.write()?.accounts.insert(id, account);
        Ok(id)
    }

    pub fn remove_account(&self, id: AccountId) -> CoreResult<Account> {
        self.write()?
            .accounts
            .remove(&id)
            .ok_or(CoreError::AccountNotFound(id))
    }

    pub fn transaction_count(&self) -> CoreResult<usize> {
        Ok(self.read()?.transactions.len())
    }

    fn read(&self) -> CoreResult<RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| CoreError::LockPoisoned("ledger state".into()))
    }

    fn write(&self) -> CoreResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|_| CoreError::LockPoisoned("ledger state".into()))
    }
}

impl LedgerStore for MemoryLedger {
    fn transact<T, F>(&self, work: F) -> CoreResult<T>
    where
        F: FnOnce(&mut dyn LedgerUnit) -> CoreResult<T>,
    {
        let mut unit = StagedUnit::new(self);
        let value = work(&mut unit)?;
        unit.commit()?;
        Ok(value)
    }

    fn account(&self, id: AccountId) -> CoreResult<Option<Account>> {
        Ok(self.read()?.accounts.get(&id).cloned())
    }

    fn accounts(&self) -> CoreResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self.read()?.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(accounts)
    }

    fn transaction(&self, id: TransactionId) -> CoreResult<Option<Transaction>> {
        Ok(self.read()?.transactions.get(&id).cloned())
    }

    fn transactions_referencing(&self, id: AccountId) -> CoreResult<Vec<Transaction>> {
        Ok(self
            .read()?
            .transactions
            .values()
            .filter(|txn| txn.values.references(id))
            .cloned()
            .collect())
    }
}

struct StagedUnit<'a> {
    ledger: &'a MemoryLedger,
    deltas: HashMap<AccountId, Decimal>,
    // `None` marks a staged removal.
    writes: HashMap<TransactionId, Option<Transaction>>,
}

impl<'a> StagedUnit<'a> {
    fn new(ledger: &'a MemoryLedger) -> Self {
        Self {
            ledger,
            deltas: HashMap::new(),
            writes: HashMap::new(),
        }
    }

    fn commit(self) -> CoreResult<()> {
        let mut state = self.ledger.write()?;
        // An account removed since it was staged aborts the whole unit.
        if let Some(missing) = self
            .deltas
            .keys()
            .find(|id| !state.accounts.contains_key(id))
        {
            return Err(CoreError::AccountNotFound(*missing));
        }
        // Every new balance is computed before any is written, so an overflow
        // leaves the ledger as it was.
        let mut balances = Vec::with_capacity(self.deltas.len());
        for (id, delta) in &self.deltas {
            if let Some(account) = state.accounts.get(id) {
                balances.push((*id, shifted(account.balance, *delta, *id)?));
            }
        }
        for (id, balance) in balances {
            if let Some(account) = state.accounts.get_mut(&id) {
                account.balance = balance;
            }
        }
        for (id, write) in self.writes {
            match write {
                Some(transaction) => {
                    state.transactions.insert(id, transaction);
                }
                None => {
                    state.transactions.remove(&id);
                }
            }
        }
        Ok(())
    }
}

fn shifted(balance: Decimal, delta: Decimal, id: AccountId) -> CoreResult<Decimal> {
    balance.checked_add(delta).ok_or_else(|| overflow(id))
}

fn overflow(id: AccountId) -> CoreError {
    CoreError::Validation(format!("balance of account {id} would overflow"))
}

impl LedgerUnit for StagedUnit<'_> {
    fn account(&self, id: AccountId) -> CoreResult<Option<Account>> {
        let state = self.ledger.read()?;
        let Some(mut account) = state.accounts.get(&id).cloned() else {
            return Ok(None);
        };
        if let Some(delta) = self.deltas.get(&id) {
            account.balance = shifted(account.balance, *delta, id)?;
        }
        Ok(Some(account))
    }

    fn adjust_balance(&mut self, id: AccountId, delta: Decimal) -> CoreResult<()> {
        if !self.ledger.read()?.accounts.contains_key(&id) {
            return Err(CoreError::AccountNotFound(id));
        }
        let staged = self.deltas.entry(id).or_default();
        *staged = staged.checked_add(delta).ok_or_else(|| overflow(id))?;
        Ok(())
    }

    fn transaction(&self, id: TransactionId) -> CoreResult<Option<Transaction>> {
        if let Some(staged) = self.writes.get(&id) {
            return Ok(staged.clone());
        }
        Ok(self.ledger.read()?.transactions.get(&id).cloned())
    }

    fn put_transaction(&mut self, transaction: Transaction) -> CoreResult<()> {
        self.writes.insert(transaction.id, Some(transaction));
        Ok(())
    }

    fn remove_transaction(&mut self, id: TransactionId) -> CoreResult<Option<Transaction>> {
        let existing = self.transaction(id)?;
        if existing.is_some() {
            self.writes.insert(id, None);
        }
        Ok(existing)
    }
}
