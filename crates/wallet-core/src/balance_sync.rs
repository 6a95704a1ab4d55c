//! Keeps account balances in step with the transactions that reference them.
//!
//! Every create, update and delete runs as one unit of work against the
//! [`LedgerStore`]: the transaction record write and the balance adjustments
//! commit together or not at all. Accounts touched by an event are locked for
//! its whole duration, so two events sharing an account never interleave.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wallet_domain::{
    Account, AccountId, AccountRef, LegRole, Transaction, TransactionId, TransactionValues,
};

use crate::{
    effects::{self, Direction},
    locks::AccountLocks,
    store::{LedgerStore, LedgerUnit},
    CoreError, CoreResult,
};

/// A transaction mutation the engine must mirror onto balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TransactionEvent {
    #[serde(rename = "create")]
    Created { transaction: Transaction },
    /// `before` carries the pre-update values when the caller captured them;
    /// otherwise the stored record is read inside the same unit of work.
    #[serde(rename = "update")]
    Updated {
        #[serde(default)]
        before: Option<TransactionValues>,
        after: Transaction,
    },
    #[serde(rename = "delete")]
    Deleted { transaction_id: TransactionId },
}

/// Why a leg could not be matched to a live account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrphanCause {
    Missing,
    Malformed,
}

/// Outcome of looking up an account reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Account),
    Orphaned(OrphanCause),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LegEffect {
    pub account_id: AccountId,
    pub role: LegRole,
    pub delta: Decimal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrphanedLeg {
    pub transaction_id: TransactionId,
    pub role: LegRole,
    pub reference: AccountRef,
    pub cause: OrphanCause,
}

/// What one event did to balances.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct SyncReport {
    pub applied: Vec<LegEffect>,
    pub orphaned: Vec<OrphanedLeg>,
}

impl SyncReport {
    /// Net balance change the event caused on `account`.
    pub fn net_change(&self, account: AccountId) -> Decimal {
        self.applied
            .iter()
            .filter(|effect| effect.account_id == account)
            .map(|effect| effect.delta)
            .sum()
    }

    pub fn is_clean(&self) -> bool {
        self.orphaned.is_empty()
    }
}

/// Counters accumulated since the engine was created.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SyncMetrics {
    pub events_processed: u64,
    pub legs_applied: u64,
    pub orphaned_references: u64,
}

#[derive(Debug, Default)]
struct Counters {
    events_processed: AtomicU64,
    legs_applied: AtomicU64,
    orphaned_references: AtomicU64,
}

/// Stored balance compared with a full replay of the transaction log.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct Reconciliation {
    pub account_id: AccountId,
    pub stored: Decimal,
    pub expected: Decimal,
    pub drift: Decimal,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        self.drift.is_zero()
    }
}

/// Balance Synchronization Engine.
#[derive(Debug)]
pub struct BalanceSync<S> {
    store: Arc<S>,
    locks: AccountLocks,
    counters: Counters,
}

impl<S: LedgerStore> BalanceSync<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: AccountLocks::new(),
            counters: Counters::default(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Dispatches a mutation event to the matching handler.
    pub fn handle(&self, event: TransactionEvent) -> CoreResult<SyncReport> {
        match event {
            TransactionEvent::Created { transaction } => self.on_create(transaction),
            TransactionEvent::Updated { before, after } => self.update(before, after),
            TransactionEvent::Deleted { transaction_id } => self.on_delete(transaction_id),
        }
    }

    /// Persists a new transaction and applies its effect.
    pub fn on_create(&self, transaction: Transaction) -> CoreResult<SyncReport> {
        validate_values(&transaction.values)?;
        let set = self.locks.lock_set(transaction.values.account_ids())?;
        let _held = set.acquire()?;

        let id = transaction.id;
        let report = self.store.transact(|unit| {
            if unit.transaction(id)?.is_some() {
                return Err(CoreError::DuplicateTransaction(id));
            }
            let mut report = SyncReport::default();
            apply_legs(unit, id, &transaction.values, Direction::Apply, &mut report)?;
            unit.put_transaction(transaction)?;
            Ok(report)
        })?;

        self.record(&report);
        debug!("created transaction {} ({} leg(s))", id, report.applied.len());
        Ok(report)
    }

    /// Replaces a stored transaction, reversing the values it had before the
    /// update and applying the new ones.
    pub fn on_update(&self, after: Transaction) -> CoreResult<SyncReport> {
        self.update(None, after)
    }

    /// Same as [`Self::on_update`] with pre-update values captured by the caller.
    pub fn on_update_from(
        &self,
        before: TransactionValues,
        after: Transaction,
    ) -> CoreResult<SyncReport> {
        self.update(Some(before), after)
    }

    /// Removes a stored transaction and reverses its effect.
    pub fn on_delete(&self, id: TransactionId) -> CoreResult<SyncReport> {
        loop {
            let snapshot = self
                .store
                .transaction(id)?
                .ok_or(CoreError::TransactionNotFound(id))?;
            let set = self.locks.lock_set(snapshot.values.account_ids())?;
            let _held = set.acquire()?;

            let outcome = self.store.transact(|unit| {
                let current = unit
                    .transaction(id)?
                    .ok_or(CoreError::TransactionNotFound(id))?;
                if !set.covers(&current.values.account_ids()) {
                    return Ok(None);
                }
                let mut report = SyncReport::default();
                apply_legs(unit, id, &current.values, Direction::Reverse, &mut report)?;
                unit.remove_transaction(id)?;
                Ok(Some(report))
            })?;

            match outcome {
                Some(report) => {
                    self.record(&report);
                    debug!("deleted transaction {}", id);
                    return Ok(report);
                }
                None => debug!("transaction {} changed accounts while waiting; retrying", id),
            }
        }
    }

    fn update(
        &self,
        before: Option<TransactionValues>,
        after: Transaction,
    ) -> CoreResult<SyncReport> {
        validate_values(&after.values)?;
        let id = after.id;
        loop {
            let prior = match &before {
                Some(values) => values.clone(),
                None => {
                    self.store
                        .transaction(id)?
                        .ok_or(CoreError::TransactionNotFound(id))?
                        .values
                }
            };
            let set = self.locks.lock_set(
                prior
                    .account_ids()
                    .into_iter()
                    .chain(after.values.account_ids()),
            )?;
            let _held = set.acquire()?;

            let outcome = self.store.transact(|unit| {
                let stored = unit
                    .transaction(id)?
                    .ok_or(CoreError::TransactionNotFound(id))?;
                let old = before.clone().unwrap_or(stored.values);
                if !set.covers(&old.account_ids()) {
                    return Ok(None);
                }
                let mut report = SyncReport::default();
                apply_legs(unit, id, &old, Direction::Reverse, &mut report)?;
                apply_legs(unit, id, &after.values, Direction::Apply, &mut report)?;
                unit.put_transaction(after.clone())?;
                Ok(Some(report))
            })?;

            match outcome {
                Some(report) => {
                    self.record(&report);
                    debug!("updated transaction {}", id);
                    return Ok(report);
                }
                None => debug!("transaction {} changed accounts while waiting; retrying", id),
            }
        }
    }

    /// Compares the stored balance of an account with a replay of every
    /// transaction that currently references it.
    pub fn reconcile(&self, account_id: AccountId) -> CoreResult<Reconciliation> {
        let set = self.locks.lock_set([account_id])?;
        let _held = set.acquire()?;

        let account = self
            .store
            .account(account_id)?
            .ok_or(CoreError::AccountNotFound(account_id))?;
        let transactions = self.store.transactions_referencing(account_id)?;
        let expected = Self::expected_balance(&account, &transactions);
        let drift = account.balance - expected;
        if !drift.is_zero() {
            warn!(
                "account {} drifted by {} (stored {}, expected {})",
                account_id, drift, account.balance, expected
            );
        }
        Ok(Reconciliation {
            account_id,
            stored: account.balance,
            expected,
            drift,
        })
    }

    /// Balance the account would hold if `transactions` were replayed from
    /// its opening balance.
    pub fn expected_balance(account: &Account, transactions: &[Transaction]) -> Decimal {
        effects::replay(account, transactions)
    }

    pub fn metrics(&self) -> SyncMetrics {
        SyncMetrics {
            events_processed: self.counters.events_processed.load(Ordering::Relaxed),
            legs_applied: self.counters.legs_applied.load(Ordering::Relaxed),
            orphaned_references: self.counters.orphaned_references.load(Ordering::Relaxed),
        }
    }

    fn record(&self, report: &SyncReport) {
        self.counters.events_processed.fetch_add(1, Ordering::Relaxed);
        self.counters
            .legs_applied
            .fetch_add(report.applied.len() as u64, Ordering::Relaxed);
        self.counters
            .orphaned_references
            .fetch_add(report.orphaned.len() as u64, Ordering::Relaxed);
    }
}

/// Looks an account reference up inside the current unit of work.
pub fn resolve(unit: &dyn LedgerUnit, reference: &AccountRef) -> CoreResult<Resolution> {
    match reference {
        AccountRef::Malformed(_) => Ok(Resolution::Orphaned(OrphanCause::Malformed)),
        AccountRef::Known(id) => Ok(match unit.account(*id)? {
            Some(account) => Resolution::Found(account),
            None => Resolution::Orphaned(OrphanCause::Missing),
        }),
    }
}

fn apply_legs(
    unit: &mut dyn LedgerUnit,
    transaction_id: TransactionId,
    values: &TransactionValues,
    direction: Direction,
    report: &mut SyncReport,
) -> CoreResult<()> {
    for (role, reference) in values.legs() {
        match resolve(&*unit, reference)? {
            Resolution::Found(account) => {
                let delta = effects::leg_delta(account.kind, values, role, direction);
                unit.adjust_balance(account.id, delta)?;
                debug!(
                    "{:?} {:?} leg of {} on {}: {}",
                    direction, role, transaction_id, account.id, delta
                );
                report.applied.push(LegEffect {
                    account_id: account.id,
                    role,
                    delta,
                });
            }
            Resolution::Orphaned(cause) => {
                warn!(
                    "transaction {} {:?} leg points at {} ({:?}); balance left untouched",
                    transaction_id, role, reference, cause
                );
                report.orphaned.push(OrphanedLeg {
                    transaction_id,
                    role,
                    reference: reference.clone(),
                    cause,
                });
            }
        }
    }
    Ok(())
}

fn validate_values(values: &TransactionValues) -> CoreResult<()> {
    if values.amount <= Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "transaction amount must be positive, got {}",
            values.amount
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLedger;
    use rust_decimal_macros::dec;

    fn engine() -> BalanceSync<MemoryLedger> {
        BalanceSync::new(Arc::new(MemoryLedger::new()))
    }

    fn balance(engine: &BalanceSync<MemoryLedger>, id: AccountId) -> Decimal {
        engine.store().account(id).unwrap().expect("account").balance
    }

    #[test]
    fn expense_then_edit_then_delete_on_asset() {
        let engine = engine();
        let bank = engine
            .store()
            .insert_account(Account::asset("Bank", dec!(1000.00)))
            .unwrap();

        let txn = Transaction::expense(dec!(100.00), bank);
        let id = txn.id;
        engine.on_create(txn.clone()).unwrap();
        assert_eq!(balance(&engine, bank), dec!(900.00));

        let mut edited = txn;
        edited.values.amount = dec!(200.00);
        engine.on_update(edited).unwrap();
        assert_eq!(balance(&engine, bank), dec!(800.00));

        engine.on_delete(id).unwrap();
        assert_eq!(balance(&engine, bank), dec!(1000.00));
        assert!(engine.store().transaction(id).unwrap().is_none());
    }

    #[test]
    fn transfer_pays_down_liability() {
        let engine = engine();
        let bank = engine
            .store()
            .insert_account(Account::asset("Bank", dec!(1000.00)))
            .unwrap();
        let card = engine
            .store()
            .insert_account(Account::liability("Visa", dec!(500.00)))
            .unwrap();

        let report = engine
            .on_create(Transaction::transfer(dec!(100.00), bank, card))
            .unwrap();

        assert_eq!(balance(&engine, bank), dec!(900.00));
        assert_eq!(balance(&engine, card), dec!(400.00));
        assert_eq!(report.net_change(card), dec!(-100.00));
        assert!(report.is_clean());
    }

    #[test]
    fn missing_destination_still_moves_source() {
        let engine = engine();
        let bank = engine
            .store()
            .insert_account(Account::asset("Bank", dec!(300)))
            .unwrap();
        let ghost = AccountId::new();

        let report = engine
            .on_create(Transaction::transfer(dec!(50), bank, ghost))
            .unwrap();

        assert_eq!(balance(&engine, bank), dec!(250));
        assert_eq!(report.orphaned.len(), 1);
        assert_eq!(report.orphaned[0].role, LegRole::Destination);
        assert_eq!(report.orphaned[0].cause, OrphanCause::Missing);
        assert_eq!(engine.metrics().orphaned_references, 1);
    }

    #[test]
    fn malformed_reference_counts_as_orphan() {
        let engine = engine();
        let txn = Transaction::expense(dec!(10), AccountRef::parse("12"));
        let report = engine.on_create(txn).unwrap();
        assert_eq!(report.orphaned[0].cause, OrphanCause::Malformed);
        assert!(report.applied.is_empty());
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let engine = engine();
        let bank = engine
            .store()
            .insert_account(Account::asset("Bank", dec!(10)))
            .unwrap();
        let err = engine
            .on_create(Transaction::expense(dec!(0), bank))
            .expect_err("zero amount");
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(engine.store().transaction_count().unwrap(), 0);
    }

    #[test]
    fn duplicate_create_is_rejected_without_side_effects() {
        let engine = engine();
        let bank = engine
            .store()
            .insert_account(Account::asset("Bank", dec!(10)))
            .unwrap();
        let txn = Transaction::income(dec!(5), bank);
        engine.on_create(txn.clone()).unwrap();
        let err = engine.on_create(txn).expect_err("duplicate");
        assert!(matches!(err, CoreError::DuplicateTransaction(_)));
        assert_eq!(balance(&engine, bank), dec!(15));
    }

    #[test]
    fn update_of_unknown_transaction_fails() {
        let engine = engine();
        let bank = engine
            .store()
            .insert_account(Account::asset("Bank", dec!(10)))
            .unwrap();
        let err = engine
            .on_update(Transaction::income(dec!(5), bank))
            .expect_err("not stored");
        assert!(matches!(err, CoreError::TransactionNotFound(_)));
        assert_eq!(balance(&engine, bank), dec!(10));
    }

    #[test]
    fn update_can_move_transaction_between_accounts() {
        let engine = engine();
        let bank = engine
            .store()
            .insert_account(Account::asset("Bank", dec!(100)))
            .unwrap();
        let card = engine
            .store()
            .insert_account(Account::liability("Card", dec!(0)))
            .unwrap();

        let txn = Transaction::expense(dec!(30), bank);
        engine.on_create(txn.clone()).unwrap();

        let moved = Transaction {
            values: Transaction::expense(dec!(30), card).values,
            ..txn
        };
        engine.on_update(moved).unwrap();

        assert_eq!(balance(&engine, bank), dec!(100));
        assert_eq!(balance(&engine, card), dec!(30));
    }

    #[test]
    fn account_locks_are_not_retained_between_events() {
        let engine = engine();
        let bank = engine
            .store()
            .insert_account(Account::asset("Bank", dec!(100)))
            .unwrap();

        let txn = Transaction::transfer(dec!(5), bank, AccountId::new());
        engine.on_create(txn.clone()).unwrap();
        engine.on_delete(txn.id).unwrap();
        engine.reconcile(bank).unwrap();

        assert_eq!(engine.locks.tracked_accounts(), 0);
    }

    #[test]
    fn handle_uses_caller_supplied_before_values() {
        let engine = engine();
        let bank = engine
            .store()
            .insert_account(Account::asset("Bank", dec!(100)))
            .unwrap();
        let txn = Transaction::expense(dec!(40), bank);
        engine
            .handle(TransactionEvent::Created {
                transaction: txn.clone(),
            })
            .unwrap();

        let before = txn.values.clone();
        let mut after = txn;
        after.values.amount = dec!(10);
        engine
            .handle(TransactionEvent::Updated {
                before: Some(before),
                after,
            })
            .unwrap();

        assert_eq!(balance(&engine, bank), dec!(90));
    }

    #[test]
    fn reconcile_reports_no_drift_after_mixed_events() {
        let engine = engine();
        let bank = engine
            .store()
            .insert_account(Account::asset("Bank", dec!(1000)))
            .unwrap();
        let card = engine
            .store()
            .insert_account(Account::liability("Card", dec!(200)))
            .unwrap();

        engine.on_create(Transaction::expense(dec!(12.34), card)).unwrap();
        let pay = Transaction::transfer(dec!(150), bank, card);
        engine.on_create(pay.clone()).unwrap();
        engine.on_create(Transaction::income(dec!(99.99), bank)).unwrap();
        engine.on_delete(pay.id).unwrap();

        for id in [bank, card] {
            let check = engine.reconcile(id).unwrap();
            assert!(check.is_consistent(), "{check:?}");
        }
        assert_eq!(balance(&engine, card), dec!(212.34));
        assert_eq!(engine.metrics().events_processed, 4);
    }
}
