use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use wallet_config::Config;
use wallet_core::{
    BalanceSync, CoreError, LedgerStore, MemoryLedger, PayoffComparison, PayoffPlanner,
    PayoffRequest, Reconciliation, SyncMetrics, SyncReport,
};
use wallet_domain::{Account, AccountId, AccountKind, Debt, Transaction, TransactionId};

use crate::errors::Result;

/// Application facade: owns the ledger, the balance engine and user settings.
///
/// Every transaction write goes through here so the balance update runs in
/// the same unit of work as the record itself.
pub struct WalletService {
    sync: BalanceSync<MemoryLedger>,
    config: Config,
}

impl WalletService {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_store(Arc::new(MemoryLedger::new()), config)
    }

    pub fn with_store(store: Arc<MemoryLedger>, config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sync: BalanceSync::new(store),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &BalanceSync<MemoryLedger> {
        &self.sync
    }

    pub fn open_account(&self, account: Account) -> Result<AccountId> {
        info!("opening {:?} account '{}'", account.kind, account.name);
        Ok(self.sync.store().insert_account(account)?)
    }

    /// Removes the account. Transactions still pointing at it become orphaned
    /// references and no longer move any balance for that leg.
    pub fn close_account(&self, id: AccountId) -> Result<Account> {
        let dangling = self.sync.store().transactions_referencing(id)?.len();
        let account = self.sync.store().remove_account(id)?;
        if dangling > 0 {
            warn!(
                "closed account '{}' with {} transaction(s) still referencing it",
                account.name, dangling
            );
        }
        Ok(account)
    }

    pub fn account(&self, id: AccountId) -> Result<Account> {
        Ok(self
            .sync
            .store()
            .account(id)?
            .ok_or(CoreError::AccountNotFound(id))?)
    }

    pub fn accounts(&self) -> Result<Vec<Account>> {
        Ok(self.sync.store().accounts()?)
    }

    pub fn record(&self, transaction: Transaction) -> Result<SyncReport> {
        Ok(self.sync.on_create(transaction)?)
    }

    pub fn amend(&self, transaction: Transaction) -> Result<SyncReport> {
        Ok(self.sync.on_update(transaction)?)
    }

    pub fn remove(&self, id: TransactionId) -> Result<SyncReport> {
        Ok(self.sync.on_delete(id)?)
    }

    pub fn reconcile(&self, id: AccountId) -> Result<Reconciliation> {
        Ok(self.sync.reconcile(id)?)
    }

    pub fn metrics(&self) -> SyncMetrics {
        self.sync.metrics()
    }

    /// Assets minus liabilities.
    pub fn net_position(&self) -> Result<Decimal> {
        Ok(self
            .accounts()?
            .iter()
            .map(|account| match account.kind {
                AccountKind::Asset => account.balance,
                AccountKind::Liability => -account.balance,
            })
            .sum())
    }

    /// Planner snapshots of every liability, in name order.
    pub fn debts(&self) -> Result<Vec<Debt>> {
        Ok(self
            .accounts()?
            .iter()
            .filter_map(Account::debt_snapshot)
            .collect())
    }

    /// Payoff projections for the current liabilities. `extra` falls back to
    /// the configured default extra payment.
    pub fn payoff_plans(&self, extra: Option<Decimal>) -> Result<PayoffComparison> {
        self.payoff_plans_on(extra, Utc::now().date_naive())
    }

    pub fn payoff_plans_on(
        &self,
        extra: Option<Decimal>,
        today: NaiveDate,
    ) -> Result<PayoffComparison> {
        let extra = extra.unwrap_or(self.config.default_extra_payment);
        let request = PayoffRequest::new(self.debts()?, extra);
        Ok(PayoffPlanner::plan_on(&request, today)?)
    }
}
