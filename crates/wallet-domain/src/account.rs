use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{common::*, debt::Debt, ids::AccountId};

/// Represents an asset or liability whose balance is derived from transactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub kind: AccountKind,
    /// Value held for assets, amount owed for liabilities.
    pub balance: Decimal,
    /// Balance the account was opened with, before any transaction applied.
    #[serde(default)]
    pub opening_balance: Decimal,
    /// Annual interest rate in percent (20 = 20%/yr). Liabilities only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_payment: Option<Decimal>,
}

impl Account {
    /// Creates a new account whose balance starts at `opening_balance`.
    pub fn new(name: impl Into<String>, kind: AccountKind, opening_balance: Decimal) -> Self {
        Self {
            id: AccountId::new(),
            name: name.into(),
            kind,
            balance: opening_balance,
            opening_balance,
            interest_rate: None,
            minimum_payment: None,
        }
    }

    pub fn asset(name: impl Into<String>, opening_balance: Decimal) -> Self {
        Self::new(name, AccountKind::Asset, opening_balance)
    }

    pub fn liability(name: impl Into<String>, opening_balance: Decimal) -> Self {
        Self::new(name, AccountKind::Liability, opening_balance)
    }

    /// Attaches repayment terms used when the liability is fed to the planner.
    pub fn with_terms(mut self, interest_rate: Decimal, minimum_payment: Option<Decimal>) -> Self {
        self.interest_rate = Some(interest_rate);
        self.minimum_payment = minimum_payment;
        self
    }

    pub fn is_liability(&self) -> bool {
        self.kind == AccountKind::Liability
    }

    /// Snapshot of a liability as planner input. Assets yield `None`.
    pub fn debt_snapshot(&self) -> Option<Debt> {
        if !self.is_liability() {
            return None;
        }
        Some(Debt {
            id: self.id,
            name: self.name.clone(),
            balance: self.balance,
            annual_interest_rate: self.interest_rate.unwrap_or_default(),
            minimum_payment: self.minimum_payment,
        })
    }
}

impl Identifiable for Account {
    type Id = AccountId;

    fn id(&self) -> AccountId {
        self.id
    }
}

impl NamedEntity for Account {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Account {
    fn display_label(&self) -> String {
        format!("{} ({:?})", self.name, self.kind)
    }
}

/// Enumerates the supported account classifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Asset,
    Liability,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn new_account_starts_at_opening_balance() {
        let account = Account::asset("Bank", dec!(1000.00));
        assert_eq!(account.balance, dec!(1000.00));
        assert_eq!(account.opening_balance, dec!(1000.00));
        assert_eq!(account.display_label(), "Bank (Asset)");
    }

    #[test]
    fn only_liabilities_produce_debt_snapshots() {
        let card = Account::liability("Visa", dec!(500)).with_terms(dec!(20), Some(dec!(25)));
        let debt = card.debt_snapshot().expect("liability snapshot");
        assert_eq!(debt.id, card.id);
        assert_eq!(debt.balance, dec!(500));
        assert_eq!(debt.annual_interest_rate, dec!(20));
        assert_eq!(debt.minimum_payment, Some(dec!(25)));

        assert!(Account::asset("Cash", dec!(10)).debt_snapshot().is_none());
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&AccountKind::Liability).unwrap();
        assert_eq!(json, "\"liability\"");
    }
}
