use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    common::*,
    ids::{AccountId, AccountRef, TransactionId},
};

/// Enumerates how a transaction moves money.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
}

/// Position an account occupies within a transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LegRole {
    Source,
    Destination,
}

/// The balance-relevant fields of a transaction.
///
/// This is the blob the balance engine reverses and applies; everything else a
/// transaction carries is irrelevant to account balances.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionValues {
    pub amount: Decimal,
    #[serde(rename = "transaction_kind")]
    pub kind: TransactionKind,
    #[serde(
        rename = "source_account_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub source: Option<AccountRef>,
    #[serde(
        rename = "dest_account_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub destination: Option<AccountRef>,
}

impl TransactionValues {
    pub fn new(kind: TransactionKind, amount: Decimal) -> Self {
        Self {
            amount,
            kind,
            source: None,
            destination: None,
        }
    }

    /// Legs that affect balances: the source when set, and the destination
    /// only for transfers. A transfer without destination is single-legged.
    pub fn legs(&self) -> impl Iterator<Item = (LegRole, &AccountRef)> + '_ {
        let source = self.source.as_ref().map(|r| (LegRole::Source, r));
        let destination = match self.kind {
            TransactionKind::Transfer => self.destination.as_ref().map(|r| (LegRole::Destination, r)),
            _ => None,
        };
        source.into_iter().chain(destination)
    }

    /// Well-formed account ids touched by the legs.
    pub fn account_ids(&self) -> Vec<AccountId> {
        self.legs().filter_map(|(_, reference)| reference.id()).collect()
    }

    pub fn references(&self, account: AccountId) -> bool {
        self.legs().any(|(_, reference)| reference.points_to(account))
    }
}

/// A recorded income, expense or transfer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub id: TransactionId,
    pub values: TransactionValues,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Transaction {
    pub fn new(kind: TransactionKind, amount: Decimal) -> Self {
        Self {
            id: TransactionId::new(),
            values: TransactionValues::new(kind, amount),
            description: None,
        }
    }

    pub fn expense(amount: Decimal, source: impl Into<AccountRef>) -> Self {
        Self::new(TransactionKind::Expense, amount).with_source(source)
    }

    pub fn income(amount: Decimal, source: impl Into<AccountRef>) -> Self {
        Self::new(TransactionKind::Income, amount).with_source(source)
    }

    pub fn transfer(
        amount: Decimal,
        source: impl Into<AccountRef>,
        destination: impl Into<AccountRef>,
    ) -> Self {
        Self::new(TransactionKind::Transfer, amount)
            .with_source(source)
            .with_destination(destination)
    }

    pub fn with_source(mut self, source: impl Into<AccountRef>) -> Self {
        self.values.source = Some(source.into());
        self
    }

    pub fn with_destination(mut self, destination: impl Into<AccountRef>) -> Self {
        self.values.destination = Some(destination.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn amount(&self) -> Decimal {
        self.values.amount
    }

    pub fn kind(&self) -> TransactionKind {
        self.values.kind
    }
}

impl Identifiable for Transaction {
    type Id = TransactionId;

    fn id(&self) -> TransactionId {
        self.id
    }
}

impl Displayable for Transaction {
    fn display_label(&self) -> String {
        format!("txn:{} [{:?} {}]", self.id, self.values.kind, self.values.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn destination_only_counts_for_transfers() {
        let a = AccountId::new();
        let b = AccountId::new();
        let expense = Transaction::expense(dec!(10), a).with_destination(b);
        let legs: Vec<_> = expense.values.legs().map(|(role, _)| role).collect();
        assert_eq!(legs, vec![LegRole::Source]);
        assert!(!expense.values.references(b));

        let transfer = Transaction::transfer(dec!(10), a, b);
        let legs: Vec<_> = transfer.values.legs().map(|(role, _)| role).collect();
        assert_eq!(legs, vec![LegRole::Source, LegRole::Destination]);
        assert_eq!(transfer.values.account_ids(), vec![a, b]);
    }

    #[test]
    fn transfer_without_destination_is_single_legged() {
        let a = AccountId::new();
        let transfer = Transaction::new(TransactionKind::Transfer, dec!(5)).with_source(a);
        assert_eq!(transfer.values.legs().count(), 1);
    }

    #[test]
    fn values_use_wire_field_names() {
        let a = AccountId::new();
        let values = Transaction::income(dec!(12.50), a).values;
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(json["transaction_kind"], "income");
        assert_eq!(json["source_account_id"], a.to_string());
        assert!(json.get("dest_account_id").is_none());
    }

    #[test]
    fn malformed_reference_survives_deserialization() {
        let json = r#"{"amount": "3.00", "transaction_kind": "expense", "source_account_id": "17"}"#;
        let values: TransactionValues = serde_json::from_str(json).unwrap();
        assert_eq!(values.source, Some(AccountRef::Malformed("17".into())));
        assert!(values.account_ids().is_empty());
    }
}
