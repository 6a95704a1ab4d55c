//! Sign convention linking transactions to account balances.

use rust_decimal::Decimal;
use wallet_domain::{Account, AccountKind, LegRole, Transaction, TransactionKind, TransactionValues};

/// Whether an effect is being applied or undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Apply,
    Reverse,
}

impl Direction {
    fn sign(self) -> Decimal {
        match self {
            Direction::Apply => Decimal::ONE,
            Direction::Reverse => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Change in balance caused by one leg of a transaction of `amount`.
///
/// | account   | kind     | role        | effect |
/// |-----------|----------|-------------|--------|
/// | asset     | expense  | source      | −amt   |
/// | asset     | income   | source      | +amt   |
/// | asset     | transfer | source      | −amt   |
/// | asset     | transfer | destination | +amt   |
/// | liability | expense  | source      | +amt   |
/// | liability | income   | source      | −amt   |
/// | liability | transfer | source      | +amt   |
/// | liability | transfer | destination | −amt   |
///
/// A destination leg on a non-transfer never reaches this function; it is
/// ignored by [`TransactionValues::legs`].
pub fn signed_effect(
    account: AccountKind,
    kind: TransactionKind,
    role: LegRole,
    amount: Decimal,
) -> Decimal {
    let outflow = match (kind, role) {
        (TransactionKind::Expense, _) => true,
        (TransactionKind::Income, _) => false,
        (TransactionKind::Transfer, LegRole::Source) => true,
        (TransactionKind::Transfer, LegRole::Destination) => false,
    };
    // Money leaving an asset lowers it; money "leaving" a liability is new debt.
    match (account, outflow) {
        (AccountKind::Asset, true) | (AccountKind::Liability, false) => -amount,
        (AccountKind::Asset, false) | (AccountKind::Liability, true) => amount,
    }
}

/// Signed effect of one leg in the requested direction.
pub fn leg_delta(
    account: AccountKind,
    values: &TransactionValues,
    role: LegRole,
    direction: Direction,
) -> Decimal {
    signed_effect(account, values.kind, role, values.amount) * direction.sign()
}

/// Net contribution of a transaction to one account, summed over every leg
/// pointing at it.
pub fn contribution(account: &Account, values: &TransactionValues) -> Decimal {
    values
        .legs()
        .filter(|(_, reference)| reference.points_to(account.id))
        .map(|(role, _)| signed_effect(account.kind, values.kind, role, values.amount))
        .sum()
}

/// Replays `transactions` on top of the account's opening balance.
pub fn replay<'a>(account: &Account, transactions: impl IntoIterator<Item = &'a Transaction>) -> Decimal {
    transactions
        .into_iter()
        .fold(account.opening_balance, |balance, txn| {
            balance + contribution(account, &txn.values)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn table_matches_sign_convention() {
        use AccountKind::*;
        use LegRole::*;
        use TransactionKind::*;

        let amt = dec!(100);
        let rows = [
            (Asset, Expense, Source, dec!(-100)),
            (Asset, Income, Source, dec!(100)),
            (Asset, Transfer, Source, dec!(-100)),
            (Asset, Transfer, Destination, dec!(100)),
            (Liability, Expense, Source, dec!(100)),
            (Liability, Income, Source, dec!(-100)),
            (Liability, Transfer, Source, dec!(100)),
            (Liability, Transfer, Destination, dec!(-100)),
        ];
        for (account, kind, role, expected) in rows {
            assert_eq!(
                signed_effect(account, kind, role, amt),
                expected,
                "{account:?} {kind:?} {role:?}"
            );
        }
    }

    #[test]
    fn reverse_negates_apply() {
        let values = Transaction::expense(dec!(42.10), wallet_domain::AccountId::new()).values;
        let applied = leg_delta(AccountKind::Liability, &values, LegRole::Source, Direction::Apply);
        let reversed = leg_delta(AccountKind::Liability, &values, LegRole::Source, Direction::Reverse);
        assert_eq!(applied + reversed, Decimal::ZERO);
    }

    #[test]
    fn self_transfer_nets_to_zero() {
        let account = Account::asset("Wallet", dec!(50));
        let values = Transaction::transfer(dec!(20), account.id, account.id).values;
        assert_eq!(contribution(&account, &values), Decimal::ZERO);
    }

    #[test]
    fn replay_starts_from_opening_balance() {
        let account = Account::asset("Bank", dec!(1000));
        let txns = vec![
            Transaction::expense(dec!(100), account.id),
            Transaction::income(dec!(40), account.id),
        ];
        assert_eq!(replay(&account, &txns), dec!(940));
    }
}
