//! Shared traits and money helpers for wallet primitives.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits used when money leaves the core.
pub const MONEY_SCALE: u32 = 2;

/// Exposes a stable identifier for entities held by the ledger store.
pub trait Identifiable {
    type Id: Copy + Eq;

    fn id(&self) -> Self::Id;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Rounds a money value to cents using banker's rounding.
///
/// Only presentation and summary values go through here; running balances
/// keep their full precision.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn round_money_uses_bankers_rounding() {
        assert_eq!(round_money(dec!(2.345)), dec!(2.34));
        assert_eq!(round_money(dec!(2.355)), dec!(2.36));
        assert_eq!(round_money(dec!(47833.333333)), dec!(47833.33));
    }
}
