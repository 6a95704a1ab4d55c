use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{common::*, ids::AccountId};

/// Read-only liability snapshot consumed by the payoff planner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Debt {
    /// Fresh id when absent from the input.
    #[serde(default)]
    pub id: AccountId,
    pub name: String,
    /// Current amount owed.
    pub balance: Decimal,
    /// Annual rate in percent, e.g. 20 = 20%/yr.
    #[serde(default)]
    pub annual_interest_rate: Decimal,
    /// Absent or zero means the planner synthesizes one.
    #[serde(default)]
    pub minimum_payment: Option<Decimal>,
}

impl Debt {
    pub fn new(name: impl Into<String>, balance: Decimal, annual_interest_rate: Decimal) -> Self {
        Self {
            id: AccountId::new(),
            name: name.into(),
            balance,
            annual_interest_rate,
            minimum_payment: None,
        }
    }

    pub fn with_minimum_payment(mut self, minimum_payment: Decimal) -> Self {
        self.minimum_payment = Some(minimum_payment);
        self
    }
}

impl Identifiable for Debt {
    type Id = AccountId;

    fn id(&self) -> AccountId {
        self.id
    }
}

impl NamedEntity for Debt {
    fn name(&self) -> &str {
        &self.name
    }
}
