//! Debt Payoff Planner: month-by-month amortization under snowball and
//! avalanche ordering.
//!
//! Running balances are kept at full decimal precision for the whole
//! simulation; only the reported figures are rounded to cents.

use std::cmp::Ordering;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wallet_domain::{round_money, AccountId, Debt};

use crate::{CoreError, CoreResult};

/// Hard bound on simulated months (30 years).
pub const MAX_MONTHS: u32 = 360;
/// Balances at or below this are considered paid off.
pub const PAID_OFF_THRESHOLD: Decimal = dec!(0.01);
const MINIMUM_PAYMENT_FLOOR: Decimal = dec!(10.00);
const MINIMUM_PAYMENT_RATE: Decimal = dec!(0.02);
/// `payoff_date` approximates a month as 30 days.
const DAYS_PER_MONTH: i64 = 30;
/// Largest worst-case outstanding balance accepted, well inside `Decimal`'s range.
const GROWTH_LIMIT: f64 = 1e25;

/// Payment ordering strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Smallest balance first.
    Snowball,
    /// Highest annual rate first.
    Avalanche,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Snowball, Strategy::Avalanche];

    /// Puts debts in the order this strategy targets them. Ties keep input order.
    fn arrange(self, debts: &mut [DebtState]) {
        debts.sort_by(|a, b| self.compare(a, b));
    }

    fn compare(self, a: &DebtState, b: &DebtState) -> Ordering {
        match self {
            Strategy::Snowball => a.balance.cmp(&b.balance),
            Strategy::Avalanche => b.annual_rate.cmp(&a.annual_rate),
        }
    }
}

/// Planner input: debt snapshots plus money available above the minimums.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PayoffRequest {
    pub debts: Vec<Debt>,
    #[serde(default)]
    pub extra_monthly_payment: Decimal,
}

impl PayoffRequest {
    pub fn new(debts: Vec<Debt>, extra_monthly_payment: Decimal) -> Self {
        Self {
            debts,
            extra_monthly_payment,
        }
    }

    /// Rejects input the simulation cannot run on. Nothing is simulated when
    /// this fails.
    pub fn validate(&self) -> CoreResult<()> {
        if self.extra_monthly_payment < Decimal::ZERO {
            return Err(CoreError::Validation(format!(
                "extra monthly payment must not be negative, got {}",
                self.extra_monthly_payment
            )));
        }
        for debt in &self.debts {
            if debt.annual_interest_rate < Decimal::ZERO {
                return Err(CoreError::Validation(format!(
                    "debt '{}' has a negative interest rate",
                    debt.name
                )));
            }
            if debt.minimum_payment.is_some_and(|min| min < Decimal::ZERO) {
                return Err(CoreError::Validation(format!(
                    "debt '{}' has a negative minimum payment",
                    debt.name
                )));
            }
        }

        if self.checked_budget().is_none() {
            return Err(CoreError::Validation(
                "minimum payments plus the extra payment are too large to simulate".into(),
            ));
        }

        let worst_case: f64 = self
            .debts
            .iter()
            .map(|debt| {
                let balance = debt.balance.max(Decimal::ZERO).to_f64().unwrap_or(f64::INFINITY);
                let rate = debt.annual_interest_rate.to_f64().unwrap_or(f64::INFINITY);
                balance * (1.0 + rate / 1200.0).powi(MAX_MONTHS as i32)
            })
            .sum();
        if !(worst_case < GROWTH_LIMIT) {
            return Err(CoreError::Validation(
                "balances and rates are too large to simulate".into(),
            ));
        }
        Ok(())
    }

    /// Fixed monthly budget: every (synthesized) minimum plus the extra payment.
    ///
    /// Saturates at `Decimal::MAX`; [`Self::validate`] rejects such requests.
    pub fn monthly_budget(&self) -> Decimal {
        self.checked_budget().unwrap_or(Decimal::MAX)
    }

    fn checked_budget(&self) -> Option<Decimal> {
        self.debts
            .iter()
            .try_fold(self.extra_monthly_payment, |total, debt| {
                total.checked_add(effective_minimum(debt))
            })
    }
}

/// Minimum payment the simulation uses for `debt`.
///
/// A missing or zero minimum on a debt with a positive balance becomes
/// `max(10.00, 2% of balance)`.
pub fn effective_minimum(debt: &Debt) -> Decimal {
    let stated = debt.minimum_payment.unwrap_or_default();
    if stated.is_zero() && debt.balance > Decimal::ZERO {
        MINIMUM_PAYMENT_FLOOR.max(debt.balance * MINIMUM_PAYMENT_RATE)
    } else {
        stated
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebtProgress {
    pub name: String,
    pub balance: Decimal,
    pub paid: Decimal,
}

/// One simulated month. `debts` follows the strategy order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEntry {
    pub month: u32,
    pub total_balance: Decimal,
    pub debts: Vec<DebtProgress>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebtSummary {
    pub id: AccountId,
    pub name: String,
    pub minimum_payment: Decimal,
    pub interest_paid: Decimal,
    /// Month the balance first reached the paid-off threshold; `Some(0)` for
    /// debts that started paid off, `None` if the cap stopped the run first.
    pub paid_off_month: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanResult {
    pub strategy: Strategy,
    pub months_to_payoff: u32,
    pub total_interest_paid: Decimal,
    /// `today + 30 × months` days; not calendar-month arithmetic.
    pub payoff_date: NaiveDate,
    pub monthly_budget: Decimal,
    pub capped: bool,
    pub debts: Vec<DebtSummary>,
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayoffComparison {
    pub snowball: PlanResult,
    pub avalanche: PlanResult,
}

impl PayoffComparison {
    pub fn get(&self, strategy: Strategy) -> &PlanResult {
        match strategy {
            Strategy::Snowball => &self.snowball,
            Strategy::Avalanche => &self.avalanche,
        }
    }

    /// Interest avalanche saves over snowball (negative if it costs more).
    pub fn interest_saved_by_avalanche(&self) -> Decimal {
        self.snowball.total_interest_paid - self.avalanche.total_interest_paid
    }
}

#[derive(Debug, Clone)]
struct DebtState {
    id: AccountId,
    name: String,
    balance: Decimal,
    annual_rate: Decimal,
    monthly_rate: Decimal,
    minimum_payment: Decimal,
    interest_paid: Decimal,
    paid_this_month: Decimal,
    paid_off_month: Option<u32>,
}

impl DebtState {
    fn from_debt(debt: &Debt) -> Self {
        let balance = debt.balance.max(Decimal::ZERO);
        Self {
            id: debt.id,
            name: debt.name.clone(),
            balance,
            annual_rate: debt.annual_interest_rate,
            monthly_rate: debt.annual_interest_rate / dec!(100) / dec!(12),
            minimum_payment: effective_minimum(debt),
            interest_paid: Decimal::ZERO,
            paid_this_month: Decimal::ZERO,
            paid_off_month: (balance <= PAID_OFF_THRESHOLD).then_some(0),
        }
    }

    fn is_active(&self) -> bool {
        self.balance > Decimal::ZERO
    }

    fn accrue(&mut self) -> Decimal {
        self.paid_this_month = Decimal::ZERO;
        if !self.is_active() {
            return Decimal::ZERO;
        }
        let interest = self.balance * self.monthly_rate;
        self.balance += interest;
        self.interest_paid += interest;
        interest
    }

    /// Pays up to `limit` and returns the amount actually paid.
    fn pay(&mut self, limit: Decimal) -> Decimal {
        if !self.is_active() || limit <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let payment = limit.min(self.balance);
        self.balance -= payment;
        self.paid_this_month += payment;
        payment
    }
}

/// Stateless entry point for payoff projections.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayoffPlanner;

impl PayoffPlanner {
    /// Plans both strategies with payoff dates counted from today (UTC).
    pub fn plan(request: &PayoffRequest) -> CoreResult<PayoffComparison> {
        Self::plan_on(request, Utc::now().date_naive())
    }

    pub fn plan_on(request: &PayoffRequest, today: NaiveDate) -> CoreResult<PayoffComparison> {
        request.validate()?;
        let budget = request.monthly_budget();
        let prepared: Vec<DebtState> = request.debts.iter().map(DebtState::from_debt).collect();
        Ok(PayoffComparison {
            snowball: simulate(prepared.clone(), budget, Strategy::Snowball, today)?,
            avalanche: simulate(prepared, budget, Strategy::Avalanche, today)?,
        })
    }

    /// Runs a single strategy.
    pub fn simulate(
        request: &PayoffRequest,
        strategy: Strategy,
        today: NaiveDate,
    ) -> CoreResult<PlanResult> {
        request.validate()?;
        let prepared = request.debts.iter().map(DebtState::from_debt).collect();
        simulate(prepared, request.monthly_budget(), strategy, today)
    }
}

fn simulate(
    mut debts: Vec<DebtState>,
    budget: Decimal,
    strategy: Strategy,
    today: NaiveDate,
) -> CoreResult<PlanResult> {
    strategy.arrange(&mut debts);

    let mut month = 0u32;
    let mut total_interest = Decimal::ZERO;
    let mut timeline = Vec::new();

    while month < MAX_MONTHS && debts.iter().any(|d| d.balance > PAID_OFF_THRESHOLD) {
        month += 1;
        let mut remaining = budget;

        for debt in debts.iter_mut() {
            total_interest += debt.accrue();
        }
        for debt in debts.iter_mut() {
            let due = debt.minimum_payment.min(remaining);
            remaining -= debt.pay(due);
        }
        for debt in debts.iter_mut() {
            if remaining <= Decimal::ZERO {
                break;
            }
            remaining -= debt.pay(remaining);
        }

        let mut total_balance = Decimal::ZERO;
        let mut progress = Vec::with_capacity(debts.len());
        for debt in debts.iter_mut() {
            if debt.paid_off_month.is_none() && debt.balance <= PAID_OFF_THRESHOLD {
                debt.paid_off_month = Some(month);
            }
            total_balance += debt.balance;
            progress.push(DebtProgress {
                name: debt.name.clone(),
                balance: round_money(debt.balance),
                paid: round_money(debt.paid_this_month),
            });
        }
        timeline.push(TimelineEntry {
            month,
            total_balance: round_money(total_balance),
            debts: progress,
        });
    }

    let capped = debts.iter().any(|d| d.balance > PAID_OFF_THRESHOLD);
    if capped {
        warn!(
            "{:?} plan stopped at the {} month cap with balance remaining; budget {} does not amortize the debt",
            strategy, MAX_MONTHS, budget
        );
    }
    debug!(
        "{:?} plan: {} month(s), interest {}",
        strategy,
        month,
        round_money(total_interest)
    );

    let payoff_date = today
        .checked_add_signed(Duration::days(DAYS_PER_MONTH * i64::from(month)))
        .ok_or_else(|| CoreError::Validation("payoff date is out of range".into()))?;

    Ok(PlanResult {
        strategy,
        months_to_payoff: month,
        total_interest_paid: round_money(total_interest),
        payoff_date,
        monthly_budget: round_money(budget),
        capped,
        debts: debts
            .into_iter()
            .map(|d| DebtSummary {
                id: d.id,
                name: d.name,
                minimum_payment: round_money(d.minimum_payment),
                interest_paid: round_money(d.interest_paid),
                paid_off_month: d.paid_off_month,
            })
            .collect(),
        timeline,
    })
}
