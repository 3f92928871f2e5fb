//! Cross-period series for dashboard charts.
//!
//! Repeats the period summary over a rolling window of months and derives
//! period-over-period deltas. All per-period math is delegated to
//! [`calculate_period_summary`]; this module only wires consecutive
//! periods together.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::db::models::{
    Account, AccountSnapshot, Debt, Expense, Income, Period, ProjectedIncome,
};
use crate::financials::currency::to_cop;
use crate::financials::returns::manual_projected_amount;
use crate::financials::summary::{calculate_period_summary, PeriodSummary};

/// One period's raw records, fully materialized by the caller.
#[derive(Debug, Clone)]
pub struct PeriodData {
    pub period: Period,
    pub incomes: Vec<Income>,
    pub expenses: Vec<Expense>,
    pub debts: Vec<Debt>,
    pub snapshots: Vec<AccountSnapshot>,
    pub projected_incomes: Vec<ProjectedIncome>,
}

impl PeriodData {
    /// An empty dataset for a period that was never recorded; summaries
    /// over it are all zeros.
    pub fn empty(period: Period) -> Self {
        PeriodData {
            period,
            incomes: Vec::new(),
            expenses: Vec::new(),
            debts: Vec::new(),
            snapshots: Vec::new(),
            projected_incomes: Vec::new(),
        }
    }
}

/// One point of the cross-period series.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesPoint {
    pub period_id: String,
    pub summary: PeriodSummary,
    /// Net capital delta against the preceding point; zero for the first
    /// point, whose "previous" is itself.
    pub real_income: Decimal,
    /// Manually stated income expectations for the period, in COP at the
    /// period's own rate. Reported alongside real income, never folded in.
    pub projected_income: Decimal,
}

/// Sum of the period's manual projected-income entries in COP. Rate-based
/// entries apply to the account's snapshot balance in the same period; a
/// missing snapshot or an unknown account contributes zero.
pub fn manual_projected_total(accounts: &[Account], data: &PeriodData) -> Decimal {
    let account_by_id: HashMap<&str, &Account> =
        accounts.iter().map(|a| (a.id.as_str(), a)).collect();
    let snapshot_by_account: HashMap<&str, &AccountSnapshot> = data
        .snapshots
        .iter()
        .map(|s| (s.account_id.as_str(), s))
        .collect();

    let mut total = Decimal::ZERO;
    for item in &data.projected_incomes {
        let Some(account) = account_by_id.get(item.account_id.as_str()) else {
            continue;
        };
        let balance = snapshot_by_account
            .get(item.account_id.as_str())
            .map(|s| s.balance)
            .unwrap_or(Decimal::ZERO);
        let amount = manual_projected_amount(item, balance);
        total += to_cop(amount, account.currency, &data.period);
    }
    total
}

/// Summarize every period in `window` (ordered oldest first) and derive
/// the period-over-period real income as `capital[t] - capital[t-1]`.
///
/// Each period's previous-period records are taken from the preceding
/// window element; the first element has no predecessor and uses empty
/// previous records.
pub fn build_series(accounts: &[Account], window: &[PeriodData]) -> Vec<SeriesPoint> {
    let mut points = Vec::with_capacity(window.len());
    let mut prev_capital: Option<Decimal> = None;

    for (index, data) in window.iter().enumerate() {
        let (prev_debts, prev_snapshots): (&[Debt], &[AccountSnapshot]) = if index > 0 {
            let prev = &window[index - 1];
            (&prev.debts, &prev.snapshots)
        } else {
            (&[], &[])
        };

        let summary = calculate_period_summary(
            &data.period,
            &data.incomes,
            &data.expenses,
            &data.debts,
            prev_debts,
            accounts,
            &data.snapshots,
            prev_snapshots,
        );

        let real_income = match prev_capital {
            Some(prev) => summary.capital_total - prev,
            None => Decimal::ZERO,
        };
        prev_capital = Some(summary.capital_total);

        points.push(SeriesPoint {
            period_id: data.period.id.clone(),
            summary,
            real_income,
            projected_income: manual_projected_total(accounts, data),
        });
    }

    points
}
