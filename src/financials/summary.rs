//! Period summary aggregation.
//!
//! Folds one period's raw records (plus the previous period's snapshots and
//! debts) into a single consistent set of aggregates. Pure and total over
//! well-formed inputs: missing previous balances, unset FX rates, absent
//! projected rates and orphaned snapshots are steady-state situations
//! handled with zero/None substitutes, never errors.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::db::models::{Account, AccountSnapshot, Currency, Debt, Expense, Income, Period};
use crate::financials::categories::{is_capital_eligible, is_liquid};
use crate::financials::currency::{rate_available, to_cop};
use crate::financials::debt::net_debt_total;
use crate::financials::returns::{projected_return, real_return};

/// The derived aggregates for one period, all in COP.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodSummary {
    pub income_total: Decimal,
    pub income_salary: Decimal,
    /// Manual non-salary incomes plus observed account returns
    pub income_non_salary_real: Decimal,
    /// Returns implied by stated annual rates; reported separately, never
    /// folded into realized totals
    pub income_non_salary_projected: Decimal,
    pub expenses_total: Decimal,
    pub balance: Decimal,
    pub balance_without_salary: Decimal,
    pub debt_total: Decimal,
    pub liquid_total: Decimal,
    /// Net capital: capital-eligible balances minus net debt
    pub capital_total: Decimal,
    /// Flow/stock reconciliation gap, floored at zero
    pub unspecified_expense: Decimal,
    /// True when any foreign amount could not be converted because the
    /// period's rate is unset; the affected amounts contributed zero
    pub fx_incomplete: bool,
}

/// Tracks conversion completeness while delegating to [`to_cop`].
struct Converter<'a> {
    period: &'a Period,
    incomplete: bool,
}

impl<'a> Converter<'a> {
    fn new(period: &'a Period) -> Self {
        Converter {
            period,
            incomplete: false,
        }
    }

    fn convert(&mut self, amount: Decimal, currency: Currency) -> Decimal {
        if !rate_available(currency, self.period) {
            self.incomplete = true;
        }
        to_cop(amount, currency, self.period)
    }
}

/// Derive the period's summary from its raw records.
///
/// `prev_snapshots` feed the real-return and savings-stock calculations;
/// `prev_debts` only feed the previous net-capital comparison, never this
/// period's own debt total. Previous-period balances are converted at the
/// **current** period's rate for a like-for-like capital comparison.
pub fn calculate_period_summary(
    period: &Period,
    incomes: &[Income],
    expenses: &[Expense],
    debts: &[Debt],
    prev_debts: &[Debt],
    accounts: &[Account],
    snapshots: &[AccountSnapshot],
    prev_snapshots: &[AccountSnapshot],
) -> PeriodSummary {
    let mut fx = Converter::new(period);

    // 1. Incomes, partitioned salary / non-salary
    let mut income_salary = Decimal::ZERO;
    let mut manual_non_salary = Decimal::ZERO;
    for income in incomes {
        let value = fx.convert(income.amount, income.currency);
        if income.is_salary {
            income_salary += value;
        } else {
            manual_non_salary += value;
        }
    }

    // 2. Per-account returns. Keyed lookups built once per call; an
    // orphaned snapshot (no matching account) is skipped, not fatal.
    let account_by_id: HashMap<&str, &Account> =
        accounts.iter().map(|a| (a.id.as_str(), a)).collect();
    let prev_snapshot_by_account: HashMap<&str, &AccountSnapshot> = prev_snapshots
        .iter()
        .map(|s| (s.account_id.as_str(), s))
        .collect();

    let mut real_returns_total = Decimal::ZERO;
    let mut projected_returns_total = Decimal::ZERO;
    for snapshot in snapshots {
        let Some(account) = account_by_id.get(snapshot.account_id.as_str()) else {
            continue;
        };

        let previous = prev_snapshot_by_account
            .get(snapshot.account_id.as_str())
            .map(|s| s.balance);
        let real = real_return(snapshot.balance, previous);
        real_returns_total += fx.convert(real.monthly_return, account.currency);

        if let Some(annual_rate) = snapshot.effective_annual_rate_projected {
            let projected = projected_return(snapshot.balance, annual_rate);
            projected_returns_total += fx.convert(projected.monthly_return, account.currency);
        }
    }

    // 3. Income totals
    let income_non_salary_real = manual_non_salary + real_returns_total;
    let income_total = income_salary + income_non_salary_real;

    // 4. Expenses
    let mut expenses_total = Decimal::ZERO;
    for expense in expenses {
        expenses_total += fx.convert(expense.amount, expense.currency);
    }

    // 5. Balances
    let balance = income_total - expenses_total;
    let balance_without_salary = income_non_salary_real - expenses_total;

    // 6. Debt. Previous-period debts feed only the net-capital comparison.
    let debt_total = net_debt_total(debts, period);
    let prev_debt_total = net_debt_total(prev_debts, period);

    // 7. Liquid & gross capital; a snapshot may contribute to both buckets.
    let mut liquid_total = Decimal::ZERO;
    let mut capital_total_gross = Decimal::ZERO;
    for snapshot in snapshots {
        let Some(account) = account_by_id.get(snapshot.account_id.as_str()) else {
            continue;
        };
        let value = fx.convert(snapshot.balance, account.currency);
        if is_liquid(account) {
            liquid_total += value;
        }
        if is_capital_eligible(account) {
            capital_total_gross += value;
        }
    }

    // 8. Previous gross capital, converted at this period's rate
    let mut prev_capital_total_gross = Decimal::ZERO;
    for snapshot in prev_snapshots {
        let Some(account) = account_by_id.get(snapshot.account_id.as_str()) else {
            continue;
        };
        if is_capital_eligible(account) {
            prev_capital_total_gross += fx.convert(snapshot.balance, account.currency);
        }
    }

    // 9. Net capital
    let net_capital_total = capital_total_gross - debt_total;
    let net_prev_capital_total = prev_capital_total_gross - prev_debt_total;

    // 10. Flow savings (income - expenses) vs stock savings (net-worth delta)
    let savings_flow = income_total - expenses_total;
    let savings_stock = net_capital_total - net_prev_capital_total;

    // 11. Leakage: flow the stock never showed. Negative leakage means the
    // stock grew faster than recorded flow, which is not unrecorded
    // spending, so it reports as zero.
    let leakage = savings_flow - savings_stock;
    let unspecified_expense = leakage.max(Decimal::ZERO);

    PeriodSummary {
        income_total,
        income_salary,
        income_non_salary_real,
        income_non_salary_projected: projected_returns_total,
        expenses_total,
        balance,
        balance_without_salary,
        debt_total,
        liquid_total,
        capital_total: net_capital_total,
        unspecified_expense,
        fx_incomplete: fx.incomplete,
    }
}
