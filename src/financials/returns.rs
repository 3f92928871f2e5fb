//! Monthly return figures, projected and real.
//!
//! Projected returns come from a stated effective annual rate on a
//! snapshot; real returns come from comparing consecutive snapshots of the
//! same account. Both work on raw balances in the account's own currency;
//! conversion to COP happens at the aggregation layer.

use rust_decimal::{Decimal, MathematicalOps};

use crate::db::models::{ProjectedIncome, ProjectedIncomeKind};

/// Result of projecting one month of return from an effective annual rate.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedReturn {
    /// Equivalent monthly rate, decimal (0.01 = 1%)
    pub monthly_rate: Decimal,
    pub end_balance: Decimal,
    pub monthly_return: Decimal,
}

/// Observed return between two consecutive snapshots of an account.
#[derive(Debug, Clone, PartialEq)]
pub struct RealReturn {
    /// Absolute return (B_t - B_{t-1}); zero on an account's first period
    pub monthly_return: Decimal,
    /// None when there is no positive previous balance to base a rate on
    pub monthly_rate: Option<Decimal>,
    /// Annualized equivalent of `monthly_rate`
    pub annual_rate: Option<Decimal>,
}

/// Project one month of return on `balance` from an effective annual rate
/// given as a decimal (0.12 = 12% EA), via `(1 + ea)^(1/12) - 1`.
///
/// Rates below -100% EA have no real monthly equivalent; they yield the
/// all-zero result instead of an error.
pub fn projected_return(balance: Decimal, annual_rate: Decimal) -> ProjectedReturn {
    let base = Decimal::ONE + annual_rate;
    if base < Decimal::ZERO {
        return ProjectedReturn {
            monthly_rate: Decimal::ZERO,
            end_balance: balance,
            monthly_return: Decimal::ZERO,
        };
    }

    let monthly_rate = base.powf(1.0 / 12.0) - Decimal::ONE;
    let end_balance = balance * (Decimal::ONE + monthly_rate);
    ProjectedReturn {
        monthly_rate,
        end_balance,
        monthly_return: end_balance - balance,
    }
}

/// Expected monthly amount of a manual projected-income entry, given the
/// linked account's snapshot balance for the same period.
///
/// Unlike snapshot rates, these entries state rates in percent (12 = 12%
/// EA). A missing figure computes as zero rather than failing: a manual
/// expectation must never break the series.
pub fn manual_projected_amount(item: &ProjectedIncome, balance: Decimal) -> Decimal {
    match item.kind {
        ProjectedIncomeKind::Salary => item.amount.unwrap_or(Decimal::ZERO),
        ProjectedIncomeKind::FixedEa => {
            let ea = item.rate_ea.unwrap_or(Decimal::ZERO) / Decimal::ONE_HUNDRED;
            let base = Decimal::ONE + ea;
            if base < Decimal::ZERO {
                return Decimal::ZERO;
            }
            balance * (base.powf(1.0 / 12.0) - Decimal::ONE)
        }
        ProjectedIncomeKind::VariableMonthly => {
            balance * item.rate_monthly.unwrap_or(Decimal::ZERO) / Decimal::ONE_HUNDRED
        }
    }
}

/// Observed monthly return of an account given its current balance and the
/// previous period's balance, if one exists.
///
/// No previous snapshot (the account's first recorded period) means there
/// is no basis for a return: the absolute return is zero and the rates are
/// None. Rates are also None when the previous balance is zero or negative;
/// a rate on that base is meaningless and must not surface as infinity.
pub fn real_return(current_balance: Decimal, previous_balance: Option<Decimal>) -> RealReturn {
    let Some(previous) = previous_balance else {
        return RealReturn {
            monthly_return: Decimal::ZERO,
            monthly_rate: None,
            annual_rate: None,
        };
    };

    let monthly_return = current_balance - previous;

    if previous > Decimal::ZERO {
        let monthly_rate = current_balance / previous - Decimal::ONE;
        let annual_rate = (Decimal::ONE + monthly_rate).powi(12) - Decimal::ONE;
        RealReturn {
            monthly_return,
            monthly_rate: Some(monthly_rate),
            annual_rate: Some(annual_rate),
        }
    } else {
        RealReturn {
            monthly_return,
            monthly_rate: None,
            annual_rate: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn assert_close(actual: Decimal, expected: Decimal, tolerance: Decimal) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} +/- {tolerance}, got {actual}"
        );
    }

    #[test]
    fn test_projected_return_twelve_percent_ea() {
        // (1.12)^(1/12) - 1 = 0.009489 monthly
        let result = projected_return(dec!(1000000), dec!(0.12));
        assert_close(result.monthly_rate, dec!(0.009489), dec!(0.000001));
        assert_close(result.monthly_return, dec!(9489), dec!(1));
        assert_eq!(result.end_balance - dec!(1000000), result.monthly_return);
    }

    #[test]
    fn test_projected_return_zero_rate_is_zero_return() {
        let result = projected_return(dec!(1000000), Decimal::ZERO);
        assert_eq!(result.monthly_rate, Decimal::ZERO);
        assert_eq!(result.monthly_return, Decimal::ZERO);
        assert_eq!(result.end_balance, dec!(1000000));
    }

    #[test]
    fn test_projected_return_negative_rate() {
        // -12% EA shrinks the balance every month
        let result = projected_return(dec!(1000000), dec!(-0.12));
        assert!(result.monthly_rate < Decimal::ZERO);
        assert!(result.monthly_return < Decimal::ZERO);
        assert!(result.end_balance < dec!(1000000));
    }

    #[test]
    fn test_projected_return_below_total_loss_yields_zero() {
        let result = projected_return(dec!(1000000), dec!(-1.5));
        assert_eq!(result.monthly_rate, Decimal::ZERO);
        assert_eq!(result.monthly_return, Decimal::ZERO);
        assert_eq!(result.end_balance, dec!(1000000));
    }

    fn entry(kind: ProjectedIncomeKind) -> ProjectedIncome {
        ProjectedIncome {
            id: "proj-1".to_string(),
            period_id: "2024-05".to_string(),
            account_id: "a1".to_string(),
            entity_id: None,
            concept: "test".to_string(),
            kind,
            rate_ea: None,
            rate_monthly: None,
            amount: None,
            is_recurring: false,
            notes: None,
        }
    }

    #[test]
    fn test_manual_projected_salary_ignores_balance() {
        let item = ProjectedIncome {
            amount: Some(dec!(5000000)),
            ..entry(ProjectedIncomeKind::Salary)
        };
        assert_eq!(manual_projected_amount(&item, Decimal::ZERO), dec!(5000000));
        assert_eq!(manual_projected_amount(&item, dec!(999)), dec!(5000000));
    }

    #[test]
    fn test_manual_projected_fixed_ea_is_percent_based() {
        // 12 (percent) EA on 1,000,000 -> ~9,489 monthly
        let item = ProjectedIncome {
            rate_ea: Some(dec!(12)),
            ..entry(ProjectedIncomeKind::FixedEa)
        };
        let amount = manual_projected_amount(&item, dec!(1000000));
        assert_close(amount, dec!(9489), dec!(1));
    }

    #[test]
    fn test_manual_projected_variable_monthly() {
        let item = ProjectedIncome {
            rate_monthly: Some(dec!(1.5)),
            ..entry(ProjectedIncomeKind::VariableMonthly)
        };
        assert_eq!(manual_projected_amount(&item, dec!(1000000)), dec!(15000));
    }

    #[test]
    fn test_manual_projected_missing_figures_compute_zero() {
        assert_eq!(
            manual_projected_amount(&entry(ProjectedIncomeKind::Salary), dec!(1000000)),
            Decimal::ZERO
        );
        assert_eq!(
            manual_projected_amount(&entry(ProjectedIncomeKind::FixedEa), dec!(1000000)),
            Decimal::ZERO
        );
        assert_eq!(
            manual_projected_amount(&entry(ProjectedIncomeKind::VariableMonthly), dec!(1000000)),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_real_return_without_previous_balance() {
        let result = real_return(dec!(1000000), None);
        assert_eq!(result.monthly_return, Decimal::ZERO);
        assert_eq!(result.monthly_rate, None);
        assert_eq!(result.annual_rate, None);
    }

    #[test]
    fn test_real_return_flat_balance() {
        let result = real_return(dec!(1000000), Some(dec!(1000000)));
        assert_eq!(result.monthly_return, Decimal::ZERO);
        assert_eq!(result.monthly_rate, Some(Decimal::ZERO));
        assert_eq!(result.annual_rate, Some(Decimal::ZERO));
    }

    #[test]
    fn test_real_return_with_growth() {
        let result = real_return(dec!(1100000), Some(dec!(1000000)));
        assert_eq!(result.monthly_return, dec!(100000));
        assert_eq!(result.monthly_rate, Some(dec!(0.1)));
        // (1.1)^12 - 1 = 2.138428...
        assert_close(result.annual_rate.unwrap(), dec!(2.138428), dec!(0.000001));
    }

    #[test]
    fn test_real_return_rates_suppressed_on_zero_or_negative_base() {
        let from_zero = real_return(dec!(500000), Some(Decimal::ZERO));
        assert_eq!(from_zero.monthly_return, dec!(500000));
        assert_eq!(from_zero.monthly_rate, None);
        assert_eq!(from_zero.annual_rate, None);

        let from_negative = real_return(dec!(500000), Some(dec!(-100)));
        assert_eq!(from_negative.monthly_return, dec!(500100));
        assert_eq!(from_negative.monthly_rate, None);
        assert_eq!(from_negative.annual_rate, None);
    }

    #[test]
    fn test_real_return_loss() {
        let result = real_return(dec!(900000), Some(dec!(1000000)));
        assert_eq!(result.monthly_return, dec!(-100000));
        assert_eq!(result.monthly_rate, Some(dec!(-0.1)));
        assert!(result.annual_rate.unwrap() < Decimal::ZERO);
    }
}
