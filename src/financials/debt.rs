//! Net outstanding debt.

use rust_decimal::Decimal;

use crate::db::models::{Debt, Period};
use crate::financials::currency::to_cop;

/// A debt's outstanding balance net of recorded amortization, in COP.
///
/// The clamp to zero happens in the debt's native currency, before
/// conversion: an over-amortized debt is fully paid, not an asset.
pub fn net_debt(debt: &Debt, period: &Period) -> Decimal {
    let amortization = debt.amortization_amount.unwrap_or(Decimal::ZERO);
    let net = (debt.amount - amortization).max(Decimal::ZERO);
    to_cop(net, debt.currency, period)
}

/// Sum of [`net_debt`] over a period's debts.
pub fn net_debt_total(debts: &[Debt], period: &Period) -> Decimal {
    debts.iter().map(|d| net_debt(d, period)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Currency, DebtType};
    use rust_decimal_macros::dec;

    fn debt(amount: Decimal, amortization: Option<Decimal>, currency: Currency) -> Debt {
        Debt {
            id: "debt-1".to_string(),
            period_id: "2024-05".to_string(),
            series_id: "visa".to_string(),
            entity_id: None,
            debt_type: DebtType::CreditCard,
            amount,
            amortization_amount: amortization,
            currency,
            due_date: None,
            notes: None,
        }
    }

    fn period(rate: Option<Decimal>) -> Period {
        Period {
            id: "2024-05".to_string(),
            year: 2024,
            month: 5,
            usd_cop_rate: rate,
        }
    }

    #[test]
    fn test_net_debt_subtracts_amortization() {
        let d = debt(dec!(500000), Some(dec!(200000)), Currency::Cop);
        assert_eq!(net_debt(&d, &period(None)), dec!(300000));
    }

    #[test]
    fn test_net_debt_missing_amortization_defaults_to_zero() {
        let d = debt(dec!(500000), None, Currency::Cop);
        assert_eq!(net_debt(&d, &period(None)), dec!(500000));
    }

    #[test]
    fn test_over_amortized_debt_clamps_to_zero() {
        let d = debt(dec!(500000), Some(dec!(600000)), Currency::Cop);
        assert_eq!(net_debt(&d, &period(None)), Decimal::ZERO);
    }

    #[test]
    fn test_clamp_happens_before_conversion() {
        // Over-amortized USD debt is zero even with a rate set
        let d = debt(dec!(100), Some(dec!(150)), Currency::Usd);
        assert_eq!(net_debt(&d, &period(Some(dec!(4000)))), Decimal::ZERO);

        // And a normal USD debt converts after netting
        let d2 = debt(dec!(100), Some(dec!(40)), Currency::Usd);
        assert_eq!(net_debt(&d2, &period(Some(dec!(4000)))), dec!(240000));
    }

    #[test]
    fn test_net_debt_total() {
        let p = period(None);
        let debts = vec![
            debt(dec!(500000), Some(dec!(600000)), Currency::Cop),
            debt(dec!(300000), None, Currency::Cop),
        ];
        assert_eq!(net_debt_total(&debts, &p), dec!(300000));
        assert_eq!(net_debt_total(&[], &p), Decimal::ZERO);
    }
}
