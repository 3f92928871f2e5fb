//! Period-scoped conversion into the reporting currency (COP).
//!
//! Each period carries at most one manual USD->COP rate. An amount is only
//! ever converted with its own period's rate. When the rate is unset the
//! conversion fails soft to zero: a wrong rate or a NaN propagating through
//! the sums would be worse than a visibly missing contribution.

use rust_decimal::Decimal;
use tracing::warn;

use crate::db::models::{Currency, Period};

/// Convert `amount` to COP using the period's manual rate.
///
/// Foreign amounts with no rate convert to zero and log a warning; the
/// aggregator additionally surfaces the condition via
/// `PeriodSummary::fx_incomplete`. Never panics.
pub fn to_cop(amount: Decimal, currency: Currency, period: &Period) -> Decimal {
    match currency {
        Currency::Cop => amount,
        Currency::Usd => match period.usd_cop_rate {
            Some(rate) => amount * rate,
            None => {
                warn!(
                    "Missing USD->COP rate for period {}, cannot convert {} USD",
                    period.id, amount
                );
                Decimal::ZERO
            }
        },
    }
}

/// Whether the period can convert `currency` into COP. Reporting-currency
/// amounts never need a rate.
pub fn rate_available(currency: Currency, period: &Period) -> bool {
    match currency {
        Currency::Cop => true,
        Currency::Usd => period.usd_cop_rate.is_some(),
    }
}
