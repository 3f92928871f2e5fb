//! The period financial summary engine.
//!
//! Pure calculation over immutable per-period record sets: currency
//! conversion, return figures, account classification, net debt, the
//! period summary aggregator and the cross-period series builder. Nothing
//! here touches the database or mutates its inputs; callers load the
//! records and hand in fully materialized slices.

pub mod categories;
pub mod currency;
pub mod debt;
pub mod returns;
pub mod series;
pub mod summary;

pub use categories::{account_categories, is_capital_eligible, is_liquid};
pub use currency::{rate_available, to_cop};
pub use debt::{net_debt, net_debt_total};
pub use returns::{
    manual_projected_amount, projected_return, real_return, ProjectedReturn, RealReturn,
};
pub use series::{build_series, manual_projected_total, PeriodData, SeriesPoint};
pub use summary::{calculate_period_summary, PeriodSummary};
