//! Terminal rendering of the period summary and the cross-period series.

pub mod dashboard;

pub use dashboard::{render_series, render_summary};
