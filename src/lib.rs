//! Plata - personal monthly finance tracker
//!
//! This library tracks accounts, incomes, expenses and debts per monthly
//! period, converts everything to COP with a manual per-period USD rate,
//! and derives the period summary and cross-period series the dashboard
//! reports are built from.

pub mod backup;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod financials;
pub mod reports;
pub mod utils;
