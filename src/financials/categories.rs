//! Semantic account classification.
//!
//! Accounts carry a list of category tags; older records carry a single
//! `category` column instead. Normalization to a list happens here, at the
//! boundary, so nothing downstream ever branches on the legacy shape.

use crate::db::models::{Account, AccountCategory};

/// Categories counted as liquid (cash-like, immediately accessible).
/// Must stay a subset of [`CAPITAL_CATEGORIES`].
pub const LIQUID_CATEGORIES: &[AccountCategory] = &[
    AccountCategory::Cash,
    AccountCategory::LowAmountAccount,
];

/// Categories counted toward capital (net-worth eligible).
pub const CAPITAL_CATEGORIES: &[AccountCategory] = &[
    AccountCategory::Cash,
    AccountCategory::LowAmountAccount,
    AccountCategory::Savings,
    AccountCategory::EmergencyFund,
    AccountCategory::InvestShort,
    AccountCategory::InvestMedium,
    AccountCategory::InvestLong,
    AccountCategory::Retirement,
    AccountCategory::Other,
];

/// The account's categories, with the legacy single-category shape
/// normalized to a one-element list. Empty only for records that carry
/// neither representation.
pub fn account_categories(account: &Account) -> Vec<AccountCategory> {
    if !account.categories.is_empty() {
        account.categories.clone()
    } else if let Some(legacy) = account.legacy_category {
        vec![legacy]
    } else {
        Vec::new()
    }
}

pub fn is_liquid(account: &Account) -> bool {
    account_categories(account)
        .iter()
        .any(|c| LIQUID_CATEGORIES.contains(c))
}

pub fn is_capital_eligible(account: &Account) -> bool {
    account_categories(account)
        .iter()
        .any(|c| CAPITAL_CATEGORIES.contains(c))
}
