use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currencies the tracker understands. COP is the reporting currency;
/// every aggregate is expressed in COP.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Currency {
    Cop,
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Cop => "COP",
            Currency::Usd => "USD",
        }
    }
}

impl FromStr for Currency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COP" => Ok(Currency::Cop),
            "USD" => Ok(Currency::Usd),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic buckets an account can belong to. Membership is non-exclusive:
/// an account may count as both liquid and capital-eligible.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AccountCategory {
    Cash,
    LowAmountAccount,
    Savings,
    EmergencyFund,
    InvestShort,
    InvestMedium,
    InvestLong,
    Retirement,
    Other,
}

impl AccountCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountCategory::Cash => "CASH",
            AccountCategory::LowAmountAccount => "LOW_AMOUNT_ACCOUNT",
            AccountCategory::Savings => "SAVINGS",
            AccountCategory::EmergencyFund => "EMERGENCY_FUND",
            AccountCategory::InvestShort => "INVEST_SHORT",
            AccountCategory::InvestMedium => "INVEST_MEDIUM",
            AccountCategory::InvestLong => "INVEST_LONG",
            AccountCategory::Retirement => "RETIREMENT",
            AccountCategory::Other => "OTHER",
        }
    }
}

impl FromStr for AccountCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CASH" => Ok(AccountCategory::Cash),
            "LOW_AMOUNT_ACCOUNT" => Ok(AccountCategory::LowAmountAccount),
            "SAVINGS" => Ok(AccountCategory::Savings),
            "EMERGENCY_FUND" => Ok(AccountCategory::EmergencyFund),
            "INVEST_SHORT" => Ok(AccountCategory::InvestShort),
            "INVEST_MEDIUM" => Ok(AccountCategory::InvestMedium),
            "INVEST_LONG" => Ok(AccountCategory::InvestLong),
            "RETIREMENT" => Ok(AccountCategory::Retirement),
            "OTHER" => Ok(AccountCategory::Other),
            _ => Err(()),
        }
    }
}

/// Entity type (bank, employer, person the money relates to)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntityType {
    Bank,
    Franchise,
    Person,
    Employer,
    Broker,
    Other,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Bank => "BANK",
            EntityType::Franchise => "FRANCHISE",
            EntityType::Person => "PERSON",
            EntityType::Employer => "EMPLOYER",
            EntityType::Broker => "BROKER",
            EntityType::Other => "OTHER",
        }
    }
}

impl FromStr for EntityType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BANK" => Ok(EntityType::Bank),
            "FRANCHISE" => Ok(EntityType::Franchise),
            "PERSON" => Ok(EntityType::Person),
            "EMPLOYER" => Ok(EntityType::Employer),
            "BROKER" => Ok(EntityType::Broker),
            "OTHER" => Ok(EntityType::Other),
            _ => Err(()),
        }
    }
}

/// Debt type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DebtType {
    CreditCard,
    Personal,
    Loan,
    Other,
}

impl DebtType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtType::CreditCard => "CREDIT_CARD",
            DebtType::Personal => "PERSONAL",
            DebtType::Loan => "LOAN",
            DebtType::Other => "OTHER",
        }
    }
}

impl FromStr for DebtType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREDIT_CARD" => Ok(DebtType::CreditCard),
            "PERSONAL" => Ok(DebtType::Personal),
            "LOAN" => Ok(DebtType::Loan),
            "OTHER" => Ok(DebtType::Other),
            _ => Err(()),
        }
    }
}

/// A reporting period (one calendar month), identified "YYYY-MM".
///
/// `usd_cop_rate` is the single manual exchange rate for the period;
/// `None` means "unset" and marks the period's conversions as incomplete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Period {
    pub id: String,
    pub year: i32,
    pub month: u32,
    pub usd_cop_rate: Option<Decimal>,
}

impl Period {
    /// Build a period from a "YYYY-MM" id, validating the shape.
    pub fn from_id(id: &str) -> Option<Period> {
        let (year, month) = parse_period_id(id)?;
        Some(Period {
            id: id.to_string(),
            year,
            month,
            usd_cop_rate: None,
        })
    }
}

/// Parse a "YYYY-MM" period id into (year, month). Returns None on any
/// malformed input, including out-of-range months.
pub fn parse_period_id(id: &str) -> Option<(i32, u32)> {
    let (y, m) = id.split_once('-')?;
    if y.len() != 4 || m.len() != 2 {
        return None;
    }
    let year: i32 = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month))
}

/// Format (year, month) back into a "YYYY-MM" id.
pub fn format_period_id(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

/// Id of the period immediately before `id`, rolling over the year.
pub fn previous_period_id(id: &str) -> Option<String> {
    let (year, month) = parse_period_id(id)?;
    if month == 1 {
        Some(format_period_id(year - 1, 12))
    } else {
        Some(format_period_id(year, month - 1))
    }
}

/// The `n` trailing period ids ending at `id` (inclusive), oldest first.
/// This is the rolling window the dashboard series is built over.
pub fn period_window(id: &str, n: usize) -> Option<Vec<String>> {
    parse_period_id(id)?;
    let mut ids = Vec::with_capacity(n);
    let mut current = id.to_string();
    for _ in 0..n {
        ids.push(current.clone());
        current = previous_period_id(&current)?;
    }
    ids.reverse();
    Some(ids)
}

/// Counterparty for accounts, incomes, expenses and debts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub entity_type: Option<EntityType>,
    pub notes: Option<String>,
}

/// A tracked account (bank account, investment fund, cash stash).
///
/// `categories` is the current representation; older records carried a
/// single `category` instead. The classifier normalizes both shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub entity_id: String,
    pub account_type: String,
    pub categories: Vec<AccountCategory>,
    pub legacy_category: Option<AccountCategory>,
    pub currency: Currency,
    pub is_salary_account: bool,
    pub is_active: bool,
}

/// The recorded balance of one account at one period's close.
/// Logically unique per (period, account); the store enforces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: String,
    pub period_id: String,
    pub account_id: String,
    pub balance: Decimal,
    /// Projected effective annual rate as a decimal (0.12 = 12% EA).
    /// Absent means "skip the projected-return calculation".
    pub effective_annual_rate_projected: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A recorded income for a period. The salary / non-salary partition
/// drives the summary's income breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Income {
    pub id: String,
    pub period_id: String,
    pub date: Option<NaiveDate>,
    pub entity_id: Option<String>,
    pub concept: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub is_salary: bool,
    pub notes: Option<String>,
}

/// A recorded expense for a period. Flat list, summed by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub period_id: String,
    pub date: NaiveDate,
    pub entity_id: Option<String>,
    pub reason: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub notes: Option<String>,
}

/// How a manual projected-income entry states its expected return.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProjectedIncomeKind {
    /// A fixed monthly amount
    Salary,
    /// An effective annual rate, in percent (12 = 12% EA)
    FixedEa,
    /// A monthly rate, in percent (1 = 1% per month)
    VariableMonthly,
}

impl ProjectedIncomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectedIncomeKind::Salary => "SALARY",
            ProjectedIncomeKind::FixedEa => "FIXED_EA",
            ProjectedIncomeKind::VariableMonthly => "VARIABLE_MONTHLY",
        }
    }
}

impl FromStr for ProjectedIncomeKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SALARY" => Ok(ProjectedIncomeKind::Salary),
            "FIXED_EA" => Ok(ProjectedIncomeKind::FixedEa),
            "VARIABLE_MONTHLY" => Ok(ProjectedIncomeKind::VariableMonthly),
            _ => Err(()),
        }
    }
}

/// A manually stated expectation of income for a period, tied to an
/// account. Rate-based kinds apply to the account's snapshot balance in
/// the same period; no snapshot means a zero base. Feeds the cross-period
/// series only, never the realized summary totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectedIncome {
    pub id: String,
    pub period_id: String,
    pub account_id: String,
    pub entity_id: Option<String>,
    pub concept: String,
    pub kind: ProjectedIncomeKind,
    /// Percent EA for [`ProjectedIncomeKind::FixedEa`]
    pub rate_ea: Option<Decimal>,
    /// Percent per month for [`ProjectedIncomeKind::VariableMonthly`]
    pub rate_monthly: Option<Decimal>,
    /// Fixed monthly amount for [`ProjectedIncomeKind::Salary`], in the
    /// account's currency
    pub amount: Option<Decimal>,
    pub is_recurring: bool,
    pub notes: Option<String>,
}

/// A debt balance recorded for a period. `series_id` links the same
/// logical debt across months. Net outstanding is
/// `max(0, amount - amortization_amount)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debt {
    pub id: String,
    pub period_id: String,
    pub series_id: String,
    pub entity_id: Option<String>,
    pub debt_type: DebtType,
    pub amount: Decimal,
    pub amortization_amount: Option<Decimal>,
    pub currency: Currency,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}
