// Database module - SQLite connection and models

pub mod models;

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

use crate::error::TrackerError;
use crate::financials::series::PeriodData;
pub use models::{
    format_period_id, parse_period_id, period_window, previous_period_id, Account,
    AccountCategory, AccountSnapshot, Currency, Debt, DebtType, Entity, EntityType, Expense,
    Income, Period, ProjectedIncome, ProjectedIncomeKind,
};

/// Get the default database path (~/.plata/data.db)
pub fn get_default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let plata_dir = PathBuf::from(home).join(".plata");

    // Create directory if it doesn't exist
    std::fs::create_dir_all(&plata_dir).context("Failed to create .plata directory")?;

    Ok(plata_dir.join("data.db"))
}

/// Open database connection
pub fn open_db(db_path: Option<PathBuf>) -> Result<Connection> {
    let path = db_path.unwrap_or(get_default_db_path()?);
    let conn = Connection::open(&path).context(format!("Failed to open database at {:?}", path))?;

    // Enable foreign keys
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("Failed to enable foreign keys")?;

    Ok(conn)
}

/// Initialize the database with schema
///
/// Creates the database file and runs the schema SQL to set up all
/// tables and indexes. Safe to call on an existing database.
pub fn init_database(db_path: Option<PathBuf>) -> Result<()> {
    let path = db_path.unwrap_or(get_default_db_path()?);

    info!("Initializing database at: {:?}", path);

    let conn = open_db(Some(path))?;

    let schema_sql = include_str!("schema.sql");
    conn.execute_batch(schema_sql)
        .context("Failed to execute schema")?;

    info!("Database initialized successfully");
    Ok(())
}

// ============ Periods ============

/// Insert a period. The id must be well-formed "YYYY-MM"; the FX rate,
/// when present, must be positive. Malformed input is rejected here so it
/// never reaches the calculation core.
pub fn insert_period(conn: &Connection, period: &Period) -> Result<()> {
    let Some((year, month)) = parse_period_id(&period.id) else {
        bail!(TrackerError::ValidationError(format!(
            "period id must be YYYY-MM, got '{}'",
            period.id
        )));
    };
    if let Some(rate) = period.usd_cop_rate {
        if rate <= Decimal::ZERO {
            bail!(TrackerError::ValidationError(
                "usd_cop_rate must be positive".to_string()
            ));
        }
    }

    conn.execute(
        "INSERT INTO periods (id, year, month, usd_cop_rate) VALUES (?1, ?2, ?3, ?4)",
        params![
            period.id,
            year,
            month,
            period.usd_cop_rate.map(|r| r.to_string())
        ],
    )?;
    Ok(())
}

/// Fetch a period by id, or None if it was never created.
pub fn get_period(conn: &Connection, period_id: &str) -> Result<Option<Period>> {
    let mut stmt =
        conn.prepare("SELECT id, year, month, usd_cop_rate FROM periods WHERE id = ?1")?;
    let period = stmt
        .query_row([period_id], |row| {
            Ok(Period {
                id: row.get(0)?,
                year: row.get(1)?,
                month: row.get(2)?,
                usd_cop_rate: get_optional_decimal_value(row, 3)?,
            })
        })
        .optional()?;
    Ok(period)
}

/// Fetch a period, falling back to a rate-less placeholder when the period
/// row was never created. Conversions against the placeholder behave as
/// "rate unset".
pub fn get_period_or_default(conn: &Connection, period_id: &str) -> Result<Period> {
    if let Some(period) = get_period(conn, period_id)? {
        return Ok(period);
    }
    Period::from_id(period_id).ok_or_else(|| {
        TrackerError::ValidationError(format!("period id must be YYYY-MM, got '{period_id}'"))
            .into()
    })
}

pub fn list_periods(conn: &Connection) -> Result<Vec<Period>> {
    let mut stmt =
        conn.prepare("SELECT id, year, month, usd_cop_rate FROM periods ORDER BY id")?;
    let periods = stmt
        .query_map([], |row| {
            Ok(Period {
                id: row.get(0)?,
                year: row.get(1)?,
                month: row.get(2)?,
                usd_cop_rate: get_optional_decimal_value(row, 3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(periods)
}

/// Set (or clear) the manual USD->COP rate for a period.
pub fn set_period_rate(conn: &Connection, period_id: &str, rate: Option<Decimal>) -> Result<()> {
    if let Some(r) = rate {
        if r <= Decimal::ZERO {
            bail!(TrackerError::ValidationError(
                "usd_cop_rate must be positive".to_string()
            ));
        }
    }
    let updated = conn.execute(
        "UPDATE periods SET usd_cop_rate = ?1 WHERE id = ?2",
        params![rate.map(|r| r.to_string()), period_id],
    )?;
    if updated == 0 {
        bail!(TrackerError::ValidationError(format!(
            "period '{period_id}' does not exist"
        )));
    }
    Ok(())
}

// ============ Entities ============

pub fn insert_entity(conn: &Connection, entity: &Entity) -> Result<()> {
    if entity.name.trim().is_empty() {
        bail!(TrackerError::ValidationError(
            "entity name is required".to_string()
        ));
    }
    conn.execute(
        "INSERT INTO entities (id, name, entity_type, notes) VALUES (?1, ?2, ?3, ?4)",
        params![
            entity.id,
            entity.name,
            entity.entity_type.map(|t| t.as_str()),
            entity.notes
        ],
    )?;
    Ok(())
}

pub fn list_entities(conn: &Connection) -> Result<Vec<Entity>> {
    let mut stmt = conn.prepare("SELECT id, name, entity_type, notes FROM entities ORDER BY name")?;
    let entities = stmt
        .query_map([], |row| {
            let type_str: Option<String> = row.get(2)?;
            Ok(Entity {
                id: row.get(0)?,
                name: row.get(1)?,
                entity_type: type_str.and_then(|s| s.parse::<EntityType>().ok()),
                notes: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entities)
}

// ============ Accounts ============

pub fn insert_account(conn: &Connection, account: &Account) -> Result<()> {
    if account.name.trim().is_empty() {
        bail!(TrackerError::ValidationError(
            "account name is required".to_string()
        ));
    }
    if account.categories.is_empty() && account.legacy_category.is_none() {
        bail!(TrackerError::ValidationError(
            "account needs at least one category".to_string()
        ));
    }
    let categories_json = serde_json::to_string(
        &account
            .categories
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>(),
    )?;
    conn.execute(
        "INSERT INTO accounts (
            id, name, entity_id, account_type, categories, category,
            currency, is_salary_account, is_active
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            account.id,
            account.name,
            account.entity_id,
            account.account_type,
            categories_json,
            account.legacy_category.map(|c| c.as_str()),
            account.currency.as_str(),
            account.is_salary_account,
            account.is_active,
        ],
    )?;
    Ok(())
}

fn account_from_row(row: &Row) -> rusqlite::Result<Account> {
    let categories_json: String = row.get(4)?;
    let tags: Vec<String> = serde_json::from_str(&categories_json)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    let categories = tags
        .iter()
        .filter_map(|t| t.parse::<AccountCategory>().ok())
        .collect();
    let legacy: Option<String> = row.get(5)?;
    let currency_str: String = row.get(6)?;
    Ok(Account {
        id: row.get(0)?,
        name: row.get(1)?,
        entity_id: row.get(2)?,
        account_type: row.get(3)?,
        categories,
        legacy_category: legacy.and_then(|s| s.parse::<AccountCategory>().ok()),
        currency: currency_str.parse::<Currency>().unwrap_or(Currency::Cop),
        is_salary_account: row.get(7)?,
        is_active: row.get(8)?,
    })
}

pub fn list_accounts(conn: &Connection, only_active: bool) -> Result<Vec<Account>> {
    let sql = if only_active {
        "SELECT id, name, entity_id, account_type, categories, category,
                currency, is_salary_account, is_active
         FROM accounts WHERE is_active = 1 ORDER BY name"
    } else {
        "SELECT id, name, entity_id, account_type, categories, category,
                currency, is_salary_account, is_active
         FROM accounts ORDER BY name"
    };
    let mut stmt = conn.prepare(sql)?;
    let accounts = stmt
        .query_map([], account_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(accounts)
}

// ============ Snapshots ============

/// Insert or replace the snapshot for (period, account). One snapshot per
/// pair; re-recording a balance overwrites the previous value.
pub fn upsert_snapshot(conn: &Connection, snapshot: &AccountSnapshot) -> Result<()> {
    conn.execute(
        "INSERT INTO account_snapshots (
            id, period_id, account_id, balance,
            effective_annual_rate_projected, notes, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT (period_id, account_id) DO UPDATE SET
            balance = excluded.balance,
            effective_annual_rate_projected = excluded.effective_annual_rate_projected,
            notes = excluded.notes,
            updated_at = excluded.updated_at",
        params![
            snapshot.id,
            snapshot.period_id,
            snapshot.account_id,
            snapshot.balance.to_string(),
            snapshot
                .effective_annual_rate_projected
                .map(|r| r.to_string()),
            snapshot.notes,
            snapshot.created_at.to_rfc3339(),
            snapshot.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn snapshot_from_row(row: &Row) -> rusqlite::Result<AccountSnapshot> {
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;
    Ok(AccountSnapshot {
        id: row.get(0)?,
        period_id: row.get(1)?,
        account_id: row.get(2)?,
        balance: get_decimal_value(row, 3)?,
        effective_annual_rate_projected: get_optional_decimal_value(row, 4)?,
        notes: row.get(5)?,
        created_at: parse_timestamp(&created_at, 6)?,
        updated_at: parse_timestamp(&updated_at, 7)?,
    })
}

const SNAPSHOT_COLUMNS: &str = "id, period_id, account_id, balance,
                effective_annual_rate_projected, notes, created_at, updated_at";

pub fn get_snapshots_for_period(conn: &Connection, period_id: &str) -> Result<Vec<AccountSnapshot>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM account_snapshots WHERE period_id = ?1"
    ))?;
    let snapshots = stmt
        .query_map([period_id], snapshot_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(snapshots)
}

/// Compound-key lookup: the snapshot for one account in one period.
pub fn get_snapshot(
    conn: &Connection,
    period_id: &str,
    account_id: &str,
) -> Result<Option<AccountSnapshot>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SNAPSHOT_COLUMNS} FROM account_snapshots
         WHERE period_id = ?1 AND account_id = ?2"
    ))?;
    let snapshot = stmt
        .query_row([period_id, account_id], snapshot_from_row)
        .optional()?;
    Ok(snapshot)
}

// ============ Incomes ============

pub fn insert_income(conn: &Connection, income: &Income) -> Result<()> {
    if income.amount <= Decimal::ZERO {
        bail!(TrackerError::ValidationError(
            "income amount must be positive".to_string()
        ));
    }
    conn.execute(
        "INSERT INTO incomes (
            id, period_id, date, entity_id, concept, amount, currency, is_salary, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            income.id,
            income.period_id,
            income.date.map(|d| d.to_string()),
            income.entity_id,
            income.concept,
            income.amount.to_string(),
            income.currency.as_str(),
            income.is_salary,
            income.notes,
        ],
    )?;
    Ok(())
}

pub fn get_incomes_for_period(conn: &Connection, period_id: &str) -> Result<Vec<Income>> {
    let mut stmt = conn.prepare(
        "SELECT id, period_id, date, entity_id, concept, amount, currency, is_salary, notes
         FROM incomes WHERE period_id = ?1 ORDER BY date",
    )?;
    let incomes = stmt
        .query_map([period_id], |row| {
            let date: Option<String> = row.get(2)?;
            let currency_str: String = row.get(6)?;
            Ok(Income {
                id: row.get(0)?,
                period_id: row.get(1)?,
                date: date.and_then(|d| d.parse().ok()),
                entity_id: row.get(3)?,
                concept: row.get(4)?,
                amount: get_decimal_value(row, 5)?,
                currency: currency_str.parse::<Currency>().unwrap_or(Currency::Cop),
                is_salary: row.get(7)?,
                notes: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(incomes)
}

// ============ Expenses ============

pub fn insert_expense(conn: &Connection, expense: &Expense) -> Result<()> {
    if expense.amount <= Decimal::ZERO {
        bail!(TrackerError::ValidationError(
            "expense amount must be positive".to_string()
        ));
    }
    conn.execute(
        "INSERT INTO expenses (
            id, period_id, date, entity_id, reason, amount, currency, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            expense.id,
            expense.period_id,
            expense.date.to_string(),
            expense.entity_id,
            expense.reason,
            expense.amount.to_string(),
            expense.currency.as_str(),
            expense.notes,
        ],
    )?;
    Ok(())
}

pub fn get_expenses_for_period(conn: &Connection, period_id: &str) -> Result<Vec<Expense>> {
    let mut stmt = conn.prepare(
        "SELECT id, period_id, date, entity_id, reason, amount, currency, notes
         FROM expenses WHERE period_id = ?1 ORDER BY date",
    )?;
    let expenses = stmt
        .query_map([period_id], |row| {
            let date: String = row.get(2)?;
            let currency_str: String = row.get(6)?;
            Ok(Expense {
                id: row.get(0)?,
                period_id: row.get(1)?,
                date: date.parse().map_err(|e| {
                    rusqlite::Error::ToSqlConversionFailure(Box::new(e))
                })?,
                entity_id: row.get(3)?,
                reason: row.get(4)?,
                amount: get_decimal_value(row, 5)?,
                currency: currency_str.parse::<Currency>().unwrap_or(Currency::Cop),
                notes: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(expenses)
}

// ============ Projected incomes ============

/// Insert a manual projected-income entry. Each kind requires the figure
/// it computes from: a positive amount for SALARY, a rate for the
/// rate-based kinds.
pub fn insert_projected_income(conn: &Connection, item: &ProjectedIncome) -> Result<()> {
    match item.kind {
        ProjectedIncomeKind::Salary => {
            if item.amount.map_or(true, |a| a <= Decimal::ZERO) {
                bail!(TrackerError::ValidationError(
                    "SALARY projected income needs a positive amount".to_string()
                ));
            }
        }
        ProjectedIncomeKind::FixedEa => {
            if item.rate_ea.is_none() {
                bail!(TrackerError::ValidationError(
                    "FIXED_EA projected income needs --rate-ea".to_string()
                ));
            }
        }
        ProjectedIncomeKind::VariableMonthly => {
            if item.rate_monthly.is_none() {
                bail!(TrackerError::ValidationError(
                    "VARIABLE_MONTHLY projected income needs --rate-monthly".to_string()
                ));
            }
        }
    }
    conn.execute(
        "INSERT INTO projected_incomes (
            id, period_id, account_id, entity_id, concept, kind,
            rate_ea, rate_monthly, amount, is_recurring, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            item.id,
            item.period_id,
            item.account_id,
            item.entity_id,
            item.concept,
            item.kind.as_str(),
            item.rate_ea.map(|r| r.to_string()),
            item.rate_monthly.map(|r| r.to_string()),
            item.amount.map(|a| a.to_string()),
            item.is_recurring,
            item.notes,
        ],
    )?;
    Ok(())
}

pub fn get_projected_incomes_for_period(
    conn: &Connection,
    period_id: &str,
) -> Result<Vec<ProjectedIncome>> {
    let mut stmt = conn.prepare(
        "SELECT id, period_id, account_id, entity_id, concept, kind,
                rate_ea, rate_monthly, amount, is_recurring, notes
         FROM projected_incomes WHERE period_id = ?1",
    )?;
    let items = stmt
        .query_map([period_id], |row| {
            let kind_str: String = row.get(5)?;
            Ok(ProjectedIncome {
                id: row.get(0)?,
                period_id: row.get(1)?,
                account_id: row.get(2)?,
                entity_id: row.get(3)?,
                concept: row.get(4)?,
                kind: kind_str
                    .parse::<ProjectedIncomeKind>()
                    .unwrap_or(ProjectedIncomeKind::Salary),
                rate_ea: get_optional_decimal_value(row, 6)?,
                rate_monthly: get_optional_decimal_value(row, 7)?,
                amount: get_optional_decimal_value(row, 8)?,
                is_recurring: row.get(9)?,
                notes: row.get(10)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(items)
}

// ============ Debts ============

pub fn insert_debt(conn: &Connection, debt: &Debt) -> Result<()> {
    if debt.amount <= Decimal::ZERO {
        bail!(TrackerError::ValidationError(
            "debt amount must be positive".to_string()
        ));
    }
    if let Some(amortization) = debt.amortization_amount {
        if amortization < Decimal::ZERO {
            bail!(TrackerError::ValidationError(
                "amortization amount cannot be negative".to_string()
            ));
        }
    }
    conn.execute(
        "INSERT INTO debts (
            id, period_id, series_id, entity_id, debt_type, amount,
            amortization_amount, currency, due_date, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            debt.id,
            debt.period_id,
            debt.series_id,
            debt.entity_id,
            debt.debt_type.as_str(),
            debt.amount.to_string(),
            debt.amortization_amount.map(|a| a.to_string()),
            debt.currency.as_str(),
            debt.due_date.map(|d| d.to_string()),
            debt.notes,
        ],
    )?;
    Ok(())
}

pub fn get_debts_for_period(conn: &Connection, period_id: &str) -> Result<Vec<Debt>> {
    let mut stmt = conn.prepare(
        "SELECT id, period_id, series_id, entity_id, debt_type, amount,
                amortization_amount, currency, due_date, notes
         FROM debts WHERE period_id = ?1",
    )?;
    let debts = stmt
        .query_map([period_id], |row| {
            let debt_type_str: String = row.get(4)?;
            let currency_str: String = row.get(7)?;
            let due_date: Option<String> = row.get(8)?;
            Ok(Debt {
                id: row.get(0)?,
                period_id: row.get(1)?,
                series_id: row.get(2)?,
                entity_id: row.get(3)?,
                debt_type: debt_type_str.parse::<DebtType>().unwrap_or(DebtType::Other),
                amount: get_decimal_value(row, 5)?,
                amortization_amount: get_optional_decimal_value(row, 6)?,
                currency: currency_str.parse::<Currency>().unwrap_or(Currency::Cop),
                due_date: due_date.and_then(|d| d.parse().ok()),
                notes: row.get(9)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(debts)
}

// ============ Aggregation inputs ============

/// Assemble everything the summary aggregator needs for one period.
/// Missing period rows degrade to a rate-less placeholder, never an error.
pub fn load_period_data(conn: &Connection, period_id: &str) -> Result<PeriodData> {
    Ok(PeriodData {
        period: get_period_or_default(conn, period_id)?,
        incomes: get_incomes_for_period(conn, period_id)?,
        expenses: get_expenses_for_period(conn, period_id)?,
        debts: get_debts_for_period(conn, period_id)?,
        snapshots: get_snapshots_for_period(conn, period_id)?,
        projected_incomes: get_projected_incomes_for_period(conn, period_id)?,
    })
}

/// Seed a period's incomes by copying the previous period's incomes with
/// fresh ids. Runs in a single transaction. Returns the number copied.
pub fn copy_incomes_from_previous(conn: &mut Connection, period_id: &str) -> Result<usize> {
    let prev_id = previous_period_id(period_id).ok_or_else(|| {
        TrackerError::ValidationError(format!("period id must be YYYY-MM, got '{period_id}'"))
    })?;
    let prev_incomes = get_incomes_for_period(conn, &prev_id)?;
    if prev_incomes.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for income in &prev_incomes {
        let copied = Income {
            id: uuid::Uuid::new_v4().to_string(),
            period_id: period_id.to_string(),
            ..income.clone()
        };
        tx.execute(
            "INSERT INTO incomes (
                id, period_id, date, entity_id, concept, amount, currency, is_salary, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                copied.id,
                copied.period_id,
                copied.date.map(|d| d.to_string()),
                copied.entity_id,
                copied.concept,
                copied.amount.to_string(),
                copied.currency.as_str(),
                copied.is_salary,
                copied.notes,
            ],
        )?;
    }
    tx.commit()?;

    info!(
        "Copied {} incomes from {} to {}",
        prev_incomes.len(),
        prev_id,
        period_id
    );
    Ok(prev_incomes.len())
}

// ============ Row helpers ============

/// Helper to read Decimal from SQLite (handles both TEXT and numeric storage)
pub fn get_decimal_value(row: &Row, idx: usize) -> Result<Decimal, rusqlite::Error> {
    if let Ok(s) = row.get::<_, String>(idx) {
        return Decimal::from_str(&s)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)));
    }

    if let Ok(i) = row.get::<_, i64>(idx) {
        return Ok(Decimal::from(i));
    }

    if let Ok(f) = row.get::<_, f64>(idx) {
        return Decimal::try_from(f)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)));
    }

    Err(rusqlite::Error::InvalidColumnType(
        idx,
        "amount".to_string(),
        rusqlite::types::Type::Null,
    ))
}

/// Nullable variant of [`get_decimal_value`].
pub fn get_optional_decimal_value(row: &Row, idx: usize) -> Result<Option<Decimal>, rusqlite::Error> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        None => Ok(None),
        Some(s) => Decimal::from_str(&s)
            .map(Some)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e))),
    }
}

fn parse_timestamp(
    raw: &str,
    idx: usize,
) -> Result<chrono::DateTime<chrono::Utc>, rusqlite::Error> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|_| {
            rusqlite::Error::InvalidColumnType(
                idx,
                "timestamp".to_string(),
                rusqlite::types::Type::Text,
            )
        })
}
