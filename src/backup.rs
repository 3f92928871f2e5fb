//! JSON export and all-or-nothing import of one period's records.
//!
//! The export file carries the period row plus its incomes, expenses,
//! debts and snapshots. Import runs in a single transaction: any failure
//! (malformed record, duplicate period, snapshot referencing an unknown
//! account) rolls the whole period back.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::db::{self, AccountSnapshot, Debt, Expense, Income, Period, ProjectedIncome};
use crate::error::TrackerError;

/// On-disk shape of a period export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodBackup {
    pub period: Period,
    pub incomes: Vec<Income>,
    pub expenses: Vec<Expense>,
    pub debts: Vec<Debt>,
    pub snapshots: Vec<AccountSnapshot>,
    pub projected_incomes: Vec<ProjectedIncome>,
}

/// Export a period's records to a JSON file.
pub fn export_period(conn: &Connection, period_id: &str, path: &Path) -> Result<PeriodBackup> {
    let Some(period) = db::get_period(conn, period_id)? else {
        bail!(TrackerError::ValidationError(format!(
            "period '{period_id}' does not exist"
        )));
    };

    let backup = PeriodBackup {
        period,
        incomes: db::get_incomes_for_period(conn, period_id)?,
        expenses: db::get_expenses_for_period(conn, period_id)?,
        debts: db::get_debts_for_period(conn, period_id)?,
        snapshots: db::get_snapshots_for_period(conn, period_id)?,
        projected_incomes: db::get_projected_incomes_for_period(conn, period_id)?,
    };

    let json = serde_json::to_string_pretty(&backup)?;
    std::fs::write(path, json).context(format!("Failed to write export to {:?}", path))?;
    info!("Exported period {} to {:?}", period_id, path);
    Ok(backup)
}

/// Import a period from a JSON export, all-or-nothing.
///
/// The target period must not already exist. Accounts referenced by the
/// file's snapshots must exist in this database; a dangling reference
/// fails the whole import. Returns the number of records written
/// (excluding the period row itself).
pub fn import_period(conn: &mut Connection, path: &Path) -> Result<usize> {
    let raw =
        std::fs::read_to_string(path).context(format!("Failed to read import from {:?}", path))?;
    let backup: PeriodBackup = serde_json::from_str(&raw)
        .context(format!("Failed to parse period export at {:?}", path))?;

    let period_id = backup.period.id.clone();
    if db::get_period(conn, &period_id)?.is_some() {
        bail!(TrackerError::ValidationError(format!(
            "period '{period_id}' already exists, refusing to import over it"
        )));
    }

    let tx = conn.transaction()?;
    db::insert_period(&tx, &backup.period)?;
    let mut written = 0;
    for income in &backup.incomes {
        db::insert_income(&tx, income)?;
        written += 1;
    }
    for expense in &backup.expenses {
        db::insert_expense(&tx, expense)?;
        written += 1;
    }
    for debt in &backup.debts {
        db::insert_debt(&tx, debt)?;
        written += 1;
    }
    for snapshot in &backup.snapshots {
        db::upsert_snapshot(&tx, snapshot)?;
        written += 1;
    }
    for item in &backup.projected_incomes {
        db::insert_projected_income(&tx, item)?;
        written += 1;
    }
    tx.commit()?;

    info!("Imported period {} ({} records)", period_id, written);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Account, AccountCategory, Currency, Entity, EntityType};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("PRAGMA foreign_keys = ON", []).unwrap();
        conn.execute_batch(include_str!("db/schema.sql")).unwrap();
        conn
    }

    fn seed_period(conn: &Connection, period_id: &str) -> String {
        db::insert_period(conn, &Period::from_id(period_id).unwrap()).unwrap();

        let entity = Entity {
            id: uuid::Uuid::new_v4().to_string(),
            name: "Banco".to_string(),
            entity_type: Some(EntityType::Bank),
            notes: None,
        };
        db::insert_entity(conn, &entity).unwrap();

        let account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            name: "Ahorros".to_string(),
            entity_id: entity.id,
            account_type: "Ahorros".to_string(),
            categories: vec![AccountCategory::Cash],
            legacy_category: None,
            currency: Currency::Cop,
            is_salary_account: true,
            is_active: true,
        };
        db::insert_account(conn, &account).unwrap();

        let now = Utc::now();
        db::upsert_snapshot(
            conn,
            &AccountSnapshot {
                id: uuid::Uuid::new_v4().to_string(),
                period_id: period_id.to_string(),
                account_id: account.id.clone(),
                balance: dec!(1000000),
                effective_annual_rate_projected: Some(dec!(0.12)),
                notes: None,
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();

        db::insert_income(
            conn,
            &Income {
                id: uuid::Uuid::new_v4().to_string(),
                period_id: period_id.to_string(),
                date: None,
                entity_id: None,
                concept: "Salario".to_string(),
                amount: dec!(5000000),
                currency: Currency::Cop,
                is_salary: true,
                notes: None,
            },
        )
        .unwrap();

        db::insert_projected_income(
            conn,
            &ProjectedIncome {
                id: uuid::Uuid::new_v4().to_string(),
                period_id: period_id.to_string(),
                account_id: account.id.clone(),
                entity_id: None,
                concept: "Intereses".to_string(),
                kind: db::ProjectedIncomeKind::FixedEa,
                rate_ea: Some(dec!(12)),
                rate_monthly: None,
                amount: None,
                is_recurring: true,
                notes: None,
            },
        )
        .unwrap();

        account.id.clone()
    }

    #[test]
    fn test_export_then_import_roundtrip() {
        let conn = test_conn();
        let account_id = seed_period(&conn, "2024-05");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2024-05.json");
        let backup = export_period(&conn, "2024-05", &path).unwrap();
        assert_eq!(backup.incomes.len(), 1);
        assert_eq!(backup.snapshots.len(), 1);
        assert_eq!(backup.projected_incomes.len(), 1);

        // Import into a fresh database that has the same account
        let mut target = test_conn();
        let entity = Entity {
            id: "ent-t".to_string(),
            name: "Banco".to_string(),
            entity_type: None,
            notes: None,
        };
        db::insert_entity(&target, &entity).unwrap();
        db::insert_account(
            &target,
            &Account {
                id: account_id,
                name: "Ahorros".to_string(),
                entity_id: entity.id,
                account_type: "Ahorros".to_string(),
                categories: vec![AccountCategory::Cash],
                legacy_category: None,
                currency: Currency::Cop,
                is_salary_account: true,
                is_active: true,
            },
        )
        .unwrap();

        let written = import_period(&mut target, &path).unwrap();
        assert_eq!(written, 3);
        assert!(db::get_period(&target, "2024-05").unwrap().is_some());
        assert_eq!(
            db::get_incomes_for_period(&target, "2024-05").unwrap().len(),
            1
        );
        assert_eq!(
            db::get_snapshots_for_period(&target, "2024-05")
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            db::get_projected_incomes_for_period(&target, "2024-05")
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_import_refuses_existing_period() {
        let conn = test_conn();
        seed_period(&conn, "2024-05");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2024-05.json");
        export_period(&conn, "2024-05", &path).unwrap();

        let mut same = conn;
        assert!(import_period(&mut same, &path).is_err());
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let conn = test_conn();
        seed_period(&conn, "2024-05");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2024-05.json");
        export_period(&conn, "2024-05", &path).unwrap();

        // Target database lacks the snapshot's account: the foreign key
        // fails and nothing of the period may remain.
        let mut target = test_conn();
        assert!(import_period(&mut target, &path).is_err());
        assert!(db::get_period(&target, "2024-05").unwrap().is_none());
        assert!(db::get_incomes_for_period(&target, "2024-05")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_export_unknown_period_is_an_error() {
        let conn = test_conn();
        let dir = tempfile::tempdir().unwrap();
        assert!(export_period(&conn, "2030-01", &dir.path().join("x.json")).is_err());
    }
}
