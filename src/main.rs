use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use colored::Colorize;
use rust_decimal::Decimal;
use rusqlite::Connection;
use std::str::FromStr;
use tabled::{settings::Style, Table, Tabled};

use plata::backup;
use plata::cli::{
    AccountCommands, Cli, Commands, DebtCommands, EntityCommands, ExpenseCommands, IncomeCommands,
    PeriodCommands, ProjectedCommands, SnapshotCommands,
};
use plata::config::AppConfig;
use plata::db::{
    self, Account, AccountCategory, AccountSnapshot, Currency, Debt, DebtType, Entity, EntityType,
    Expense, Income, Period, ProjectedIncome, ProjectedIncomeKind,
};
use plata::error::TrackerError;
use plata::financials::{build_series, calculate_period_summary, PeriodData};
use plata::reports;
use plata::utils::{format_cop, format_rate, format_usd};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = AppConfig::load().unwrap_or_default();
    let db_path = cli.db.or(config.db_path.clone());

    // Every command needs the schema in place; init is idempotent.
    db::init_database(db_path.clone())?;
    let mut conn = db::open_db(db_path)?;

    match cli.command {
        Commands::Init => {
            println!("{} Database initialized", "✓".green().bold());
            Ok(())
        }

        Commands::Period { action } => handle_period(&mut conn, action),
        Commands::Entity { action } => handle_entity(&conn, action),
        Commands::Account { action } => handle_account(&conn, action),
        Commands::Snapshot { action } => handle_snapshot(&conn, action),
        Commands::Income { action } => handle_income(&conn, action),
        Commands::Expense { action } => handle_expense(&conn, action),
        Commands::Debt { action } => handle_debt(&conn, action),
        Commands::Projected { action } => handle_projected(&conn, action),

        Commands::Summary { period, json } => handle_summary(&conn, &period, json),
        Commands::Series {
            period,
            months,
            json,
        } => handle_series(&conn, &period, months.unwrap_or(config.series_months), json),
    }
}

// ============ Parsing helpers ============

fn parse_amount(raw: &str, what: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|_| {
        TrackerError::ParseError(format!("{what} must be a decimal number, got '{raw}'")).into()
    })
}

fn parse_currency(raw: &str) -> Result<Currency> {
    raw.parse::<Currency>().map_err(|_| {
        TrackerError::ParseError(format!("currency must be COP or USD, got '{raw}'")).into()
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        TrackerError::ParseError(format!("date must be YYYY-MM-DD, got '{raw}'")).into()
    })
}

fn parse_period_arg(raw: &str) -> Result<Period> {
    Period::from_id(raw).ok_or_else(|| {
        TrackerError::ParseError(format!("period must be YYYY-MM, got '{raw}'")).into()
    })
}

/// Amount formatted in its native currency for listings.
fn format_native(amount: Decimal, currency: Currency) -> String {
    match currency {
        Currency::Cop => format_cop(amount),
        Currency::Usd => format_usd(amount),
    }
}

// ============ Periods ============

fn handle_period(conn: &mut Connection, action: PeriodCommands) -> Result<()> {
    match action {
        PeriodCommands::Add { id, rate } => {
            let mut period = parse_period_arg(&id)?;
            period.usd_cop_rate = match rate {
                Some(raw) => Some(parse_amount(&raw, "rate")?),
                None => None,
            };
            db::insert_period(conn, &period)?;
            match period.usd_cop_rate {
                Some(rate) => println!(
                    "{} Period {} created (USD->COP {})",
                    "✓".green().bold(),
                    id,
                    rate
                ),
                None => println!(
                    "{} Period {} created {}",
                    "✓".green().bold(),
                    id,
                    "(no USD->COP rate yet)".yellow()
                ),
            }
            Ok(())
        }

        PeriodCommands::List => {
            #[derive(Tabled)]
            struct PeriodRow {
                #[tabled(rename = "Period")]
                id: String,
                #[tabled(rename = "USD->COP")]
                rate: String,
            }

            let periods = db::list_periods(conn)?;
            if periods.is_empty() {
                println!("No periods recorded yet");
                return Ok(());
            }
            let rows: Vec<PeriodRow> = periods
                .iter()
                .map(|p| PeriodRow {
                    id: p.id.clone(),
                    rate: p
                        .usd_cop_rate
                        .map(|r| r.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
            Ok(())
        }

        PeriodCommands::SetRate { id, rate } => {
            let rate = parse_amount(&rate, "rate")?;
            db::set_period_rate(conn, &id, Some(rate))?;
            println!("{} Period {} rate set to {}", "✓".green().bold(), id, rate);
            Ok(())
        }

        PeriodCommands::CopyIncomes { id } => {
            parse_period_arg(&id)?;
            if db::get_period(conn, &id)?.is_none() {
                bail!(TrackerError::ValidationError(format!(
                    "period '{id}' does not exist, create it first"
                )));
            }
            let copied = db::copy_incomes_from_previous(conn, &id)?;
            if copied == 0 {
                println!("{} Previous period has no incomes to copy", "!".yellow().bold());
            } else {
                println!(
                    "{} Copied {} income(s) into {}",
                    "✓".green().bold(),
                    copied,
                    id
                );
            }
            Ok(())
        }

        PeriodCommands::Export { id, file } => {
            let backup = backup::export_period(conn, &id, &file)?;
            println!(
                "{} Exported {} ({} incomes, {} expenses, {} debts, {} snapshots, {} projected) to {}",
                "✓".green().bold(),
                id,
                backup.incomes.len(),
                backup.expenses.len(),
                backup.debts.len(),
                backup.snapshots.len(),
                backup.projected_incomes.len(),
                file.display()
            );
            Ok(())
        }

        PeriodCommands::Import { file } => {
            let written = backup::import_period(conn, &file)?;
            println!(
                "{} Imported {} record(s) from {}",
                "✓".green().bold(),
                written,
                file.display()
            );
            Ok(())
        }
    }
}

// ============ Entities ============

fn handle_entity(conn: &Connection, action: EntityCommands) -> Result<()> {
    match action {
        EntityCommands::Add {
            name,
            entity_type,
            notes,
        } => {
            let entity_type = match entity_type {
                Some(raw) => Some(raw.parse::<EntityType>().map_err(|_| {
                    TrackerError::ParseError(format!("unknown entity type '{raw}'"))
                })?),
                None => None,
            };
            let entity = Entity {
                id: uuid::Uuid::new_v4().to_string(),
                name: name.clone(),
                entity_type,
                notes,
            };
            db::insert_entity(conn, &entity)?;
            println!("{} Entity '{}' created: {}", "✓".green().bold(), name, entity.id);
            Ok(())
        }

        EntityCommands::List => {
            #[derive(Tabled)]
            struct EntityRow {
                #[tabled(rename = "Id")]
                id: String,
                #[tabled(rename = "Name")]
                name: String,
                #[tabled(rename = "Type")]
                entity_type: String,
            }

            let entities = db::list_entities(conn)?;
            if entities.is_empty() {
                println!("No entities recorded yet");
                return Ok(());
            }
            let rows: Vec<EntityRow> = entities
                .iter()
                .map(|e| EntityRow {
                    id: e.id.clone(),
                    name: e.name.clone(),
                    entity_type: e
                        .entity_type
                        .map(|t| t.as_str().to_string())
                        .unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
            Ok(())
        }
    }
}

// ============ Accounts ============

fn handle_account(conn: &Connection, action: AccountCommands) -> Result<()> {
    match action {
        AccountCommands::Add {
            name,
            entity,
            account_type,
            categories,
            currency,
            salary,
        } => {
            let categories = categories
                .iter()
                .map(|raw| {
                    raw.parse::<AccountCategory>().map_err(|_| {
                        TrackerError::ParseError(format!("unknown account category '{raw}'"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let account = Account {
                id: uuid::Uuid::new_v4().to_string(),
                name: name.clone(),
                entity_id: entity,
                account_type,
                categories,
                legacy_category: None,
                currency: parse_currency(&currency)?,
                is_salary_account: salary,
                is_active: true,
            };
            db::insert_account(conn, &account)?;
            println!("{} Account '{}' created: {}", "✓".green().bold(), name, account.id);
            Ok(())
        }

        AccountCommands::List { all } => {
            #[derive(Tabled)]
            struct AccountRow {
                #[tabled(rename = "Id")]
                id: String,
                #[tabled(rename = "Name")]
                name: String,
                #[tabled(rename = "Type")]
                account_type: String,
                #[tabled(rename = "Categories")]
                categories: String,
                #[tabled(rename = "Currency")]
                currency: String,
                #[tabled(rename = "Salary")]
                salary: String,
                #[tabled(rename = "Active")]
                active: String,
            }

            let accounts = db::list_accounts(conn, !all)?;
            if accounts.is_empty() {
                println!("No accounts recorded yet");
                return Ok(());
            }
            let rows: Vec<AccountRow> = accounts
                .iter()
                .map(|a| AccountRow {
                    id: a.id.clone(),
                    name: a.name.clone(),
                    account_type: a.account_type.clone(),
                    categories: a
                        .categories
                        .iter()
                        .map(|c| c.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    currency: a.currency.to_string(),
                    salary: if a.is_salary_account { "yes" } else { "" }.to_string(),
                    active: if a.is_active { "yes" } else { "no" }.to_string(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
            Ok(())
        }
    }
}

// ============ Snapshots ============

fn handle_snapshot(conn: &Connection, action: SnapshotCommands) -> Result<()> {
    match action {
        SnapshotCommands::Set {
            period,
            account,
            balance,
            rate,
            notes,
        } => {
            parse_period_arg(&period)?;
            let now = Utc::now();
            let snapshot = AccountSnapshot {
                id: uuid::Uuid::new_v4().to_string(),
                period_id: period.clone(),
                account_id: account,
                balance: parse_amount(&balance, "balance")?,
                effective_annual_rate_projected: match rate {
                    Some(raw) => Some(parse_amount(&raw, "rate")?),
                    None => None,
                },
                notes,
                created_at: now,
                updated_at: now,
            };
            db::upsert_snapshot(conn, &snapshot)?;
            println!("{} Snapshot recorded for {}", "✓".green().bold(), period);
            Ok(())
        }

        SnapshotCommands::List { period } => {
            #[derive(Tabled)]
            struct SnapshotRow {
                #[tabled(rename = "Account")]
                account: String,
                #[tabled(rename = "Balance")]
                balance: String,
                #[tabled(rename = "Projected EA")]
                rate: String,
            }

            let accounts = db::list_accounts(conn, false)?;
            let snapshots = db::get_snapshots_for_period(conn, &period)?;
            if snapshots.is_empty() {
                println!("No snapshots recorded for {}", period);
                return Ok(());
            }
            let rows: Vec<SnapshotRow> = snapshots
                .iter()
                .map(|s| {
                    let account = accounts.iter().find(|a| a.id == s.account_id);
                    SnapshotRow {
                        account: account
                            .map(|a| a.name.clone())
                            .unwrap_or_else(|| s.account_id.clone()),
                        balance: format_native(
                            s.balance,
                            account.map(|a| a.currency).unwrap_or(Currency::Cop),
                        ),
                        rate: s
                            .effective_annual_rate_projected
                            .map(format_rate)
                            .unwrap_or_else(|| "-".to_string()),
                    }
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
            Ok(())
        }
    }
}

// ============ Incomes ============

fn handle_income(conn: &Connection, action: IncomeCommands) -> Result<()> {
    match action {
        IncomeCommands::Add {
            period,
            concept,
            amount,
            currency,
            salary,
            date,
            entity,
            notes,
        } => {
            parse_period_arg(&period)?;
            let income = Income {
                id: uuid::Uuid::new_v4().to_string(),
                period_id: period.clone(),
                date: match date {
                    Some(raw) => Some(parse_date(&raw)?),
                    None => None,
                },
                entity_id: entity,
                concept: concept.clone(),
                amount: parse_amount(&amount, "amount")?,
                currency: parse_currency(&currency)?,
                is_salary: salary,
                notes,
            };
            db::insert_income(conn, &income)?;
            println!(
                "{} Income '{}' recorded for {}: {}",
                "✓".green().bold(),
                concept,
                period,
                format_native(income.amount, income.currency)
            );
            Ok(())
        }

        IncomeCommands::List { period } => {
            #[derive(Tabled)]
            struct IncomeRow {
                #[tabled(rename = "Concept")]
                concept: String,
                #[tabled(rename = "Amount")]
                amount: String,
                #[tabled(rename = "Salary")]
                salary: String,
                #[tabled(rename = "Date")]
                date: String,
            }

            let incomes = db::get_incomes_for_period(conn, &period)?;
            if incomes.is_empty() {
                println!("No incomes recorded for {}", period);
                return Ok(());
            }
            let rows: Vec<IncomeRow> = incomes
                .iter()
                .map(|i| IncomeRow {
                    concept: i.concept.clone(),
                    amount: format_native(i.amount, i.currency),
                    salary: if i.is_salary { "yes" } else { "" }.to_string(),
                    date: i
                        .date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
            Ok(())
        }
    }
}

// ============ Expenses ============

fn handle_expense(conn: &Connection, action: ExpenseCommands) -> Result<()> {
    match action {
        ExpenseCommands::Add {
            period,
            concept,
            amount,
            currency,
            date,
            entity,
            notes,
        } => {
            parse_period_arg(&period)?;
            // Undated expenses land on the first of the month
            let date = match date {
                Some(raw) => parse_date(&raw)?,
                None => parse_date(&format!("{period}-01"))?,
            };
            let expense = Expense {
                id: uuid::Uuid::new_v4().to_string(),
                period_id: period.clone(),
                date,
                entity_id: entity,
                reason: concept.clone(),
                amount: parse_amount(&amount, "amount")?,
                currency: parse_currency(&currency)?,
                notes,
            };
            db::insert_expense(conn, &expense)?;
            println!(
                "{} Expense '{}' recorded for {}: {}",
                "✓".green().bold(),
                concept,
                period,
                format_native(expense.amount, expense.currency)
            );
            Ok(())
        }

        ExpenseCommands::List { period } => {
            #[derive(Tabled)]
            struct ExpenseRow {
                #[tabled(rename = "Concept")]
                concept: String,
                #[tabled(rename = "Amount")]
                amount: String,
                #[tabled(rename = "Date")]
                date: String,
            }

            let expenses = db::get_expenses_for_period(conn, &period)?;
            if expenses.is_empty() {
                println!("No expenses recorded for {}", period);
                return Ok(());
            }
            let rows: Vec<ExpenseRow> = expenses
                .iter()
                .map(|e| ExpenseRow {
                    concept: e.reason.clone(),
                    amount: format_native(e.amount, e.currency),
                    date: e.date.to_string(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
            Ok(())
        }
    }
}

// ============ Debts ============

fn handle_debt(conn: &Connection, action: DebtCommands) -> Result<()> {
    match action {
        DebtCommands::Add {
            period,
            amount,
            currency,
            amortization,
            series,
            debt_type,
            due,
            entity,
            notes,
        } => {
            parse_period_arg(&period)?;
            let debt = Debt {
                id: uuid::Uuid::new_v4().to_string(),
                period_id: period.clone(),
                series_id: series.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                entity_id: entity,
                debt_type: match debt_type {
                    Some(raw) => raw.parse::<DebtType>().map_err(|_| {
                        TrackerError::ParseError(format!("unknown debt type '{raw}'"))
                    })?,
                    None => DebtType::Other,
                },
                amount: parse_amount(&amount, "amount")?,
                amortization_amount: match amortization {
                    Some(raw) => Some(parse_amount(&raw, "amortization")?),
                    None => None,
                },
                currency: parse_currency(&currency)?,
                due_date: match due {
                    Some(raw) => Some(parse_date(&raw)?),
                    None => None,
                },
                notes,
            };
            db::insert_debt(conn, &debt)?;
            println!(
                "{} Debt recorded for {}: {} (series {})",
                "✓".green().bold(),
                period,
                format_native(debt.amount, debt.currency),
                debt.series_id
            );
            Ok(())
        }

        DebtCommands::List { period } => {
            #[derive(Tabled)]
            struct DebtRow {
                #[tabled(rename = "Type")]
                debt_type: String,
                #[tabled(rename = "Amount")]
                amount: String,
                #[tabled(rename = "Amortized")]
                amortized: String,
                #[tabled(rename = "Series")]
                series: String,
            }

            let debts = db::get_debts_for_period(conn, &period)?;
            if debts.is_empty() {
                println!("No debts recorded for {}", period);
                return Ok(());
            }
            let rows: Vec<DebtRow> = debts
                .iter()
                .map(|d| DebtRow {
                    debt_type: d.debt_type.as_str().to_string(),
                    amount: format_native(d.amount, d.currency),
                    amortized: d
                        .amortization_amount
                        .map(|a| format_native(a, d.currency))
                        .unwrap_or_else(|| "-".to_string()),
                    series: d.series_id.clone(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
            Ok(())
        }
    }
}

// ============ Projected incomes ============

fn handle_projected(conn: &Connection, action: ProjectedCommands) -> Result<()> {
    match action {
        ProjectedCommands::Add {
            period,
            account,
            concept,
            kind,
            amount,
            rate_ea,
            rate_monthly,
            recurring,
            entity,
            notes,
        } => {
            parse_period_arg(&period)?;
            let item = ProjectedIncome {
                id: uuid::Uuid::new_v4().to_string(),
                period_id: period.clone(),
                account_id: account,
                entity_id: entity,
                concept: concept.clone(),
                kind: kind.parse::<ProjectedIncomeKind>().map_err(|_| {
                    TrackerError::ParseError(format!("unknown projected income kind '{kind}'"))
                })?,
                rate_ea: match rate_ea {
                    Some(raw) => Some(parse_amount(&raw, "rate-ea")?),
                    None => None,
                },
                rate_monthly: match rate_monthly {
                    Some(raw) => Some(parse_amount(&raw, "rate-monthly")?),
                    None => None,
                },
                amount: match amount {
                    Some(raw) => Some(parse_amount(&raw, "amount")?),
                    None => None,
                },
                is_recurring: recurring,
                notes,
            };
            db::insert_projected_income(conn, &item)?;
            println!(
                "{} Projected income '{}' recorded for {}",
                "✓".green().bold(),
                concept,
                period
            );
            Ok(())
        }

        ProjectedCommands::List { period } => {
            #[derive(Tabled)]
            struct ProjectedRow {
                #[tabled(rename = "Concept")]
                concept: String,
                #[tabled(rename = "Kind")]
                kind: String,
                #[tabled(rename = "Figure")]
                figure: String,
                #[tabled(rename = "Account")]
                account: String,
                #[tabled(rename = "Recurring")]
                recurring: String,
            }

            let accounts = db::list_accounts(conn, false)?;
            let items = db::get_projected_incomes_for_period(conn, &period)?;
            if items.is_empty() {
                println!("No projected incomes recorded for {}", period);
                return Ok(());
            }
            let rows: Vec<ProjectedRow> = items
                .iter()
                .map(|item| {
                    let account = accounts.iter().find(|a| a.id == item.account_id);
                    let figure = match item.kind {
                        ProjectedIncomeKind::Salary => item
                            .amount
                            .map(|a| {
                                format_native(
                                    a,
                                    account.map(|acc| acc.currency).unwrap_or(Currency::Cop),
                                )
                            })
                            .unwrap_or_else(|| "-".to_string()),
                        ProjectedIncomeKind::FixedEa => item
                            .rate_ea
                            .map(|r| format!("{r}% EA"))
                            .unwrap_or_else(|| "-".to_string()),
                        ProjectedIncomeKind::VariableMonthly => item
                            .rate_monthly
                            .map(|r| format!("{r}%/month"))
                            .unwrap_or_else(|| "-".to_string()),
                    };
                    ProjectedRow {
                        concept: item.concept.clone(),
                        kind: item.kind.as_str().to_string(),
                        figure,
                        account: account
                            .map(|a| a.name.clone())
                            .unwrap_or_else(|| item.account_id.clone()),
                        recurring: if item.is_recurring { "yes" } else { "" }.to_string(),
                    }
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
            Ok(())
        }
    }
}

// ============ Summary & series ============

fn handle_summary(conn: &Connection, period_id: &str, json: bool) -> Result<()> {
    parse_period_arg(period_id)?;
    let prev_id = db::previous_period_id(period_id).ok_or_else(|| {
        TrackerError::ParseError(format!("period must be YYYY-MM, got '{period_id}'"))
    })?;

    let accounts = db::list_accounts(conn, false)?;
    let data = db::load_period_data(conn, period_id)?;
    let prev = db::load_period_data(conn, &prev_id)?;

    let summary = calculate_period_summary(
        &data.period,
        &data.incomes,
        &data.expenses,
        &data.debts,
        &prev.debts,
        &accounts,
        &data.snapshots,
        &prev.snapshots,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", reports::render_summary(period_id, &summary));
    }
    Ok(())
}

fn handle_series(conn: &Connection, period_id: &str, months: usize, json: bool) -> Result<()> {
    if months == 0 {
        bail!(TrackerError::ValidationError(
            "series must cover at least one month".to_string()
        ));
    }
    let window_ids = db::period_window(period_id, months).ok_or_else(|| {
        TrackerError::ParseError(format!("period must be YYYY-MM, got '{period_id}'"))
    })?;

    let accounts = db::list_accounts(conn, false)?;
    let window: Vec<PeriodData> = window_ids
        .iter()
        .map(|id| db::load_period_data(conn, id))
        .collect::<Result<Vec<_>>>()?;

    let points = build_series(&accounts, &window);
    if json {
        println!("{}", serde_json::to_string_pretty(&points)?);
    } else {
        print!("{}", reports::render_series(&points));
    }
    Ok(())
}
