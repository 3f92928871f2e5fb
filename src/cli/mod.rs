use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "plata")]
#[command(version, about = "Personal finance tracker with monthly period summaries")]
#[command(
    long_about = "Track accounts, incomes, expenses and debts per monthly period, with COP/USD conversion, projected and real returns, and a cross-period dashboard series."
)]
pub struct Cli {
    /// Path to the SQLite database (default: ~/.plata/data.db)
    #[arg(long = "db", global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database schema (safe to run repeatedly)
    Init,

    /// Monthly period management
    Period {
        #[command(subcommand)]
        action: PeriodCommands,
    },

    /// Entities (banks, brokers, funds, people)
    Entity {
        #[command(subcommand)]
        action: EntityCommands,
    },

    /// Account management
    Account {
        #[command(subcommand)]
        action: AccountCommands,
    },

    /// Per-period account balance snapshots
    Snapshot {
        #[command(subcommand)]
        action: SnapshotCommands,
    },

    /// Income records
    Income {
        #[command(subcommand)]
        action: IncomeCommands,
    },

    /// Expense records
    Expense {
        #[command(subcommand)]
        action: ExpenseCommands,
    },

    /// Debt records
    Debt {
        #[command(subcommand)]
        action: DebtCommands,
    },

    /// Manual income expectations shown alongside the series
    Projected {
        #[command(subcommand)]
        action: ProjectedCommands,
    },

    /// Financial summary for one period
    Summary {
        /// Period in YYYY-MM format
        period: String,

        /// Output the summary as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Rolling cross-period series ending at a period
    Series {
        /// Period in YYYY-MM format (last month of the window)
        period: String,

        /// Number of trailing months to include
        #[arg(short, long)]
        months: Option<usize>,

        /// Output the series as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum PeriodCommands {
    /// Create a period
    Add {
        /// Period in YYYY-MM format
        id: String,

        /// Manual USD->COP rate for this month
        #[arg(long)]
        rate: Option<String>,
    },

    /// List all periods, oldest first
    List,

    /// Set or replace a period's USD->COP rate
    SetRate {
        /// Period in YYYY-MM format
        id: String,

        /// Manual USD->COP rate
        rate: String,
    },

    /// Copy the previous month's incomes into a period
    CopyIncomes {
        /// Target period in YYYY-MM format
        id: String,
    },

    /// Export a period's records to a JSON file
    Export {
        /// Period in YYYY-MM format
        id: String,

        /// Destination file
        file: PathBuf,
    },

    /// Import a period from a JSON export (all-or-nothing)
    Import {
        /// Source file produced by `period export`
        file: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum EntityCommands {
    /// Register an entity
    Add {
        /// Entity name
        name: String,

        /// Entity type (bank, franchise, person, employer, broker, other)
        #[arg(long = "type")]
        entity_type: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List all entities
    List,
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Register an account
    Add {
        /// Account name
        name: String,

        /// Id of the owning entity
        #[arg(long)]
        entity: String,

        /// Free-form account type label (e.g. "Ahorros", "CDT")
        #[arg(long = "type", default_value = "Cuenta")]
        account_type: String,

        /// Category tag, repeatable (cash, low_amount_account, savings,
        /// emergency_fund, invest_short, invest_medium, invest_long,
        /// retirement, other)
        #[arg(long = "category", required = true)]
        categories: Vec<String>,

        /// Native currency (COP or USD)
        #[arg(long, default_value = "COP")]
        currency: String,

        /// Mark as the account salary is paid into
        #[arg(long)]
        salary: bool,
    },

    /// List accounts
    List {
        /// Include inactive accounts
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
pub enum SnapshotCommands {
    /// Record or replace an account's balance for a period
    Set {
        /// Period in YYYY-MM format
        period: String,

        /// Account id
        account: String,

        /// End-of-month balance in the account's native currency
        balance: String,

        /// Projected effective annual rate (e.g. 0.12 for 12% EA)
        #[arg(long)]
        rate: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List a period's snapshots
    List {
        /// Period in YYYY-MM format
        period: String,
    },
}

#[derive(Subcommand)]
pub enum IncomeCommands {
    /// Record an income
    Add {
        /// Period in YYYY-MM format
        period: String,

        /// What the income is
        concept: String,

        /// Amount in its native currency
        amount: String,

        /// Native currency (COP or USD)
        #[arg(long, default_value = "COP")]
        currency: String,

        /// Mark as salary
        #[arg(long)]
        salary: bool,

        /// Date within the month (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Id of the paying entity
        #[arg(long)]
        entity: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List a period's incomes
    List {
        /// Period in YYYY-MM format
        period: String,
    },
}

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an expense
    Add {
        /// Period in YYYY-MM format
        period: String,

        /// What the expense is
        concept: String,

        /// Amount in its native currency
        amount: String,

        /// Native currency (COP or USD)
        #[arg(long, default_value = "COP")]
        currency: String,

        /// Date within the month (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,

        /// Id of the entity paid
        #[arg(long)]
        entity: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List a period's expenses
    List {
        /// Period in YYYY-MM format
        period: String,
    },
}

#[derive(Subcommand)]
pub enum ProjectedCommands {
    /// Record an expected income against an account for a period
    Add {
        /// Period in YYYY-MM format
        period: String,

        /// Account id the expectation applies to
        account: String,

        /// What the expected income is
        concept: String,

        /// Kind of expectation (salary, fixed_ea, variable_monthly)
        #[arg(long, default_value = "salary")]
        kind: String,

        /// Fixed monthly amount, in the account's currency (salary kind)
        #[arg(long)]
        amount: Option<String>,

        /// Effective annual rate in percent, e.g. 12 for 12% EA (fixed_ea kind)
        #[arg(long = "rate-ea")]
        rate_ea: Option<String>,

        /// Monthly rate in percent, e.g. 1.5 (variable_monthly kind)
        #[arg(long = "rate-monthly")]
        rate_monthly: Option<String>,

        /// Mark as recurring month over month
        #[arg(long)]
        recurring: bool,

        /// Id of the paying entity
        #[arg(long)]
        entity: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List a period's expected incomes
    List {
        /// Period in YYYY-MM format
        period: String,
    },
}

#[derive(Subcommand)]
pub enum DebtCommands {
    /// Record a debt balance for a period
    Add {
        /// Period in YYYY-MM format
        period: String,

        /// Outstanding amount in its native currency
        amount: String,

        /// Native currency (COP or USD)
        #[arg(long, default_value = "COP")]
        currency: String,

        /// Amount already amortized against this debt
        #[arg(long)]
        amortization: Option<String>,

        /// Series id linking the same debt across months
        #[arg(long)]
        series: Option<String>,

        /// Debt type (loan, credit_card, personal, other)
        #[arg(long = "type")]
        debt_type: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Id of the creditor entity
        #[arg(long)]
        entity: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// List a period's debts
    List {
        /// Period in YYYY-MM format
        period: String,
    },
}
