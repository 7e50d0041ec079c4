//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Fi-Fusion - see where your money goes
#[derive(Parser)]
#[command(name = "fifusion")]
#[command(about = "Personal finance dashboard: totals, budgets, goals, health score and insights", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "fifusion.db", global = true)]
    pub db: PathBuf,

    /// Ledger owner; every record and dashboard is scoped to one user
    #[arg(long, default_value = "default", global = true)]
    pub user: String,

    /// Engine config file (defaults to the data dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for real data)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set FIFUSION_DB_KEY environment variable with your passphrase.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Import transactions from CSV (date, description, amount[, category][, currency])
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Manage transactions (list, add, delete)
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// Manage budgets (list, add, delete)
    Budgets {
        #[command(subcommand)]
        action: Option<BudgetsAction>,
    },

    /// Manage savings goals (list, add, progress, delete)
    Goals {
        #[command(subcommand)]
        action: Option<GoalsAction>,
    },

    /// Show the dashboard for a period
    ///
    /// Defaults to the current calendar month. Periods are half-open:
    /// --to is the first day NOT included.
    Dashboard {
        /// Calendar month (YYYY-MM)
        #[arg(long, conflicts_with_all = ["from", "to"])]
        period: Option<String>,

        /// First day of the period (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Day after the last day of the period (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,

        /// Print the view as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List recent transactions
    List {
        /// Maximum number to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },

    /// Record a transaction by hand
    Add {
        /// Date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Signed amount in major units (negative = expense)
        #[arg(long, allow_negative_numbers = true)]
        amount: f64,

        #[arg(long)]
        description: String,

        #[arg(long)]
        category: Option<String>,

        /// ISO 4217 code (defaults to two decimal places)
        #[arg(long)]
        currency: Option<String>,
    },

    /// Delete a transaction
    Delete {
        /// Transaction ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum BudgetsAction {
    /// List budgets
    List,

    /// Add a budget for one category and period
    Add {
        #[arg(long)]
        category: String,

        /// Allocated amount in major units
        #[arg(long)]
        amount: f64,

        /// Calendar month (YYYY-MM); defaults to the current month
        #[arg(long, conflicts_with_all = ["from", "to"])]
        period: Option<String>,

        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,

        #[arg(long)]
        currency: Option<String>,
    },

    /// Delete a budget
    Delete {
        /// Budget ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum GoalsAction {
    /// List goals
    List,

    /// Add a savings goal
    Add {
        #[arg(long)]
        name: String,

        /// Target amount in major units
        #[arg(long)]
        target: f64,

        /// Amount already saved
        #[arg(long, default_value = "0")]
        current: f64,

        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: NaiveDate,

        /// Category whose transactions count as contributions
        #[arg(long)]
        category: String,

        #[arg(long)]
        currency: Option<String>,
    },

    /// Record the amount saved so far
    Progress {
        /// Goal ID
        id: i64,

        /// New saved amount in major units
        #[arg(long)]
        amount: f64,
    },

    /// Delete a goal
    Delete {
        /// Goal ID
        id: i64,
    },
}
