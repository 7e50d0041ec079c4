//! Fi-Fusion CLI - personal finance dashboard
//!
//! Usage:
//!   fifusion init                        Initialize database
//!   fifusion import --file CSV           Import transactions
//!   fifusion budgets add ...             Record a budget
//!   fifusion dashboard --period 2023-10  Show the dashboard for a month

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Import { file } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_import(&db, &cli.user, &file)
        }
        Commands::Transactions { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None => commands::cmd_transactions_list(&db, &cli.user, 20),
                Some(TransactionsAction::List { limit }) => {
                    commands::cmd_transactions_list(&db, &cli.user, limit)
                }
                Some(TransactionsAction::Add {
                    date,
                    amount,
                    description,
                    category,
                    currency,
                }) => commands::cmd_transactions_add(
                    &db,
                    &cli.user,
                    date,
                    amount,
                    &description,
                    category,
                    currency,
                ),
                Some(TransactionsAction::Delete { id }) => {
                    commands::cmd_transactions_delete(&db, &cli.user, id)
                }
            }
        }
        Commands::Budgets { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(BudgetsAction::List) => commands::cmd_budgets_list(&db, &cli.user),
                Some(BudgetsAction::Add {
                    category,
                    amount,
                    period,
                    from,
                    to,
                    currency,
                }) => {
                    let (start, end) = commands::resolve_period(
                        period.as_deref(),
                        from,
                        to,
                        commands::today(),
                    )?;
                    commands::cmd_budgets_add(&db, &cli.user, &category, amount, start, end, currency)
                }
                Some(BudgetsAction::Delete { id }) => {
                    commands::cmd_budgets_delete(&db, &cli.user, id)
                }
            }
        }
        Commands::Goals { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None | Some(GoalsAction::List) => commands::cmd_goals_list(&db, &cli.user),
                Some(GoalsAction::Add {
                    name,
                    target,
                    current,
                    deadline,
                    category,
                    currency,
                }) => commands::cmd_goals_add(
                    &db, &cli.user, &name, target, current, deadline, &category, currency,
                ),
                Some(GoalsAction::Progress { id, amount }) => {
                    commands::cmd_goals_progress(&db, &cli.user, id, amount)
                }
                Some(GoalsAction::Delete { id }) => commands::cmd_goals_delete(&db, &cli.user, id),
            }
        }
        Commands::Dashboard {
            period,
            from,
            to,
            json,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let config = commands::load_config(cli.config.as_deref())?;
            let (start, end) =
                commands::resolve_period(period.as_deref(), from, to, commands::today())?;
            let output = commands::cmd_dashboard(&db, config, &cli.user, start, end, json)?;
            println!("{}", output);
            Ok(())
        }
    }
}
