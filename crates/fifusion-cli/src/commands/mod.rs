//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `budgets` - Budget commands (list, add, delete)
//! - `core` - Core commands (init) and shared utilities (open_db, load_config)
//! - `dashboard` - Dashboard rendering and period resolution
//! - `goals` - Savings goal commands (list, add, progress, delete)
//! - `import` - CSV import
//! - `transactions` - Transaction commands (list, add, delete)

pub mod budgets;
pub mod core;
pub mod dashboard;
pub mod goals;
pub mod import;
pub mod transactions;

// Re-export command functions for main.rs
pub use budgets::*;
pub use core::*;
pub use dashboard::*;
pub use goals::*;
pub use import::*;
pub use transactions::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Major-unit amount with expense/income colouring
pub fn colored_amount(amount: f64) -> String {
    if amount < 0.0 {
        format!("\x1b[31m{:.2}\x1b[0m", amount.abs()) // Red for expenses
    } else {
        format!("\x1b[32m+{:.2}\x1b[0m", amount) // Green for income
    }
}
