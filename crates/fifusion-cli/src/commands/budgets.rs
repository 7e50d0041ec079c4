//! Budget command implementations

use anyhow::{bail, Result};
use chrono::NaiveDate;
use fifusion_core::{db::Database, models::NewBudget};

pub fn cmd_budgets_list(db: &Database, user_id: &str) -> Result<()> {
    let budgets = db.list_all_budgets(user_id)?;

    if budgets.is_empty() {
        println!("No budgets yet. Add one with:");
        println!("  fifusion budgets add --category Housing --amount 1200 --period 2024-01");
        return Ok(());
    }

    println!();
    println!("📋 Budgets");
    println!("   ─────────────────────────────────────────────────────────────");

    for budget in budgets {
        println!(
            "   [{}] {} → {} │ {:<20} │ {:>10.2}",
            budget.id,
            budget.period_start,
            budget.period_end,
            budget.category.as_deref().unwrap_or("-"),
            budget.allocated
        );
    }

    Ok(())
}

pub fn cmd_budgets_add(
    db: &Database,
    user_id: &str,
    category: &str,
    amount: f64,
    period_start: NaiveDate,
    period_end: NaiveDate,
    currency: Option<String>,
) -> Result<()> {
    let category = category.trim();
    if category.is_empty() {
        bail!("Category must not be empty");
    }

    let id = db.insert_budget(
        user_id,
        &NewBudget {
            category: category.to_string(),
            allocated: amount,
            currency,
            period_start,
            period_end,
        },
    )?;

    println!(
        "✅ Added budget {} for {} ({} → {})",
        id, category, period_start, period_end
    );
    Ok(())
}

pub fn cmd_budgets_delete(db: &Database, user_id: &str, id: i64) -> Result<()> {
    if !db.delete_budget(user_id, id)? {
        bail!("Budget {} not found", id);
    }
    println!("🗑️  Deleted budget {}", id);
    Ok(())
}
