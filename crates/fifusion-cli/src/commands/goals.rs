//! Savings goal command implementations

use anyhow::{bail, Result};
use chrono::NaiveDate;
use fifusion_core::{db::Database, models::NewGoal};

pub fn cmd_goals_list(db: &Database, user_id: &str) -> Result<()> {
    let goals = db.goals_for_user(user_id)?;

    if goals.is_empty() {
        println!("No goals yet. Add one with:");
        println!(
            "  fifusion goals add --name \"Emergency Fund\" --target 10000 --deadline 2025-06-01 --category Savings"
        );
        return Ok(());
    }

    println!();
    println!("🎯 Goals");
    println!("   ─────────────────────────────────────────────────────────────");

    for goal in goals {
        let pct = if goal.target_amount > 0.0 {
            goal.current_amount / goal.target_amount * 100.0
        } else {
            0.0
        };
        println!(
            "   [{}] {:<20} │ {:>10.2} / {:<10.2} ({:>3.0}%) │ due {}",
            goal.id,
            goal.name.as_deref().unwrap_or("-"),
            goal.current_amount,
            goal.target_amount,
            pct,
            goal.deadline
        );
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_goals_add(
    db: &Database,
    user_id: &str,
    name: &str,
    target: f64,
    current: f64,
    deadline: NaiveDate,
    category: &str,
    currency: Option<String>,
) -> Result<()> {
    if name.trim().is_empty() || category.trim().is_empty() {
        bail!("Goal name and category must not be empty");
    }

    let id = db.insert_goal(
        user_id,
        &NewGoal {
            name: name.trim().to_string(),
            target_amount: target,
            current_amount: current,
            currency,
            deadline,
            category: category.trim().to_string(),
        },
    )?;

    println!("✅ Added goal {} ({})", id, name.trim());
    Ok(())
}

pub fn cmd_goals_progress(db: &Database, user_id: &str, id: i64, amount: f64) -> Result<()> {
    db.update_goal_progress(user_id, id, amount)?;
    println!("✅ Goal {} now at {:.2}", id, amount);
    Ok(())
}

pub fn cmd_goals_delete(db: &Database, user_id: &str, id: i64) -> Result<()> {
    if !db.delete_goal(user_id, id)? {
        bail!("Goal {} not found", id);
    }
    println!("🗑️  Deleted goal {}", id);
    Ok(())
}
