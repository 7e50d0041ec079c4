//! Savings goal operations

use rusqlite::params;

use super::{date_param, Database};
use crate::error::{Error, Result};
use crate::models::{NewGoal, RawGoal};

const SELECT_COLUMNS: &str = "SELECT id, user_id, name, target_amount, current_amount, currency, deadline, category FROM goals";

fn check_progress(target: f64, current: f64) -> Result<()> {
    if !target.is_finite() || target <= 0.0 {
        return Err(Error::validation("target_amount", "must be positive"));
    }
    if !current.is_finite() || current < 0.0 {
        return Err(Error::validation("current_amount", "must not be negative"));
    }
    if current > target {
        return Err(Error::InvariantViolation(format!(
            "goal progress {} exceeds target {}",
            current, target
        )));
    }
    Ok(())
}

impl Database {
    /// Insert a savings goal
    pub fn insert_goal(&self, user_id: &str, goal: &NewGoal) -> Result<i64> {
        check_progress(goal.target_amount, goal.current_amount)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO goals (user_id, name, target_amount, current_amount, currency, deadline, category)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                goal.name,
                goal.target_amount,
                goal.current_amount,
                goal.currency,
                date_param(goal.deadline),
                goal.category,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// All goals for a user, nearest deadline first
    pub fn goals_for_user(&self, user_id: &str) -> Result<Vec<RawGoal>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? ORDER BY deadline, id",
            SELECT_COLUMNS
        ))?;

        let goals = stmt
            .query_map(params![user_id], |row| {
                Ok(RawGoal {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    name: row.get(2)?,
                    target_amount: row.get(3)?,
                    current_amount: row.get(4)?,
                    currency: row.get(5)?,
                    deadline: row.get(6)?,
                    category: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(goals)
    }

    /// Record new progress toward a goal
    pub fn update_goal_progress(&self, user_id: &str, id: i64, current_amount: f64) -> Result<()> {
        let conn = self.conn()?;
        let target: f64 = conn
            .query_row(
                "SELECT target_amount FROM goals WHERE user_id = ? AND id = ?",
                params![user_id, id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Error::NotFound(format!("goal {}", id)),
                other => Error::Database(other),
            })?;

        check_progress(target, current_amount)?;

        conn.execute(
            "UPDATE goals SET current_amount = ? WHERE user_id = ? AND id = ?",
            params![current_amount, user_id, id],
        )?;
        Ok(())
    }

    /// Delete a goal; returns whether a row was removed
    pub fn delete_goal(&self, user_id: &str, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM goals WHERE user_id = ? AND id = ?",
            params![user_id, id],
        )?;
        Ok(deleted > 0)
    }
}
