//! Budget operations

use chrono::NaiveDate;
use rusqlite::params;

use super::{date_param, Database};
use crate::error::{Error, Result};
use crate::models::{NewBudget, RawBudget};

const SELECT_COLUMNS: &str =
    "SELECT id, user_id, category, allocated, currency, period_start, period_end FROM budgets";

impl Database {
    /// Insert a budget for one category and period
    ///
    /// A second budget for the same category and exact period is rejected by
    /// the unique index; partially overlapping periods are caught later by
    /// the normalizer.
    pub fn insert_budget(&self, user_id: &str, budget: &NewBudget) -> Result<i64> {
        if budget.period_end <= budget.period_start {
            return Err(Error::InvariantViolation(format!(
                "budget period end {} is not after start {}",
                budget.period_end, budget.period_start
            )));
        }
        if !budget.allocated.is_finite() || budget.allocated < 0.0 {
            return Err(Error::validation("allocated", "must be a non-negative amount"));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO budgets (user_id, category, allocated, currency, period_start, period_end)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                budget.category,
                budget.allocated,
                budget.currency,
                date_param(budget.period_start),
                date_param(budget.period_end),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Budgets whose period overlaps `[from, to)`
    pub fn budgets_overlapping(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawBudget>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? AND period_start < ? AND period_end > ? ORDER BY period_start, category",
            SELECT_COLUMNS
        ))?;

        let budgets = stmt
            .query_map(
                params![user_id, date_param(to), date_param(from)],
                Self::row_to_budget,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(budgets)
    }

    /// Every budget for a user, newest period first
    pub fn list_all_budgets(&self, user_id: &str) -> Result<Vec<RawBudget>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? ORDER BY period_start DESC, category",
            SELECT_COLUMNS
        ))?;

        let budgets = stmt
            .query_map(params![user_id], Self::row_to_budget)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(budgets)
    }

    /// Delete a budget; returns whether a row was removed
    pub fn delete_budget(&self, user_id: &str, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM budgets WHERE user_id = ? AND id = ?",
            params![user_id, id],
        )?;
        Ok(deleted > 0)
    }

    fn row_to_budget(row: &rusqlite::Row) -> rusqlite::Result<RawBudget> {
        Ok(RawBudget {
            id: row.get(0)?,
            user_id: row.get(1)?,
            category: row.get(2)?,
            allocated: row.get(3)?,
            currency: row.get(4)?,
            period_start: row.get(5)?,
            period_end: row.get(6)?,
        })
    }
}
