//! Transaction operations

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{date_param, Database};
use crate::error::Result;
use crate::models::{NewTransaction, RawTransaction};

const SELECT_COLUMNS: &str =
    "SELECT id, user_id, amount, currency, category, description, date FROM transactions";

impl Database {
    /// Insert a transaction (skips duplicates based on import_hash)
    ///
    /// Returns `None` when a row with the same import hash already exists
    /// for this user.
    pub fn insert_transaction(&self, user_id: &str, tx: &NewTransaction) -> Result<Option<i64>> {
        let conn = self.conn()?;

        if let Some(hash) = &tx.import_hash {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM transactions WHERE user_id = ? AND import_hash = ?",
                    params![user_id, hash],
                    |row| row.get(0),
                )
                .optional()?;

            if existing.is_some() {
                return Ok(None);
            }
        }

        conn.execute(
            r#"
            INSERT INTO transactions (user_id, date, description, amount, currency, category, import_hash)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                date_param(tx.date),
                tx.description,
                tx.amount,
                tx.currency,
                tx.category,
                tx.import_hash,
            ],
        )?;

        Ok(Some(conn.last_insert_rowid()))
    }

    /// Get a single transaction by ID
    pub fn get_transaction(&self, user_id: &str, id: i64) -> Result<Option<RawTransaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                &format!("{} WHERE user_id = ? AND id = ?", SELECT_COLUMNS),
                params![user_id, id],
                Self::row_to_transaction,
            )
            .optional()?;
        Ok(tx)
    }

    /// Transactions dated within `[from, to)`, oldest first
    pub fn transactions_between(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawTransaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? AND date >= ? AND date < ? ORDER BY date, id",
            SELECT_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(
                params![user_id, date_param(from), date_param(to)],
                Self::row_to_transaction,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Most recent transactions, newest first
    pub fn recent_transactions(&self, user_id: &str, limit: i64) -> Result<Vec<RawTransaction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE user_id = ? ORDER BY date DESC, id DESC LIMIT ?",
            SELECT_COLUMNS
        ))?;

        let transactions = stmt
            .query_map(params![user_id, limit], Self::row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Delete a transaction; returns whether a row was removed
    pub fn delete_transaction(&self, user_id: &str, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM transactions WHERE user_id = ? AND id = ?",
            params![user_id, id],
        )?;
        Ok(deleted > 0)
    }

    /// Count transactions for a user
    pub fn count_transactions(&self, user_id: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<RawTransaction> {
        Ok(RawTransaction {
            id: row.get(0)?,
            user_id: row.get(1)?,
            amount: row.get(2)?,
            currency: row.get(3)?,
            category: row.get(4)?,
            description: row.get(5)?,
            date: row.get(6)?,
        })
    }
}
