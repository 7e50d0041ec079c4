//! Ledger store seam
//!
//! The engine reads raw records through [`LedgerStore`]; [`crate::db::Database`]
//! is the SQLite implementation and [`MemoryLedger`] serves tests and hosts
//! that already hold the records in memory.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{RawBudget, RawGoal, RawLedger, RawTransaction};

/// Read side of the ledger
///
/// Ranges are half-open `[from, to)`. Implementations return raw rows; the
/// normalizer decides what is valid.
pub trait LedgerStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Transactions for `user_id` dated within `[from, to)`
    fn list_transactions(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawTransaction>, Self::Error>;

    /// Budgets for `user_id` whose period overlaps `[from, to)`
    fn list_budgets(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawBudget>, Self::Error>;

    /// All goals for `user_id`
    fn list_goals(&self, user_id: &str) -> Result<Vec<RawGoal>, Self::Error>;
}

impl<T: LedgerStore + ?Sized> LedgerStore for &T {
    type Error = T::Error;

    fn list_transactions(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawTransaction>, Self::Error> {
        (**self).list_transactions(user_id, from, to)
    }

    fn list_budgets(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawBudget>, Self::Error> {
        (**self).list_budgets(user_id, from, to)
    }

    fn list_goals(&self, user_id: &str) -> Result<Vec<RawGoal>, Self::Error> {
        (**self).list_goals(user_id)
    }
}

/// Failure raised by a [`MemoryLedger`] marked unavailable
#[derive(Debug, Clone, Error)]
#[error("memory ledger unavailable: {0}")]
pub struct MemoryLedgerError(pub String);

/// In-memory [`LedgerStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    ledger: RawLedger,
    outage: Option<String>,
}

/// Leading `YYYY-MM-DD` of a raw date, if it has one
///
/// Rows whose date can't be read are still returned so the normalizer can
/// report them.
fn leading_date(raw: &str) -> Option<NaiveDate> {
    raw.get(..10)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

impl MemoryLedger {
    pub fn new(ledger: RawLedger) -> Self {
        Self {
            ledger,
            outage: None,
        }
    }

    /// A store whose every read fails with `reason`
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            ledger: RawLedger::default(),
            outage: Some(reason.into()),
        }
    }

    pub fn push_transaction(&mut self, tx: RawTransaction) {
        self.ledger.transactions.push(tx);
    }

    pub fn push_budget(&mut self, budget: RawBudget) {
        self.ledger.budgets.push(budget);
    }

    pub fn push_goal(&mut self, goal: RawGoal) {
        self.ledger.goals.push(goal);
    }

    fn check(&self) -> Result<(), MemoryLedgerError> {
        match &self.outage {
            Some(reason) => Err(MemoryLedgerError(reason.clone())),
            None => Ok(()),
        }
    }
}

impl LedgerStore for MemoryLedger {
    type Error = MemoryLedgerError;

    fn list_transactions(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawTransaction>, Self::Error> {
        self.check()?;
        Ok(self
            .ledger
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .filter(|t| leading_date(&t.date).map_or(true, |d| d >= from && d < to))
            .cloned()
            .collect())
    }

    fn list_budgets(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<RawBudget>, Self::Error> {
        self.check()?;
        Ok(self
            .ledger
            .budgets
            .iter()
            .filter(|b| b.user_id == user_id)
            .filter(|b| {
                match (leading_date(&b.period_start), leading_date(&b.period_end)) {
                    (Some(start), Some(end)) => start < to && end > from,
                    _ => true,
                }
            })
            .cloned()
            .collect())
    }

    fn list_goals(&self, user_id: &str) -> Result<Vec<RawGoal>, Self::Error> {
        self.check()?;
        Ok(self
            .ledger
            .goals
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }
}
