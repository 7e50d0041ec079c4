//! Domain models for Fi-Fusion
//!
//! Three layers live here:
//! - raw records as the ledger store hands them out (`Raw*`)
//! - canonical value objects produced by the normalizer (`Transaction`, `Budget`, `Goal`)
//! - derived, never-persisted aggregates (`AggregateSnapshot` and its parts)

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::normalize::minor_unit_exponent;

/// Category assigned to transactions stored without one
pub const UNCATEGORIZED: &str = "Uncategorized";

// ============================================================================
// Raw store records
// ============================================================================

/// A transaction row exactly as the ledger store returns it
///
/// Amounts are in major units (e.g. dollars) and dates are unparsed strings;
/// nothing here is trusted until it passes through the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub id: i64,
    pub user_id: String,
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub date: String,
}

/// A budget row exactly as the ledger store returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBudget {
    pub id: i64,
    pub user_id: String,
    #[serde(default)]
    pub category: Option<String>,
    pub allocated: f64,
    #[serde(default)]
    pub currency: Option<String>,
    pub period_start: String,
    pub period_end: String,
}

/// A goal row exactly as the ledger store returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGoal {
    pub id: i64,
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub target_amount: f64,
    pub current_amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    pub deadline: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Everything the store returned for one dashboard request
#[derive(Debug, Clone, Default)]
pub struct RawLedger {
    pub transactions: Vec<RawTransaction>,
    pub budgets: Vec<RawBudget>,
    pub goals: Vec<RawGoal>,
}

// ============================================================================
// Records for insertion
// ============================================================================

/// New transaction to insert (before it has an ID)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub description: String,
    /// Major units; negative = expense
    pub amount: f64,
    pub currency: Option<String>,
    pub category: Option<String>,
    /// SHA-256 of the source row, used to skip re-imports
    pub import_hash: Option<String>,
}

/// New budget to insert
#[derive(Debug, Clone)]
pub struct NewBudget {
    pub category: String,
    pub allocated: f64,
    pub currency: Option<String>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

/// New savings goal to insert
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub currency: Option<String>,
    pub deadline: NaiveDate,
    pub category: String,
}

// ============================================================================
// Canonical value objects
// ============================================================================

/// A validated ledger transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    /// Signed minor units: negative = expense, positive = income
    pub amount_minor: i64,
    pub category: String,
    pub description: String,
    pub occurred_on: NaiveDate,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.amount_minor < 0
    }

    pub fn is_income(&self) -> bool {
        self.amount_minor > 0
    }

    /// Whether this transaction falls inside the half-open period `[start, end)`
    pub fn occurs_within(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.occurred_on >= start && self.occurred_on < end
    }
}

/// A validated per-category spending budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: String,
    pub category: String,
    pub allocated_minor: i64,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
}

impl Budget {
    /// Whether the budget's period intersects `[start, end)`
    pub fn is_active_in(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.period_start < end && self.period_end > start
    }

    pub(crate) fn overlaps(&self, other: &Budget) -> bool {
        self.is_active_in(other.period_start, other.period_end)
    }
}

/// A validated savings goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub target_minor: i64,
    pub current_minor: i64,
    pub deadline: NaiveDate,
    pub category: String,
}

impl Goal {
    pub fn remaining_minor(&self) -> i64 {
        self.target_minor - self.current_minor
    }

    pub fn is_complete(&self) -> bool {
        self.current_minor >= self.target_minor
    }
}

// ============================================================================
// Derived aggregates
// ============================================================================

/// Budget consumption ratio with explicit sentinels instead of NaN/inf
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Utilization {
    /// `spent / allocated` for a non-zero allocation
    Ratio(f64),
    /// Spending against a zero allocation
    Unbounded,
    /// Zero allocation and nothing spent
    Undefined,
}

impl Utilization {
    pub fn from_amounts(allocated: i64, spent: i64) -> Self {
        if allocated > 0 {
            Self::Ratio(spent as f64 / allocated as f64)
        } else if spent > 0 {
            Self::Unbounded
        } else {
            Self::Undefined
        }
    }

    /// Whether spending has gone past the allocation
    pub fn is_over(&self) -> bool {
        match self {
            Self::Ratio(r) => *r > 1.0,
            Self::Unbounded => true,
            Self::Undefined => false,
        }
    }

    pub fn ratio(&self) -> Option<f64> {
        match self {
            Self::Ratio(r) => Some(*r),
            _ => None,
        }
    }
}

/// Allocation vs. spend for one budgeted category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetUtilization {
    pub allocated: i64,
    pub spent: i64,
    pub pct_used: Utilization,
}

/// Pacing of a single goal at the snapshot's as-of date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalPacing {
    pub goal: Goal,
    pub pct_complete: f64,
    pub on_track: bool,
    pub projected_completion_date: Option<NaiveDate>,
    /// Minor units per day still needed to hit the deadline (None once due or complete)
    pub required_daily_minor: Option<f64>,
    /// Minor units per day observed over the trailing accrual window
    pub observed_daily_minor: f64,
}

/// Percentage change against the preceding equal-length period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "pct", rename_all = "snake_case")]
pub enum TrendDelta {
    Change(f64),
    /// Prior period had a zero total
    InsufficientHistory,
}

impl TrendDelta {
    pub fn between(current: i64, prior: i64) -> Self {
        if prior == 0 {
            Self::InsufficientHistory
        } else {
            Self::Change((current - prior) as f64 / prior as f64 * 100.0)
        }
    }

    pub fn pct(&self) -> Option<f64> {
        match self {
            Self::Change(p) => Some(*p),
            Self::InsufficientHistory => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub income_delta: TrendDelta,
    pub expense_delta: TrendDelta,
}

/// A small charge that repeats for the same merchant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringExpense {
    pub category: String,
    pub merchant: String,
    /// Charges seen across the current and prior period
    pub occurrences: usize,
    /// Spend on this merchant inside the current period
    pub period_total_minor: i64,
}

/// Summary metrics for one user over one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Last calendar day inside the period
    pub as_of: NaiveDate,
    pub total_income: i64,
    pub total_expense: i64,
    pub net_savings: i64,
    pub category_totals: BTreeMap<String, i64>,
    pub budget_utilization: BTreeMap<String, BudgetUtilization>,
    pub goal_pacing: Vec<GoalPacing>,
    pub trend: Trend,
    pub recurring_expenses: Vec<RecurringExpense>,
    pub recent_transactions: Vec<Transaction>,
    /// ISO-4217 code every amount is in; `None` is the two-decimal default
    #[serde(default)]
    pub currency: Option<String>,
}

impl AggregateSnapshot {
    pub fn with_currency(mut self, currency: Option<String>) -> Self {
        self.currency = currency;
        self
    }

    /// Minor-unit digits of the snapshot's currency
    pub fn minor_exponent(&self) -> u32 {
        minor_unit_exponent(self.currency.as_deref()).unwrap_or(2)
    }

    /// Render an amount of this snapshot in major units
    pub fn format_amount(&self, minor: i64) -> String {
        format_minor(minor, self.minor_exponent())
    }
}

/// Number of days in the half-open period `[start, end)`
pub fn period_len_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// Render minor units as a major-unit decimal string (e.g. `-1234, 2` -> `-12.34`)
pub fn format_minor(minor: i64, exponent: u32) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    if exponent == 0 {
        return format!("{}{}", sign, abs);
    }
    let scale = 10u64.pow(exponent);
    format!(
        "{}{}.{:0width$}",
        sign,
        abs / scale,
        abs % scale,
        width = exponent as usize
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization_sentinels() {
        assert_eq!(Utilization::from_amounts(200, 250), Utilization::Ratio(1.25));
        assert_eq!(Utilization::from_amounts(0, 10), Utilization::Unbounded);
        assert_eq!(Utilization::from_amounts(0, 0), Utilization::Undefined);
        assert!(Utilization::Unbounded.is_over());
        assert!(!Utilization::Undefined.is_over());
        assert!(!Utilization::Ratio(1.0).is_over());
    }

    #[test]
    fn test_utilization_never_nan() {
        for allocated in [0_i64, 1, 7, 1200] {
            for spent in [0_i64, 1, 1150, 99_999] {
                if let Utilization::Ratio(r) = Utilization::from_amounts(allocated, spent) {
                    assert!(!r.is_nan());
                    assert_eq!(r, spent as f64 / allocated as f64);
                }
            }
        }
    }

    #[test]
    fn test_trend_delta() {
        assert_eq!(TrendDelta::between(110, 100), TrendDelta::Change(10.0));
        assert_eq!(TrendDelta::between(50, 100), TrendDelta::Change(-50.0));
        assert_eq!(TrendDelta::between(50, 0), TrendDelta::InsufficientHistory);
        assert_eq!(TrendDelta::InsufficientHistory.pct(), None);
    }

    #[test]
    fn test_format_minor() {
        assert_eq!(format_minor(3200, 2), "32.00");
        assert_eq!(format_minor(-1234, 2), "-12.34");
        assert_eq!(format_minor(5, 2), "0.05");
        assert_eq!(format_minor(-1500, 0), "-1500");
        assert_eq!(format_minor(12_345, 3), "12.345");
    }

    #[test]
    fn test_utilization_serialization() {
        let json = serde_json::to_value(Utilization::Unbounded).unwrap();
        assert_eq!(json["kind"], "unbounded");
        let json = serde_json::to_value(Utilization::Ratio(0.5)).unwrap();
        assert_eq!(json["value"], 0.5);
    }

    #[test]
    fn test_budget_activity() {
        let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
        let budget = Budget {
            id: 1,
            user_id: "u".into(),
            category: "Housing".into(),
            allocated_minor: 1200,
            period_start: d(1, 1),
            period_end: d(2, 1),
        };
        assert!(budget.is_active_in(d(1, 15), d(2, 15)));
        assert!(!budget.is_active_in(d(2, 1), d(3, 1)));
    }
}
