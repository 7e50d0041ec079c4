//! Normalizer - converts raw store records into canonical value objects
//!
//! Money becomes integer minor units (round-half-to-even at the currency's
//! minor unit), dates become calendar days, and every invariant of the
//! canonical types is checked here so later stages can rely on them.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{
    Budget, Goal, RawBudget, RawGoal, RawLedger, RawTransaction, Transaction, UNCATEGORIZED,
};

/// Earliest calendar day the ledger store supports
pub const MIN_SUPPORTED_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1900, 1, 1) {
    Some(d) => d,
    None => panic!("valid date"),
};

/// Latest calendar day the ledger store supports
pub const MAX_SUPPORTED_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2199, 12, 31) {
    Some(d) => d,
    None => panic!("valid date"),
};

/// What to do with a record that fails validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizePolicy {
    /// Log the record and leave it out
    #[default]
    Skip,
    /// Abort the whole batch on the first bad record
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub policy: NormalizePolicy,
    /// Largest absolute amount accepted, in minor units
    pub max_minor_units: i64,
    /// Ledger currency (ISO 4217); inferred from the records when unset
    pub currency: Option<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            policy: NormalizePolicy::Skip,
            max_minor_units: 1_000_000_000_000,
            currency: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Transaction,
    Budget,
    Goal,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::Budget => "budget",
            Self::Goal => "goal",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A record dropped under [`NormalizePolicy::Skip`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    pub kind: RecordKind,
    pub id: i64,
    pub reason: String,
}

/// Canonical records for one request (order not guaranteed)
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
    pub goals: Vec<Goal>,
    pub skipped: Vec<SkippedRecord>,
    /// Currency every accepted amount is in
    pub currency: Option<String>,
}

/// Number of minor-unit digits for an ISO-4217 currency code
///
/// Missing currency means the ledger default (two decimal places).
pub fn minor_unit_exponent(currency: Option<&str>) -> Result<u32> {
    let Some(code) = currency.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(2);
    };

    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::validation(
            "currency",
            format!("'{}' is not an ISO-4217 code", code),
        ));
    }

    Ok(match code.to_ascii_uppercase().as_str() {
        "JPY" | "KRW" | "VND" | "CLP" | "ISK" | "UGX" | "XAF" | "XOF" => 0,
        "BHD" | "KWD" | "OMR" | "JOD" | "TND" | "IQD" | "LYD" => 3,
        _ => 2,
    })
}

/// Scale a major-unit amount to minor units using round-half-to-even
///
/// Binary noise below a millionth of a minor unit is dropped first so that
/// `2.675` is treated as the tie it was written as.
pub fn round_to_minor(amount: f64, exponent: u32) -> f64 {
    let scaled = amount * 10f64.powi(exponent as i32);
    let cleaned = (scaled * 1e6).round() / 1e6;
    cleaned.round_ties_even()
}

/// Parse a stored date (plain ISO date, SQLite datetime, or RFC 3339 timestamp)
fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .ok_or_else(|| Error::validation(field, format!("'{}' is not a date", value)))?;

    if !(MIN_SUPPORTED_DATE..=MAX_SUPPORTED_DATE).contains(&date) {
        return Err(Error::InvariantViolation(format!(
            "{} {} is outside the supported range {}..={}",
            field, date, MIN_SUPPORTED_DATE, MAX_SUPPORTED_DATE
        )));
    }

    Ok(date)
}

/// Currency a record is denominated in, checked against the ledger currency
///
/// Records without a code take the ledger's.
fn record_currency<'a>(record: Option<&'a str>, ledger: Option<&'a str>) -> Result<Option<&'a str>> {
    let Some(code) = record.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(ledger);
    };
    minor_unit_exponent(Some(code))?;

    match ledger {
        Some(expected) if !code.eq_ignore_ascii_case(expected) => Err(Error::InvariantViolation(
            format!(
                "currency {} does not match ledger currency {}",
                code.to_ascii_uppercase(),
                expected
            ),
        )),
        _ => Ok(Some(code)),
    }
}

fn required_text(field: &'static str, value: Option<&str>) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(Error::validation(field, "must not be empty")),
    }
}

/// Raw record → canonical value object conversion
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    fn to_minor(&self, field: &'static str, amount: f64, currency: Option<&str>) -> Result<i64> {
        if !amount.is_finite() {
            return Err(Error::validation(field, "amount is not a finite number"));
        }

        let exponent = minor_unit_exponent(currency)?;
        let rounded = round_to_minor(amount, exponent);

        if rounded.abs() > self.config.max_minor_units as f64 {
            return Err(Error::Range(format!(
                "{} of {} exceeds the maximum of {} minor units",
                field, amount, self.config.max_minor_units
            )));
        }

        Ok(rounded as i64)
    }

    /// The configured ledger currency, or the most common valid code in `raw`
    ///
    /// Ties go to the alphabetically first code so the choice doesn't depend
    /// on record order.
    pub fn ledger_currency(&self, raw: &RawLedger) -> Option<String> {
        if let Some(code) = self
            .config
            .currency
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            return Some(code.to_ascii_uppercase());
        }

        let codes = raw
            .transactions
            .iter()
            .map(|t| t.currency.as_deref())
            .chain(raw.budgets.iter().map(|b| b.currency.as_deref()))
            .chain(raw.goals.iter().map(|g| g.currency.as_deref()))
            .flatten()
            .map(str::trim)
            .filter(|c| !c.is_empty() && minor_unit_exponent(Some(c)).is_ok());

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for code in codes {
            *counts.entry(code.to_ascii_uppercase()).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
            .map(|(code, _)| code)
    }

    pub fn normalize_transaction(&self, raw: &RawTransaction) -> Result<Transaction> {
        self.transaction_in(raw, self.config.currency.as_deref())
    }

    fn transaction_in(&self, raw: &RawTransaction, ledger: Option<&str>) -> Result<Transaction> {
        let user_id = required_text("user_id", Some(&raw.user_id))?;
        let currency = record_currency(raw.currency.as_deref(), ledger)?;
        let amount_minor = self.to_minor("amount", raw.amount, currency)?;
        let occurred_on = parse_date("date", &raw.date)?;

        let category = raw
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED)
            .to_string();

        Ok(Transaction {
            id: raw.id,
            user_id,
            amount_minor,
            category,
            description: raw.description.as_deref().unwrap_or("").trim().to_string(),
            occurred_on,
        })
    }

    pub fn normalize_budget(&self, raw: &RawBudget) -> Result<Budget> {
        self.budget_in(raw, self.config.currency.as_deref())
    }

    fn budget_in(&self, raw: &RawBudget, ledger: Option<&str>) -> Result<Budget> {
        let user_id = required_text("user_id", Some(&raw.user_id))?;
        let category = required_text("category", raw.category.as_deref())?;
        let currency = record_currency(raw.currency.as_deref(), ledger)?;
        let allocated_minor = self.to_minor("allocated", raw.allocated, currency)?;
        if allocated_minor < 0 {
            return Err(Error::validation("allocated", "must not be negative"));
        }

        let period_start = parse_date("period_start", &raw.period_start)?;
        let period_end = parse_date("period_end", &raw.period_end)?;
        if period_end <= period_start {
            return Err(Error::InvariantViolation(format!(
                "budget {} period ends ({}) on or before it starts ({})",
                raw.id, period_end, period_start
            )));
        }

        Ok(Budget {
            id: raw.id,
            user_id,
            category,
            allocated_minor,
            period_start,
            period_end,
        })
    }

    pub fn normalize_goal(&self, raw: &RawGoal) -> Result<Goal> {
        self.goal_in(raw, self.config.currency.as_deref())
    }

    fn goal_in(&self, raw: &RawGoal, ledger: Option<&str>) -> Result<Goal> {
        let user_id = required_text("user_id", Some(&raw.user_id))?;
        let name = required_text("name", raw.name.as_deref())?;
        let category = required_text("category", raw.category.as_deref())?;
        let currency = record_currency(raw.currency.as_deref(), ledger)?;

        let target_minor = self.to_minor("target_amount", raw.target_amount, currency)?;
        if target_minor <= 0 {
            return Err(Error::validation("target_amount", "must be positive"));
        }

        let current_minor = self.to_minor("current_amount", raw.current_amount, currency)?;
        if current_minor < 0 {
            return Err(Error::validation("current_amount", "must not be negative"));
        }
        if current_minor > target_minor {
            return Err(Error::InvariantViolation(format!(
                "goal {} current amount {} exceeds target {}",
                raw.id, current_minor, target_minor
            )));
        }

        Ok(Goal {
            id: raw.id,
            user_id,
            name,
            target_minor,
            current_minor,
            deadline: parse_date("deadline", &raw.deadline)?,
            category,
        })
    }

    /// Normalize everything the store returned, applying the configured policy
    ///
    /// All amounts are held to one ledger currency; records in another one
    /// are rejected.
    pub fn normalize_batch(&self, raw: &RawLedger) -> Result<NormalizedBatch> {
        let ledger = self.ledger_currency(raw);
        let mut batch = NormalizedBatch {
            currency: ledger.clone(),
            ..NormalizedBatch::default()
        };

        for tx in &raw.transactions {
            match self.transaction_in(tx, ledger.as_deref()) {
                Ok(t) => batch.transactions.push(t),
                Err(e) => self.reject(&mut batch, RecordKind::Transaction, tx.id, e)?,
            }
        }

        // Earlier periods claim a category first so overlap rejection is stable
        let mut budgets: Vec<&RawBudget> = raw.budgets.iter().collect();
        budgets.sort_by(|a, b| {
            a.period_start
                .cmp(&b.period_start)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut accepted: HashMap<(String, String), Vec<usize>> = HashMap::new();
        for raw_budget in budgets {
            let result = self.budget_in(raw_budget, ledger.as_deref()).and_then(|budget| {
                let key = (budget.user_id.clone(), budget.category.clone());
                let clash = accepted.get(&key).and_then(|idxs| {
                    idxs.iter()
                        .map(|&i| &batch.budgets[i])
                        .find(|existing| existing.overlaps(&budget))
                });
                if let Some(existing) = clash {
                    return Err(Error::InvariantViolation(format!(
                        "budget {} for '{}' overlaps budget {}",
                        budget.id, budget.category, existing.id
                    )));
                }
                Ok((key, budget))
            });

            match result {
                Ok((key, budget)) => {
                    accepted.entry(key).or_default().push(batch.budgets.len());
                    batch.budgets.push(budget);
                }
                Err(e) => self.reject(&mut batch, RecordKind::Budget, raw_budget.id, e)?,
            }
        }

        for goal in &raw.goals {
            match self.goal_in(goal, ledger.as_deref()) {
                Ok(g) => batch.goals.push(g),
                Err(e) => self.reject(&mut batch, RecordKind::Goal, goal.id, e)?,
            }
        }

        tracing::debug!(
            transactions = batch.transactions.len(),
            budgets = batch.budgets.len(),
            goals = batch.goals.len(),
            skipped = batch.skipped.len(),
            "Normalized ledger batch"
        );

        Ok(batch)
    }

    fn reject(
        &self,
        batch: &mut NormalizedBatch,
        kind: RecordKind,
        id: i64,
        error: Error,
    ) -> Result<()> {
        if self.config.policy == NormalizePolicy::Strict || !error.is_record_level() {
            return Err(error);
        }

        tracing::warn!(kind = kind.as_str(), id, error = %error, "Skipping invalid record");
        batch.skipped.push(SkippedRecord {
            kind,
            id,
            reason: error.to_string(),
        });
        Ok(())
    }
}
