//! Aggregator - folds normalized records into an [`AggregateSnapshot`]
//!
//! Pure and deterministic: identical inputs always produce identical
//! snapshots, whatever order the records arrive in.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use chrono::{Days, Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{
    period_len_days, AggregateSnapshot, Budget, BudgetUtilization, Goal, GoalPacing,
    RecurringExpense, Transaction, Trend, TrendDelta, Utilization,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Trailing days used to observe goal contributions
    pub accrual_window_days: i64,
    /// Largest charge (minor units) still considered a small expense
    pub small_expense_max_minor: i64,
    /// Charges needed across current + prior period to call a merchant recurring
    pub recurring_min_occurrences: usize,
    /// Transactions kept in `recent_transactions`
    pub recent_limit: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            accrual_window_days: 30,
            small_expense_max_minor: 5_000,
            recurring_min_occurrences: 2,
            recent_limit: 5,
        }
    }
}

/// Projections further out than this are reported as unreachable
const MAX_PROJECTION_DAYS: i64 = 365 * 100;

/// Aggregate with the default configuration
pub fn aggregate(
    transactions: &[Transaction],
    budgets: &[Budget],
    goals: &[Goal],
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<AggregateSnapshot> {
    Aggregator::default().aggregate(transactions, budgets, goals, period_start, period_end)
}

/// Income/expense totals for one period
#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    income: i64,
    expense: i64,
}

fn checked_sum(acc: i64, value: i64, what: &str) -> Result<i64> {
    acc.checked_add(value)
        .ok_or_else(|| Error::Range(format!("{} overflowed", what)))
}

/// `date - days`, or a range error naming `what`
fn days_before(date: NaiveDate, days: i64, what: &str) -> Result<NaiveDate> {
    u64::try_from(days)
        .ok()
        .and_then(|d| date.checked_sub_days(Days::new(d)))
        .ok_or_else(|| Error::Range(format!("{} precedes the supported date range", what)))
}

fn period_totals(transactions: &[Transaction], start: NaiveDate, end: NaiveDate) -> Result<Totals> {
    let mut totals = Totals::default();
    for tx in transactions.iter().filter(|t| t.occurs_within(start, end)) {
        if tx.is_income() {
            totals.income = checked_sum(totals.income, tx.amount_minor, "total income")?;
        } else if tx.is_expense() {
            totals.expense = checked_sum(totals.expense, -tx.amount_minor, "total expense")?;
        }
    }
    Ok(totals)
}

/// Reduce a bank description to a stable merchant key
pub fn normalize_merchant(description: &str) -> String {
    static NOISE: OnceLock<Regex> = OnceLock::new();
    let noise = NOISE.get_or_init(|| Regex::new(r"[#*\d]+|\s-\s.*$").expect("static regex"));

    let upper = description.to_uppercase();
    let cleaned = noise.replace_all(&upper, " ");
    let key = cleaned
        .split_whitespace()
        .take(3)
        .collect::<Vec<_>>()
        .join(" ");

    if key.is_empty() {
        upper.trim().to_string()
    } else {
        key
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// Fold transactions, budgets and goals into a snapshot for `[period_start, period_end)`
    ///
    /// `transactions` may extend before the period: the prior equal-length
    /// period feeds the trend and recurring detection, and the accrual window
    /// feeds goal pacing.
    pub fn aggregate(
        &self,
        transactions: &[Transaction],
        budgets: &[Budget],
        goals: &[Goal],
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<AggregateSnapshot> {
        let len = period_len_days(period_start, period_end);
        if len <= 0 {
            return Err(Error::validation(
                "period",
                format!("period end {} is not after start {}", period_end, period_start),
            ));
        }
        let as_of = days_before(period_end, 1, "as-of date")?;

        let current = period_totals(transactions, period_start, period_end)?;
        let prior_start = days_before(period_start, len, "prior period")?;
        let prior = period_totals(transactions, prior_start, period_start)?;

        let mut category_totals: BTreeMap<String, i64> = BTreeMap::new();
        for tx in transactions
            .iter()
            .filter(|t| t.is_expense() && t.occurs_within(period_start, period_end))
        {
            let entry = category_totals.entry(tx.category.clone()).or_insert(0);
            *entry = checked_sum(*entry, -tx.amount_minor, "category total")?;
        }

        // Budgets sharing a category within the period pool their allocations
        let mut allocations: BTreeMap<String, i64> = BTreeMap::new();
        for budget in budgets
            .iter()
            .filter(|b| b.is_active_in(period_start, period_end))
        {
            let entry = allocations.entry(budget.category.clone()).or_insert(0);
            *entry = checked_sum(*entry, budget.allocated_minor, "budget allocation")?;
        }
        let budget_utilization: BTreeMap<String, BudgetUtilization> = allocations
            .into_iter()
            .map(|(category, allocated)| {
                let spent = category_totals.get(&category).copied().unwrap_or(0);
                (
                    category,
                    BudgetUtilization {
                        allocated,
                        spent,
                        pct_used: Utilization::from_amounts(allocated, spent),
                    },
                )
            })
            .collect();

        let mut goal_pacing: Vec<GoalPacing> = goals
            .iter()
            .map(|g| self.pace_goal(g, transactions, period_end, as_of))
            .collect::<Result<_>>()?;
        goal_pacing.sort_by(|a, b| a.goal.id.cmp(&b.goal.id));

        let snapshot = AggregateSnapshot {
            period_start,
            period_end,
            as_of,
            total_income: current.income,
            total_expense: current.expense,
            net_savings: current.income - current.expense,
            category_totals,
            budget_utilization,
            goal_pacing,
            trend: Trend {
                income_delta: TrendDelta::between(current.income, prior.income),
                expense_delta: TrendDelta::between(current.expense, prior.expense),
            },
            recurring_expenses: self.recurring_expenses(
                transactions,
                prior_start,
                period_start,
                period_end,
            ),
            recent_transactions: self.recent_transactions(transactions, period_start, period_end),
            currency: None,
        };

        tracing::debug!(
            from = %period_start,
            to = %period_end,
            income = snapshot.total_income,
            expense = snapshot.total_expense,
            categories = snapshot.category_totals.len(),
            "Aggregated period"
        );

        Ok(snapshot)
    }

    fn pace_goal(
        &self,
        goal: &Goal,
        transactions: &[Transaction],
        period_end: NaiveDate,
        as_of: NaiveDate,
    ) -> Result<GoalPacing> {
        let window = self.config.accrual_window_days;
        let window_start = days_before(period_end, window, "goal accrual window")?;

        let mut observed: i64 = 0;
        for tx in transactions
            .iter()
            .filter(|t| t.category == goal.category && t.occurs_within(window_start, period_end))
        {
            observed = checked_sum(observed, tx.amount_minor.abs(), "goal accrual")?;
        }

        let remaining = goal.remaining_minor();
        let days_remaining = (goal.deadline - as_of).num_days();
        let pct_complete = goal.current_minor as f64 / goal.target_minor as f64;

        let (on_track, projected) = if goal.is_complete() {
            (true, Some(as_of))
        } else {
            let on_track = days_remaining > 0
                && observed > 0
                && (observed as i128) * (days_remaining as i128)
                    >= (remaining as i128) * (window as i128);

            // ceil(remaining / (observed / window)) in integers
            let projected = if observed > 0 {
                let numerator = remaining as i128 * window as i128;
                let days = (numerator + observed as i128 - 1) / observed as i128;
                i64::try_from(days)
                    .ok()
                    .filter(|d| *d <= MAX_PROJECTION_DAYS)
                    .and_then(|d| as_of.checked_add_signed(Duration::days(d)))
            } else {
                None
            };
            (on_track, projected)
        };

        Ok(GoalPacing {
            goal: goal.clone(),
            pct_complete,
            on_track,
            projected_completion_date: projected,
            required_daily_minor: (days_remaining > 0 && remaining > 0)
                .then(|| remaining as f64 / days_remaining as f64),
            observed_daily_minor: observed as f64 / window as f64,
        })
    }

    fn recurring_expenses(
        &self,
        transactions: &[Transaction],
        prior_start: NaiveDate,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Vec<RecurringExpense> {
        // (category, merchant) -> (occurrences, current period total)
        let mut groups: HashMap<(String, String), (usize, i64)> = HashMap::new();

        for tx in transactions.iter().filter(|t| {
            t.is_expense()
                && -t.amount_minor <= self.config.small_expense_max_minor
                && t.occurs_within(prior_start, period_end)
        }) {
            let key = (tx.category.clone(), normalize_merchant(&tx.description));
            let entry = groups.entry(key).or_insert((0, 0));
            entry.0 += 1;
            if tx.occurred_on >= period_start {
                entry.1 = entry.1.saturating_add(-tx.amount_minor);
            }
        }

        let mut recurring: Vec<RecurringExpense> = groups
            .into_iter()
            .filter(|(_, (count, current))| {
                *count >= self.config.recurring_min_occurrences && *current > 0
            })
            .map(|((category, merchant), (occurrences, total))| RecurringExpense {
                category,
                merchant,
                occurrences,
                period_total_minor: total,
            })
            .collect();

        recurring.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.merchant.cmp(&b.merchant))
        });
        recurring
    }

    fn recent_transactions(
        &self,
        transactions: &[Transaction],
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Vec<Transaction> {
        let mut recent: Vec<Transaction> = transactions
            .iter()
            .filter(|t| t.occurs_within(period_start, period_end))
            .cloned()
            .collect();
        recent.sort_by(|a, b| {
            b.occurred_on
                .cmp(&a.occurred_on)
                .then_with(|| b.id.cmp(&a.id))
        });
        recent.truncate(self.config.recent_limit);
        recent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn tx(id: i64, amount_minor: i64, category: &str, on: NaiveDate) -> Transaction {
        Transaction {
            id,
            user_id: "user-1".to_string(),
            amount_minor,
            category: category.to_string(),
            description: format!("{} purchase", category),
            occurred_on: on,
        }
    }

    fn budget(category: &str, allocated: i64) -> Budget {
        Budget {
            id: 1,
            user_id: "user-1".to_string(),
            category: category.to_string(),
            allocated_minor: allocated,
            period_start: d(2023, 10, 1),
            period_end: d(2023, 11, 1),
        }
    }

    #[test]
    fn test_totals_and_categories() {
        let txs = vec![
            tx(1, 3800, "Income", d(2023, 10, 10)),
            tx(2, -1150, "Housing", d(2023, 10, 1)),
            tx(3, -425, "Food & Dining", d(2023, 10, 15)),
        ];
        let snapshot = aggregate(
            &txs,
            &[budget("Housing", 1200)],
            &[],
            d(2023, 10, 1),
            d(2023, 11, 1),
        )
        .unwrap();

        assert_eq!(snapshot.total_income, 3800);
        assert_eq!(snapshot.total_expense, 1575);
        assert_eq!(snapshot.net_savings, 2225);
        assert_eq!(snapshot.category_totals["Housing"], 1150);
        assert_eq!(snapshot.category_totals["Food & Dining"], 425);
        assert!(!snapshot.category_totals.contains_key("Income"));

        let housing = &snapshot.budget_utilization["Housing"];
        let pct = housing.pct_used.ratio().unwrap();
        assert!((pct - 0.958).abs() < 0.001);
    }

    #[test]
    fn test_half_open_period() {
        let txs = vec![
            tx(1, -100, "Shopping", d(2023, 9, 30)),
            tx(2, -200, "Shopping", d(2023, 10, 1)),
            tx(3, -400, "Shopping", d(2023, 10, 31)),
            tx(4, -800, "Shopping", d(2023, 11, 1)),
        ];
        let snapshot = aggregate(&txs, &[], &[], d(2023, 10, 1), d(2023, 11, 1)).unwrap();
        assert_eq!(snapshot.total_expense, 600);
        assert_eq!(snapshot.as_of, d(2023, 10, 31));
    }

    #[test]
    fn test_empty_period_is_zeroed() {
        let snapshot = aggregate(&[], &[], &[], d(2023, 10, 1), d(2023, 11, 1)).unwrap();
        assert_eq!(snapshot.total_income, 0);
        assert_eq!(snapshot.total_expense, 0);
        assert_eq!(snapshot.net_savings, 0);
        assert!(snapshot.category_totals.is_empty());
        assert_eq!(snapshot.trend.expense_delta, TrendDelta::InsufficientHistory);
        assert_eq!(snapshot.trend.income_delta, TrendDelta::InsufficientHistory);
    }

    #[test]
    fn test_inverted_period_rejected() {
        let result = aggregate(&[], &[], &[], d(2023, 11, 1), d(2023, 10, 1));
        assert!(matches!(result, Err(Error::Validation { field: "period", .. })));
    }

    #[test]
    fn test_net_savings_identity_under_reaggregation() {
        let txs: Vec<Transaction> = (0..40)
            .map(|i| {
                let amount = if i % 3 == 0 { 1234 * i } else { -577 * i };
                tx(i, amount, "Misc", d(2023, 10, 1) + Duration::days(i % 31))
            })
            .collect();

        let first = aggregate(&txs, &[], &[], d(2023, 10, 1), d(2023, 11, 1)).unwrap();
        let mut reversed = txs.clone();
        reversed.reverse();
        let second = aggregate(&reversed, &[], &[], d(2023, 10, 1), d(2023, 11, 1)).unwrap();

        assert_eq!(first.total_income - first.total_expense, first.net_savings);
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_allocation_budget() {
        let txs = vec![tx(1, -500, "Gifts", d(2023, 10, 5))];
        let snapshot = aggregate(
            &txs,
            &[budget("Gifts", 0), budget("Travel", 0)],
            &[],
            d(2023, 10, 1),
            d(2023, 11, 1),
        )
        .unwrap();

        assert_eq!(
            snapshot.budget_utilization["Gifts"].pct_used,
            Utilization::Unbounded
        );
        assert_eq!(
            snapshot.budget_utilization["Travel"].pct_used,
            Utilization::Undefined
        );
    }

    #[test]
    fn test_inactive_budget_ignored() {
        let mut old = budget("Housing", 1200);
        old.period_start = d(2023, 8, 1);
        old.period_end = d(2023, 9, 1);
        let snapshot = aggregate(&[], &[old], &[], d(2023, 10, 1), d(2023, 11, 1)).unwrap();
        assert!(snapshot.budget_utilization.is_empty());
    }

    #[test]
    fn test_trend_against_prior_period() {
        let txs = vec![
            tx(1, -1000, "Food", d(2023, 9, 10)),
            tx(2, -1100, "Food", d(2023, 10, 10)),
            tx(3, 5000, "Income", d(2023, 10, 1)),
        ];
        let snapshot = aggregate(&txs, &[], &[], d(2023, 10, 1), d(2023, 10, 31)).unwrap();

        let delta = snapshot.trend.expense_delta.pct().unwrap();
        assert!((delta - 10.0).abs() < 1e-9);
        assert_eq!(snapshot.trend.income_delta, TrendDelta::InsufficientHistory);
    }

    #[test]
    fn test_goal_on_track() {
        let goal = Goal {
            id: 1,
            user_id: "user-1".to_string(),
            name: "Emergency Fund".to_string(),
            target_minor: 10_000,
            current_minor: 7_500,
            deadline: d(2023, 10, 31) + Duration::days(90),
            category: "Savings".to_string(),
        };
        // 1250 over 30 days => 2500 remaining takes 60 days
        let txs = vec![
            tx(1, -625, "Savings", d(2023, 10, 5)),
            tx(2, -625, "Savings", d(2023, 10, 20)),
        ];

        let snapshot = aggregate(&txs, &[], &[goal], d(2023, 10, 1), d(2023, 11, 1)).unwrap();
        let pacing = &snapshot.goal_pacing[0];

        assert!(pacing.on_track);
        assert_eq!(pacing.pct_complete, 0.75);
        assert_eq!(
            pacing.projected_completion_date,
            Some(d(2023, 10, 31) + Duration::days(60))
        );
    }

    #[test]
    fn test_goal_without_accrual() {
        let goal = Goal {
            id: 2,
            user_id: "user-1".to_string(),
            name: "Vacation".to_string(),
            target_minor: 250_000,
            current_minor: 120_000,
            deadline: d(2024, 6, 1),
            category: "Travel".to_string(),
        };
        let snapshot = aggregate(&[], &[], &[goal], d(2023, 10, 1), d(2023, 11, 1)).unwrap();
        let pacing = &snapshot.goal_pacing[0];

        assert!(!pacing.on_track);
        assert_eq!(pacing.projected_completion_date, None);
        assert!(pacing.required_daily_minor.is_some());
    }

    #[test]
    fn test_recurring_small_expenses() {
        let mut stream_sep = tx(1, -999, "Subscriptions", d(2023, 9, 14));
        stream_sep.description = "STREAMING SERVICE #4411".to_string();
        let mut stream_oct = tx(2, -999, "Subscriptions", d(2023, 10, 14));
        stream_oct.description = "Streaming Service #4412".to_string();
        let mut one_off = tx(3, -2000, "Shopping", d(2023, 10, 2));
        one_off.description = "Bookstore".to_string();
        let mut big = tx(4, -90000, "Subscriptions", d(2023, 10, 3));
        big.description = "Annual Software".to_string();

        let snapshot = aggregate(
            &[stream_sep, stream_oct, one_off, big],
            &[],
            &[],
            d(2023, 10, 1),
            d(2023, 10, 31),
        )
        .unwrap();

        assert_eq!(snapshot.recurring_expenses.len(), 1);
        let recurring = &snapshot.recurring_expenses[0];
        assert_eq!(recurring.merchant, "STREAMING SERVICE");
        assert_eq!(recurring.occurrences, 2);
        assert_eq!(recurring.period_total_minor, 999);
    }

    #[test]
    fn test_recent_transactions_order() {
        let txs = vec![
            tx(1, -10, "A", d(2023, 10, 3)),
            tx(2, -10, "A", d(2023, 10, 9)),
            tx(3, -10, "A", d(2023, 10, 9)),
        ];
        let aggregator = Aggregator::new(AggregatorConfig {
            recent_limit: 2,
            ..Default::default()
        });
        let snapshot = aggregator
            .aggregate(&txs, &[], &[], d(2023, 10, 1), d(2023, 11, 1))
            .unwrap();
        let ids: Vec<i64> = snapshot.recent_transactions.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn test_normalize_merchant() {
        assert_eq!(normalize_merchant("Uber *Trip 8841"), "UBER TRIP");
        assert_eq!(
            normalize_merchant("Restaurant - The Italian Place"),
            "RESTAURANT"
        );
        assert_eq!(normalize_merchant("NETFLIX.COM"), "NETFLIX.COM");
    }

    #[test]
    fn test_split_budgets_pool_regardless_of_order() {
        let half = |id, start: NaiveDate, end: NaiveDate, allocated| Budget {
            id,
            user_id: "user-1".to_string(),
            category: "Food & Dining".to_string(),
            allocated_minor: allocated,
            period_start: start,
            period_end: end,
        };
        let first = half(1, d(2023, 10, 1), d(2023, 10, 16), 20_000);
        let second = half(2, d(2023, 10, 16), d(2023, 11, 1), 50_000);
        let txs = vec![tx(1, -30_000, "Food & Dining", d(2023, 10, 20))];

        let forward = aggregate(
            &txs,
            &[first.clone(), second.clone()],
            &[],
            d(2023, 10, 1),
            d(2023, 11, 1),
        )
        .unwrap();
        let reversed =
            aggregate(&txs, &[second, first], &[], d(2023, 10, 1), d(2023, 11, 1)).unwrap();

        assert_eq!(forward, reversed);
        let food = &forward.budget_utilization["Food & Dining"];
        assert_eq!(food.allocated, 70_000);
        assert_eq!(food.spent, 30_000);
        assert!(!food.pct_used.is_over());
    }

    #[test]
    fn test_period_at_calendar_floor_is_range_error() {
        let start = NaiveDate::MIN + Duration::days(5);
        let end = NaiveDate::MIN + Duration::days(15);

        let err = aggregate(&[], &[], &[], start, end).unwrap_err();
        assert!(matches!(err, Error::Range(_)));
    }

    #[test]
    fn test_accrual_window_at_calendar_floor_is_range_error() {
        let goal = Goal {
            id: 1,
            user_id: "user-1".to_string(),
            name: "Fund".to_string(),
            target_minor: 1_000,
            current_minor: 0,
            deadline: NaiveDate::MIN + Duration::days(400),
            category: "Savings".to_string(),
        };
        // Prior period fits, the 30-day accrual window does not
        let start = NaiveDate::MIN + Duration::days(10);
        let end = NaiveDate::MIN + Duration::days(20);

        let err = aggregate(&[], &[], &[goal], start, end).unwrap_err();
        assert!(matches!(err, Error::Range(_)));
    }
}
