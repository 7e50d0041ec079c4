//! Integration tests for fifusion-core
//!
//! These tests exercise the full ledger → normalize → aggregate → score →
//! insights → view pipeline through the public API.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use fifusion_core::{
    aggregate,
    db::Database,
    import::parse_csv,
    models::{
        AggregateSnapshot, NewBudget, NewGoal, RawBudget, RawGoal, RawLedger, RawTransaction,
        Transaction, Trend, TrendDelta,
    },
    Dashboard, EngineConfig, Error, HealthFactor, HealthScorer, InsightType, MemoryLedger,
    Normalizer, Tone,
};

const USER: &str = "user-1";

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn october() -> (NaiveDate, NaiveDate) {
    (d(2023, 10, 1), d(2023, 11, 1))
}

fn raw_tx(id: i64, amount: f64, category: &str, description: &str, date: &str) -> RawTransaction {
    RawTransaction {
        id,
        user_id: USER.to_string(),
        amount,
        currency: Some("USD".to_string()),
        category: Some(category.to_string()),
        description: Some(description.to_string()),
        date: date.to_string(),
    }
}

fn raw_budget(id: i64, category: &str, allocated: f64) -> RawBudget {
    RawBudget {
        id,
        user_id: USER.to_string(),
        category: Some(category.to_string()),
        allocated,
        currency: Some("USD".to_string()),
        period_start: "2023-10-01".to_string(),
        period_end: "2023-11-01".to_string(),
    }
}

fn dashboard(ledger: RawLedger) -> Dashboard<MemoryLedger> {
    Dashboard::new(MemoryLedger::new(ledger), EngineConfig::default())
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_scenario_a_totals_and_budget_utilization() {
    let ledger = RawLedger {
        transactions: vec![
            raw_tx(1, 3800.0, "Income", "Payroll", "2023-10-01"),
            raw_tx(2, -1150.0, "Housing", "Rent", "2023-10-03"),
            raw_tx(3, -425.0, "Food & Dining", "Groceries", "2023-10-12"),
        ],
        budgets: vec![raw_budget(1, "Housing", 1200.0)],
        goals: vec![],
    };
    let (start, end) = october();

    let view = dashboard(ledger)
        .compute_dashboard_view(USER, start, end)
        .unwrap();

    assert_eq!(view.summary.total_income, 380_000);
    assert_eq!(view.summary.total_expense, 157_500);
    assert_eq!(view.summary.net_savings, 222_500);

    let housing = &view.budgets["Housing"];
    let ratio = housing.pct_used.ratio().unwrap();
    assert!((ratio - 0.958).abs() < 0.001, "ratio was {}", ratio);
    assert!(!housing.pct_used.is_over());

    assert_eq!(view.category_totals["Housing"], 115_000);
    assert_eq!(view.category_totals["Food & Dining"], 42_500);
    assert_eq!(view.recent_transactions[0].id, 3);
}

#[test]
fn test_scenario_b_overspend() {
    let ledger = RawLedger {
        transactions: vec![
            raw_tx(1, -150.0, "Entertainment", "Concert Tickets", "2023-10-06"),
            raw_tx(2, -100.0, "Entertainment", "Theme Park", "2023-10-21"),
        ],
        budgets: vec![raw_budget(1, "Entertainment", 200.0)],
        goals: vec![],
    };
    let (start, end) = october();

    let view = dashboard(ledger)
        .compute_dashboard_view(USER, start, end)
        .unwrap();

    assert_eq!(view.budgets["Entertainment"].pct_used.ratio(), Some(1.25));

    let overspend: Vec<_> = view
        .insights
        .iter()
        .filter(|i| i.insight_type == InsightType::Overspend)
        .collect();
    assert_eq!(overspend.len(), 1);
    assert_eq!(overspend[0].category, "Entertainment");
    assert!(overspend[0].severity_rank > 0);
    assert_eq!(overspend[0].tone, Tone::Negative);
}

#[test]
fn test_scenario_c_goal_ahead_of_schedule() {
    let ledger = RawLedger {
        transactions: vec![raw_tx(
            1,
            -1250.0,
            "Savings",
            "Transfer to savings",
            "2023-10-15",
        )],
        budgets: vec![],
        goals: vec![RawGoal {
            id: 1,
            user_id: USER.to_string(),
            name: Some("Emergency Fund".to_string()),
            target_amount: 10_000.0,
            current_amount: 7_500.0,
            currency: Some("USD".to_string()),
            // as-of 2023-10-31 plus 90 days
            deadline: "2024-01-29".to_string(),
            category: Some("Savings".to_string()),
        }],
    };
    let (start, end) = october();

    let view = dashboard(ledger)
        .compute_dashboard_view(USER, start, end)
        .unwrap();

    let pacing = &view.goals[0];
    assert!(pacing.on_track);
    assert_eq!(pacing.projected_completion_date, Some(d(2023, 12, 30)));
    assert!((pacing.pct_complete - 0.75).abs() < f64::EPSILON);

    let goal_insight = view
        .insights
        .iter()
        .find(|i| i.insight_type == InsightType::GoalTracking)
        .expect("goal-tracking insight");
    assert_eq!(goal_insight.tone, Tone::Positive);
    assert_eq!(goal_insight.category, "Savings");
}

#[test]
fn test_scenario_d_empty_period() {
    let (start, end) = october();

    let view = dashboard(RawLedger::default())
        .compute_dashboard_view(USER, start, end)
        .unwrap();

    assert_eq!(view.summary.total_income, 0);
    assert_eq!(view.summary.total_expense, 0);
    assert_eq!(view.summary.net_savings, 0);
    assert!(view.category_totals.is_empty());
    assert_eq!(view.summary.expense_trend, TrendDelta::InsufficientHistory);

    assert_eq!(view.health.components[&HealthFactor::SavingsRate], 20.0);
    assert_eq!(view.health.value, 75);

    assert!(!view.insights.iter().any(|i| matches!(
        i.insight_type,
        InsightType::Overspend | InsightType::SpendingIncrease
    )));
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_round_trip_single_transaction() {
    let raw = raw_tx(7, -42.37, "Food & Dining", "  Corner Bistro ", "2023-10-07");
    let tx = Normalizer::default().normalize_transaction(&raw).unwrap();
    let (start, end) = october();

    let snapshot = aggregate(std::slice::from_ref(&tx), &[], &[], start, end).unwrap();

    let expected_tx = Transaction {
        id: 7,
        user_id: USER.to_string(),
        amount_minor: -4_237,
        category: "Food & Dining".to_string(),
        description: "Corner Bistro".to_string(),
        occurred_on: d(2023, 10, 7),
    };
    let expected = AggregateSnapshot {
        period_start: start,
        period_end: end,
        as_of: d(2023, 10, 31),
        total_income: 0,
        total_expense: 4_237,
        net_savings: -4_237,
        category_totals: BTreeMap::from([("Food & Dining".to_string(), 4_237)]),
        budget_utilization: BTreeMap::new(),
        goal_pacing: vec![],
        trend: Trend {
            income_delta: TrendDelta::InsufficientHistory,
            expense_delta: TrendDelta::InsufficientHistory,
        },
        recurring_expenses: vec![],
        recent_transactions: vec![expected_tx.clone()],
        currency: None,
    };

    assert_eq!(tx, expected_tx);
    assert_eq!(snapshot, expected);
}

/// Deterministic pseudo-random ledger (no external RNG needed)
fn generated_ledger(seed: u64, count: usize) -> RawLedger {
    const CATEGORIES: &[&str] = &["Housing", "Food & Dining", "Subscriptions", "Income", "Travel"];
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        state >> 33
    };

    let transactions = (0..count)
        .map(|i| {
            let cents = (next() % 500_000) as i64 - 200_000;
            let category = CATEGORIES[(next() % CATEGORIES.len() as u64) as usize];
            let day = 1 + (next() % 28) as u32;
            let month = 7 + (next() % 4) as u32;
            raw_tx(
                i as i64,
                cents as f64 / 100.0,
                category,
                "Generated",
                &format!("2023-{:02}-{:02}", month, day),
            )
        })
        .collect();

    RawLedger {
        transactions,
        budgets: vec![
            raw_budget(1, "Housing", 1200.0),
            raw_budget(2, "Food & Dining", 300.0),
            raw_budget(3, "Subscriptions", 0.0),
        ],
        goals: vec![],
    }
}

#[test]
fn test_net_savings_identity_and_determinism() {
    let (start, end) = october();

    for seed in 0..20 {
        let dash = dashboard(generated_ledger(seed, 60));
        let first = dash.compute_dashboard_view(USER, start, end).unwrap();
        let second = dash.compute_dashboard_view(USER, start, end).unwrap();

        assert_eq!(
            first.summary.total_income - first.summary.total_expense,
            first.summary.net_savings
        );
        assert!(first.health.value <= 100);
        assert_eq!(first, second);

        for utilization in first.budgets.values() {
            if let Some(ratio) = utilization.pct_used.ratio() {
                assert!(ratio.is_finite());
            }
        }
    }
}

#[test]
fn test_health_score_is_deterministic() {
    let (start, end) = october();
    let view = dashboard(generated_ledger(42, 80))
        .compute_dashboard_view(USER, start, end)
        .unwrap();

    let scorer = HealthScorer::default();
    let snapshot = aggregate(&[], &[], &[], start, end).unwrap();
    assert_eq!(scorer.score(&snapshot), scorer.score(&snapshot));
    assert!(view.health.value <= 100);
}

#[test]
fn test_insights_unique_per_type_and_category() {
    let (start, end) = october();

    for seed in 0..20 {
        let view = dashboard(generated_ledger(seed, 120))
            .compute_dashboard_view(USER, start, end)
            .unwrap();

        let mut seen = HashSet::new();
        for insight in &view.insights {
            assert!(
                seen.insert((insight.insight_type, insight.category.clone())),
                "duplicate insight {}",
                insight.id
            );
        }

        // Ranked by severity, highest first
        assert!(view
            .insights
            .windows(2)
            .all(|w| w[0].severity_rank >= w[1].severity_rank));
    }
}

#[test]
fn test_upstream_failure_is_not_an_empty_dashboard() {
    let dash = Dashboard::new(
        MemoryLedger::unavailable("store offline"),
        EngineConfig::default(),
    );
    let (start, end) = october();

    let err = dash.compute_dashboard_view(USER, start, end).unwrap_err();
    assert!(matches!(err, Error::UpstreamUnavailable(_)));
}

// =============================================================================
// SQLite end-to-end
// =============================================================================

#[test]
fn test_sqlite_import_to_dashboard() {
    let db = Database::in_memory().expect("Failed to create database");

    let csv = "date,description,amount,category
2023-09-01,Payroll,3800.00,Income
2023-09-03,Rent,-1150.00,Housing
2023-09-14,Streaming Service,-15.99,Subscriptions
2023-09-20,Music Plus,-10.99,Subscriptions
2023-10-01,Payroll,3800.00,Income
2023-10-03,Rent,-1150.00,Housing
2023-10-12,Groceries,-425.00,Food & Dining
2023-10-14,Streaming Service,-15.99,Subscriptions
2023-10-20,Music Plus,-10.99,Subscriptions";

    let transactions = parse_csv(csv.as_bytes()).expect("Failed to parse CSV");
    let mut imported = 0;
    for tx in &transactions {
        if db.insert_transaction(USER, tx).unwrap().is_some() {
            imported += 1;
        }
    }
    assert_eq!(imported, 9);

    // Re-importing the same file inserts nothing
    for tx in &transactions {
        assert!(db.insert_transaction(USER, tx).unwrap().is_none());
    }

    db.insert_budget(
        USER,
        &NewBudget {
            category: "Housing".to_string(),
            allocated: 1200.0,
            currency: None,
            period_start: d(2023, 10, 1),
            period_end: d(2023, 11, 1),
        },
    )
    .unwrap();
    db.insert_goal(
        USER,
        &NewGoal {
            name: "Vacation".to_string(),
            target_amount: 2000.0,
            current_amount: 500.0,
            currency: None,
            deadline: d(2024, 6, 1),
            category: "Travel".to_string(),
        },
    )
    .unwrap();

    let (start, end) = october();
    let view = Dashboard::new(&db, EngineConfig::default())
        .compute_dashboard_view(USER, start, end)
        .unwrap();

    assert_eq!(view.summary.total_income, 380_000);
    assert_eq!(view.summary.total_expense, 160_198);
    assert_eq!(view.summary.expense_trend.pct().map(|p| p.round()), Some(36.0));
    assert_eq!(view.budgets["Housing"].spent, 115_000);
    assert_eq!(view.recurring_expenses.len(), 2);
    assert_eq!(view.goals.len(), 1);
    assert!(!view.goals[0].on_track);

    // Stalled goal ranks first
    assert_eq!(view.insights[0].insight_type, InsightType::GoalTracking);
    assert_eq!(view.insights[0].category, "Travel");

    // Another user sees nothing
    let empty = Dashboard::new(&db, EngineConfig::default())
        .compute_dashboard_view("someone-else", start, end)
        .unwrap();
    assert_eq!(empty.summary.total_expense, 0);
    assert!(empty.goals.is_empty());
}
