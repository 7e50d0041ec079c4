//! Health Scorer - maps a snapshot to a 0-100 composite score
//!
//! Weights are fixed product policy:
//!
//! | Factor             | Weight | Value                                            |
//! |--------------------|--------|--------------------------------------------------|
//! | `savings_rate`     | 40     | net / income in [0, 1]; 0.5 with no income       |
//! | `budget_adherence` | 30     | mean of min(1, allocated / spent); 1.0 if unused |
//! | `goal_pacing`      | 20     | share of goals on track; 1.0 without goals       |
//! | `expense_trend`    | 10     | 1.0 flat/declining, down to -1.0 past threshold  |

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{AggregateSnapshot, TrendDelta};

const SAVINGS_RATE_WEIGHT: f64 = 40.0;
const BUDGET_ADHERENCE_WEIGHT: f64 = 30.0;
const GOAL_PACING_WEIGHT: f64 = 20.0;
const EXPENSE_TREND_WEIGHT: f64 = 10.0;

/// Value used when a factor has nothing to measure
const NEUTRAL_MIDPOINT: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Expense growth (percent) beyond which the trend factor turns negative
    pub expense_trend_threshold_pct: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            expense_trend_threshold_pct: 15.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthFactor {
    SavingsRate,
    BudgetAdherence,
    GoalPacing,
    ExpenseTrend,
}

impl HealthFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SavingsRate => "savings_rate",
            Self::BudgetAdherence => "budget_adherence",
            Self::GoalPacing => "goal_pacing",
            Self::ExpenseTrend => "expense_trend",
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            Self::SavingsRate => SAVINGS_RATE_WEIGHT,
            Self::BudgetAdherence => BUDGET_ADHERENCE_WEIGHT,
            Self::GoalPacing => GOAL_PACING_WEIGHT,
            Self::ExpenseTrend => EXPENSE_TREND_WEIGHT,
        }
    }

    pub fn all() -> &'static [HealthFactor] {
        &[
            Self::SavingsRate,
            Self::BudgetAdherence,
            Self::GoalPacing,
            Self::ExpenseTrend,
        ]
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Composite financial health score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    /// 0-100
    pub value: u8,
    /// Points contributed by each factor (weight x factor value)
    pub components: BTreeMap<HealthFactor, f64>,
}

impl HealthScore {
    /// Display band for the score (same cut-offs as the dashboard gauge)
    pub fn label(&self) -> &'static str {
        match self.value {
            80..=100 => "Excellent",
            60..=79 => "Good",
            40..=59 => "Fair",
            _ => "Needs Attention",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HealthScorer {
    config: HealthConfig,
}

impl HealthScorer {
    pub fn new(config: HealthConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, snapshot: &AggregateSnapshot) -> HealthScore {
        let components: BTreeMap<HealthFactor, f64> = HealthFactor::all()
            .iter()
            .map(|factor| {
                let value = self.factor_value(*factor, snapshot);
                (*factor, factor.weight() * value)
            })
            .collect();

        let total: f64 = components.values().sum();
        let value = total.round().clamp(0.0, 100.0) as u8;

        tracing::debug!(value, "Scored financial health");

        HealthScore { value, components }
    }

    fn factor_value(&self, factor: HealthFactor, snapshot: &AggregateSnapshot) -> f64 {
        match factor {
            HealthFactor::SavingsRate => savings_rate(snapshot),
            HealthFactor::BudgetAdherence => budget_adherence(snapshot),
            HealthFactor::GoalPacing => goal_pacing(snapshot),
            HealthFactor::ExpenseTrend => {
                expense_trend(snapshot.trend.expense_delta, self.config.expense_trend_threshold_pct)
            }
        }
    }
}

fn savings_rate(snapshot: &AggregateSnapshot) -> f64 {
    if snapshot.total_income == 0 {
        return NEUTRAL_MIDPOINT;
    }
    (snapshot.net_savings as f64 / snapshot.total_income as f64).clamp(0.0, 1.0)
}

fn budget_adherence(snapshot: &AggregateSnapshot) -> f64 {
    let ratios: Vec<f64> = snapshot
        .budget_utilization
        .values()
        .filter(|u| u.spent > 0)
        .map(|u| (u.allocated as f64 / u.spent as f64).min(1.0))
        .collect();

    if ratios.is_empty() {
        1.0
    } else {
        ratios.iter().sum::<f64>() / ratios.len() as f64
    }
}

fn goal_pacing(snapshot: &AggregateSnapshot) -> f64 {
    if snapshot.goal_pacing.is_empty() {
        return 1.0;
    }
    let on_track = snapshot.goal_pacing.iter().filter(|g| g.on_track).count();
    on_track as f64 / snapshot.goal_pacing.len() as f64
}

fn expense_trend(delta: TrendDelta, threshold_pct: f64) -> f64 {
    match delta {
        TrendDelta::InsufficientHistory => NEUTRAL_MIDPOINT,
        TrendDelta::Change(pct) if pct <= 0.0 => 1.0,
        TrendDelta::Change(pct) if pct <= threshold_pct => 1.0 - pct / threshold_pct,
        TrendDelta::Change(_) => -1.0,
    }
}
