//! View Assembler - composes engine outputs into the dashboard view model
//!
//! No computation happens here: every field is moved out of the snapshot,
//! health score, or insight list as-is.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::health::HealthScore;
use crate::insights::Insight;
use crate::models::{
    format_minor, AggregateSnapshot, BudgetUtilization, GoalPacing, RecurringExpense, Transaction,
    TrendDelta,
};
use crate::normalize::minor_unit_exponent;

/// Headline figures (the three stat cards)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_income: i64,
    pub total_expense: i64,
    pub net_savings: i64,
    pub income_trend: TrendDelta,
    pub expense_trend: TrendDelta,
}

/// Read-only dashboard view for one user and period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub user_id: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub as_of: NaiveDate,
    pub summary: DashboardSummary,
    pub category_totals: BTreeMap<String, i64>,
    pub budgets: BTreeMap<String, BudgetUtilization>,
    pub goals: Vec<GoalPacing>,
    pub recurring_expenses: Vec<RecurringExpense>,
    pub recent_transactions: Vec<Transaction>,
    pub health: HealthScore,
    pub insights: Vec<Insight>,
    /// ISO-4217 code of every amount in the view
    pub currency: Option<String>,
}

impl DashboardView {
    /// Render an amount of this view in major units
    pub fn format_amount(&self, minor: i64) -> String {
        format_minor(
            minor,
            minor_unit_exponent(self.currency.as_deref()).unwrap_or(2),
        )
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Compose a dashboard view, failing if any input is absent
pub fn assemble(
    snapshot: Option<AggregateSnapshot>,
    health: Option<HealthScore>,
    insights: Option<Vec<Insight>>,
    user_id: &str,
) -> Result<DashboardView> {
    let snapshot = snapshot.ok_or(Error::IncompleteData("aggregate snapshot"))?;
    let health = health.ok_or(Error::IncompleteData("health score"))?;
    let insights = insights.ok_or(Error::IncompleteData("insights"))?;

    Ok(DashboardView {
        user_id: user_id.to_string(),
        period_start: snapshot.period_start,
        period_end: snapshot.period_end,
        as_of: snapshot.as_of,
        summary: DashboardSummary {
            total_income: snapshot.total_income,
            total_expense: snapshot.total_expense,
            net_savings: snapshot.net_savings,
            income_trend: snapshot.trend.income_delta,
            expense_trend: snapshot.trend.expense_delta,
        },
        category_totals: snapshot.category_totals,
        budgets: snapshot.budget_utilization,
        goals: snapshot.goal_pacing,
        recurring_expenses: snapshot.recurring_expenses,
        recent_transactions: snapshot.recent_transactions,
        health,
        insights,
        currency: snapshot.currency,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::health::HealthScorer;

    fn snapshot() -> AggregateSnapshot {
        let start = NaiveDate::from_ymd_opt(2023, 10, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 11, 1).unwrap();
        aggregate(&[], &[], &[], start, end).unwrap()
    }

    #[test]
    fn test_assemble_composes_inputs() {
        let snapshot = snapshot();
        let health = HealthScorer::default().score(&snapshot);

        let view = assemble(Some(snapshot.clone()), Some(health.clone()), Some(vec![]), "user-1")
            .unwrap();

        assert_eq!(view.user_id, "user-1");
        assert_eq!(view.period_start, snapshot.period_start);
        assert_eq!(view.summary.net_savings, 0);
        assert_eq!(view.health, health);
        assert!(view.insights.is_empty());
    }

    #[test]
    fn test_missing_inputs() {
        let snapshot = snapshot();
        let health = HealthScorer::default().score(&snapshot);

        assert!(matches!(
            assemble(None, Some(health.clone()), Some(vec![]), "u"),
            Err(Error::IncompleteData("aggregate snapshot"))
        ));
        assert!(matches!(
            assemble(Some(snapshot.clone()), None, Some(vec![]), "u"),
            Err(Error::IncompleteData("health score"))
        ));
        assert!(matches!(
            assemble(Some(snapshot), Some(health), None, "u"),
            Err(Error::IncompleteData("insights"))
        ));
    }

    #[test]
    fn test_json_shape() {
        let snapshot = snapshot();
        let health = HealthScorer::default().score(&snapshot);
        let view = assemble(Some(snapshot), Some(health), Some(vec![]), "u").unwrap();

        let json: serde_json::Value = serde_json::from_str(&view.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["period_start"], "2023-10-01");
        assert_eq!(json["summary"]["total_income"], 0);
        assert_eq!(json["summary"]["expense_trend"]["kind"], "insufficient_history");
        assert_eq!(json["health"]["value"], 75);
        assert_eq!(json["health"]["components"]["savings_rate"], 20.0);
    }

    #[test]
    fn test_amounts_format_in_view_currency() {
        let snapshot = snapshot();
        let health = HealthScorer::default().score(&snapshot);

        let yen = assemble(
            Some(snapshot.clone().with_currency(Some("JPY".to_string()))),
            Some(health.clone()),
            Some(vec![]),
            "u",
        )
        .unwrap();
        assert_eq!(yen.currency.as_deref(), Some("JPY"));
        assert_eq!(yen.format_amount(-1500), "-1500");

        let default = assemble(Some(snapshot), Some(health), Some(vec![]), "u").unwrap();
        assert_eq!(default.currency, None);
        assert_eq!(default.format_amount(-1500), "-15.00");
    }
}
