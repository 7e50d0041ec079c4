//! Goal Tracking Rule
//!
//! Celebrates goals projected to finish comfortably ahead of their deadline
//! and warns about goals projected to miss it. A goal with no recent
//! contributions has no projection and is treated as missing.

use crate::models::GoalPacing;

use super::engine::{InsightRule, RuleContext};
use super::types::{Insight, InsightType, Tone};

const AHEAD_BASE_SEVERITY: i32 = 10;
const AHEAD_MAX_BONUS: i32 = 20;
const BEHIND_BASE_SEVERITY: i32 = 55;
const BEHIND_MAX_BONUS: i32 = 25;

pub struct GoalTrackingRule;

impl GoalTrackingRule {
    fn assess(&self, pacing: &GoalPacing, ctx: &RuleContext<'_>) -> Option<Insight> {
        let goal = &pacing.goal;
        if goal.is_complete() {
            return None;
        }
        let generated_on = ctx.snapshot.as_of;

        let Some(projected) = pacing.projected_completion_date else {
            return Some(
                Insight::new(
                    InsightType::GoalTracking,
                    goal.category.clone(),
                    BEHIND_BASE_SEVERITY + BEHIND_MAX_BONUS,
                    generated_on,
                    format!("{} Has Stalled", goal.name),
                    format!(
                        "No recent contributions to your {} goal; {} is still needed by {}.",
                        goal.name,
                        ctx.snapshot.format_amount(goal.remaining_minor()),
                        goal.deadline
                    ),
                )
                .with_tone(Tone::Negative),
            );
        };

        let days_ahead = (goal.deadline - projected).num_days();
        if days_ahead > ctx.config.goal_ahead_margin_days {
            let bonus = ((days_ahead / 7) as i32).min(AHEAD_MAX_BONUS);
            Some(
                Insight::new(
                    InsightType::GoalTracking,
                    goal.category.clone(),
                    AHEAD_BASE_SEVERITY + bonus,
                    generated_on,
                    format!("{} Progress", goal.name),
                    format!(
                        "You're on track to reach your {} goal {} days ahead of schedule.",
                        goal.name, days_ahead
                    ),
                )
                .with_tone(Tone::Positive),
            )
        } else if days_ahead < 0 {
            let days_late = -days_ahead;
            let bonus = ((days_late / 7) as i32).min(BEHIND_MAX_BONUS);
            Some(
                Insight::new(
                    InsightType::GoalTracking,
                    goal.category.clone(),
                    BEHIND_BASE_SEVERITY + bonus,
                    generated_on,
                    format!("{} Falling Behind", goal.name),
                    format!(
                        "At your current pace the {} goal finishes {} days after its {} deadline.",
                        goal.name, days_late, goal.deadline
                    ),
                )
                .with_tone(Tone::Negative),
            )
        } else {
            None
        }
    }
}

impl InsightRule for GoalTrackingRule {
    fn id(&self) -> InsightType {
        InsightType::GoalTracking
    }

    fn name(&self) -> &'static str {
        "Goal Tracking"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Insight> {
        ctx.snapshot
            .goal_pacing
            .iter()
            .filter_map(|pacing| self.assess(pacing, ctx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::insights::InsightConfig;
    use crate::models::{Goal, Transaction};
    use chrono::{Duration, NaiveDate};

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, day).unwrap()
    }

    fn goal(current: i64, deadline: NaiveDate) -> Goal {
        Goal {
            id: 1,
            user_id: "user-1".to_string(),
            name: "Emergency Fund".to_string(),
            target_minor: 10_000,
            current_minor: current,
            deadline,
            category: "Savings".to_string(),
        }
    }

    fn contribution(id: i64, amount: i64, on: NaiveDate) -> Transaction {
        Transaction {
            id,
            user_id: "user-1".to_string(),
            amount_minor: -amount,
            category: "Savings".to_string(),
            description: "Transfer to savings".to_string(),
            occurred_on: on,
        }
    }

    fn run(goals: &[Goal], txs: &[Transaction]) -> Vec<Insight> {
        let snapshot = aggregate(txs, &[], goals, d(10, 1), d(11, 1)).unwrap();
        let config = InsightConfig::default();
        GoalTrackingRule.evaluate(&RuleContext {
            snapshot: &snapshot,
            history: &[],
            config: &config,
        })
    }

    #[test]
    fn test_ahead_of_schedule() {
        // 60 days to finish, 90 days to deadline
        let insights = run(
            &[goal(7_500, d(10, 31) + Duration::days(90))],
            &[contribution(1, 1_250, d(10, 15))],
        );

        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].tone, Tone::Positive);
        assert_eq!(insights[0].insight_type, InsightType::GoalTracking);
        assert!(insights[0].severity_rank > 0);
        assert!(insights[0].description.contains("30 days ahead"));
    }

    #[test]
    fn test_projected_to_miss() {
        // 60 days to finish, 30 days to deadline
        let insights = run(
            &[goal(7_500, d(11, 30))],
            &[contribution(1, 1_250, d(10, 15))],
        );

        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].tone, Tone::Negative);
        assert_eq!(insights[0].severity_rank, BEHIND_BASE_SEVERITY + 4);
    }

    #[test]
    fn test_stalled_goal() {
        let insights = run(&[goal(1_000, d(12, 31))], &[]);
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].tone, Tone::Negative);
        assert_eq!(
            insights[0].severity_rank,
            BEHIND_BASE_SEVERITY + BEHIND_MAX_BONUS
        );
    }

    #[test]
    fn test_on_pace_within_margin_and_complete_goals_are_quiet() {
        // 60 days to finish, 70 days to deadline: ahead, but inside the margin
        let insights = run(
            &[goal(7_500, d(10, 31) + Duration::days(70)), {
                let mut done = goal(10_000, d(12, 31));
                done.id = 2;
                done.category = "Travel".to_string();
                done
            }],
            &[contribution(1, 1_250, d(10, 15))],
        );
        assert!(insights.is_empty());
    }
}
