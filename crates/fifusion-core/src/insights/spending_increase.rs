//! Spending Increase Rule
//!
//! Compares each category's spend this period with its average over the
//! trailing history periods. Categories missing from a prior period count as
//! zero spend for that period; with no history, or a zero average, there is
//! no baseline and nothing is reported.

use super::engine::{InsightRule, RuleContext};
use super::types::{Insight, InsightType, Tone};

const BASE_SEVERITY: i32 = 30;
const MAX_INCREASE_BONUS: i32 = 40;

pub struct SpendingIncreaseRule;

impl InsightRule for SpendingIncreaseRule {
    fn id(&self) -> InsightType {
        InsightType::SpendingIncrease
    }

    fn name(&self) -> &'static str {
        "Spending Increase"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Insight> {
        let baseline: Vec<_> = ctx
            .history
            .iter()
            .take(ctx.config.history_periods)
            .collect();
        if baseline.is_empty() {
            return vec![];
        }

        let mut insights = Vec::new();
        for (category, &current) in &ctx.snapshot.category_totals {
            let total: i64 = baseline
                .iter()
                .map(|s| s.category_totals.get(category).copied().unwrap_or(0))
                .sum();
            let average = total as f64 / baseline.len() as f64;
            if average <= 0.0 {
                continue;
            }

            let increase = current as f64 - average;
            let increase_pct = increase / average * 100.0;
            if increase_pct <= ctx.config.spending_increase_threshold_pct
                || increase < ctx.config.spending_increase_min_minor as f64
            {
                continue;
            }

            let bonus = ((increase_pct / 5.0).round() as i32).min(MAX_INCREASE_BONUS);
            insights.push(
                Insight::new(
                    InsightType::SpendingIncrease,
                    category.clone(),
                    BASE_SEVERITY + bonus,
                    ctx.snapshot.as_of,
                    format!("{} Spending Increase", category),
                    format!(
                        "Your {} expenses have increased by {:.0}% this period compared to your \
                         average ({} vs {}).",
                        category,
                        increase_pct,
                        ctx.snapshot.format_amount(current),
                        ctx.snapshot.format_amount(average.round() as i64)
                    ),
                )
                .with_tone(Tone::Negative),
            );
        }

        insights
    }
}
