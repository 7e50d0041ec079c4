//! Saving Opportunity Rule
//!
//! Looks for recurring small charges (streaming, app subscriptions, daily
//! coffee) in discretionary categories. When a category's recurring spend in
//! the period passes the configured threshold it is suggested as a place to
//! cut back.

use std::collections::BTreeMap;

use super::engine::{InsightRule, RuleContext};
use super::types::{Insight, InsightType, Tone};

const BASE_SEVERITY: i32 = 20;
const MAX_AMOUNT_BONUS: i32 = 30;

pub struct SavingOpportunityRule;

impl InsightRule for SavingOpportunityRule {
    fn id(&self) -> InsightType {
        InsightType::Saving
    }

    fn name(&self) -> &'static str {
        "Saving Opportunity"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Insight> {
        // category -> (recurring total, merchants)
        let mut by_category: BTreeMap<&str, (i64, Vec<&str>)> = BTreeMap::new();
        for recurring in ctx
            .snapshot
            .recurring_expenses
            .iter()
            .filter(|r| ctx.config.is_discretionary(&r.category))
        {
            let entry = by_category
                .entry(recurring.category.as_str())
                .or_insert((0, vec![]));
            entry.0 = entry.0.saturating_add(recurring.period_total_minor);
            entry.1.push(recurring.merchant.as_str());
        }

        by_category
            .into_iter()
            .filter(|(_, (total, _))| *total > ctx.config.saving_threshold_minor)
            .map(|(category, (total, merchants))| {
                let bonus = i32::try_from(total / 1_000)
                    .unwrap_or(MAX_AMOUNT_BONUS)
                    .min(MAX_AMOUNT_BONUS);
                let charges = if merchants.len() == 1 {
                    "1 recurring charge".to_string()
                } else {
                    format!("{} recurring charges", merchants.len())
                };

                Insight::new(
                    InsightType::Saving,
                    category,
                    BASE_SEVERITY + bonus,
                    ctx.snapshot.as_of,
                    format!("{} Optimization", category),
                    format!(
                        "You could save up to {} this period by reviewing {} in {} ({}).",
                        ctx.snapshot.format_amount(total),
                        charges,
                        category,
                        merchants.join(", ")
                    ),
                )
                .with_tone(Tone::Neutral)
            })
            .collect()
    }
}
