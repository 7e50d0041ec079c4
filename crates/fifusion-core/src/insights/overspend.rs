//! Overspend Rule
//!
//! Flags every budget whose spend has passed its allocation. Severity grows
//! with the size of the overage; spending against a zero allocation ranks
//! highest.

use crate::models::Utilization;

use super::engine::{InsightRule, RuleContext};
use super::types::{Insight, InsightType, Tone};

const BASE_SEVERITY: i32 = 50;
const MAX_OVERAGE_BONUS: i32 = 50;

pub struct OverspendRule;

impl InsightRule for OverspendRule {
    fn id(&self) -> InsightType {
        InsightType::Overspend
    }

    fn name(&self) -> &'static str {
        "Overspend"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Insight> {
        let snapshot = ctx.snapshot;

        snapshot
            .budget_utilization
            .iter()
            .filter(|(_, u)| u.pct_used.is_over())
            .map(|(category, u)| {
                let (severity, detail) = match u.pct_used {
                    Utilization::Ratio(ratio) => {
                        let overage_pct = (ratio - 1.0) * 100.0;
                        let bonus = (overage_pct.round() as i32).min(MAX_OVERAGE_BONUS);
                        (
                            BASE_SEVERITY + bonus,
                            format!("{:.0}% of budget used", ratio * 100.0),
                        )
                    }
                    _ => (
                        BASE_SEVERITY + MAX_OVERAGE_BONUS,
                        "no allocation set".to_string(),
                    ),
                };

                Insight::new(
                    InsightType::Overspend,
                    category.clone(),
                    severity,
                    snapshot.as_of,
                    format!("{} Over Budget", category),
                    format!(
                        "You've spent {} against a {} budget for {} ({}).",
                        snapshot.format_amount(u.spent),
                        snapshot.format_amount(u.allocated),
                        category,
                        detail
                    ),
                )
                .with_tone(Tone::Negative)
            })
            .collect()
    }
}
