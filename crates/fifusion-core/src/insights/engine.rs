//! Insight Generator - runs every rule and ranks the results

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::AggregateSnapshot;

use super::types::{Insight, InsightType};
use super::{GoalTrackingRule, OverspendRule, SavingOpportunityRule, SpendingIncreaseRule};

/// Thresholds for the built-in rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Prior periods averaged for the spending-increase baseline
    pub history_periods: usize,
    pub spending_increase_threshold_pct: f64,
    pub spending_increase_min_minor: i64,
    pub goal_ahead_margin_days: i64,
    pub saving_threshold_minor: i64,
    pub discretionary_categories: Vec<String>,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            history_periods: 3,
            spending_increase_threshold_pct: 20.0,
            spending_increase_min_minor: 2_500,
            goal_ahead_margin_days: 14,
            saving_threshold_minor: 3_000,
            discretionary_categories: vec![
                "Subscriptions".to_string(),
                "Entertainment".to_string(),
                "Food & Dining".to_string(),
                "Shopping".to_string(),
            ],
        }
    }
}

impl InsightConfig {
    pub fn is_discretionary(&self, category: &str) -> bool {
        self.discretionary_categories
            .iter()
            .any(|c| c.eq_ignore_ascii_case(category))
    }
}

/// Inputs handed to each rule
pub struct RuleContext<'a> {
    pub snapshot: &'a AggregateSnapshot,
    /// Prior snapshots, most recent first
    pub history: &'a [AggregateSnapshot],
    pub config: &'a InsightConfig,
}

/// A single insight rule; evaluated independently of the others
pub trait InsightRule: Send + Sync {
    /// Insight type this rule emits
    fn id(&self) -> InsightType;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Zero or more insights, at most one per category
    fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<Insight>;
}

/// Runs all registered rules against a snapshot
pub struct InsightGenerator {
    config: InsightConfig,
    rules: Vec<Box<dyn InsightRule>>,
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self::new(InsightConfig::default())
    }
}

impl InsightGenerator {
    /// Create a generator with the built-in rules
    pub fn new(config: InsightConfig) -> Self {
        let mut generator = Self {
            config,
            rules: vec![],
        };

        generator.register(Box::new(OverspendRule));
        generator.register(Box::new(SpendingIncreaseRule));
        generator.register(Box::new(GoalTrackingRule));
        generator.register(Box::new(SavingOpportunityRule));

        generator
    }

    pub fn register(&mut self, rule: Box<dyn InsightRule>) {
        self.rules.push(rule);
    }

    /// Rule types currently registered
    pub fn rule_types(&self) -> Vec<InsightType> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    /// Evaluate every rule, dedupe by `(type, category)`, and rank
    pub fn generate(
        &self,
        snapshot: &AggregateSnapshot,
        history: &[AggregateSnapshot],
    ) -> Vec<Insight> {
        let ctx = RuleContext {
            snapshot,
            history,
            config: &self.config,
        };

        let mut best: HashMap<(InsightType, String), Insight> = HashMap::new();
        for rule in &self.rules {
            let insights = rule.evaluate(&ctx);
            tracing::debug!(rule = rule.name(), count = insights.len(), "Insight rule evaluated");

            for insight in insights {
                let key = (insight.insight_type, insight.category.clone());
                match best.get(&key) {
                    Some(existing) if existing.ranking(&insight).is_le() => {}
                    _ => {
                        best.insert(key, insight);
                    }
                }
            }
        }

        let mut insights: Vec<Insight> = best.into_values().collect();
        insights.sort_by(Insight::ranking);
        insights
    }
}
