//! Insight Generator - rule-based financial insights
//!
//! Every rule looks at the current [`AggregateSnapshot`](crate::models::AggregateSnapshot)
//! (and, where it needs a baseline, at prior snapshots) and emits zero or more
//! insights. Rules never see each other's output.
//!
//! ## Built-in rules
//!
//! - **Overspend** - budgets past their allocation
//! - **Spending Increase** - categories above their trailing average
//! - **Goal Tracking** - goals running ahead of or behind their deadline
//! - **Saving Opportunity** - recurring small discretionary charges
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fifusion_core::insights::InsightGenerator;
//!
//! let generator = InsightGenerator::default();
//! let insights = generator.generate(&snapshot, &history);
//! ```

pub mod engine;
pub mod goal_tracking;
pub mod overspend;
pub mod savings_opportunity;
pub mod spending_increase;
pub mod types;

pub use engine::{InsightConfig, InsightGenerator, InsightRule, RuleContext};
pub use goal_tracking::GoalTrackingRule;
pub use overspend::OverspendRule;
pub use savings_opportunity::SavingOpportunityRule;
pub use spending_increase::SpendingIncreaseRule;
pub use types::{Insight, InsightType, Tone};
