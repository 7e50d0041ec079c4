//! Fi-Fusion Core Library
//!
//! The financial aggregation and insight engine behind the Fi-Fusion dashboard:
//! - Ledger store trait with SQLite (SQLCipher) and in-memory implementations
//! - Normalizer turning raw ledger rows into validated minor-unit records
//! - Aggregator producing per-period totals, budget utilization and goal pacing
//! - Weighted financial health score
//! - Rule-based insight generator
//! - CSV transaction import

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod health;
pub mod import;
pub mod insights;
pub mod models;
pub mod normalize;
pub mod store;
pub mod view;

pub use aggregate::{aggregate, Aggregator, AggregatorConfig};
pub use config::EngineConfig;
pub use dashboard::Dashboard;
pub use db::Database;
pub use error::{Error, Result};
pub use health::{HealthConfig, HealthFactor, HealthScore, HealthScorer};
pub use insights::{Insight, InsightConfig, InsightGenerator, InsightRule, InsightType, Tone};
pub use normalize::{NormalizePolicy, Normalizer, NormalizerConfig};
pub use store::{LedgerStore, MemoryLedger};
pub use view::{assemble, DashboardSummary, DashboardView};
