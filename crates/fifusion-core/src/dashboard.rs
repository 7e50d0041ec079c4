//! Dashboard entry point
//!
//! Wires the pipeline together for one request:
//!
//! ```text
//! LedgerStore -> Normalizer -> Aggregator -> { HealthScorer, InsightGenerator } -> assemble
//! ```
//!
//! Every call re-reads the store; nothing is cached between requests.

use chrono::{Days, NaiveDate};
use tracing::{debug, info, warn};

use crate::aggregate::Aggregator;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::health::HealthScorer;
use crate::insights::InsightGenerator;
use crate::models::{period_len_days, AggregateSnapshot, RawLedger};
use crate::normalize::Normalizer;
use crate::store::LedgerStore;
use crate::view::{assemble, DashboardView};

/// Computes dashboard views from a ledger store
pub struct Dashboard<S> {
    store: S,
    normalizer: Normalizer,
    aggregator: Aggregator,
    scorer: HealthScorer,
    generator: InsightGenerator,
    history_periods: usize,
    accrual_window_days: i64,
}

impl<S: LedgerStore> Dashboard<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            history_periods: config.insights.history_periods,
            accrual_window_days: config.aggregator.accrual_window_days,
            normalizer: Normalizer::new(config.normalizer),
            aggregator: Aggregator::new(config.aggregator),
            scorer: HealthScorer::new(config.health),
            generator: InsightGenerator::new(config.insights),
        }
    }

    /// Compute the dashboard for `user_id` over `[period_start, period_end)`
    pub fn compute_dashboard_view(
        &self,
        user_id: &str,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<DashboardView> {
        let len = period_len_days(period_start, period_end);
        if len <= 0 {
            return Err(Error::validation(
                "period",
                format!("period end {} is not after start {}", period_end, period_start),
            ));
        }

        let fetch_from = self.fetch_start(period_start, period_end, len)?;
        debug!(user_id, from = %fetch_from, to = %period_end, "Reading ledger");

        let raw = RawLedger {
            transactions: self
                .store
                .list_transactions(user_id, fetch_from, period_end)
                .map_err(Error::upstream)?,
            budgets: self
                .store
                .list_budgets(user_id, period_start, period_end)
                .map_err(Error::upstream)?,
            goals: self.store.list_goals(user_id).map_err(Error::upstream)?,
        };

        let batch = self.normalizer.normalize_batch(&raw)?;
        if !batch.skipped.is_empty() {
            warn!(
                user_id,
                skipped = batch.skipped.len(),
                "Some ledger records were skipped"
            );
        }

        let snapshot = self
            .aggregator
            .aggregate(
                &batch.transactions,
                &batch.budgets,
                &batch.goals,
                period_start,
                period_end,
            )?
            .with_currency(batch.currency.clone());
        let history = self.history(&batch.transactions, period_start, len)?;

        let health = self.scorer.score(&snapshot);
        let insights = self.generator.generate(&snapshot, &history);

        info!(
            user_id,
            from = %period_start,
            to = %period_end,
            health = health.value,
            insights = insights.len(),
            "Computed dashboard"
        );

        assemble(Some(snapshot), Some(health), Some(insights), user_id)
    }

    /// Earliest date the aggregator and insight rules look at
    ///
    /// Covers the history periods (at least the one prior period the trend
    /// needs) and the goal accrual window.
    fn fetch_start(&self, start: NaiveDate, end: NaiveDate, len: i64) -> Result<NaiveDate> {
        let periods = self.history_periods.max(1) as u64;
        let history_days = (len as u64)
            .checked_mul(periods)
            .ok_or_else(|| Error::Range("history range overflowed".to_string()))?;

        let history_start = start
            .checked_sub_days(Days::new(history_days))
            .ok_or_else(|| Error::Range("history range precedes supported dates".to_string()))?;
        let window_start = end
            .checked_sub_days(Days::new(self.accrual_window_days.max(0) as u64))
            .ok_or_else(|| Error::Range("accrual window precedes supported dates".to_string()))?;

        Ok(history_start.min(window_start))
    }

    /// Snapshots of the prior equal-length periods, most recent first
    ///
    /// They feed category baselines only, so budgets and goals are left out.
    fn history(
        &self,
        transactions: &[crate::models::Transaction],
        period_start: NaiveDate,
        len: i64,
    ) -> Result<Vec<AggregateSnapshot>> {
        let len = len as u64;
        let mut history = Vec::with_capacity(self.history_periods);
        let mut end = period_start;

        for _ in 0..self.history_periods {
            let Some(start) = end.checked_sub_days(Days::new(len)) else {
                break;
            };
            history.push(self.aggregator.aggregate(transactions, &[], &[], start, end)?);
            end = start;
        }

        Ok(history)
    }
}
