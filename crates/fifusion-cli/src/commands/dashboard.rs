//! Dashboard command implementation
//!
//! Resolves the requested period, runs the engine against the database and
//! renders the view either as JSON or as a terminal summary.

use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use chrono::{Datelike, Local, Months, NaiveDate};
use fifusion_core::models::{TrendDelta, Utilization};
use fifusion_core::{db::Database, Dashboard, DashboardView, EngineConfig, Tone};

use super::truncate;

/// Today's date in the local timezone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Turn the period flags into a half-open `[start, end)` range
///
/// `--period YYYY-MM` selects a calendar month, `--from/--to` an explicit
/// range; with neither, the month containing `today` is used.
pub fn resolve_period(
    period: Option<&str>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    let (start, end) = match (period, from, to) {
        (Some(month), _, _) => month_range(parse_month(month)?)?,
        (None, Some(from), Some(to)) => (from, to),
        (None, None, None) => month_range(today.with_day(1).context("Invalid date")?)?,
        _ => bail!("Both --from and --to are required for a custom range"),
    };

    if end <= start {
        bail!("Period end {} must be after start {}", end, start);
    }
    Ok((start, end))
}

fn parse_month(month: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", month))
}

fn month_range(first: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let next = first
        .checked_add_months(Months::new(1))
        .context("Month is out of range")?;
    Ok((first, next))
}

pub fn cmd_dashboard(
    db: &Database,
    config: EngineConfig,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    json: bool,
) -> Result<String> {
    let view = Dashboard::new(db, config)
        .compute_dashboard_view(user_id, start, end)
        .context("Failed to compute dashboard")?;

    if json {
        Ok(view.to_json_pretty()?)
    } else {
        render_text(&view)
    }
}

fn trend_text(delta: &TrendDelta) -> String {
    match delta {
        TrendDelta::Change(pct) => format!("{:+.1}% vs prior period", pct),
        TrendDelta::InsufficientHistory => "no prior data".to_string(),
    }
}

fn utilization_text(pct: &Utilization) -> String {
    match pct {
        Utilization::Ratio(r) => format!("{:.0}%", r * 100.0),
        Utilization::Unbounded => "unbudgeted".to_string(),
        Utilization::Undefined => "-".to_string(),
    }
}

fn tone_icon(tone: Tone) -> &'static str {
    match tone {
        Tone::Positive => "✅",
        Tone::Negative => "⚠️ ",
        Tone::Neutral => "💡",
    }
}

/// Terminal rendering of a dashboard view
pub fn render_text(view: &DashboardView) -> Result<String> {
    let mut out = String::new();
    let s = &view.summary;

    writeln!(out)?;
    writeln!(
        out,
        "📊 Dashboard for {} ({} → {}, as of {})",
        view.user_id, view.period_start, view.period_end, view.as_of
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "   Income:      {:>12}  ({})",
        view.format_amount(s.total_income),
        trend_text(&s.income_trend)
    )?;
    writeln!(
        out,
        "   Expenses:    {:>12}  ({})",
        view.format_amount(s.total_expense),
        trend_text(&s.expense_trend)
    )?;
    writeln!(out, "   Net savings: {:>12}", view.format_amount(s.net_savings))?;

    writeln!(out)?;
    writeln!(
        out,
        "❤️  Financial health: {}/100 ({})",
        view.health.value,
        view.health.label()
    )?;
    for (factor, points) in &view.health.components {
        writeln!(
            out,
            "   {:<18} {:>5.1} / {:.0}",
            factor.as_str(),
            points,
            factor.weight()
        )?;
    }

    if !view.category_totals.is_empty() {
        writeln!(out)?;
        writeln!(out, "💸 Spending by category")?;
        let mut totals: Vec<_> = view.category_totals.iter().collect();
        totals.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (category, total) in totals {
            writeln!(out, "   {:<24} {:>12}", truncate(category, 24), view.format_amount(*total))?;
        }
    }

    if !view.budgets.is_empty() {
        writeln!(out)?;
        writeln!(out, "📋 Budgets")?;
        for (category, budget) in &view.budgets {
            let flag = if budget.pct_used.is_over() { " ⚠️" } else { "" };
            writeln!(
                out,
                "   {:<24} {:>12} / {:<12} {:>10}{}",
                truncate(category, 24),
                view.format_amount(budget.spent),
                view.format_amount(budget.allocated),
                utilization_text(&budget.pct_used),
                flag
            )?;
        }
    }

    if !view.goals.is_empty() {
        writeln!(out)?;
        writeln!(out, "🎯 Goals")?;
        for pacing in &view.goals {
            let projection = match pacing.projected_completion_date {
                Some(date) => format!("projected {}", date),
                None => "no projection".to_string(),
            };
            writeln!(
                out,
                "   {:<24} {:>5.1}%  {}  due {}  {}",
                truncate(&pacing.goal.name, 24),
                pacing.pct_complete * 100.0,
                if pacing.on_track { "on track " } else { "behind   " },
                pacing.goal.deadline,
                projection
            )?;
        }
    }

    if !view.recurring_expenses.is_empty() {
        writeln!(out)?;
        writeln!(out, "🔁 Recurring expenses")?;
        for recurring in &view.recurring_expenses {
            writeln!(
                out,
                "   {:<24} {:<18} {:>3}x {:>12}",
                truncate(&recurring.merchant, 24),
                truncate(&recurring.category, 18),
                recurring.occurrences,
                view.format_amount(recurring.period_total_minor)
            )?;
        }
    }

    if !view.recent_transactions.is_empty() {
        writeln!(out)?;
        writeln!(out, "📝 Recent transactions")?;
        for tx in &view.recent_transactions {
            writeln!(
                out,
                "   {} │ {:>12} │ {:<18} │ {}",
                tx.occurred_on,
                view.format_amount(tx.amount_minor),
                truncate(&tx.category, 18),
                truncate(&tx.description, 35)
            )?;
        }
    }

    writeln!(out)?;
    if view.insights.is_empty() {
        writeln!(out, "💡 No insights for this period")?;
    } else {
        writeln!(out, "💡 Insights")?;
        for insight in &view.insights {
            writeln!(out, "   {} {} [{}]", tone_icon(insight.tone), insight.title, insight.tag)?;
            writeln!(out, "      {}", insight.description)?;
        }
    }

    Ok(out)
}
