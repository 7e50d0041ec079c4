//! Core types for the Insight Generator

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Kinds of insight shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsightType {
    /// Recurring discretionary spend that could be trimmed
    Saving,
    /// A category running above its recent average
    SpendingIncrease,
    /// A goal running ahead of or behind its deadline
    GoalTracking,
    /// Investment suggestions (rendered by the presentation layer, not generated here)
    Investment,
    /// A budget past its allocation
    Overspend,
}

impl InsightType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::Saving => "saving",
            InsightType::SpendingIncrease => "spending-increase",
            InsightType::GoalTracking => "goal-tracking",
            InsightType::Investment => "investment",
            InsightType::Overspend => "overspend",
        }
    }

    /// Tag shown alongside the insight
    pub fn default_tag(&self) -> &'static str {
        match self {
            InsightType::Saving => "Expense Reduction",
            InsightType::SpendingIncrease => "Spending Pattern",
            InsightType::GoalTracking => "Savings",
            InsightType::Investment => "Investment",
            InsightType::Overspend => "Budget",
        }
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "saving" => Ok(InsightType::Saving),
            "spending-increase" => Ok(InsightType::SpendingIncrease),
            "goal-tracking" => Ok(InsightType::GoalTracking),
            "investment" => Ok(InsightType::Investment),
            "overspend" => Ok(InsightType::Overspend),
            _ => Err(format!("Unknown insight type: {}", s)),
        }
    }
}

/// Whether the insight is good news or a warning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Positive,
    Negative,
    #[default]
    Neutral,
}

/// A generated insight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    /// Deterministic key: `"{type}:{category}"`
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub tag: String,
    pub category: String,
    pub tone: Tone,
    /// Higher = more important
    pub severity_rank: i32,
    pub generated_on: NaiveDate,
}

impl Insight {
    pub fn new(
        insight_type: InsightType,
        category: impl Into<String>,
        severity_rank: i32,
        generated_on: NaiveDate,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let category = category.into();
        Self {
            id: format!("{}:{}", insight_type.as_str(), category),
            title: title.into(),
            description: description.into(),
            insight_type,
            tag: insight_type.default_tag().to_string(),
            category,
            tone: Tone::Neutral,
            severity_rank,
            generated_on,
        }
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    /// Presentation order: severity desc, then generated_on desc, then id asc
    pub fn ranking(&self, other: &Self) -> Ordering {
        other
            .severity_rank
            .cmp(&self.severity_rank)
            .then_with(|| other.generated_on.cmp(&self.generated_on))
            .then_with(|| self.id.cmp(&other.id))
    }
}
