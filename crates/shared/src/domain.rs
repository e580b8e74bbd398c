use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(DecisionId);
id_newtype!(ScenarioId);

/// Free-form context attached to a decision.
pub type DecisionContext = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionCategory {
    Career,
    Finance,
    Health,
    Business,
    Education,
    Personal,
    #[serde(other)]
    Other,
}

impl DecisionCategory {
    pub const SELECTABLE: [DecisionCategory; 6] = [
        DecisionCategory::Career,
        DecisionCategory::Finance,
        DecisionCategory::Business,
        DecisionCategory::Education,
        DecisionCategory::Health,
        DecisionCategory::Personal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DecisionCategory::Career => "career",
            DecisionCategory::Finance => "finance",
            DecisionCategory::Health => "health",
            DecisionCategory::Business => "business",
            DecisionCategory::Education => "education",
            DecisionCategory::Personal => "personal",
            DecisionCategory::Other => "other",
        }
    }
}

impl fmt::Display for DecisionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecisionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::SELECTABLE
            .into_iter()
            .find(|category| category.as_str() == needle)
            .ok_or_else(|| {
                format!(
                    "unknown category '{s}', expected one of: career, finance, business, education, health, personal"
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    #[default]
    Draft,
    Simulating,
    Completed,
    Archived,
    #[serde(other)]
    Unknown,
}

impl DecisionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionStatus::Draft => "draft",
            DecisionStatus::Simulating => "simulating",
            DecisionStatus::Completed => "completed",
            DecisionStatus::Archived => "archived",
            DecisionStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecisionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(DecisionStatus::Draft),
            "simulating" => Ok(DecisionStatus::Simulating),
            "completed" => Ok(DecisionStatus::Completed),
            "archived" => Ok(DecisionStatus::Archived),
            other => Err(format!("unknown decision status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: DecisionId,
    pub user_id: UserId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: DecisionCategory,
    #[serde(default)]
    pub context: Option<DecisionContext>,
    #[serde(default)]
    pub status: DecisionStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Decision {
    /// Returns a context entry as text, skipping blank strings.
    pub fn context_text(&self, key: &str) -> Option<&str> {
        self.context
            .as_ref()?
            .get(key)?
            .as_str()
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Positive,
    Neutral,
    Negative,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub period: String,
    pub event: String,
    #[serde(default = "unknown_impact")]
    pub impact: Impact,
}

fn unknown_impact() -> Impact {
    Impact::Unknown
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEntry {
    pub factor: String,
    #[serde(default = "unknown_severity")]
    pub severity: Severity,
    #[serde(default)]
    pub mitigation: Option<String>,
}

fn unknown_severity() -> Severity {
    Severity::Unknown
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcomes {
    /// Projected amounts keyed `year_1`, `year_3`, ...
    #[serde(default)]
    pub financial: BTreeMap<String, f64>,
    #[serde(default)]
    pub satisfaction: Option<f64>,
    #[serde(default)]
    pub time_investment_hours: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ScenarioOutcomes {
    /// Financial projection as `("Year N", amount)` points in year order.
    /// Keys that do not follow the `year_N` pattern are skipped.
    pub fn financial_series(&self) -> Vec<(String, f64)> {
        let mut points: Vec<(u32, f64)> = self
            .financial
            .iter()
            .filter_map(|(key, amount)| {
                let year = key.strip_prefix("year_")?.parse::<u32>().ok()?;
                Some((year, *amount))
            })
            .collect();
        points.sort_by_key(|(year, _)| *year);
        points
            .into_iter()
            .map(|(year, amount)| (format!("Year {year}"), amount))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub decision_id: DecisionId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub probability: Option<f64>,
    #[serde(default)]
    pub timeline_data: Option<Value>,
    #[serde(default)]
    pub outcomes: Option<Value>,
    #[serde(default)]
    pub risks: Option<Vec<Value>>,
    #[serde(default)]
    pub recommendations: Option<String>,
    #[serde(default)]
    pub rank: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl Scenario {
    /// Timeline milestones; entries that do not match the expected shape are dropped.
    pub fn timeline(&self) -> Vec<TimelineEntry> {
        match &self.timeline_data {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn outcomes(&self) -> Option<ScenarioOutcomes> {
        let outcomes = self.outcomes.as_ref()?;
        serde_json::from_value(outcomes.clone()).ok()
    }

    pub fn risk_entries(&self) -> Vec<RiskEntry> {
        self.risks
            .iter()
            .flatten()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect()
    }

    /// Probability rounded to a whole percentage.
    pub fn probability_percent(&self) -> Option<u32> {
        self.probability
            .map(|p| (p.clamp(0.0, 1.0) * 100.0).round() as u32)
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
