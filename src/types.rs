use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tabled::Tabled;

use crate::util::format_number;

/// One parsed CSV line: header name to raw cell text.
pub type Row = HashMap<String, String>;

/// Rightsizing estimates keyed by client name. A missing key means
/// "no recoverable savings", which is not the same thing as a zero entry.
pub type SavingsMap = BTreeMap<String, SavingsEstimate>;

/// Canonical billing-schema record, produced once per row so that column
/// aliases are resolved in a single place.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingRecord {
    pub client: String,
    pub revenue: f64,
    pub cost: f64,
    pub licenses_used: f64,
    pub licenses_purchased: f64,
}

/// Canonical cost-only record (generic cloud billing export).
#[derive(Debug, Clone, PartialEq)]
pub struct CostRecord {
    pub label: String,
    pub cost: f64,
}

/// Which column layout the CSV was recognised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schema {
    /// `client/revenue/cost/licenses_*`
    Billing,
    /// `Cost/Service/UsageType`
    CostOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Health {
    #[serde(rename = "Healthy")]
    Healthy,
    #[serde(rename = "At Risk")]
    AtRisk,
    #[serde(rename = "Inefficient")]
    Inefficient,
    /// Only used by the cost-only schema, where margin and waste are unknown.
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Health {
    /// Waste above this percentage marks a profitable client as inefficient.
    pub const INEFFICIENT_WASTE_PCT: f64 = 30.0;

    pub fn classify(margin: f64, license_waste_pct: f64) -> Self {
        if margin < 0.0 {
            Health::AtRisk
        } else if license_waste_pct > Self::INEFFICIENT_WASTE_PCT {
            Health::Inefficient
        } else {
            Health::Healthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Health::Healthy => "Healthy",
            Health::AtRisk => "At Risk",
            Health::Inefficient => "Inefficient",
            Health::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInsight {
    pub client: String,
    pub revenue: f64,
    pub cost: f64,
    pub margin: f64,
    pub license_waste_pct: f64,
    pub health: Health,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    pub total_revenue: f64,
    pub total_cost: f64,
    pub total_profit: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeReport {
    #[serde(flatten)]
    pub totals: PortfolioTotals,
    pub client_insights: Vec<ClientInsight>,
    pub schema: Schema,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<AlertStatus>>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavingsEstimate {
    pub savings_usd: f64,
    pub current_cost: f64,
    pub projected_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Ok,
    Warn,
    Breach,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Ok => "ok",
            AlertLevel::Warn => "warn",
            AlertLevel::Breach => "breach",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertStatus {
    pub client: String,
    pub budget: f64,
    pub spend: f64,
    /// Spend as a percentage of budget, one decimal.
    pub pct: f64,
    pub status: AlertLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub industry: String,
    pub industry_avg_waste_pct: f64,
    pub your_waste_pct: f64,
    pub potential_savings_usd: f64,
    pub method: String,
}

/// A prioritised cost-saving action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub title: String,
    pub reason: String,
    #[serde(default)]
    pub est_impact_usd: f64,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projected_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings_pct: Option<f64>,
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, Serialize)]
pub struct ReportBundle {
    pub report: AnalyzeReport,
    pub savings: SavingsMap,
    pub benchmark: BenchmarkResult,
    pub actions: Vec<Action>,
}

// Display rows. Amounts are pre-formatted so console tables and CSV exports
// show the same text.

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct InsightRow {
    #[serde(rename = "Client")]
    #[tabled(rename = "Client")]
    pub client: String,
    #[serde(rename = "Revenue")]
    #[tabled(rename = "Revenue")]
    pub revenue: String,
    #[serde(rename = "Cost")]
    #[tabled(rename = "Cost")]
    pub cost: String,
    #[serde(rename = "Margin")]
    #[tabled(rename = "Margin")]
    pub margin: String,
    #[serde(rename = "LicenseWastePct")]
    #[tabled(rename = "LicenseWastePct")]
    pub license_waste_pct: String,
    #[serde(rename = "Health")]
    #[tabled(rename = "Health")]
    pub health: String,
}

impl From<&ClientInsight> for InsightRow {
    fn from(c: &ClientInsight) -> Self {
        InsightRow {
            client: c.client.clone(),
            revenue: format_number(c.revenue, 2),
            cost: format_number(c.cost, 2),
            margin: format_number(c.margin, 2),
            license_waste_pct: format_number(c.license_waste_pct, 1),
            health: c.health.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SavingsRow {
    #[serde(rename = "Client")]
    #[tabled(rename = "Client")]
    pub client: String,
    #[serde(rename = "CurrentCost")]
    #[tabled(rename = "CurrentCost")]
    pub current_cost: String,
    #[serde(rename = "ProjectedCost")]
    #[tabled(rename = "ProjectedCost")]
    pub projected_cost: String,
    #[serde(rename = "Savings")]
    #[tabled(rename = "Savings")]
    pub savings_usd: String,
}

impl SavingsRow {
    pub fn new(client: &str, s: &SavingsEstimate) -> Self {
        SavingsRow {
            client: client.to_string(),
            current_cost: format_number(s.current_cost, 2),
            projected_cost: format_number(s.projected_cost, 2),
            savings_usd: format_number(s.savings_usd, 2),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct AlertRow {
    #[serde(rename = "Client")]
    #[tabled(rename = "Client")]
    pub client: String,
    #[serde(rename = "Budget")]
    #[tabled(rename = "Budget")]
    pub budget: String,
    #[serde(rename = "Spend")]
    #[tabled(rename = "Spend")]
    pub spend: String,
    #[serde(rename = "Pct")]
    #[tabled(rename = "Pct")]
    pub pct: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
}

impl From<&AlertStatus> for AlertRow {
    fn from(a: &AlertStatus) -> Self {
        AlertRow {
            client: a.client.clone(),
            budget: format_number(a.budget, 2),
            spend: format_number(a.spend, 2),
            pct: format_number(a.pct, 1),
            status: a.status.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ActionRow {
    #[serde(rename = "Title")]
    #[tabled(rename = "Title")]
    pub title: String,
    #[serde(rename = "EstImpact")]
    #[tabled(rename = "EstImpact")]
    pub est_impact_usd: String,
    #[serde(rename = "SavingsPct")]
    #[tabled(rename = "SavingsPct")]
    pub savings_pct: String,
    #[serde(rename = "Targets")]
    #[tabled(rename = "Targets")]
    pub targets: String,
}

impl From<&Action> for ActionRow {
    fn from(a: &Action) -> Self {
        ActionRow {
            title: a.title.clone(),
            est_impact_usd: format_number(a.est_impact_usd, 2),
            savings_pct: a
                .savings_pct
                .map(|p| format_number(p, 1))
                .unwrap_or_else(|| "-".to_string()),
            targets: a.targets.join(", "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_classification_is_exclusive() {
        assert_eq!(Health::classify(-0.01, 90.0), Health::AtRisk);
        assert_eq!(Health::classify(0.0, 30.1), Health::Inefficient);
        assert_eq!(Health::classify(0.0, 30.0), Health::Healthy);
        assert_eq!(Health::classify(10.0, 0.0), Health::Healthy);
    }

    #[test]
    fn health_serializes_with_display_labels() {
        let s = serde_json::to_string(&Health::AtRisk).unwrap();
        assert_eq!(s, "\"At Risk\"");
        assert_eq!(Health::Inefficient.to_string(), "Inefficient");
    }

    #[test]
    fn alert_level_serializes_lowercase() {
        let s = serde_json::to_string(&AlertLevel::Breach).unwrap();
        assert_eq!(s, "\"breach\"");
    }
}
