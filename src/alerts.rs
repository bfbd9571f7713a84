//! Budget tracking and spend alerts.
//!
//! A client only shows up in the alert list if it has a positive budget;
//! having no budget is an opt-out, not an "ok".

use crate::error::AnalysisResult;
use crate::types::{AlertLevel, AlertStatus, AnalyzeReport, ClientInsight};
use crate::util::round1;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

pub const DEFAULT_WARN_THRESHOLD: f64 = 0.9;
pub const DEFAULT_BREACH_THRESHOLD: f64 = 1.0;

/// Spend/budget ratios at which a client moves to `warn` and `breach`.
///
/// No ordering between the two is enforced: breach is checked first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThresholds {
    pub warn: f64,
    pub breach: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        AlertThresholds {
            warn: DEFAULT_WARN_THRESHOLD,
            breach: DEFAULT_BREACH_THRESHOLD,
        }
    }
}

impl AlertThresholds {
    pub fn classify(&self, ratio: f64) -> AlertLevel {
        if ratio >= self.breach {
            AlertLevel::Breach
        } else if ratio >= self.warn {
            AlertLevel::Warn
        } else {
            AlertLevel::Ok
        }
    }
}

/// Per-client budgets. Only finite numeric values survive loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Budgets(BTreeMap<String, f64>);

fn numeric(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        // `true` is not a budget of 1.0
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    };
    n.filter(|x| x.is_finite())
}

impl Budgets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, client: impl Into<String>, budget: f64) {
        self.0.insert(client.into(), budget);
    }

    pub fn get(&self, client: &str) -> Option<f64> {
        self.0.get(client).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build from a JSON value. Anything but an object yields no budgets;
    /// entries that are not finite numbers (or numeric strings) are dropped.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            warn!("budgets document is not a JSON object, ignoring");
            return Self::default();
        };
        let mut dropped = 0usize;
        let map = obj
            .iter()
            .filter_map(|(k, v)| match numeric(v) {
                Some(n) => Some((k.clone(), n)),
                None => {
                    dropped += 1;
                    None
                }
            })
            .collect();
        if dropped > 0 {
            warn!(dropped, "dropped non-numeric budget entries");
        }
        Budgets(map)
    }

    pub fn from_json_str(s: &str) -> AnalysisResult<Self> {
        let value: Value = serde_json::from_str(s)?;
        Ok(Self::from_value(&value))
    }

    pub fn load(path: impl AsRef<Path>) -> AnalysisResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let budgets = Self::from_json_str(&text)?;
        debug!(path = %path.as_ref().display(), entries = budgets.len(), "loaded budgets");
        Ok(budgets)
    }

    /// Copy with negative budgets clamped to zero, as stored.
    pub fn sanitized(&self) -> Self {
        Budgets(self.0.iter().map(|(k, v)| (k.clone(), v.max(0.0))).collect())
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .sanitized()
            .0
            .into_iter()
            .filter_map(|(k, v)| serde_json::Number::from_f64(v).map(|n| (k, Value::Number(n))))
            .collect();
        Value::Object(map)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> AnalysisResult<()> {
        let s = serde_json::to_string_pretty(&self.to_json())?;
        std::fs::write(path, s)?;
        Ok(())
    }
}

impl FromIterator<(String, f64)> for Budgets {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Budgets(iter.into_iter().collect())
    }
}

/// One alert per insight whose client has a budget above zero, in insight
/// order.
pub fn evaluate(
    insights: &[ClientInsight],
    budgets: &Budgets,
    thresholds: AlertThresholds,
) -> Vec<AlertStatus> {
    let alerts: Vec<AlertStatus> = insights
        .iter()
        .filter_map(|c| {
            let budget = budgets.get(&c.client).unwrap_or(0.0);
            if budget <= 0.0 {
                return None;
            }
            let spend = c.cost;
            let ratio = spend / budget;
            Some(AlertStatus {
                client: c.client.clone(),
                budget,
                spend,
                pct: round1(ratio * 100.0),
                status: thresholds.classify(ratio),
            })
        })
        .collect();
    debug!(alerts = alerts.len(), budgets = budgets.len(), "evaluated budgets");
    alerts
}

pub fn attach_alerts(report: &mut AnalyzeReport, budgets: &Budgets, thresholds: AlertThresholds) {
    report.alerts = Some(evaluate(&report.client_insights, budgets, thresholds));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Health;
    use serde_json::json;

    fn insight(client: &str, cost: f64) -> ClientInsight {
        ClientInsight {
            client: client.to_string(),
            revenue: 100.0,
            cost,
            margin: 100.0 - cost,
            license_waste_pct: 0.0,
            health: Health::Healthy,
        }
    }

    fn budgets(pairs: &[(&str, f64)]) -> Budgets {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn under_budget_is_ok() {
        let out = evaluate(&[insight("A", 80.0)], &budgets(&[("A", 100.0)]), AlertThresholds::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].pct, 80.0);
        assert_eq!(out[0].status, AlertLevel::Ok);
    }

    #[test]
    fn over_budget_is_breach() {
        let out = evaluate(&[insight("A", 80.0)], &budgets(&[("A", 50.0)]), AlertThresholds::default());
        assert_eq!(out[0].pct, 160.0);
        assert_eq!(out[0].status, AlertLevel::Breach);
    }

    #[test]
    fn near_budget_is_warn() {
        let out = evaluate(&[insight("A", 95.0)], &budgets(&[("A", 100.0)]), AlertThresholds::default());
        assert_eq!(out[0].status, AlertLevel::Warn);
    }

    #[test]
    fn clients_without_positive_budget_are_skipped() {
        let out = evaluate(
            &[insight("A", 80.0), insight("B", 80.0), insight("C", 80.0)],
            &budgets(&[("B", 0.0), ("C", -5.0)]),
            AlertThresholds::default(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn thresholds_applied_as_given() {
        let inverted = AlertThresholds { warn: 1.5, breach: 0.5 };
        let out = evaluate(&[insight("A", 80.0)], &budgets(&[("A", 100.0)]), inverted);
        assert_eq!(out[0].status, AlertLevel::Breach);
    }

    #[test]
    fn invalid_budget_entries_dropped() {
        let b = Budgets::from_value(&json!({
            "A": 100,
            "B": "250.5",
            "C": "lots",
            "D": null,
            "E": true,
        }));
        assert_eq!(b.len(), 2);
        assert_eq!(b.get("B"), Some(250.5));
        assert_eq!(b.get("C"), None);
    }

    #[test]
    fn boolean_budgets_are_not_numbers() {
        let b = Budgets::from_value(&json!({"A": true, "B": false, "C": [5], "D": 5}));
        assert_eq!(b.get("A"), None);
        assert_eq!(b.get("B"), None);
        assert_eq!(b.get("C"), None);
        assert_eq!(b.get("D"), Some(5.0));
        let out = evaluate(&[insight("A", 80.0)], &b, AlertThresholds::default());
        assert!(out.is_empty());
    }

    #[test]
    fn non_object_budgets_are_empty() {
        assert!(Budgets::from_value(&json!([1, 2, 3])).is_empty());
    }

    #[test]
    fn sanitized_clamps_negative() {
        let b = budgets(&[("A", -10.0), ("B", 5.0)]).sanitized();
        assert_eq!(b.get("A"), Some(0.0));
        assert_eq!(b.get("B"), Some(5.0));
    }
}
