use crate::rightsizing::{simulate, total_savings};
use crate::types::{BenchmarkResult, ClientInsight};
use crate::util::{round1, round2};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::warn;

pub const DEFAULT_INDUSTRY: &str = "msp";

/// Built-in industry averages for license waste, in percent.
pub static DEFAULT_BASELINES: Lazy<IndustryBaselines> = Lazy::new(|| {
    IndustryBaselines::new(
        [("msp", 22.0), ("saas", 18.0), ("it", 25.0), ("general", 20.0)],
        DEFAULT_INDUSTRY,
    )
});

/// Industry tag to average waste percentage, with a fallback entry for tags
/// the table does not know.
#[derive(Debug, Clone, PartialEq)]
pub struct IndustryBaselines {
    entries: HashMap<String, f64>,
    fallback: String,
}

impl IndustryBaselines {
    /// Keys are stored lower-cased. If `fallback` is not among the entries,
    /// lookups that miss resolve to 0.0.
    pub fn new<K, I>(entries: I, fallback: &str) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, f64)>,
    {
        IndustryBaselines {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.as_ref().trim().to_lowercase(), v))
                .collect(),
            fallback: fallback.trim().to_lowercase(),
        }
    }

    pub fn lookup(&self, industry: &str) -> f64 {
        let key = normalize_industry(industry);
        match self.entries.get(&key) {
            Some(v) => *v,
            None => {
                warn!(industry = %key, fallback = %self.fallback, "unknown industry, using fallback baseline");
                self.entries.get(&self.fallback).copied().unwrap_or(0.0)
            }
        }
    }
}

fn normalize_industry(industry: &str) -> String {
    let t = industry.trim().to_lowercase();
    if t.is_empty() {
        DEFAULT_INDUSTRY.to_string()
    } else {
        t
    }
}

/// Cost-weighted mean of license waste. Clients without cost carry no
/// weight; with no weight at all the result is 0.0.
pub fn weighted_avg_waste(insights: &[ClientInsight]) -> f64 {
    let (weighted, total_cost) = insights
        .iter()
        .filter(|c| c.cost > 0.0)
        .fold((0.0, 0.0), |(w, t), c| (w + c.cost * c.license_waste_pct, t + c.cost));
    if total_cost <= 0.0 {
        0.0
    } else {
        weighted / total_cost
    }
}

pub fn compare(
    insights: &[ClientInsight],
    industry: &str,
    baselines: &IndustryBaselines,
    recoverable_factor: f64,
) -> BenchmarkResult {
    let savings = simulate(insights, recoverable_factor);
    BenchmarkResult {
        industry: normalize_industry(industry).to_uppercase(),
        industry_avg_waste_pct: round1(baselines.lookup(industry)),
        your_waste_pct: round1(weighted_avg_waste(insights)),
        potential_savings_usd: round2(total_savings(&savings)),
        method: format!("cost-weighted license_waste_pct; recoverable_factor={}", recoverable_factor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Health;

    fn insight(client: &str, cost: f64, waste: f64) -> ClientInsight {
        ClientInsight {
            client: client.to_string(),
            revenue: 0.0,
            cost,
            margin: -cost,
            license_waste_pct: waste,
            health: Health::AtRisk,
        }
    }

    #[test]
    fn weighted_by_cost() {
        let avg = weighted_avg_waste(&[insight("A", 300.0, 10.0), insight("B", 100.0, 50.0)]);
        assert_eq!(avg, 20.0);
    }

    #[test]
    fn zero_cost_means_zero_average() {
        assert_eq!(weighted_avg_waste(&[]), 0.0);
        assert_eq!(weighted_avg_waste(&[insight("A", 0.0, 80.0), insight("B", -5.0, 10.0)]), 0.0);
    }

    #[test]
    fn lookup_is_case_insensitive_with_fallback() {
        assert_eq!(DEFAULT_BASELINES.lookup("SaaS"), 18.0);
        assert_eq!(DEFAULT_BASELINES.lookup(" IT "), 25.0);
        assert_eq!(DEFAULT_BASELINES.lookup("retail"), 22.0);
        assert_eq!(DEFAULT_BASELINES.lookup(""), 22.0);
    }

    #[test]
    fn custom_table_without_fallback_entry() {
        let t = IndustryBaselines::new([("Fintech", 12.5)], "missing");
        assert_eq!(t.lookup("fintech"), 12.5);
        assert_eq!(t.lookup("other"), 0.0);
    }

    #[test]
    fn compare_combines_average_and_savings() {
        let r = compare(&[insight("A", 80.0, 50.0)], "saas", &DEFAULT_BASELINES, 0.8);
        assert_eq!(r.industry, "SAAS");
        assert_eq!(r.industry_avg_waste_pct, 18.0);
        assert_eq!(r.your_waste_pct, 50.0);
        assert_eq!(r.potential_savings_usd, 32.0);
        assert_eq!(r.method, "cost-weighted license_waste_pct; recoverable_factor=0.8");
    }
}
