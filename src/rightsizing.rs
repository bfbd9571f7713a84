use crate::types::{ClientInsight, SavingsEstimate, SavingsMap};
use crate::util::round2;

/// Fraction of detected waste assumed realistically recoverable.
pub const DEFAULT_RECOVERABLE_FACTOR: f64 = 0.8;

pub fn estimate(insight: &ClientInsight, recoverable_factor: f64) -> Option<SavingsEstimate> {
    let cost = insight.cost;
    let waste = insight.license_waste_pct / 100.0;
    if cost <= 0.0 || waste <= 0.0 {
        return None;
    }
    let savings = (cost * waste * recoverable_factor).max(0.0);
    let projected = (cost - savings).max(0.0);
    Some(SavingsEstimate {
        savings_usd: round2(savings),
        current_cost: round2(cost),
        projected_cost: round2(projected),
    })
}

/// Estimate recoverable savings per client.
///
/// Clients without cost or without waste get no entry at all. When a client
/// name repeats, the later entry replaces the earlier one.
pub fn simulate(insights: &[ClientInsight], recoverable_factor: f64) -> SavingsMap {
    insights
        .iter()
        .filter_map(|c| estimate(c, recoverable_factor).map(|s| (c.client.clone(), s)))
        .collect()
}

pub fn total_savings(savings: &SavingsMap) -> f64 {
    savings.values().map(|s| s.savings_usd).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Health;

    fn insight(client: &str, cost: f64, waste: f64) -> ClientInsight {
        ClientInsight {
            client: client.to_string(),
            revenue: 100.0,
            cost,
            margin: 100.0 - cost,
            license_waste_pct: waste,
            health: Health::Healthy,
        }
    }

    #[test]
    fn recovers_share_of_waste() {
        let out = simulate(&[insight("A", 80.0, 50.0)], DEFAULT_RECOVERABLE_FACTOR);
        let a = out["A"];
        assert_eq!(a.savings_usd, 32.0);
        assert_eq!(a.current_cost, 80.0);
        assert_eq!(a.projected_cost, 48.0);
    }

    #[test]
    fn omits_clients_without_cost_or_waste() {
        let out = simulate(
            &[insight("zero-cost", 0.0, 40.0), insight("no-waste", 50.0, 0.0)],
            0.8,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn projected_cost_never_negative() {
        let out = simulate(&[insight("A", 10.0, 100.0)], 1.0);
        assert_eq!(out["A"].projected_cost, 0.0);
    }

    #[test]
    fn identical_inputs_identical_outputs() {
        let input = vec![insight("A", 80.0, 50.0), insight("B", 30.0, 10.0)];
        assert_eq!(simulate(&input, 0.8), simulate(&input, 0.8));
        assert_eq!(total_savings(&simulate(&input, 0.8)), 32.0 + 2.4);
    }
}
