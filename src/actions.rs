use crate::types::{Action, ClientInsight, SavingsMap};
use crate::util::{format_number, round1, round2};
use std::cmp::Ordering;

pub const DEFAULT_CONFIDENCE: f64 = 0.6;
pub const DEFAULT_RISK: &str = "medium";

/// Waste at or below this percentage counts as "no waste" when choosing
/// between the commitment and rightsizing actions.
const MINIMAL_WASTE_PCT: f64 = 0.1;

fn action(title: &str, reason: &str, est_impact_usd: f64, targets: Vec<String>) -> Action {
    Action {
        title: title.to_string(),
        reason: reason.to_string(),
        est_impact_usd,
        targets,
        confidence: None,
        risk: None,
        current_cost: None,
        projected_cost: None,
        savings_pct: None,
    }
}

fn names<'a>(clients: impl IntoIterator<Item = &'a ClientInsight>) -> Vec<String> {
    clients.into_iter().map(|c| c.client.clone()).collect()
}

/// Deterministic recommendations derived only from the insights.
pub fn rule_based_actions(insights: &[ClientInsight]) -> Vec<Action> {
    let mut actions = Vec::new();

    let all_minimal_waste = insights
        .iter()
        .all(|c| c.license_waste_pct <= MINIMAL_WASTE_PCT);
    if all_minimal_waste {
        actions.push(action(
            "Commit to Savings Plans / Reserved Instances",
            "Waste is minimal; use pricing commitments for steady workloads to reduce unit cost.",
            3000.0,
            names(insights),
        ));
    } else {
        let mut by_waste: Vec<&ClientInsight> = insights.iter().collect();
        by_waste.sort_by(|a, b| {
            b.license_waste_pct
                .partial_cmp(&a.license_waste_pct)
                .unwrap_or(Ordering::Equal)
        });
        actions.push(action(
            "Right-size & reclaim unused licenses",
            "Reduce recurring waste by rightsizing or reclaiming entitlements.",
            2500.0,
            names(by_waste.into_iter().take(2)),
        ));
    }

    let mut by_margin: Vec<&ClientInsight> = insights.iter().collect();
    by_margin.sort_by(|a, b| a.margin.partial_cmp(&b.margin).unwrap_or(Ordering::Equal));
    actions.push(action(
        "Reprice low-margin contracts",
        "Underpriced workloads detected; re-negotiate/adjust SKUs to recover margin.",
        2000.0,
        names(by_margin.into_iter().take(2)),
    ));

    actions.push(action(
        "Upsell higher-margin bundles (security/backup)",
        "Increase ARPU and retention with managed add-ons.",
        1500.0,
        names(insights),
    ));
    actions
}

/// Fill defaults and attach rightsizing figures for each action's targets.
///
/// `est_impact_usd` is only ever raised, never lowered, by the simulated
/// savings.
pub fn enrich_with_savings(actions: &mut [Action], savings: &SavingsMap) {
    for a in actions.iter_mut() {
        a.confidence.get_or_insert(DEFAULT_CONFIDENCE);
        a.risk.get_or_insert_with(|| DEFAULT_RISK.to_string());

        let (mut cur, mut proj, mut sav) = (0.0, 0.0, 0.0);
        for s in a.targets.iter().filter_map(|t| savings.get(t)) {
            cur += s.current_cost;
            proj += s.projected_cost;
            sav += s.savings_usd;
        }
        if cur > 0.0 {
            a.current_cost = Some(round2(cur));
            a.projected_cost = Some(round2(proj));
            if sav > 0.0 {
                a.est_impact_usd = a.est_impact_usd.max(round2(sav));
                a.savings_pct = Some(round1(sav / cur * 100.0));
            }
        }
    }
}

fn quoted_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|t| format!("'{}'", t)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Short numbered summary of the first three actions, e.g.
/// `1) Trim: waste (≈$2,500.00) targets=['A', 'B']`.
pub fn format_actions_pretty(actions: &[Action]) -> String {
    if actions.is_empty() {
        return "No actions.".to_string();
    }
    actions
        .iter()
        .take(3)
        .enumerate()
        .map(|(i, a)| {
            format!(
                "{}) {}: {} (≈${}) targets={}",
                i + 1,
                a.title,
                a.reason,
                format_number(a.est_impact_usd, 2),
                quoted_list(&a.targets)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
