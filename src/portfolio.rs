use crate::error::{AnalysisError, AnalysisResult};
use crate::insights::analyze_records;
use crate::loader::{parse_rows, ParsedCsv};
use crate::types::{
    AnalyzeReport, BillingRecord, ClientInsight, CostRecord, Health, PortfolioTotals, Schema,
};
use crate::util::round2;
use chrono::Utc;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info};

/// Totals summed from the unrounded records, so per-client rounding does
/// not drift into the portfolio figures.
pub fn billing_totals(records: &[BillingRecord]) -> PortfolioTotals {
    let revenue: f64 = records.iter().map(|r| r.revenue).sum();
    let cost: f64 = records.iter().map(|r| r.cost).sum();
    PortfolioTotals {
        total_revenue: round2(revenue),
        total_cost: round2(cost),
        total_profit: round2(revenue - cost),
    }
}

/// Cost-only exports have no revenue, so each service/usage label becomes a
/// pseudo-client whose revenue equals its cost. Highest cost first; ties
/// keep the order in which labels first appeared.
pub fn cost_only_summary(records: &[CostRecord]) -> (PortfolioTotals, Vec<ClientInsight>) {
    let mut order: Vec<String> = Vec::new();
    let mut by_label: HashMap<&str, f64> = HashMap::new();
    for r in records {
        let e = by_label.entry(r.label.as_str()).or_insert_with(|| {
            order.push(r.label.clone());
            0.0
        });
        *e += r.cost;
    }

    let mut groups: Vec<(String, f64)> = order
        .into_iter()
        .map(|label| {
            let cost = by_label.get(label.as_str()).copied().unwrap_or(0.0);
            (label, cost)
        })
        .collect();
    groups.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let insights = groups
        .into_iter()
        .map(|(label, cost)| ClientInsight {
            client: label,
            revenue: round2(cost),
            cost: round2(cost),
            margin: 0.0,
            license_waste_pct: 0.0,
            health: Health::Unknown,
        })
        .collect();

    let total: f64 = records.iter().map(|r| r.cost).sum();
    let totals = PortfolioTotals {
        total_revenue: round2(total),
        total_cost: round2(total),
        total_profit: 0.0,
    };
    (totals, insights)
}

/// Build the portfolio report for already-parsed rows.
///
/// Fails with [`AnalysisError::NoRows`] when there is no data; every other
/// problem degrades to zero values.
pub fn summarize(parsed: &ParsedCsv) -> AnalysisResult<AnalyzeReport> {
    if parsed.is_empty() {
        return Err(AnalysisError::NoRows);
    }
    let schema = parsed.schema();
    debug!(?schema, rows = parsed.rows.len(), "detected schema");

    let (totals, client_insights) = match schema {
        Schema::Billing => {
            let records = parsed.billing_records();
            (billing_totals(&records), analyze_records(&records))
        }
        Schema::CostOnly => cost_only_summary(&parsed.cost_records()),
    };

    info!(
        clients = client_insights.len(),
        total_revenue = totals.total_revenue,
        total_cost = totals.total_cost,
        "portfolio analysed"
    );
    Ok(AnalyzeReport {
        totals,
        client_insights,
        schema,
        alerts: None,
        generated_at: Utc::now(),
    })
}

/// Parse CSV text and summarise it in one step.
pub fn analyze_text(text: &str) -> AnalysisResult<(ParsedCsv, AnalyzeReport)> {
    let parsed = parse_rows(text)?;
    let report = summarize(&parsed)?;
    Ok((parsed, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            analyze_text("client,revenue,cost\n"),
            Err(AnalysisError::NoRows)
        ));
    }

    #[test]
    fn billing_totals_use_raw_values() {
        let (_, report) =
            analyze_text("client,revenue,cost\nA,0.004,0\nB,0.004,0\nC,0.004,0\n").unwrap();
        // each client rounds to 0.00 but the portfolio still sees 0.012
        assert_eq!(report.totals.total_revenue, 0.01);
        assert!(report.client_insights.iter().all(|c| c.revenue == 0.0));
    }

    #[test]
    fn cost_only_groups_and_orders_by_cost() {
        let (_, report) =
            analyze_text("Cost,Service\n10,EC2\n5,EC2\n20,S3\n1,\n").unwrap();
        assert_eq!(report.schema, Schema::CostOnly);
        let names: Vec<&str> = report.client_insights.iter().map(|c| c.client.as_str()).collect();
        assert_eq!(names, vec!["S3", "EC2", "Unknown"]);
        assert_eq!(report.totals.total_cost, 36.0);
        assert_eq!(report.totals.total_revenue, 36.0);
        assert_eq!(report.totals.total_profit, 0.0);
    }

    #[test]
    fn cost_only_ties_keep_first_seen_order() {
        let (_, report) = analyze_text("Cost,Service\n5,B\n5,A\n").unwrap();
        assert_eq!(report.client_insights[0].client, "B");
        assert_eq!(report.client_insights[1].client, "A");
    }
}
