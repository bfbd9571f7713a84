use crate::types::{BillingRecord, ClientInsight, Health};
use crate::util::{round1, round2};
use std::cmp::Ordering;

/// Share of purchased licenses that go unused, 0..=100.
///
/// Zero when nothing was purchased; over-use never produces negative waste.
pub fn license_waste_pct(licenses_used: f64, licenses_purchased: f64) -> f64 {
    if licenses_purchased <= 0.0 {
        return 0.0;
    }
    ((licenses_purchased - licenses_used) / licenses_purchased * 100.0).max(0.0)
}

pub fn client_insight(rec: &BillingRecord) -> ClientInsight {
    let margin = round2(rec.revenue - rec.cost);
    let waste = license_waste_pct(rec.licenses_used, rec.licenses_purchased);
    ClientInsight {
        client: rec.client.clone(),
        revenue: round2(rec.revenue),
        cost: round2(rec.cost),
        margin,
        license_waste_pct: round1(waste),
        health: Health::classify(margin, waste),
    }
}

/// One insight per record, lowest margin first.
///
/// Records sharing a client name are kept as separate entries. The sort is
/// stable, so equal margins keep input order.
pub fn analyze_records(records: &[BillingRecord]) -> Vec<ClientInsight> {
    let mut insights: Vec<ClientInsight> = records.iter().map(client_insight).collect();
    insights.sort_by(|a, b| a.margin.partial_cmp(&b.margin).unwrap_or(Ordering::Equal));
    insights
}
